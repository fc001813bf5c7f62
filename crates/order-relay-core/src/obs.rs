//! Structured observability hooks for conversation turns.
//!
//! This module provides:
//! - [`RelaySink`], the observability sink the orchestrator is constructed
//!   with and passes down to the turn state machine
//! - [`TracingSink`], which emits every hook as a `tracing` event
//! - [`TurnEvent`], the per-action notifications a turn buffers until its
//!   state is saved
//! - [`turn_span`], the span each turn runs inside
//!
//! Configuration errors are emitted at `error!`, kept apart from the
//! `info!`-level user-facing rejections.

use tracing::{error, info, warn};

use crate::actions::ActionKind;
use crate::conversation::ConversationId;
use crate::error::{Rejection, RelayError};
use crate::order::Confirmation;
use crate::projection::format_money;
use crate::roles::Role;

/// Receives lifecycle events from the orchestrator.
pub trait RelaySink: Send + Sync {
    fn turn_started(&self, id: &ConversationId, turn: u64, role: Role);
    fn action_applied(&self, id: &ConversationId, role: Role, action: ActionKind);
    fn action_rejected(&self, id: &ConversationId, role: Role, action: ActionKind, reason: &Rejection);
    fn configuration_error(&self, id: &ConversationId, error: &RelayError);
    fn role_switched(&self, id: &ConversationId, from: Role, to: Role);
    fn order_finalized(&self, id: &ConversationId, confirmation: &Confirmation);
    fn collaborator_failure(&self, id: &ConversationId, error: &RelayError);
    fn turn_finished(&self, id: &ConversationId, turn: u64, role: Role, emitted: usize);
}

/// A notification produced while applying a decision.
///
/// Held in [`TurnEffects`](crate::conversation::TurnEffects) and handed to
/// the sink only after the turn's state has been saved, so a failed or
/// cancelled turn reports nothing it did not commit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TurnEvent {
    ActionApplied { role: Role, action: ActionKind },
    ActionRejected { role: Role, action: ActionKind, reason: Rejection },
    RoleSwitched { from: Role, to: Role },
    OrderFinalized(Confirmation),
}

impl TurnEvent {
    pub fn publish(&self, id: &ConversationId, sink: &dyn RelaySink) {
        match self {
            TurnEvent::ActionApplied { role, action } => sink.action_applied(id, *role, *action),
            TurnEvent::ActionRejected {
                role,
                action,
                reason,
            } => sink.action_rejected(id, *role, *action, reason),
            TurnEvent::RoleSwitched { from, to } => sink.role_switched(id, *from, *to),
            TurnEvent::OrderFinalized(confirmation) => sink.order_finalized(id, confirmation),
        }
    }
}

/// Emits every hook as a structured `tracing` event.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl RelaySink for TracingSink {
    fn turn_started(&self, id: &ConversationId, turn: u64, role: Role) {
        info!(event = "turn.started", conversation_id = %id, turn = turn, role = %role);
    }

    fn action_applied(&self, id: &ConversationId, role: Role, action: ActionKind) {
        info!(event = "action.applied", conversation_id = %id, role = %role, action = %action);
    }

    fn action_rejected(&self, id: &ConversationId, role: Role, action: ActionKind, reason: &Rejection) {
        info!(
            event = "action.rejected",
            conversation_id = %id,
            role = %role,
            action = %action,
            reason = %reason,
        );
    }

    fn configuration_error(&self, id: &ConversationId, error: &RelayError) {
        error!(event = "turn.configuration_error", conversation_id = %id, error = %error);
    }

    fn role_switched(&self, id: &ConversationId, from: Role, to: Role) {
        info!(event = "role.switched", conversation_id = %id, from = %from, to = %to);
    }

    fn order_finalized(&self, id: &ConversationId, confirmation: &Confirmation) {
        info!(
            event = "order.finalized",
            conversation_id = %id,
            confirmation_id = %confirmation.confirmation_id,
            total = %format_money(confirmation.total),
            items = confirmation.item_count,
        );
    }

    fn collaborator_failure(&self, id: &ConversationId, error: &RelayError) {
        warn!(event = "turn.collaborator_failure", conversation_id = %id, error = %error);
    }

    fn turn_finished(&self, id: &ConversationId, turn: u64, role: Role, emitted: usize) {
        info!(
            event = "turn.finished",
            conversation_id = %id,
            turn = turn,
            active_role = %role,
            emitted = emitted,
        );
    }
}

/// Discards everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopSink;

impl RelaySink for NoopSink {
    fn turn_started(&self, _: &ConversationId, _: u64, _: Role) {}
    fn action_applied(&self, _: &ConversationId, _: Role, _: ActionKind) {}
    fn action_rejected(&self, _: &ConversationId, _: Role, _: ActionKind, _: &Rejection) {}
    fn configuration_error(&self, _: &ConversationId, _: &RelayError) {}
    fn role_switched(&self, _: &ConversationId, _: Role, _: Role) {}
    fn order_finalized(&self, _: &ConversationId, _: &Confirmation) {}
    fn collaborator_failure(&self, _: &ConversationId, _: &RelayError) {}
    fn turn_finished(&self, _: &ConversationId, _: u64, _: Role, _: usize) {}
}

/// Span for one turn. `turn` is recorded once the state is loaded.
pub fn turn_span(id: &ConversationId) -> tracing::Span {
    tracing::info_span!(
        "order_relay.turn",
        conversation_id = %id,
        turn = tracing::field::Empty,
    )
}
