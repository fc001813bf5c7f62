//! Conversation state and the per-turn state machine.
//!
//! [`ConversationState`] owns the order record, the active-role pointer and
//! the append-only message log. [`ConversationState::apply_decision`] is the
//! synchronous half of a turn: it gates every requested action against the
//! role that owns the turn, applies the resulting deltas in order, and
//! switches roles only once all actions have run.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::actions::{dispatch, ActionKind, ActionOutcome};
use crate::error::{RelayError, RelayResult};
use crate::obs::TurnEvent;
use crate::order::{merge, Confirmation, OrderRecord};
use crate::reasoning::Decision;
use crate::roles::Role;

/// Identity of a conversation. Each id gets its own isolated state.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ConversationId(pub String);

impl ConversationId {
    /// Generate a new random id.
    pub fn new() -> Self {
        ConversationId(uuid::Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for ConversationId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ConversationId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for ConversationId {
    fn from(s: &str) -> Self {
        ConversationId(s.to_string())
    }
}

/// Who produced a log record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "name", rename_all = "snake_case")]
pub enum Speaker {
    User,
    /// Reply text from the role that owned the turn.
    Agent(Role),
    /// Outcome message of an action.
    Action(ActionKind),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TurnRecord {
    /// Turn this record belongs to (1-based).
    pub turn: u64,
    pub speaker: Speaker,
    pub content: String,
    pub at: DateTime<Utc>,
}

/// What one turn did, as reported back to the caller.
#[derive(Debug, Clone, Default)]
pub struct TurnEffects {
    /// Records appended to the log this turn, in order.
    pub emitted: Vec<TurnRecord>,
    pub confirmations: Vec<Confirmation>,
    /// Sink notifications, in the order they happened.
    pub events: Vec<TurnEvent>,
    pub applied: usize,
    pub rejected: usize,
    /// Set when the turn ended with a role switch.
    pub handoff: Option<Role>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationState {
    pub id: ConversationId,
    pub active_role: Role,
    pub order: OrderRecord,
    message_log: Vec<TurnRecord>,
    /// Number of turns started so far.
    pub turns: u64,
    pub created_at: DateTime<Utc>,
}

impl ConversationState {
    /// Fresh conversation: Sales owns it, the order is empty.
    pub fn new(id: ConversationId) -> Self {
        Self {
            id,
            active_role: Role::Sales,
            order: OrderRecord::default(),
            message_log: Vec::new(),
            turns: 0,
            created_at: Utc::now(),
        }
    }

    /// The log, oldest first.
    pub fn message_log(&self) -> &[TurnRecord] {
        &self.message_log
    }

    /// The last `window` log records.
    pub fn recent_history(&self, window: usize) -> &[TurnRecord] {
        let start = self.message_log.len().saturating_sub(window);
        &self.message_log[start..]
    }

    /// Open a new turn and log the user's input.
    pub fn begin_turn(&mut self, user_input: &str) -> u64 {
        self.turns += 1;
        self.append(Speaker::User, user_input);
        self.turns
    }

    fn append(&mut self, speaker: Speaker, content: impl Into<String>) -> TurnRecord {
        let record = TurnRecord {
            turn: self.turns,
            speaker,
            content: content.into(),
            at: Utc::now(),
        };
        self.message_log.push(record.clone());
        record
    }

    /// Reject the decision if any action is outside the active role's set.
    ///
    /// Runs before anything is dispatched, so a wiring error leaves the
    /// state exactly as it was.
    pub fn gate(&self, decision: &Decision) -> RelayResult<()> {
        let role = self.active_role;
        match decision
            .actions
            .iter()
            .map(|call| call.kind())
            .find(|kind| !role.allows(*kind))
        {
            Some(action) => Err(RelayError::ActionNotAllowed { role, action }),
            None => Ok(()),
        }
    }

    /// Apply a reasoning decision to this state.
    ///
    /// Every action is gated by the role that owned the turn when it began;
    /// a handoff requested mid-turn only moves the pointer after the last
    /// action has run. Rejected actions append their explanation and change
    /// nothing else. Sink notifications are returned in
    /// [`TurnEffects::events`] rather than emitted here.
    pub fn apply_decision(&mut self, decision: &Decision) -> RelayResult<TurnEffects> {
        self.gate(decision)?;

        let role = self.active_role;
        let mut effects = TurnEffects::default();

        if let Some(reply) = decision.reply.as_deref().filter(|r| !r.is_empty()) {
            effects.emitted.push(self.append(Speaker::Agent(role), reply));
        }

        let mut pending_handoff = None;
        for call in &decision.actions {
            let action = call.kind();
            let outcome = dispatch(&self.order, call);
            for text in outcome.messages() {
                effects.emitted.push(self.append(Speaker::Action(action), text));
            }
            match outcome {
                ActionOutcome::Applied {
                    delta,
                    confirmation,
                } => {
                    self.order = merge(&self.order, &delta.changes);
                    if delta.handoff.is_some() {
                        pending_handoff = delta.handoff;
                    }
                    if let Some(confirmation) = confirmation {
                        effects
                            .events
                            .push(TurnEvent::OrderFinalized(confirmation.clone()));
                        effects.confirmations.push(confirmation);
                    }
                    effects.events.push(TurnEvent::ActionApplied { role, action });
                    effects.applied += 1;
                }
                ActionOutcome::Rejected { reason, .. } => {
                    effects.events.push(TurnEvent::ActionRejected {
                        role,
                        action,
                        reason,
                    });
                    effects.rejected += 1;
                }
            }
        }

        if let Some(next) = pending_handoff.filter(|next| *next != role) {
            self.active_role = next;
            effects.events.push(TurnEvent::RoleSwitched {
                from: role,
                to: next,
            });
            effects.handoff = Some(next);
        }

        Ok(effects)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actions::ActionCall;
    use rust_decimal_macros::dec;

    fn state() -> ConversationState {
        ConversationState::new(ConversationId::from("conv-1"))
    }

    #[test]
    fn test_new_conversation_starts_in_sales() {
        let s = state();
        assert_eq!(s.active_role, Role::Sales);
        assert!(s.order.items.is_empty());
        assert!(s.message_log().is_empty());
        assert_eq!(s.turns, 0);
    }

    #[test]
    fn test_gate_rejects_before_any_mutation() {
        let mut s = state();
        s.begin_turn("add a latte and place the order");
        let before = s.clone();

        let decision = Decision::actions(vec![
            ActionCall::add_item("Latte", 1, dec!(4.50)),
            ActionCall::FinalizeOrder,
        ]);
        let err = s.apply_decision(&decision).unwrap_err();
        assert!(matches!(
            err,
            RelayError::ActionNotAllowed {
                role: Role::Sales,
                action: ActionKind::FinalizeOrder
            }
        ));
        assert_eq!(s, before);
    }

    #[test]
    fn test_handoff_takes_effect_after_the_turn() {
        let mut s = state();
        s.begin_turn("a latte, then checkout");

        // add_item after the handoff is still gated as Sales.
        let decision = Decision::actions(vec![
            ActionCall::TransferToCheckout,
            ActionCall::add_item("Latte", 1, dec!(4.50)),
        ]);
        let effects = s.apply_decision(&decision).unwrap();
        assert_eq!(effects.handoff, Some(Role::Checkout));
        assert_eq!(effects.applied, 2);
        assert_eq!(s.active_role, Role::Checkout);
        assert_eq!(s.order.total, dec!(4.50));
    }

    #[test]
    fn test_rejection_only_appends_message() {
        let mut s = state();
        s.begin_turn("minus two lattes");
        let order_before = s.order.clone();

        let effects = s
            .apply_decision(&Decision::actions(vec![ActionCall::add_item(
                "Latte",
                -2,
                dec!(4.50),
            )]))
            .unwrap();
        assert_eq!(effects.rejected, 1);
        assert_eq!(effects.emitted.len(), 1);
        assert_eq!(effects.emitted[0].speaker, Speaker::Action(ActionKind::AddItem));
        assert_eq!(s.order, order_before);
        assert_eq!(s.active_role, Role::Sales);
    }

    #[test]
    fn test_log_is_append_only_and_ordered() {
        let mut s = state();
        s.begin_turn("hi");
        s.apply_decision(&Decision::reply("hello!")).unwrap();
        s.begin_turn("one muffin");
        s.apply_decision(
            &Decision::actions(vec![ActionCall::add_item("Muffin", 1, dec!(3))])
                .with_reply("Adding it"),
        )
        .unwrap();

        let speakers: Vec<Speaker> = s.message_log().iter().map(|r| r.speaker).collect();
        assert_eq!(
            speakers,
            vec![
                Speaker::User,
                Speaker::Agent(Role::Sales),
                Speaker::User,
                Speaker::Agent(Role::Sales),
                Speaker::Action(ActionKind::AddItem),
            ]
        );
        let turns: Vec<u64> = s.message_log().iter().map(|r| r.turn).collect();
        assert_eq!(turns, vec![1, 1, 2, 2, 2]);
    }

    #[test]
    fn test_effects_buffer_events_in_order() {
        let mut s = state();
        s.begin_turn("a latte and a bad muffin, then checkout");

        let effects = s
            .apply_decision(&Decision::actions(vec![
                ActionCall::add_item("Latte", 1, dec!(4.50)),
                ActionCall::add_item("Muffin", 0, dec!(3)),
                ActionCall::TransferToCheckout,
            ]))
            .unwrap();

        assert_eq!(effects.events.len(), 4);
        assert_eq!(
            effects.events[0],
            TurnEvent::ActionApplied {
                role: Role::Sales,
                action: ActionKind::AddItem
            }
        );
        assert!(matches!(
            effects.events[1],
            TurnEvent::ActionRejected {
                action: ActionKind::AddItem,
                ..
            }
        ));
        assert_eq!(
            effects.events[3],
            TurnEvent::RoleSwitched {
                from: Role::Sales,
                to: Role::Checkout
            }
        );
    }

    #[test]
    fn test_recent_history_window() {
        let mut s = state();
        for i in 0..5 {
            s.begin_turn(&format!("msg {i}"));
        }
        let recent = s.recent_history(2);
        assert_eq!(recent.len(), 2);
        assert_eq!(recent[1].content, "msg 4");
        assert_eq!(s.recent_history(50).len(), 5);
    }

    #[test]
    fn test_state_roundtrips_through_json() {
        let mut s = state();
        s.begin_turn("one latte");
        s.apply_decision(&Decision::actions(vec![ActionCall::add_item(
            "Latte",
            1,
            dec!(4.50),
        )]))
        .unwrap();
        let json = serde_json::to_string(&s).unwrap();
        let back: ConversationState = serde_json::from_str(&json).unwrap();
        assert_eq!(back, s);
    }
}
