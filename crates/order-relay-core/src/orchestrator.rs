//! Turn orchestration.
//!
//! [`Orchestrator::handle_turn`] is the one entry point. A turn runs as:
//!
//! 1. take the conversation's turn lock (turns for one id never overlap)
//! 2. load the state, or start a fresh one in `Sales`
//! 3. log the user input and ask the reasoning collaborator for a decision,
//!    giving it the active role's directive and a freshly computed projection
//! 4. gate and apply the decision to the working copy
//! 5. save the working copy
//!
//! Nothing is saved unless every step succeeds, and the sink hears about
//! applied actions, role switches and placed orders only after step 5.
//! Dropping the future before step 5 completes leaves the stored state as
//! it was.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use serde::{Deserialize, Serialize};
use tracing::Instrument;

use crate::config::RelayConfig;
use crate::conversation::{ConversationId, ConversationState, TurnRecord};
use crate::error::{RelayError, RelayResult};
use crate::obs::{turn_span, RelaySink, TracingSink};
use crate::order::{Confirmation, OrderRecord};
use crate::reasoning::{ReasoningCollaborator, ReasoningRequest};
use crate::roles::Role;
use crate::store::ConversationStore;

/// What a caller gets back from one turn.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TurnOutcome {
    pub conversation_id: ConversationId,
    pub turn: u64,
    /// Role that owned this turn.
    pub handled_by: Role,
    /// Role that owns the next turn.
    pub active_role: Role,
    pub order: OrderRecord,
    /// Records appended after the user's input, in order.
    pub messages: Vec<TurnRecord>,
    pub confirmations: Vec<Confirmation>,
}

/// Per-conversation turn locks. Entries are dropped once no turn holds them.
#[derive(Debug, Default)]
struct SessionLocks {
    locks: Mutex<HashMap<ConversationId, Arc<tokio::sync::Mutex<()>>>>,
}

impl SessionLocks {
    /// Register interest in `id`. Lock the permit to own the turn.
    fn acquire(&self, id: &ConversationId) -> TurnPermit<'_> {
        let mut locks = self.locks.lock().unwrap_or_else(|p| p.into_inner());
        let lock = Arc::clone(locks.entry(id.clone()).or_default());
        TurnPermit {
            lock,
            _prune: PruneOnDrop {
                sessions: self,
                id: id.clone(),
            },
        }
    }

    fn prune(&self, id: &ConversationId) {
        let mut locks = self.locks.lock().unwrap_or_else(|p| p.into_inner());
        if locks.get(id).is_some_and(|l| Arc::strong_count(l) == 1) {
            locks.remove(id);
        }
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        self.locks.lock().unwrap_or_else(|p| p.into_inner()).len()
    }
}

/// A registered interest in one conversation's turn lock.
///
/// Dropping the permit, including when the turn future is cancelled while
/// waiting or mid-turn, prunes the map entry once no other permit shares it.
struct TurnPermit<'a> {
    // Declared first: fields drop in order, so the count is already
    // decremented when `_prune` runs.
    lock: Arc<tokio::sync::Mutex<()>>,
    _prune: PruneOnDrop<'a>,
}

struct PruneOnDrop<'a> {
    sessions: &'a SessionLocks,
    id: ConversationId,
}

impl Drop for PruneOnDrop<'_> {
    fn drop(&mut self) {
        self.sessions.prune(&self.id);
    }
}

pub struct Orchestrator {
    reasoner: Arc<dyn ReasoningCollaborator>,
    store: Arc<dyn ConversationStore>,
    sink: Arc<dyn RelaySink>,
    config: RelayConfig,
    sessions: SessionLocks,
}

impl Orchestrator {
    /// Orchestrator with [`TracingSink`] and default configuration.
    pub fn new(
        reasoner: Arc<dyn ReasoningCollaborator>,
        store: Arc<dyn ConversationStore>,
    ) -> Self {
        Self {
            reasoner,
            store,
            sink: Arc::new(TracingSink),
            config: RelayConfig::default(),
            sessions: SessionLocks::default(),
        }
    }

    pub fn with_sink(mut self, sink: Arc<dyn RelaySink>) -> Self {
        self.sink = sink;
        self
    }

    pub fn with_config(mut self, config: RelayConfig) -> Self {
        self.config = config;
        self
    }

    pub fn config(&self) -> &RelayConfig {
        &self.config
    }

    /// Current stored state of a conversation, if it exists.
    pub async fn conversation(&self, id: &ConversationId) -> RelayResult<Option<ConversationState>> {
        Ok(self.store.load(id).await?)
    }

    /// Process one user turn for `id`.
    pub async fn handle_turn(
        &self,
        id: &ConversationId,
        user_input: &str,
    ) -> RelayResult<TurnOutcome> {
        let permit = self.sessions.acquire(id);
        let _turn = permit.lock.lock().await;
        let span = turn_span(id);
        self.run_turn(id, user_input, span.clone())
            .instrument(span)
            .await
    }

    async fn run_turn(
        &self,
        id: &ConversationId,
        user_input: &str,
        span: tracing::Span,
    ) -> RelayResult<TurnOutcome> {
        let result = self.try_turn(id, user_input, &span).await;
        if let Err(e) = &result {
            if e.is_collaborator_failure() {
                self.sink.collaborator_failure(id, e);
            } else if e.is_configuration_error() {
                self.sink.configuration_error(id, e);
            }
        }
        result
    }

    async fn try_turn(
        &self,
        id: &ConversationId,
        user_input: &str,
        span: &tracing::Span,
    ) -> RelayResult<TurnOutcome> {
        let mut working = match self.store.load(id).await? {
            Some(state) => state,
            None => ConversationState::new(id.clone()),
        };

        let turn = working.begin_turn(user_input);
        span.record("turn", turn);
        let role = working.active_role;
        self.sink.turn_started(id, turn, role);

        let template = role.template();
        let request = ReasoningRequest {
            role,
            directive: template.directive,
            context: role.project(&working.order),
            allowed_actions: template.allowed_actions,
            history: working.recent_history(self.config.history_window),
        };
        let decision = self.reasoner.decide(request).await?;

        if decision.actions.len() > self.config.max_actions_per_turn {
            return Err(RelayError::TooManyActions {
                requested: decision.actions.len(),
                limit: self.config.max_actions_per_turn,
            });
        }

        let effects = working.apply_decision(&decision)?;
        self.store.save(id, &working).await?;

        // Committed: only now report what the turn did.
        for event in &effects.events {
            event.publish(id, self.sink.as_ref());
        }
        self.sink
            .turn_finished(id, turn, working.active_role, effects.emitted.len());

        Ok(TurnOutcome {
            conversation_id: id.clone(),
            turn,
            handled_by: role,
            active_role: working.active_role,
            order: working.order,
            messages: effects.emitted,
            confirmations: effects.confirmations,
        })
    }
}
