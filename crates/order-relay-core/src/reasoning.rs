//! Reasoning collaborator boundary.
//!
//! The orchestrator never decides which actions to run. It hands the active
//! role's directive, a fresh projection and the recent history to a
//! [`ReasoningCollaborator`] and applies whatever [`Decision`] comes back.

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::actions::{ActionCall, ActionKind};
use crate::conversation::TurnRecord;
use crate::error::CollaboratorError;
use crate::roles::Role;

/// Everything the collaborator gets to see for one turn.
#[derive(Debug, Clone)]
pub struct ReasoningRequest<'a> {
    pub role: Role,
    pub directive: &'a str,
    /// Projection of the order record for `role`, computed this turn.
    pub context: String,
    pub allowed_actions: &'a [ActionKind],
    /// Most recent log records, oldest first. Ends with the user's input.
    pub history: &'a [TurnRecord],
}

/// The collaborator's answer: an optional reply and the actions to run, in order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Decision {
    #[serde(default)]
    pub reply: Option<String>,
    #[serde(default)]
    pub actions: Vec<ActionCall>,
}

impl Decision {
    pub fn reply(text: impl Into<String>) -> Self {
        Self {
            reply: Some(text.into()),
            actions: Vec::new(),
        }
    }

    pub fn actions(actions: Vec<ActionCall>) -> Self {
        Self {
            reply: None,
            actions,
        }
    }

    pub fn with_reply(mut self, text: impl Into<String>) -> Self {
        self.reply = Some(text.into());
        self
    }
}

#[async_trait]
pub trait ReasoningCollaborator: Send + Sync {
    async fn decide(&self, request: ReasoningRequest<'_>) -> Result<Decision, CollaboratorError>;
}

/// Replays a fixed queue of decisions, one per call.
#[derive(Debug, Default)]
pub struct ScriptedReasoner {
    queue: Mutex<VecDeque<Decision>>,
    served: Mutex<usize>,
}

impl ScriptedReasoner {
    pub fn new(decisions: impl IntoIterator<Item = Decision>) -> Self {
        Self {
            queue: Mutex::new(decisions.into_iter().collect()),
            served: Mutex::new(0),
        }
    }

    pub fn push(&self, decision: Decision) {
        self.queue
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push_back(decision);
    }

    pub fn remaining(&self) -> usize {
        self.queue
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .len()
    }
}

#[async_trait]
impl ReasoningCollaborator for ScriptedReasoner {
    async fn decide(&self, request: ReasoningRequest<'_>) -> Result<Decision, CollaboratorError> {
        let mut served = self
            .served
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        let next = self
            .queue
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .pop_front();
        match next {
            Some(decision) => {
                *served += 1;
                tracing::debug!(
                    role = %request.role,
                    actions = decision.actions.len(),
                    "scripted decision served"
                );
                Ok(decision)
            }
            None => Err(CollaboratorError::Exhausted { turn: *served + 1 }),
        }
    }
}
