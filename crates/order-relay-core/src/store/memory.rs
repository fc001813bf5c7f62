//! In-memory conversation store backed by a `HashMap<id, state>`.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;

use super::ConversationStore;
use crate::conversation::{ConversationId, ConversationState};
use crate::error::StorageResult;

#[derive(Debug, Default)]
pub struct MemoryConversationStore {
    states: Mutex<HashMap<ConversationId, ConversationState>>,
}

impl MemoryConversationStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored conversations.
    pub fn len(&self) -> usize {
        self.states
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl ConversationStore for MemoryConversationStore {
    async fn load(&self, id: &ConversationId) -> StorageResult<Option<ConversationState>> {
        let states = self
            .states
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        Ok(states.get(id).cloned())
    }

    async fn save(&self, id: &ConversationId, state: &ConversationState) -> StorageResult<()> {
        let mut states = self
            .states
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        states.insert(id.clone(), state.clone());
        Ok(())
    }
}
