//! Persistence collaborator boundary.
//!
//! - [`ConversationStore`]: `load` / `save` keyed by conversation id
//! - [`memory`]: in-memory store for tests and one-shot runs
//! - [`fs`]: one JSON document per conversation on disk

pub mod fs;
pub mod memory;

use async_trait::async_trait;

use crate::conversation::{ConversationId, ConversationState};
use crate::error::StorageResult;

pub use fs::FsConversationStore;
pub use memory::MemoryConversationStore;

/// Durable storage for conversation state.
///
/// Guarantees:
/// - `load` after `save` returns an equal state.
/// - `load` of an unknown id is `Ok(None)`, not an error.
/// - States of different ids never affect each other.
#[async_trait]
pub trait ConversationStore: Send + Sync {
    async fn load(&self, id: &ConversationId) -> StorageResult<Option<ConversationState>>;

    async fn save(&self, id: &ConversationId, state: &ConversationState) -> StorageResult<()>;
}
