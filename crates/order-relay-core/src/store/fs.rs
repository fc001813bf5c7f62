//! File-backed conversation store: one JSON document per conversation.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use sha2::{Digest, Sha256};
use tempfile::NamedTempFile;

use super::ConversationStore;
use crate::conversation::{ConversationId, ConversationState};
use crate::error::{StorageError, StorageResult};

/// Filesystem-backed store: one JSON document per conversation.
///
/// Layout: `<root>/<sha256(conversation id)>.json`. Hashing the id keeps
/// arbitrary ids (slashes, `..`, unicode) out of the path.
#[derive(Debug, Clone)]
pub struct FsConversationStore {
    root: PathBuf,
}

impl FsConversationStore {
    /// Create a store rooted at `root`, creating the directory if needed.
    pub fn new(root: impl AsRef<Path>) -> StorageResult<Self> {
        let root = root.as_ref().to_path_buf();
        fs::create_dir_all(&root)?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn document_path(&self, id: &ConversationId) -> PathBuf {
        let digest = hex::encode(Sha256::digest(id.as_str().as_bytes()));
        self.root.join(format!("{digest}.json"))
    }
}

fn read_document(path: &Path, id: &ConversationId) -> StorageResult<Option<ConversationState>> {
    let bytes = match fs::read(path) {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(StorageError::Io(e)),
    };
    let state: ConversationState = serde_json::from_slice(&bytes)?;
    if &state.id != id {
        return Err(StorageError::Corrupt {
            id: id.to_string(),
            reason: format!("document belongs to conversation {}", state.id),
        });
    }
    Ok(Some(state))
}

// Atomic write: temp file in the same directory, then rename.
fn write_document(root: &Path, path: &Path, bytes: &[u8]) -> StorageResult<()> {
    let mut tmp = NamedTempFile::new_in(root)?;
    tmp.write_all(bytes)?;
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}

#[async_trait]
impl ConversationStore for FsConversationStore {
    async fn load(&self, id: &ConversationId) -> StorageResult<Option<ConversationState>> {
        let path = self.document_path(id);
        let id = id.clone();
        tokio::task::spawn_blocking(move || read_document(&path, &id))
            .await
            .map_err(|e| StorageError::Task(e.to_string()))?
    }

    async fn save(&self, id: &ConversationId, state: &ConversationState) -> StorageResult<()> {
        let path = self.document_path(id);
        let root = self.root.clone();
        let bytes = serde_json::to_vec_pretty(state)?;
        tokio::task::spawn_blocking(move || write_document(&root, &path, &bytes))
            .await
            .map_err(|e| StorageError::Task(e.to_string()))?
    }
}
