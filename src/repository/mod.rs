//! Storage accessor for per-conversation dialog state

use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;
use tracing::debug;

use crate::errors::DialogResult;
use crate::value_objects::DialogStackState;

/// Loads and saves a conversation's `DialogStackState`
///
/// Conflict detection between concurrent writers belongs to the
/// implementation, not the engine.
#[async_trait]
pub trait DialogStateRepository: Send + Sync {
    /// State for `conversation_key`, or a fresh empty state
    async fn load(&self, conversation_key: &str) -> DialogResult<DialogStackState>;

    async fn save(&self, conversation_key: &str, state: &DialogStackState) -> DialogResult<()>;
}

/// Repository keeping serialized state in memory
#[derive(Debug, Default)]
pub struct InMemoryDialogStateRepository {
    entries: RwLock<HashMap<String, String>>,
}

impl InMemoryDialogStateRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Raw persisted JSON for a conversation
    pub async fn raw(&self, conversation_key: &str) -> Option<String> {
        self.entries.read().await.get(conversation_key).cloned()
    }

    /// Store raw JSON, e.g. state written by an earlier deployment
    pub async fn insert_raw(&self, conversation_key: impl Into<String>, json: impl Into<String>) {
        self.entries
            .write()
            .await
            .insert(conversation_key.into(), json.into());
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

#[async_trait]
impl DialogStateRepository for InMemoryDialogStateRepository {
    async fn load(&self, conversation_key: &str) -> DialogResult<DialogStackState> {
        match self.entries.read().await.get(conversation_key) {
            Some(json) => DialogStackState::from_json(json),
            None => {
                debug!("No dialog state for {conversation_key}; starting fresh");
                Ok(DialogStackState::new())
            }
        }
    }

    async fn save(&self, conversation_key: &str, state: &DialogStackState) -> DialogResult<()> {
        let json = state.to_json()?;
        self.entries
            .write()
            .await
            .insert(conversation_key.to_string(), json);
        Ok(())
    }
}
