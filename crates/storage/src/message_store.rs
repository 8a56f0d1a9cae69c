//! In-memory message store — the persistence gateway for a single session.

use async_trait::async_trait;
use hearth_core::error::StorageError;
use hearth_core::message::ChatMessage;
use hearth_core::store::MessageStore;
use tokio::sync::RwLock;

/// Stores finalized messages in a Vec behind an async lock. Single-session
/// by design; a multi-instance deployment would swap this behind the same
/// trait.
pub struct InMemoryMessageStore {
    messages: RwLock<Vec<ChatMessage>>,
}

impl InMemoryMessageStore {
    pub fn new() -> Self {
        Self {
            messages: RwLock::new(Vec::new()),
        }
    }
}

impl Default for InMemoryMessageStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl MessageStore for InMemoryMessageStore {
    fn name(&self) -> &str {
        "in_memory"
    }

    async fn create(&self, message: ChatMessage) -> Result<ChatMessage, StorageError> {
        let mut messages = self.messages.write().await;
        messages.push(message.clone());
        Ok(message)
    }

    async fn list(&self) -> Result<Vec<ChatMessage>, StorageError> {
        let messages = self.messages.read().await;
        let mut visible: Vec<ChatMessage> = messages
            .iter()
            .filter(|m| !m.is_deleted)
            .cloned()
            .collect();
        visible.sort_by_key(|m| m.timestamp);
        Ok(visible)
    }

    async fn soft_delete(&self, id: &str) -> Result<(), StorageError> {
        let mut messages = self.messages.write().await;
        let message = messages
            .iter_mut()
            .find(|m| m.id == id)
            .ok_or_else(|| StorageError::NotFound(id.to_string()))?;
        message.is_deleted = true;
        Ok(())
    }

    async fn hard_delete_all(&self) -> Result<(), StorageError> {
        self.messages.write().await.clear();
        Ok(())
    }

    async fn update(&self, id: &str, content: &str) -> Result<ChatMessage, StorageError> {
        let mut messages = self.messages.write().await;
        let message = messages
            .iter_mut()
            .find(|m| m.id == id)
            .ok_or_else(|| StorageError::NotFound(id.to_string()))?;
        message.content = content.to_string();
        Ok(message.clone())
    }
}
