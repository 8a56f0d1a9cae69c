//! Store traits — the persistence gateway and the long-term memory store.
//!
//! The conversation pipeline consumes these as collaborators; it never
//! reimplements persistence. Implementations live in `hearth-storage`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::StorageError;
use crate::message::ChatMessage;

/// The persistence gateway for finalized chat messages.
///
/// Ownership of a [`crate::message::StreamingMessage`] transfers here at
/// finalization; the in-memory instance is then discarded.
#[async_trait]
pub trait MessageStore: Send + Sync {
    /// The backend name (e.g., "in_memory").
    fn name(&self) -> &str;

    /// Persist a finalized message.
    async fn create(&self, message: ChatMessage) -> Result<ChatMessage, StorageError>;

    /// List messages in ascending timestamp order, excluding soft-deleted.
    async fn list(&self) -> Result<Vec<ChatMessage>, StorageError>;

    /// Soft-delete a message by ID. The record is retained but excluded
    /// from listings.
    async fn soft_delete(&self, id: &str) -> Result<(), StorageError>;

    /// Permanently remove all messages.
    async fn hard_delete_all(&self) -> Result<(), StorageError>;

    /// Replace a message's content.
    async fn update(&self, id: &str, content: &str) -> Result<ChatMessage, StorageError>;
}

/// A long-term memory record, separate from chat messages.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemoryRecord {
    pub id: String,

    /// Kind of memory (e.g., "personality", "event").
    pub kind: String,

    /// Category within the kind (e.g., "core").
    pub category: String,

    pub content: String,

    /// Importance on the same 1–5 scale as context entries.
    pub importance: u8,

    pub timestamp: DateTime<Utc>,

    pub last_recall: DateTime<Utc>,

    pub recall_count: u32,

    /// Inactive records are invisible to recall queries.
    pub active: bool,
}

impl MemoryRecord {
    /// Create a new active memory record.
    pub fn new(
        kind: impl Into<String>,
        category: impl Into<String>,
        content: impl Into<String>,
        importance: u8,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            kind: kind.into(),
            category: category.into(),
            content: content.into(),
            importance: importance.clamp(1, 5),
            timestamp: now,
            last_recall: now,
            recall_count: 1,
            active: true,
        }
    }
}

/// The long-term memory store collaborator.
#[async_trait]
pub trait MemoryStore: Send + Sync {
    /// The backend name.
    fn name(&self) -> &str;

    /// Fetch the top `n` active memories by descending importance.
    async fn top_by_importance(&self, n: usize) -> Result<Vec<MemoryRecord>, StorageError>;

    /// Store a new memory record.
    async fn create(&self, record: MemoryRecord) -> Result<MemoryRecord, StorageError>;

    /// Deactivate all active memories, then insert the given seed records.
    async fn reset_and_seed(&self, seeds: Vec<MemoryRecord>) -> Result<(), StorageError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_record_clamps_importance() {
        let record = MemoryRecord::new("personality", "core", "name:Scarlett", 9);
        assert_eq!(record.importance, 5);
        assert!(record.active);
        assert_eq!(record.recall_count, 1);
    }

    #[test]
    fn memory_record_serialization() {
        let record = MemoryRecord::new("personality", "core", "location:Los Angeles", 4);
        let json = serde_json::to_string(&record).unwrap();
        assert!(json.contains("Los Angeles"));
        assert!(json.contains(r#""importance":4"#));
    }
}
