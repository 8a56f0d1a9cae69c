//! In-memory long-term memory store.

use async_trait::async_trait;
use hearth_core::error::StorageError;
use hearth_core::store::{MemoryRecord, MemoryStore};
use tokio::sync::RwLock;
use tracing::info;

/// Long-term memory records in a Vec behind an async lock.
pub struct InMemoryMemoryStore {
    records: RwLock<Vec<MemoryRecord>>,
}

impl InMemoryMemoryStore {
    pub fn new() -> Self {
        Self {
            records: RwLock::new(Vec::new()),
        }
    }
}

impl Default for InMemoryMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

/// The base persona records installed by a memory reset.
pub fn base_memories(persona_name: &str) -> Vec<MemoryRecord> {
    vec![
        MemoryRecord::new("personality", "core", format!("name:{persona_name}"), 5),
        MemoryRecord::new("personality", "core", "location:Los Angeles", 4),
    ]
}

#[async_trait]
impl MemoryStore for InMemoryMemoryStore {
    fn name(&self) -> &str {
        "in_memory"
    }

    async fn top_by_importance(&self, n: usize) -> Result<Vec<MemoryRecord>, StorageError> {
        let records = self.records.read().await;
        let mut active: Vec<MemoryRecord> =
            records.iter().filter(|r| r.active).cloned().collect();
        active.sort_by(|a, b| b.importance.cmp(&a.importance));
        active.truncate(n);
        Ok(active)
    }

    async fn create(&self, record: MemoryRecord) -> Result<MemoryRecord, StorageError> {
        if record.kind.is_empty() || record.category.is_empty() || record.content.is_empty() {
            return Err(StorageError::Invalid(
                "kind, category, and content are required".into(),
            ));
        }
        let mut records = self.records.write().await;
        records.push(record.clone());
        Ok(record)
    }

    async fn reset_and_seed(&self, seeds: Vec<MemoryRecord>) -> Result<(), StorageError> {
        let mut records = self.records.write().await;
        for record in records.iter_mut() {
            record.active = false;
        }
        let seeded = seeds.len();
        records.extend(seeds);
        info!(seeded, "Memories reset");
        Ok(())
    }
}
