//! Process-local history store.

use async_trait::async_trait;
use hub_core::{MessageStore, StoreResult};
use std::collections::VecDeque;
use tokio::sync::RwLock;

/// Bounded in-memory history, newest entry at the front
#[derive(Debug)]
pub struct MemoryHistoryStore {
    entries: RwLock<VecDeque<String>>,
    capacity: usize,
}

impl MemoryHistoryStore {
    /// Create a store retaining at most `capacity` entries
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: RwLock::new(VecDeque::with_capacity(capacity.min(1024))),
            capacity,
        }
    }

    /// Number of retained entries
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    /// Whether nothing has been retained
    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

#[async_trait]
impl MessageStore for MemoryHistoryStore {
    async fn append(&self, payload: &str) -> StoreResult<()> {
        let mut entries = self.entries.write().await;
        entries.push_front(payload.to_string());
        entries.truncate(self.capacity);
        Ok(())
    }

    async fn recent(&self, n: usize) -> StoreResult<Vec<String>> {
        let entries = self.entries.read().await;
        Ok(entries.iter().take(n).cloned().collect())
    }
}
