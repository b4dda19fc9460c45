//! History store port
//!
//! The hub only needs two operations from its history: append one General
//! payload, and fetch the most recent entries. Adapters live in `hub-store`.

use async_trait::async_trait;
use std::sync::Arc;

use crate::error::StoreError;

/// Result type for store operations
pub type StoreResult<T> = Result<T, StoreError>;

/// Append-only bounded message history
#[async_trait]
pub trait MessageStore: Send + Sync {
    /// Persist one General message payload
    ///
    /// Must be safe to call concurrently with `recent`.
    async fn append(&self, payload: &str) -> StoreResult<()>;

    /// Return up to `n` of the most recently appended payloads, newest first
    async fn recent(&self, n: usize) -> StoreResult<Vec<String>>;

    /// Return up to `n` of the most recent payloads in chronological order
    ///
    /// This is the order replay uses, so readers see history oldest-first.
    async fn recent_chronological(&self, n: usize) -> StoreResult<Vec<String>> {
        let mut entries = self.recent(n).await?;
        entries.reverse();
        Ok(entries)
    }
}

/// Store shared between the history writer and connection setup
pub type SharedMessageStore = Arc<dyn MessageStore>;

#[cfg(test)]
mod tests {
    use super::*;

    struct FixedStore(Vec<String>);

    #[async_trait]
    impl MessageStore for FixedStore {
        async fn append(&self, _payload: &str) -> StoreResult<()> {
            Ok(())
        }

        async fn recent(&self, n: usize) -> StoreResult<Vec<String>> {
            Ok(self.0.iter().take(n).cloned().collect())
        }
    }

    #[tokio::test]
    async fn test_recent_chronological_reverses() {
        let store = FixedStore(vec!["c".into(), "b".into(), "a".into()]);
        let entries = store.recent_chronological(2).await.unwrap();
        assert_eq!(entries, vec!["b".to_string(), "c".to_string()]);
    }
}
