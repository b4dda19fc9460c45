//! # hub-store
//!
//! Adapters for the hub's [`MessageStore`](hub_core::MessageStore) port.
//!
//! ## Features
//!
//! - **Connection Pool**: Managed Redis connection pool with deadpool
//! - **Redis History**: Bounded history kept in a Redis list (newest at the head)
//! - **Memory History**: Process-local bounded history for single-node runs and tests
//!
//! ## Example
//!
//! ```ignore
//! use hub_store::{RedisHistoryStore, RedisPool, RedisPoolConfig};
//!
//! let pool = RedisPool::new(RedisPoolConfig::default())?;
//! let store = RedisHistoryStore::new(pool, "hub:history", 1000);
//!
//! store.append("[ada][12:00:00] hi").await?;
//! let newest_first = store.recent(5).await?;
//! ```

pub mod history;
pub mod pool;

// Re-export pool types
pub use pool::{RedisPool, RedisPoolConfig, RedisPoolError, RedisResult};

// Re-export history stores
pub use history::{MemoryHistoryStore, RedisHistoryStore};
