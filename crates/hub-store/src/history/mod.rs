//! History store adapters

mod memory_history;
mod redis_history;

pub use memory_history::MemoryHistoryStore;
pub use redis_history::RedisHistoryStore;
