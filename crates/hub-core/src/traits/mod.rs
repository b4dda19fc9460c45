//! Ports consumed by the coordination core

mod message_store;

pub use message_store::{MessageStore, SharedMessageStore, StoreResult};
