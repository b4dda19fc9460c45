//! # hub-core
//!
//! Domain layer containing the broadcast message model, session identity, and the
//! history store port. This crate has zero dependencies on infrastructure (network, Redis, etc.).

pub mod entities;
pub mod error;
pub mod traits;
pub mod value_objects;

// Re-export commonly used types at crate root
pub use entities::{BroadcastMessage, MessageKind, Payload};
pub use error::StoreError;
pub use traits::{MessageStore, SharedMessageStore, StoreResult};
pub use value_objects::SessionId;
