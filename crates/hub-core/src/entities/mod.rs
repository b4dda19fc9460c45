//! Entities - values flowing through the hub

mod broadcast;

pub use broadcast::{BroadcastMessage, MessageKind, Payload};
