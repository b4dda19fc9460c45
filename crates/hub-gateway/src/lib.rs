//! # hub-gateway
//!
//! Real-time broadcast hub over WebSocket.
//!
//! A single [`Hub`](hub::Hub) task owns the session registry and fans every
//! message out to all registered sessions. Each connection runs an inbound
//! pump, an outbound pump, and a liveness monitor (see [`session`]).

pub mod hub;
pub mod identity;
pub mod protocol;
pub mod server;
pub mod session;

pub use hub::{Hub, HubError, HubHandle, HubStats};
pub use server::{run, GatewayState};
pub use session::{Session, SessionError, SessionTasks};
