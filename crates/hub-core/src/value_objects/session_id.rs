//! Session ID - registry key for one connection

use std::fmt;
use uuid::Uuid;

/// Unique identifier of a single connection's session
///
/// A reconnecting peer always gets a fresh id, so an unregistered id never
/// re-enters the registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SessionId(Uuid);

impl SessionId {
    /// Generate a new random session id
    #[must_use]
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
