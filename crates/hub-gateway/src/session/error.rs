//! Per-session errors
//!
//! None of these reach other sessions: each ends only the session it occurred in.

use crate::hub::HubError;
use std::time::Duration;
use thiserror::Error;

/// Why a session task stopped abnormally
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("Connection error: {0}")]
    Connection(String),

    #[error("No pong received within {0:?}")]
    ReadTimeout(Duration),

    #[error("Write did not complete within {0:?}")]
    WriteTimeout(Duration),

    #[error("Message of {size} bytes exceeds the {limit} byte limit")]
    ProtocolViolation { size: usize, limit: usize },

    #[error(transparent)]
    Hub(#[from] HubError),

    #[error("Session task failed: {0}")]
    Task(String),
}

impl SessionError {
    /// Stable error code for log fields
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::Connection(_) => "CONNECTION",
            Self::ReadTimeout(_) => "READ_TIMEOUT",
            Self::WriteTimeout(_) => "WRITE_TIMEOUT",
            Self::ProtocolViolation { .. } => "PROTOCOL_VIOLATION",
            Self::Hub(_) => "HUB_CLOSED",
            Self::Task(_) => "TASK_FAILED",
        }
    }

    /// Whether the peer caused the failure
    #[must_use]
    pub fn is_peer_fault(&self) -> bool {
        matches!(
            self,
            Self::Connection(_)
                | Self::ReadTimeout(_)
                | Self::WriteTimeout(_)
                | Self::ProtocolViolation { .. }
        )
    }
}

impl From<tokio::task::JoinError> for SessionError {
    fn from(err: tokio::task::JoinError) -> Self {
        Self::Task(err.to_string())
    }
}
