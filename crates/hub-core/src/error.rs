//! Store errors - failures reported by history store adapters

use thiserror::Error;

/// History store errors
///
/// Every variant is non-fatal to the hub: callers log it and continue
/// without persistence.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Store unavailable: {0}")]
    Unavailable(String),

    #[error("Store backend error: {0}")]
    Backend(String),

    #[error("Corrupt history entry: {0}")]
    Corrupt(String),
}

impl StoreError {
    /// Stable error code for log fields
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::Unavailable(_) => "STORE_UNAVAILABLE",
            Self::Backend(_) => "STORE_BACKEND",
            Self::Corrupt(_) => "STORE_CORRUPT",
        }
    }

    /// Whether retrying later could succeed
    #[must_use]
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Unavailable(_))
    }
}
