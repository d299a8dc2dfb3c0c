use std::time::Duration;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, StoreError>;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("not found: {0}")]
    NotFound(String),

    #[error("store unavailable: {0}")]
    Unavailable(String),

    #[error("write conflict on {0}")]
    Conflict(String),

    #[error("store operation timed out after {0:?}")]
    Timeout(Duration),

    #[error("invalid signature '{0}'")]
    InvalidSignature(String),

    #[error("invalid glob '{pattern}': {reason}")]
    InvalidGlob { pattern: String, reason: String },

    #[error("corrupt record at {key}: {reason}")]
    CorruptRecord { key: String, reason: String },

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("operation cancelled")]
    Cancelled,
}

impl StoreError {
    /// Transport-level failures worth retrying with backoff.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::Unavailable(_) | Self::Timeout(_) | Self::Conflict(_)
        )
    }
}
