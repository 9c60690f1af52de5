//! Shared-project error types.

use atelier_sync::SyncError;
use thiserror::Error;

/// Result type for remote and session operations.
pub type CloudResult<T> = Result<T, CloudError>;

/// Errors that can occur talking to the shared-project registry.
#[derive(Debug, Error)]
pub enum CloudError {
    #[error("API request failed: {0}")]
    Api(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("registry error: {0}")]
    Sync(#[from] SyncError),

    #[error("invalid sharing state: {0}")]
    InvalidState(String),

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("tab session not running")]
    ChannelClosed,
}
