//! Registry error types.

use atelier_storage::StorageError;
use atelier_types::ProjectUid;
use thiserror::Error;

/// Result type for registry operations.
pub type SyncResult<T> = Result<T, SyncError>;

/// Errors that can occur while mutating the project registry.
#[derive(Debug, Error)]
pub enum SyncError {
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("unknown project: {0}")]
    UnknownProject(ProjectUid),

    #[error("no project selected")]
    NoSelection,
}
