//! Storage error types.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("snapshot I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("stored value is not valid JSON for its key: {0}")]
    Json(#[from] serde_json::Error),
}
