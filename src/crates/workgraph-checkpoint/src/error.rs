//! Error types for checkpoint store operations.

use thiserror::Error;

/// Result type for checkpoint operations.
pub type Result<T> = std::result::Result<T, CheckpointError>;

/// Errors a [`CheckpointStore`](crate::store::CheckpointStore) implementation can return.
#[derive(Error, Debug)]
pub enum CheckpointError {
    /// No checkpoint exists for the requested (run-id, node-id) or run-id.
    #[error("checkpoint not found: {0}")]
    NotFound(String),

    /// A call was made after `close()`.
    #[error("checkpoint store is closed")]
    ClosedStore,

    /// The backend itself failed (disk full, connection dropped, etc).
    #[error("checkpoint storage error: {0}")]
    Storage(String),

    /// Checkpoint bytes failed to (de)serialize as the on-wire JSON format.
    #[error("checkpoint serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// I/O failure opening or writing the backing store.
    #[error("checkpoint I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Backend-specific error not covered above.
    #[error("{0}")]
    Custom(String),
}
