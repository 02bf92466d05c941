//! Error types for the gating runtime.
//!
//! Most of this crate is deliberately infallible: allowlist queries, bulk
//! filtering, and record application sit on the page-render hot path and
//! degrade to pass-through on malformed input instead of erroring. [`Error`]
//! covers the edges that genuinely can fail: the persistence adapter and
//! pack serialization.

use thiserror::Error;

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    /// Filesystem I/O failed in the storage adapter.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Failed to parse or serialize JSON (stored pack index, pack export).
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The persistence adapter reported a failure. In-memory pack state
    /// stays authoritative for the session when this happens.
    #[error("storage error: {0}")]
    Storage(String),

    /// No stored pack with the requested id.
    #[error("pack not found: {0}")]
    PackNotFound(String),

    /// Catch-all for adapter-provided errors without a richer shape.
    #[error("{0}")]
    Other(String),
}

impl From<String> for Error {
    fn from(s: String) -> Self {
        Error::Other(s)
    }
}
