//! Error types for livecell-core.

use thiserror::Error;

/// Result type for livecell-core operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while driving the incremental evaluation engine.
#[derive(Debug, Error)]
pub enum Error {
    /// A subscriber's channel was closed while a diff was being delivered.
    #[error("subscriber channel closed")]
    SubscriberGone,

    /// Serialization of an outward state failed.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
