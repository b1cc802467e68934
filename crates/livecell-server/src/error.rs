//! Error types for livecell-server.

use thiserror::Error;

/// Result type for server operations.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("watch error: {0}")]
    Watch(#[from] livecell_watch::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid bind address {host}:{port}")]
    InvalidAddress { host: String, port: u16 },
}
