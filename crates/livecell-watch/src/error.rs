//! Error types for livecell-watch.

use std::path::PathBuf;

use thiserror::Error;

/// Result type for watch/parse operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors surfaced while watching a path or parsing its contents.
///
/// An unreadable or missing file is *not* an error here: the watcher treats
/// it as empty text so downstream cell lists simply go empty rather than
/// the pipeline tearing down.
#[derive(Debug, Error)]
pub enum Error {
    #[error("failed to start watching {path}: {message}")]
    Watch { path: PathBuf, message: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
