//! Error types for dolisync-sync.

use std::path::PathBuf;

use thiserror::Error;

use dolisync_core::RemoteError;

/// Errors that stop a pipeline before or outside the per-record loop.
///
/// Per-record failures never show up here; they are counted in the run
/// statistics instead.
#[derive(Debug, Error)]
pub enum SyncError {
    /// An I/O error, with annotated path for context.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The import file is not a JSON array of contact records.
    #[error("failed to parse contacts at {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// A remote call whose failure has no per-record counter to land in.
    #[error("remote error: {0}")]
    Remote(#[from] RemoteError),
}

/// Convenience constructor for [`SyncError::Io`].
pub(crate) fn io_err(path: impl Into<PathBuf>, source: std::io::Error) -> SyncError {
    SyncError::Io {
        path: path.into(),
        source,
    }
}
