//! Error types for driftlog-engine.

use std::path::PathBuf;

use thiserror::Error;

use driftlog_model::ModelError;

/// All errors that can arise from reconciliation operations.
#[derive(Debug, Error)]
pub enum EngineError {
    /// An error from the model layer (descriptor load/save).
    #[error("model error: {0}")]
    Model(#[from] ModelError),

    /// An I/O error, with annotated path for context.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// JSON serialization/deserialization error (change log store).
    #[error("change log JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A live-environment query could not be answered (builder or oracle).
    #[error("live environment query failed: {message}")]
    Environment { message: String },
}

/// Convenience constructor for [`EngineError::Io`].
pub(crate) fn io_err(path: impl Into<PathBuf>, source: std::io::Error) -> EngineError {
    EngineError::Io {
        path: path.into(),
        source,
    }
}
