//! Export errors.

use std::path::PathBuf;

/// Errors from writing or reading session exports.
#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("no scored trials yet; make at least one response to export")]
    NothingToExport,

    #[error("missing or unexpected CSV header")]
    MissingHeader,

    #[error("line {line}: {reason}")]
    BadRow { line: usize, reason: String },

    #[error("I/O error at {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl ExportError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        ExportError::Io {
            path: path.into(),
            source,
        }
    }
}
