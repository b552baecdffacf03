//! Error types for catalog-import.
//!
//! Library crates use [`CatalogImportError`] via `thiserror`.
//! The CLI wraps this with `color-eyre` for rich diagnostics.

use std::path::PathBuf;

/// Top-level error type for all catalog-import operations.
#[derive(Debug, thiserror::Error)]
pub enum CatalogImportError {
    /// Configuration loading or validation error.
    #[error("config error: {message}")]
    Config { message: String },

    /// Input record parsing error (malformed JSON, unexpected shape).
    #[error("parse error: {message}")]
    Parse { message: String },

    /// Database or storage layer error.
    #[error("storage error: {0}")]
    Storage(String),

    /// Filesystem I/O error.
    #[error("I/O error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Convenience alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, CatalogImportError>;

impl CatalogImportError {
    /// Create a config error from any displayable message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    /// Create a parse error from any displayable message.
    pub fn parse(msg: impl Into<String>) -> Self {
        Self::Parse {
            message: msg.into(),
        }
    }

    /// Wrap a `std::io::Error` with a path for context.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_formatting() {
        let err = CatalogImportError::config("missing database path");
        assert_eq!(err.to_string(), "config error: missing database path");

        let err = CatalogImportError::Storage("UNIQUE constraint failed".into());
        assert!(err.to_string().starts_with("storage error:"));

        let err = CatalogImportError::parse("line 3: expected object");
        assert!(err.to_string().contains("line 3"));
    }
}
