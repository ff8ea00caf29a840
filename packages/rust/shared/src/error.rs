//! Error types for texbuilder.
//!
//! Library crates use [`TexBuilderError`] via `thiserror`.
//! The CLI wraps this with `color-eyre` for rich diagnostics.

use std::path::PathBuf;

/// Top-level error type for all texbuilder operations.
///
/// Only structural failures end up here. Missing optional resources are
/// recorded as warnings by the assembler and never surface as errors.
#[derive(Debug, thiserror::Error)]
pub enum TexBuilderError {
    /// The base file handed to the fragment wrapper does not exist.
    #[error("source file not found: {path:?}")]
    SourceNotFound { path: PathBuf },

    /// A preface or postface fragment does not exist.
    #[error("fragment not found: {path:?}")]
    FragmentNotFound { path: PathBuf },

    /// The project root has no `preamble.tex`.
    #[error("can not find preamble at {path:?}")]
    PreambleNotFound { path: PathBuf },

    /// The sections directory is missing or is not a directory.
    #[error("sections folder does not exist: {path:?}")]
    SectionsFolderMissing { path: PathBuf },

    /// A fragment or base file could not be read.
    #[error("failed to read {path:?}: {source}")]
    ReadFailed {
        path: PathBuf,
        source: std::io::Error,
    },

    /// A wrapped (`-compiled.tex`) file could not be written.
    #[error("failed to write {path:?}: {source}")]
    WriteFailed {
        path: PathBuf,
        source: std::io::Error,
    },

    /// The final `compiled.tex` could not be written.
    #[error("can not create result file {path:?}: {source}")]
    ResultWriteFailed {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Filesystem I/O error (directory listing, config files).
    #[error("I/O error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Configuration loading or validation error.
    #[error("config error: {message}")]
    Config { message: String },
}

/// Convenience alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, TexBuilderError>;

impl TexBuilderError {
    /// Create a config error from any displayable message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
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

    pub fn read_failed(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::ReadFailed {
            path: path.into(),
            source,
        }
    }

    pub fn write_failed(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::WriteFailed {
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
        let err = TexBuilderError::config("unknown prefix style");
        assert_eq!(err.to_string(), "config error: unknown prefix style");

        let err = TexBuilderError::PreambleNotFound {
            path: PathBuf::from("tex/preamble.tex"),
        };
        assert!(err.to_string().contains("preamble.tex"));
    }

    #[test]
    fn io_errors_keep_their_path() {
        let source = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let err = TexBuilderError::write_failed("tex/compiled.tex", source);
        let msg = err.to_string();
        assert!(msg.contains("compiled.tex"));
        assert!(msg.contains("denied"));
    }
}
