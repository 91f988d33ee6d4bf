//! Error types for mesh codecs.

use std::path::PathBuf;
use thiserror::Error;

use crate::core::IoState;

/// Main error type for mesh I/O operations.
#[derive(Error, Debug)]
pub enum Error {
    /// File does not exist or cannot be accessed
    #[error("File not found: {0}")]
    FileNotFound(PathBuf),

    /// Malformed or missing header/section content
    #[error("Invalid mesh file: {0}")]
    Format(String),

    /// Component, pixel or cell type not covered by the dispatch tables
    #[error("Unsupported type: {0}")]
    UnsupportedType(String),

    /// Codec is missing configuration required by the operation
    #[error("Configuration error: {0}")]
    Config(String),

    /// Operation called in the wrong lifecycle state
    #[error("Cannot {operation} while codec is {state}")]
    InvalidState {
        operation: &'static str,
        state: IoState,
    },

    /// Caller buffer does not have the probed length
    #[error("Buffer size mismatch: expected {expected} values, got {actual}")]
    BufferSize { expected: usize, actual: usize },

    /// Caller buffer component type differs from the declared one
    #[error("Type mismatch: expected {expected}, got {actual}")]
    TypeMismatch { expected: String, actual: String },

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Coarse classification of [`Error`] values.
///
/// Orchestrators decide user-visible behavior on the kind, not on the
/// individual variant.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorKind {
    /// Open/seek/read/write failure at the OS boundary.
    Io,
    /// Malformed or missing content.
    Format,
    /// Unknown component/pixel/cell tag.
    UnsupportedType,
    /// Missing destination path or similar setup problem.
    Config,
    /// The caller broke the buffer or ordering contract.
    Usage,
}

impl Error {
    /// Create a format error.
    pub fn format(msg: impl Into<String>) -> Self {
        Self::Format(msg.into())
    }

    /// Create an unsupported type error.
    pub fn unsupported(msg: impl Into<String>) -> Self {
        Self::UnsupportedType(msg.into())
    }

    /// Create a "section ended early" format error.
    pub fn unexpected_end(section: &str) -> Self {
        Self::Format(format!("unexpected end of section while reading {}", section))
    }

    /// Returns the kind of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::FileNotFound(_) | Self::Io(_) => ErrorKind::Io,
            Self::Format(_) => ErrorKind::Format,
            Self::UnsupportedType(_) => ErrorKind::UnsupportedType,
            Self::Config(_) => ErrorKind::Config,
            Self::InvalidState { .. } | Self::BufferSize { .. } | Self::TypeMismatch { .. } => {
                ErrorKind::Usage
            }
        }
    }
}

/// Result type alias for mesh I/O operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let e = Error::BufferSize { expected: 5, actual: 3 };
        assert!(e.to_string().contains("5"));
        assert!(e.to_string().contains("3"));

        let e = Error::unexpected_end("POINTS");
        assert!(e.to_string().contains("POINTS"));
    }

    #[test]
    fn test_error_from_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "test");
        let err: Error = io_err.into();
        assert!(matches!(err, Error::Io(_)));
        assert_eq!(err.kind(), ErrorKind::Io);
    }

    #[test]
    fn test_error_kinds() {
        assert_eq!(Error::format("x").kind(), ErrorKind::Format);
        assert_eq!(Error::unsupported("x").kind(), ErrorKind::UnsupportedType);
        assert_eq!(Error::Config("x".into()).kind(), ErrorKind::Config);
        let e = Error::InvalidState { operation: "read points", state: IoState::Unopened };
        assert_eq!(e.kind(), ErrorKind::Usage);
        assert!(e.to_string().contains("unopened"));
    }
}
