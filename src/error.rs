//! Error types for code-chat-viewer.
//!
//! Only conditions that stop a whole run (missing source tree, bad
//! configuration) surface as errors from [`crate::sync::SyncRunner::run`].
//! Per-file failures are collected into the run summary instead, and
//! malformed transcript lines are counted by the parser, never raised.

use std::path::PathBuf;

use thiserror::Error;

/// Primary error type for code-chat-viewer operations.
#[derive(Error, Debug)]
pub enum ViewerError {
    /// A transcript line is not a JSON object (strict parsing only).
    #[error("Failed to parse JSONL at line {line}: {message}")]
    ParseError {
        /// 1-based line number.
        line: usize,
        /// What was wrong with the line.
        message: String,
        /// Decoder error, when there is one.
        #[source]
        source: Option<serde_json::Error>,
    },

    /// The transcript source directory is missing or is not a directory.
    #[error("Source directory not found: {path}")]
    SourceNotFound {
        /// The configured transcript root.
        path: PathBuf,
    },

    /// A transcript or page vanished.
    #[error("File not found: {path}")]
    FileNotFound {
        /// The missing path.
        path: PathBuf,
    },

    /// The OS refused access.
    #[error("Permission denied: {path}")]
    PermissionDenied {
        /// The refused path.
        path: PathBuf,
    },

    /// Transcript exceeds the configured size limit.
    #[error("Transcript too large: {path} ({size} bytes, limit {limit})")]
    TranscriptTooLarge {
        /// Path to the transcript.
        path: PathBuf,
        /// Actual size in bytes.
        size: u64,
        /// Configured limit in bytes.
        limit: u64,
    },

    /// Configuration file could not be read or parsed.
    #[error("Configuration error: {message}")]
    ConfigError {
        /// Human-readable error message.
        message: String,
    },

    /// Configuration values are inconsistent.
    #[error("Invalid configuration: {message}")]
    InvalidConfig {
        /// Human-readable error message.
        message: String,
    },

    /// Any other filesystem failure.
    #[error("I/O error: {context}")]
    IoError {
        /// The operation and path involved.
        context: String,
        /// OS error.
        #[source]
        source: std::io::Error,
    },

    /// Embedded JSON could not be produced.
    #[error("Serialization error: {context}")]
    SerializationError {
        /// What was being serialized.
        context: String,
        /// Encoder error.
        #[source]
        source: serde_json::Error,
    },
}

impl ViewerError {
    /// Parse error without an underlying decoder error.
    #[must_use]
    pub fn parse(line: usize, message: impl Into<String>) -> Self {
        Self::ParseError {
            line,
            message: message.into(),
            source: None,
        }
    }

    /// Parse error wrapping the decoder error.
    #[must_use]
    pub fn parse_with_source(line: usize, message: impl Into<String>, source: serde_json::Error) -> Self {
        Self::ParseError {
            line,
            message: message.into(),
            source: Some(source),
        }
    }

    /// Filesystem error with a description of what was attempted.
    #[must_use]
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::IoError {
            context: context.into(),
            source,
        }
    }

    /// Create a new configuration error.
    #[must_use]
    pub fn config(message: impl Into<String>) -> Self {
        Self::ConfigError {
            message: message.into(),
        }
    }

    /// Map an I/O error on `path` to the most specific variant.
    #[must_use]
    pub fn from_io_at(path: impl Into<PathBuf>, action: &str, err: std::io::Error) -> Self {
        let path = path.into();
        match err.kind() {
            std::io::ErrorKind::NotFound => Self::FileNotFound { path },
            std::io::ErrorKind::PermissionDenied => Self::PermissionDenied { path },
            _ => Self::io(format!("Failed to {action} {}", path.display()), err),
        }
    }

    /// Get the process exit code for this error.
    #[must_use]
    pub const fn exit_code(&self) -> i32 {
        match self {
            Self::ParseError { .. } => 2,
            Self::SourceNotFound { .. } | Self::FileNotFound { .. } => 3,
            Self::PermissionDenied { .. } => 4,
            Self::ConfigError { .. } | Self::InvalidConfig { .. } => 5,
            Self::IoError { .. } => 74,
            _ => 1,
        }
    }
}

/// Result type alias for code-chat-viewer operations.
pub type Result<T> = std::result::Result<T, ViewerError>;

impl From<std::io::Error> for ViewerError {
    fn from(err: std::io::Error) -> Self {
        Self::IoError {
            context: "I/O operation failed".to_string(),
            source: err,
        }
    }
}

impl From<serde_json::Error> for ViewerError {
    fn from(err: serde_json::Error) -> Self {
        Self::SerializationError {
            context: "JSON operation failed".to_string(),
            source: err,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_codes() {
        let parse_err = ViewerError::parse(1, "test");
        assert_eq!(parse_err.exit_code(), 2);

        let missing = ViewerError::SourceNotFound {
            path: PathBuf::from("/nowhere"),
        };
        assert_eq!(missing.exit_code(), 3);

        assert_eq!(ViewerError::config("bad").exit_code(), 5);
    }

    #[test]
    fn test_from_io_at_maps_kind() {
        let err = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        assert!(matches!(
            ViewerError::from_io_at("/a", "open", err),
            ViewerError::FileNotFound { .. }
        ));

        let err = std::io::Error::new(std::io::ErrorKind::Other, "boom");
        let mapped = ViewerError::from_io_at("/a", "open", err);
        assert!(mapped.to_string().contains("Failed to open /a"));
    }
}
