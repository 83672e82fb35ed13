//! Error types and handling for HL7 ingestion

use std::path::PathBuf;
use thiserror::Error;

/// Failure to turn raw bytes into a [`crate::Message`].
///
/// A message without a header segment is not a meaningful clinical record,
/// so the whole message is rejected rather than partially populated.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    #[error(
        "Malformed message: no {header} header segment ({byte_len} bytes, {segments} segments, first segment {first})",
        header = crate::segment::HEADER_SEGMENT,
        first = .first_tag.as_deref().unwrap_or("<none>")
    )]
    MalformedMessage {
        byte_len: usize,
        segments: usize,
        first_tag: Option<String>,
    },
}

impl DecodeError {
    /// Length in bytes of the rejected payload
    pub fn byte_len(&self) -> usize {
        match self {
            DecodeError::MalformedMessage { byte_len, .. } => *byte_len,
        }
    }

    /// Tag of the first segment found in the rejected payload, if any
    pub fn first_tag(&self) -> Option<&str> {
        match self {
            DecodeError::MalformedMessage { first_tag, .. } => first_tag.as_deref(),
        }
    }
}

/// Failure to decode one occurrence of a repeating segment.
///
/// Only that occurrence is dropped; the rest of the message still decodes.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OccurrenceError {
    #[error("{segment} has {available} fields but field {required} is required")]
    MissingField {
        segment: String,
        required: usize,
        available: usize,
    },

    #[error("{segment}.{field} has {found} components, expected at least {expected}")]
    MissingComponents {
        segment: String,
        field: usize,
        expected: usize,
        found: usize,
    },
}

/// Main error type for ingestion operations
#[derive(Debug, Error)]
pub enum OruError {
    /// Message could not be decoded at all
    #[error(transparent)]
    Decode(#[from] DecodeError),

    /// Configuration loading or validation errors
    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    /// File system I/O errors
    #[error("IO error for path '{path}': {source}")]
    IoError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Message source (queue) errors
    #[error("Source error: {message}")]
    SourceError { message: String },

    /// Document store errors
    #[error("Store error: {message}")]
    StoreError { message: String },

    /// Document serialization errors
    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    /// Invalid field path expression
    #[error("Invalid field path '{path}': {message}")]
    InvalidPath { path: String, message: String },

    /// Generic internal errors
    #[error("Internal error: {message}")]
    InternalError { message: String },
}

/// Error kind enumeration for categorizing errors
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    Decode,
    Config,
    Io,
    Source,
    Store,
    Serialization,
    Path,
    Internal,
}

impl OruError {
    /// Get the error kind for this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            OruError::Decode(_) => ErrorKind::Decode,
            OruError::ConfigError { .. } => ErrorKind::Config,
            OruError::IoError { .. } => ErrorKind::Io,
            OruError::SourceError { .. } => ErrorKind::Source,
            OruError::StoreError { .. } => ErrorKind::Store,
            OruError::SerializationError(_) => ErrorKind::Serialization,
            OruError::InvalidPath { .. } => ErrorKind::Path,
            OruError::InternalError { .. } => ErrorKind::Internal,
        }
    }

    /// Check if this error is recoverable (the ingestion loop can move on to the next message)
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self.kind(),
            ErrorKind::Decode | ErrorKind::Source | ErrorKind::Store | ErrorKind::Serialization
        )
    }

    /// Create a configuration error
    pub fn config_error(message: impl Into<String>) -> Self {
        Self::ConfigError {
            message: message.into(),
        }
    }

    /// Create an IO error with path context
    pub fn io_error(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::IoError {
            path: path.into(),
            source,
        }
    }

    /// Create a source error
    pub fn source_error(message: impl Into<String>) -> Self {
        Self::SourceError {
            message: message.into(),
        }
    }

    /// Create a store error
    pub fn store_error(message: impl Into<String>) -> Self {
        Self::StoreError {
            message: message.into(),
        }
    }

    /// Create an invalid path error
    pub fn invalid_path(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidPath {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create an internal error
    pub fn internal_error(message: impl Into<String>) -> Self {
        Self::InternalError {
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_malformed_message_display() {
        let err = DecodeError::MalformedMessage {
            byte_len: 12,
            segments: 1,
            first_tag: Some("PID".to_string()),
        };
        let display = err.to_string();
        assert!(display.contains("no MSH header"));
        assert!(display.contains("12 bytes"));
        assert!(display.contains("first segment PID"));
        assert_eq!(err.byte_len(), 12);
        assert_eq!(err.first_tag(), Some("PID"));
    }

    #[test]
    fn test_malformed_message_without_segments() {
        let err = DecodeError::MalformedMessage {
            byte_len: 0,
            segments: 0,
            first_tag: None,
        };
        assert!(err.to_string().contains("<none>"));
        assert_eq!(err.first_tag(), None);
    }

    #[test]
    fn test_error_kinds_and_recoverability() {
        let decode: OruError = DecodeError::MalformedMessage {
            byte_len: 0,
            segments: 0,
            first_tag: None,
        }
        .into();
        assert_eq!(decode.kind(), ErrorKind::Decode);
        assert!(decode.is_recoverable());

        assert!(OruError::store_error("insert failed").is_recoverable());
        assert!(OruError::source_error("poll failed").is_recoverable());
        assert!(!OruError::config_error("bad topic").is_recoverable());
        assert!(!OruError::internal_error("boom").is_recoverable());
    }

    #[test]
    fn test_occurrence_error_display() {
        let err = OccurrenceError::MissingComponents {
            segment: "OBX".to_string(),
            field: 3,
            expected: 3,
            found: 1,
        };
        assert_eq!(
            err.to_string(),
            "OBX.3 has 1 components, expected at least 3"
        );
    }
}
