//! Error types for the RAG store.

use std::fmt;

use thiserror::Error;

/// Result type alias using RagError.
pub type Result<T> = std::result::Result<T, RagError>;

/// A critical setting whose stored value differs from the active one.
#[derive(Debug, Clone, PartialEq)]
pub struct SettingMismatch {
    /// Dotted key, e.g. `chunking.chunk_size`.
    pub key: String,

    /// Value recorded in the settings snapshot.
    pub stored: serde_json::Value,

    /// Value of the active configuration.
    pub current: serde_json::Value,
}

impl fmt::Display for SettingMismatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: current={}, stored={}",
            self.key, self.current, self.stored
        )
    }
}

fn join_mismatches(mismatches: &[SettingMismatch]) -> String {
    mismatches
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Errors that can occur in the RAG store.
#[derive(Error, Debug)]
pub enum RagError {
    /// The storage handle is closed or was never opened.
    #[error("Store connection is not available")]
    NotAvailable,

    /// The active configuration disagrees with the stored settings snapshot.
    #[error(
        "Config mismatch detected: {}. Rebuild the database with the current configuration",
        join_mismatches(.mismatches)
    )]
    ConfigMismatch { mismatches: Vec<SettingMismatch> },

    /// A schema upgrade step failed.
    #[error("Upgrade to {version} failed in step '{step}': {message}")]
    Upgrade {
        version: String,
        step: String,
        message: String,
    },

    /// A version string could not be encoded.
    #[error("Invalid version '{version}': {reason}")]
    InvalidVersion { version: String, reason: String },

    /// Embedding length does not match the configured dimension.
    #[error("Embedding dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    /// Document not found.
    #[error("Document not found: {id}")]
    DocumentNotFound { id: i64 },

    /// Invalid argument provided.
    #[error("Invalid argument: {message}")]
    InvalidArgument { message: String },

    /// Database error.
    #[error("Database error: {message}")]
    Database { message: String },

    /// Chunking error.
    #[error("Chunking error: {message}")]
    Chunking { message: String },

    /// Embedding provider error.
    #[error("Embedding error: {message}")]
    Embedding { message: String },

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Configuration error.
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// Internal error (unexpected).
    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl RagError {
    /// Create an invalid argument error.
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument {
            message: message.into(),
        }
    }

    /// Create a database error.
    pub fn database(message: impl Into<String>) -> Self {
        Self::Database {
            message: message.into(),
        }
    }

    /// Create a chunking error.
    pub fn chunking(message: impl Into<String>) -> Self {
        Self::Chunking {
            message: message.into(),
        }
    }

    /// Create an embedding error.
    pub fn embedding(message: impl Into<String>) -> Self {
        Self::Embedding {
            message: message.into(),
        }
    }

    /// Create a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Get a stable machine-readable error code.
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::NotAvailable => "NOT_AVAILABLE",
            Self::ConfigMismatch { .. } => "CONFIG_MISMATCH",
            Self::Upgrade { .. } => "UPGRADE_FAILED",
            Self::InvalidVersion { .. } => "INVALID_VERSION",
            Self::DimensionMismatch { .. } => "DIMENSION_MISMATCH",
            Self::DocumentNotFound { .. } => "DOCUMENT_NOT_FOUND",
            Self::InvalidArgument { .. } => "INVALID_ARGUMENT",
            Self::Database { .. } => "DATABASE_ERROR",
            Self::Chunking { .. } => "CHUNKING_ERROR",
            Self::Embedding { .. } => "EMBEDDING_ERROR",
            Self::Io(_) => "IO_ERROR",
            Self::Serialization(_) => "SERIALIZATION_ERROR",
            Self::Config { .. } => "CONFIG_ERROR",
            Self::Internal { .. } => "INTERNAL_ERROR",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_error_display() {
        let err = RagError::DocumentNotFound { id: 42 };
        assert!(err.to_string().contains("42"));
    }

    #[test]
    fn test_config_mismatch_lists_every_key() {
        let err = RagError::ConfigMismatch {
            mismatches: vec![
                SettingMismatch {
                    key: "chunking.chunk_size".to_string(),
                    stored: json!(200),
                    current: json!(999),
                },
                SettingMismatch {
                    key: "embedding.model".to_string(),
                    stored: json!("a"),
                    current: json!("b"),
                },
            ],
        };

        let msg = err.to_string();
        assert!(msg.contains("chunking.chunk_size: current=999, stored=200"));
        assert!(msg.contains("embedding.model: current=\"b\", stored=\"a\""));
        assert!(msg.contains("Rebuild"));
    }

    #[test]
    fn test_error_codes() {
        assert_eq!(RagError::NotAvailable.error_code(), "NOT_AVAILABLE");
        assert_eq!(
            RagError::ConfigMismatch { mismatches: vec![] }.error_code(),
            "CONFIG_MISMATCH"
        );
        assert_eq!(RagError::database("test").error_code(), "DATABASE_ERROR");
    }
}
