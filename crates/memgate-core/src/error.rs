//! Error types for memgate-core.
//!
//! Gate rejections are not errors; they are ordinary [`GateDecision`] values.
//! Everything here is either a configuration problem, a failed provider call,
//! or a broken internal invariant.
//!
//! [`GateDecision`]: crate::types::GateDecision

use thiserror::Error;

use crate::types::DecisionReason;

/// Result type alias using memgate-core Error
pub type Result<T> = std::result::Result<T, Error>;

/// Core error types for memgate operations
#[derive(Error, Debug)]
pub enum Error {
    // Configuration errors (fatal at construction)
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Unsupported {kind} provider: {name}. Supported: {supported}")]
    UnsupportedProvider {
        kind: &'static str,
        name: String,
        supported: String,
    },

    // Provider errors (recoverable per call)
    #[error("Embedding provider error: {0}")]
    Embedding(String),

    #[error("Classifier provider error: {0}")]
    Classification(String),

    #[error("Vector store error: {0}")]
    Store(String),

    #[error("Memory accepted ({reason}) but not persisted")]
    NotPersisted {
        reason: DecisionReason,
        #[source]
        source: Box<Error>,
    },

    // Internal invariant errors (fatal defects)
    #[error("Embedding dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("Recent-embedding cache lock poisoned")]
    LockPoisoned,

    // IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // Serialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl Error {
    /// Create an unsupported provider error
    pub fn unsupported_provider(
        kind: &'static str,
        name: impl Into<String>,
        supported: &[&str],
    ) -> Self {
        Self::UnsupportedProvider {
            kind,
            name: name.into(),
            supported: supported.join(", "),
        }
    }

    /// Wrap a storage failure that happened after the gate accepted a memory
    pub fn not_persisted(reason: DecisionReason, source: Error) -> Self {
        Self::NotPersisted {
            reason,
            source: Box::new(source),
        }
    }

    /// Check if this error came from a provider call (retryable by the caller)
    pub fn is_provider(&self) -> bool {
        matches!(
            self,
            Self::Embedding(_) | Self::Classification(_) | Self::Store(_) | Self::NotPersisted { .. }
        )
    }

    /// Check if this error signals a defect or misconfiguration that must not be retried
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::Config(_)
                | Self::UnsupportedProvider { .. }
                | Self::DimensionMismatch { .. }
                | Self::LockPoisoned
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unsupported_provider_lists_choices() {
        let err = Error::unsupported_provider("store", "qdrant", &["memory", "sqlite"]);
        let msg = err.to_string();
        assert!(msg.contains("qdrant"));
        assert!(msg.contains("memory, sqlite"));
        assert!(err.is_fatal());
        assert!(!err.is_provider());
    }

    #[test]
    fn test_not_persisted_is_provider_error() {
        let err = Error::not_persisted(
            DecisionReason::ClassifiedKeep,
            Error::Store("connection refused".into()),
        );
        assert!(err.is_provider());
        assert!(!err.is_fatal());
        assert_eq!(err.to_string(), "Memory accepted (classified_keep) but not persisted");

        let source = std::error::Error::source(&err).unwrap();
        assert_eq!(source.to_string(), "Vector store error: connection refused");
    }

    #[test]
    fn test_dimension_mismatch_is_fatal() {
        let err = Error::DimensionMismatch {
            expected: 384,
            actual: 3,
        };
        assert!(err.is_fatal());
        assert!(err.to_string().contains("384"));
    }
}
