//! Error types for cache operations.

use std::path::PathBuf;

use crate::source::SourceKind;

/// Boxed error returned by producer functions.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Errors that can occur during cache operations.
///
/// A cache miss is never an error: lookups report absence as `None`.
/// Everything here is either a configuration bug or an environment
/// problem that the caller has to see.
#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    /// An I/O error occurred while reading, writing or inspecting a file.
    #[error("cache I/O error at {path}: {source}")]
    Io {
        /// The path that caused the error.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// No registered header type matches the source object.
    #[error("cannot find header type for {kind} source")]
    NoMatchingHeader {
        /// Kind of the source object that failed to resolve.
        kind: SourceKind,
    },

    /// A naming or validity strategy was paired with a source it cannot handle.
    #[error("{strategy} expects a {expected} source, got {found}")]
    SourceMismatch {
        /// Name of the strategy that rejected the source.
        strategy: &'static str,
        /// Description of the accepted source kinds.
        expected: &'static str,
        /// Kind of the source actually supplied.
        found: SourceKind,
    },

    /// A serialization or deserialization error occurred.
    #[error("serialization error: {reason}")]
    Serialization {
        /// Description of the serialization failure.
        reason: String,
    },

    /// The producer function failed to compute an artifact.
    #[error("producer '{reader_id}' failed: {source}")]
    Producer {
        /// Reader identifier of the failing producer.
        reader_id: String,
        /// The producer's own error.
        source: BoxError,
    },

    /// The cache configuration could not be loaded.
    #[error(transparent)]
    Config(#[from] stowage_config::ConfigError),
}

impl CacheError {
    /// Builds an [`CacheError::Io`] for `path`.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Builds a [`CacheError::Serialization`] from any displayable error.
    pub fn serialization(err: impl std::fmt::Display) -> Self {
        Self::Serialization {
            reason: err.to_string(),
        }
    }
}
