//! Error types for giftpool-state

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised by a state store backend.
#[derive(Debug, Error)]
pub enum StateError {
    /// Reading or writing a document failed.
    #[error("io error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A document could not be encoded or decoded.
    #[error("serialization error in {document}: {source}")]
    Serialization {
        document: &'static str,
        #[source]
        source: serde_json::Error,
    },

    /// The backend refused the write.
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Result type for state store operations
pub type StateResult<T> = Result<T, StateError>;
