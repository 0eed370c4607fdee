//! Error types for giftpool-types

use thiserror::Error;

/// Errors raised while constructing domain records.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TypesError {
    /// An identifier was empty or whitespace only.
    #[error("empty {0} identifier")]
    EmptyIdentifier(&'static str),

    /// A rule was declared with an empty pattern.
    #[error("eligibility rule pattern must not be empty")]
    EmptyPattern,
}
