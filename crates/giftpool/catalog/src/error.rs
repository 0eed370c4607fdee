//! Error types for giftpool-catalog

use giftpool_types::GiftId;
use thiserror::Error;

/// Errors detected while loading a catalog.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// A rule pattern is not a valid regular expression.
    #[error("invalid pattern {pattern:?}: {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    /// The same gift id was declared twice.
    #[error("duplicate gift: {0}")]
    DuplicateGift(GiftId),

    /// A rule allows a gift that is not in the catalog.
    #[error("rule {pattern:?} references unknown gift {gift}")]
    UnknownRuleGift { pattern: String, gift: GiftId },
}

/// Result type for catalog operations
pub type Result<T> = std::result::Result<T, CatalogError>;
