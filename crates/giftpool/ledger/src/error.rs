//! Error types for giftpool-ledger

use giftpool_state::StateError;
use giftpool_types::{GiftId, PersonId};
use thiserror::Error;

/// Which capacity bound a rejected claim would have crossed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CapacityBound {
    Global,
    PerPerson,
}

impl std::fmt::Display for CapacityBound {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CapacityBound::Global => f.write_str("global"),
            CapacityBound::PerPerson => f.write_str("per-person"),
        }
    }
}

/// Ledger-related errors.
#[derive(Debug, Error)]
pub enum LedgerError {
    /// The claim would exceed a capacity bound; nothing was recorded.
    #[error("{bound} capacity {limit} of {gift} exhausted for {person}")]
    CapacityExceeded {
        person: PersonId,
        gift: GiftId,
        bound: CapacityBound,
        limit: u32,
    },

    #[error("unknown person: {0}")]
    UnknownPerson(PersonId),

    #[error("unknown gift: {0}")]
    UnknownGift(GiftId),

    /// The mutation could not be made durable and was rolled back.
    #[error("persistence failed: {0}")]
    Persistence(#[from] StateError),
}

impl LedgerError {
    pub fn is_capacity_exceeded(&self) -> bool {
        matches!(self, LedgerError::CapacityExceeded { .. })
    }
}

/// Result type for ledger operations
pub type Result<T> = std::result::Result<T, LedgerError>;
