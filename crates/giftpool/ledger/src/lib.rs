//! Giftpool ledger
//!
//! The selection ledger records claims under the global and per-person
//! capacity invariants; the availability resolver derives each person's
//! current offer set from it.

#![deny(unsafe_code)]

mod error;
mod ledger;
mod resolver;

pub use error::{CapacityBound, LedgerError, Result};
pub use ledger::{LedgerView, SelectionLedger};
pub use resolver::{resolve_offers, AvailabilityResolver};
