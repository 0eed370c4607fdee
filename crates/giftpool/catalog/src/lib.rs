//! Giftpool catalog
//!
//! The catalog is the static description of the pool: which gifts exist,
//! how many times each may be claimed overall and per person, and which
//! display-name patterns restrict a person to a subset of gifts.

#![deny(unsafe_code)]

mod catalog;
mod error;
mod matcher;

pub use catalog::Catalog;
pub use error::{CatalogError, Result};
pub use matcher::{AllowedGifts, EligibilityMatcher};
