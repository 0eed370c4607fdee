//! Giftpool state store
//!
//! Durable load/save of the catalog, the selection ledger and the
//! notification registry. The core only relies on the [`StateStore`]
//! contract; the JSON-file backend is what the daemon runs with.

#![deny(unsafe_code)]

mod error;
mod json;
mod memory;
mod traits;

pub use error::{StateError, StateResult};
pub use json::JsonFileStateStore;
pub use memory::InMemoryStateStore;
pub use traits::StateStore;
