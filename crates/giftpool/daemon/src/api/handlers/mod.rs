//! API request handlers

mod catalog;
mod claims;
mod events;
mod health;
mod persons;

pub use catalog::*;
pub use claims::*;
pub use events::*;
pub use health::*;
pub use persons::*;
