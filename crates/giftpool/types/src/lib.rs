//! Giftpool shared types
//!
//! Domain records used across the workspace: identifiers, catalog entries,
//! persons with their selections, notification handles and the snapshot
//! shapes persisted by the state store.

#![deny(unsafe_code)]

pub mod content;
pub mod error;
pub mod gift;
pub mod ids;
pub mod notification;
pub mod person;
pub mod snapshot;

pub use content::{GiftContent, NotificationContent, CLAIMED_MARK};
pub use error::TypesError;
pub use gift::{CatalogDocument, EligibilityRule, Gift};
pub use ids::{GiftId, NotificationKey, PersonId};
pub use notification::{ChannelRef, LifecycleState, MessageKind, NotificationHandle};
pub use person::Person;
pub use snapshot::{LedgerSnapshot, RegistryEntry, RegistrySnapshot};
