//! Giftpool notifications
//!
//! The registry of outstanding notification handles plus the two external
//! seams the reconciler drives: the [`NotificationChannel`] carrying
//! messages and the [`ContentProvider`] supplying what they show.

#![deny(unsafe_code)]

mod channel;
mod content;
mod error;
mod memory;
mod registry;

pub use channel::NotificationChannel;
pub use content::{ContentProvider, FsContentProvider, StaticContentProvider};
pub use error::{ChannelError, ContentError, RegistryError, RegistryResult};
pub use memory::{InMemoryChannel, SentMessage};
pub use registry::{NotificationRegistry, RegistryCounts};
