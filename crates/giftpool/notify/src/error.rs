//! Error types for giftpool-notify

use giftpool_state::StateError;
use giftpool_types::{GiftId, NotificationKey};
use thiserror::Error;

/// Registry errors.
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("no notification registered for {0}")]
    NotFound(NotificationKey),

    /// Fulfilled handles are retained and may not be removed.
    #[error("notification {0} is not active")]
    NotActive(NotificationKey),

    /// The mutation could not be made durable and was rolled back.
    #[error("persistence failed: {0}")]
    Persistence(#[from] StateError),
}

/// Errors reported by a notification channel.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ChannelError {
    /// The remote message does not exist (never created or already removed).
    #[error("message not found: {0}")]
    NotFound(String),

    /// Network or remote failure; the operation may be retried.
    #[error("channel transport error: {0}")]
    Transport(String),
}

/// Errors reported by a content provider.
#[derive(Debug, Error)]
pub enum ContentError {
    #[error("no content for gift {0}")]
    Missing(GiftId),

    #[error("failed to read content for {gift}: {source}")]
    Io {
        gift: GiftId,
        #[source]
        source: std::io::Error,
    },
}

/// Result type for registry operations
pub type RegistryResult<T> = Result<T, RegistryError>;
