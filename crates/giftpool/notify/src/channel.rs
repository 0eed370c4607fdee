//! Notification channel seam

use crate::error::ChannelError;
use async_trait::async_trait;
use giftpool_types::{ChannelRef, NotificationContent, PersonId};

/// External transport carrying one message per (person, gift).
#[async_trait]
pub trait NotificationChannel: Send + Sync {
    /// Send a new message to `person`.
    async fn create(
        &self,
        person: &PersonId,
        content: &NotificationContent,
    ) -> Result<ChannelRef, ChannelError>;

    /// Re-render an existing message.
    async fn update(
        &self,
        channel_ref: &ChannelRef,
        content: &NotificationContent,
    ) -> Result<(), ChannelError>;

    /// Remove a message. [`ChannelError::NotFound`] means it is already gone.
    async fn delete(&self, channel_ref: &ChannelRef) -> Result<(), ChannelError>;
}
