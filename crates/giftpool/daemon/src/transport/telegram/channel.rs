//! Telegram-backed notification channel

use super::api::{InlineKeyboardMarkup, TelegramClient, TelegramError};
use async_trait::async_trait;
use giftpool_notify::{ChannelError, NotificationChannel};
use giftpool_types::{ChannelRef, MessageKind, NotificationContent, PersonId};
use std::sync::Arc;

impl From<TelegramError> for ChannelError {
    fn from(err: TelegramError) -> Self {
        if err.is_message_missing() {
            ChannelError::NotFound(err.to_string())
        } else {
            ChannelError::Transport(err.to_string())
        }
    }
}

/// Sends offers as private bot messages.
///
/// The person id is the Telegram user id, which is also the id of the
/// private chat with the bot.
pub struct TelegramChannel {
    client: Arc<TelegramClient>,
    claim_label: String,
}

impl TelegramChannel {
    pub fn new(client: Arc<TelegramClient>, claim_label: impl Into<String>) -> Self {
        Self {
            client,
            claim_label: claim_label.into(),
        }
    }

    fn markup(&self, content: &NotificationContent) -> Option<InlineKeyboardMarkup> {
        content
            .claimable
            .then(|| InlineKeyboardMarkup::claim(&self.claim_label, content.gift.as_str()))
    }
}

/// Telegram rejects empty texts.
fn text_of(content: &NotificationContent) -> String {
    if content.text.trim().is_empty() {
        content.gift.to_string()
    } else {
        content.text.clone()
    }
}

fn message_id(channel_ref: &ChannelRef) -> Result<i64, ChannelError> {
    channel_ref
        .message
        .parse()
        .map_err(|_| ChannelError::NotFound(channel_ref.to_string()))
}

#[async_trait]
impl NotificationChannel for TelegramChannel {
    async fn create(
        &self,
        person: &PersonId,
        content: &NotificationContent,
    ) -> Result<ChannelRef, ChannelError> {
        let chat_id = person.as_str();
        let text = text_of(content);
        let markup = self.markup(content);

        if let Some(image) = &content.image {
            match self
                .client
                .send_photo(chat_id, image, &text, markup.as_ref())
                .await
            {
                Ok(message) => {
                    return Ok(ChannelRef::new(
                        message.chat.id.to_string(),
                        message.message_id.to_string(),
                        MessageKind::Media,
                    ));
                }
                Err(TelegramError::Io(err)) => {
                    tracing::warn!(
                        gift = %content.gift,
                        image = %image.display(),
                        error = %err,
                        "Image unreadable, sending text only"
                    );
                }
                Err(err) => return Err(err.into()),
            }
        }

        let message = self
            .client
            .send_message(chat_id, &text, markup.as_ref())
            .await?;
        Ok(ChannelRef::new(
            message.chat.id.to_string(),
            message.message_id.to_string(),
            MessageKind::Text,
        ))
    }

    async fn update(
        &self,
        channel_ref: &ChannelRef,
        content: &NotificationContent,
    ) -> Result<(), ChannelError> {
        let message_id = message_id(channel_ref)?;
        let text = text_of(content);
        let markup = self.markup(content);

        let result = match channel_ref.kind {
            MessageKind::Text => {
                self.client
                    .edit_message_text(
                        &channel_ref.conversation,
                        message_id,
                        &text,
                        markup.as_ref(),
                    )
                    .await
            }
            MessageKind::Media => {
                self.client
                    .edit_message_caption(
                        &channel_ref.conversation,
                        message_id,
                        &text,
                        markup.as_ref(),
                    )
                    .await
            }
        };

        match result {
            Ok(()) => Ok(()),
            Err(err) if err.is_not_modified() => Ok(()),
            Err(err) => Err(err.into()),
        }
    }

    async fn delete(&self, channel_ref: &ChannelRef) -> Result<(), ChannelError> {
        let message_id = message_id(channel_ref)?;
        self.client
            .delete_message(&channel_ref.conversation, message_id)
            .await?;
        Ok(())
    }
}
