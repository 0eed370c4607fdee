//! Telegram update loop
//!
//! Long-polls `getUpdates`. `/start` and `/help` run onboarding; presses on
//! a claim button run claim handling and are answered with a short notice.

use super::api::{parse_claim_data, CallbackQuery, Message, TelegramClient, Update};
use crate::claims::{ClaimHandler, ClaimOutcome};
use crate::config::TelegramConfig;
use crate::scheduler::NotificationReconciler;
use giftpool_types::{GiftId, PersonId};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;

/// Pause after a failed getUpdates call.
const RETRY_DELAY: Duration = Duration::from_secs(5);

pub struct TelegramPoller {
    client: Arc<TelegramClient>,
    config: TelegramConfig,
    reconciler: Arc<NotificationReconciler>,
    claims: Arc<ClaimHandler>,
}

impl TelegramPoller {
    pub fn new(
        client: Arc<TelegramClient>,
        config: TelegramConfig,
        reconciler: Arc<NotificationReconciler>,
        claims: Arc<ClaimHandler>,
    ) -> Self {
        Self {
            client,
            config,
            reconciler,
            claims,
        }
    }

    /// Poll until `shutdown` flips to true.
    pub async fn run(self, mut shutdown: watch::Receiver<bool>) {
        let mut offset = None;
        tracing::info!("Telegram poller started");

        loop {
            let polled = tokio::select! {
                _ = shutdown.changed() => break,
                polled = self.client.get_updates(offset, self.config.poll_timeout_secs) => polled,
            };

            match polled {
                Ok(updates) => {
                    for update in updates {
                        offset = Some(update.update_id + 1);
                        self.handle(update).await;
                    }
                }
                Err(err) => {
                    tracing::warn!(error = %err, "getUpdates failed");
                    tokio::select! {
                        _ = shutdown.changed() => break,
                        _ = tokio::time::sleep(RETRY_DELAY) => {}
                    }
                }
            }
        }

        tracing::info!("Telegram poller stopped");
    }

    async fn handle(&self, update: Update) {
        if let Some(query) = update.callback_query {
            self.on_callback(query).await;
        } else if let Some(message) = update.message {
            self.on_message(message).await;
        }
    }

    async fn on_message(&self, message: Message) {
        let (Some(text), Some(user)) = (message.text.as_deref(), message.from.as_ref()) else {
            return;
        };
        if !is_onboarding_command(text) {
            tracing::debug!(user = user.id, "Ignoring message");
            return;
        }

        if let Some(greeting) = &self.config.greeting {
            let chat_id = message.chat.id.to_string();
            if let Err(err) = self.client.send_message(&chat_id, greeting, None).await {
                tracing::warn!(user = user.id, error = %err, "Greeting not sent");
            }
        }

        let person = PersonId::new(user.id.to_string());
        if let Err(err) = self.reconciler.onboard(person, &user.display_name()).await {
            tracing::error!(user = user.id, error = %err, "Onboarding failed");
        }
    }

    async fn on_callback(&self, query: CallbackQuery) {
        let notice = match query.data.as_deref().and_then(parse_claim_data) {
            Some(gift) => self.claim(query.from.id, gift).await,
            None => {
                tracing::debug!(user = query.from.id, "Ignoring callback payload");
                None
            }
        };

        if let Err(err) = self.client.answer_callback_query(&query.id, notice).await {
            tracing::warn!(user = query.from.id, error = %err, "Callback not answered");
        }
    }

    async fn claim(&self, user: i64, gift: &str) -> Option<&str> {
        let person = PersonId::new(user.to_string());
        match self.claims.claim(&person, &GiftId::new(gift)).await {
            Ok(ClaimOutcome::Claimed { .. }) => Some(&self.config.claimed_notice),
            Ok(ClaimOutcome::Unavailable) => Some(&self.config.unavailable_notice),
            Err(err) => {
                tracing::error!(person = %person, gift, error = %err, "Claim failed");
                None
            }
        }
    }
}

/// `/start` or `/help`, optionally addressed as `/start@bot` and with arguments.
fn is_onboarding_command(text: &str) -> bool {
    let command = text.split_whitespace().next().unwrap_or_default();
    let command = command.split('@').next().unwrap_or_default();
    matches!(command, "/start" | "/help")
}
