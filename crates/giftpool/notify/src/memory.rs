//! In-memory notification channel

use crate::channel::NotificationChannel;
use crate::error::ChannelError;
use async_trait::async_trait;
use giftpool_types::{ChannelRef, MessageKind, NotificationContent, PersonId};
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use tokio::sync::RwLock;

/// A message currently held by the in-memory channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentMessage {
    pub person: PersonId,
    pub channel_ref: ChannelRef,
    pub content: NotificationContent,
}

/// Channel keeping messages in process memory.
///
/// Used by the daemon's `memory` transport and by tests, which can switch
/// individual operations to fail with a transport error.
#[derive(Debug, Default)]
pub struct InMemoryChannel {
    messages: RwLock<BTreeMap<u64, SentMessage>>,
    next_id: AtomicU64,
    fail_creates: AtomicBool,
    fail_updates: AtomicBool,
    fail_deletes: AtomicBool,
}

impl InMemoryChannel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_creates(&self, fail: bool) {
        self.fail_creates.store(fail, Ordering::SeqCst);
    }

    pub fn fail_updates(&self, fail: bool) {
        self.fail_updates.store(fail, Ordering::SeqCst);
    }

    pub fn fail_deletes(&self, fail: bool) {
        self.fail_deletes.store(fail, Ordering::SeqCst);
    }

    /// Drop a message behind the registry's back, as a user deleting a chat would.
    pub async fn forget(&self, channel_ref: &ChannelRef) -> bool {
        match parse_id(channel_ref) {
            Ok(id) => self.messages.write().await.remove(&id).is_some(),
            Err(_) => false,
        }
    }

    /// Messages held for `person`, oldest first.
    pub async fn messages_for(&self, person: &PersonId) -> Vec<SentMessage> {
        self.messages
            .read()
            .await
            .values()
            .filter(|message| &message.person == person)
            .cloned()
            .collect()
    }

    pub async fn message(&self, channel_ref: &ChannelRef) -> Option<SentMessage> {
        let id = parse_id(channel_ref).ok()?;
        self.messages.read().await.get(&id).cloned()
    }

    pub async fn len(&self) -> usize {
        self.messages.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.messages.read().await.is_empty()
    }

    fn check(&self, flag: &AtomicBool, operation: &str) -> Result<(), ChannelError> {
        if flag.load(Ordering::SeqCst) {
            return Err(ChannelError::Transport(format!("{operation} unavailable")));
        }
        Ok(())
    }
}

fn parse_id(channel_ref: &ChannelRef) -> Result<u64, ChannelError> {
    channel_ref
        .message
        .parse()
        .map_err(|_| ChannelError::NotFound(channel_ref.to_string()))
}

#[async_trait]
impl NotificationChannel for InMemoryChannel {
    async fn create(
        &self,
        person: &PersonId,
        content: &NotificationContent,
    ) -> Result<ChannelRef, ChannelError> {
        self.check(&self.fail_creates, "create")?;

        let id = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
        let kind = if content.image.is_some() {
            MessageKind::Media
        } else {
            MessageKind::Text
        };
        let channel_ref = ChannelRef::new(person.as_str(), id.to_string(), kind);

        self.messages.write().await.insert(
            id,
            SentMessage {
                person: person.clone(),
                channel_ref: channel_ref.clone(),
                content: content.clone(),
            },
        );
        Ok(channel_ref)
    }

    async fn update(
        &self,
        channel_ref: &ChannelRef,
        content: &NotificationContent,
    ) -> Result<(), ChannelError> {
        self.check(&self.fail_updates, "update")?;

        let id = parse_id(channel_ref)?;
        let mut messages = self.messages.write().await;
        let message = messages
            .get_mut(&id)
            .ok_or_else(|| ChannelError::NotFound(channel_ref.to_string()))?;
        message.content = content.clone();
        Ok(())
    }

    async fn delete(&self, channel_ref: &ChannelRef) -> Result<(), ChannelError> {
        self.check(&self.fail_deletes, "delete")?;

        let id = parse_id(channel_ref)?;
        self.messages
            .write()
            .await
            .remove(&id)
            .map(|_| ())
            .ok_or_else(|| ChannelError::NotFound(channel_ref.to_string()))
    }
}
