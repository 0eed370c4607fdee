//! Notification handles and their lifecycle

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// How the external message was rendered. Updates must use the same form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageKind {
    Text,
    Media,
}

/// Opaque reference to a message held by the notification channel.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ChannelRef {
    /// Conversation (chat) the message lives in.
    pub conversation: String,

    /// Message identifier within the conversation.
    pub message: String,

    pub kind: MessageKind,
}

impl ChannelRef {
    pub fn new(conversation: impl Into<String>, message: impl Into<String>, kind: MessageKind) -> Self {
        Self {
            conversation: conversation.into(),
            message: message.into(),
            kind,
        }
    }
}

impl fmt::Display for ChannelRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.conversation, self.message)
    }
}

/// Lifecycle of an outstanding notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LifecycleState {
    /// Offered but not claimed.
    Active,
    /// Claimed and confirmed. Retained, never re-offered or deleted.
    Fulfilled,
}

/// Registry entry for one (person, gift) notification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationHandle {
    pub channel_ref: ChannelRef,
    pub state: LifecycleState,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fulfilled_at: Option<DateTime<Utc>>,
}

impl NotificationHandle {
    /// A freshly sent offer.
    pub fn active(channel_ref: ChannelRef) -> Self {
        Self {
            channel_ref,
            state: LifecycleState::Active,
            created_at: Utc::now(),
            fulfilled_at: None,
        }
    }

    pub fn is_active(&self) -> bool {
        self.state == LifecycleState::Active
    }

    pub fn is_fulfilled(&self) -> bool {
        self.state == LifecycleState::Fulfilled
    }
}
