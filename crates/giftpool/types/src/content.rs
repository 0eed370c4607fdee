//! Gift presentation content

use crate::ids::GiftId;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Mark prepended to a notification once its gift was claimed.
pub const CLAIMED_MARK: &str = "\u{2705}";

/// Human-facing description of a gift.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GiftContent {
    pub title: Option<String>,
    pub description: Option<String>,
    #[serde(default)]
    pub images: Vec<PathBuf>,
}

impl GiftContent {
    /// Title and description separated by a blank line.
    pub fn summary(&self) -> String {
        [self.title.as_deref(), self.description.as_deref()]
            .into_iter()
            .flatten()
            .map(str::trim)
            .filter(|part| !part.is_empty())
            .collect::<Vec<_>>()
            .join("\n\n")
    }
}

/// What a notification channel renders for one gift.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationContent {
    pub gift: GiftId,
    pub text: String,
    pub image: Option<PathBuf>,

    /// Whether the message carries a claim action.
    pub claimable: bool,
}

impl NotificationContent {
    /// Presentation of an open offer.
    pub fn offer(gift: GiftId, content: &GiftContent) -> Self {
        Self {
            gift,
            text: content.summary(),
            image: content.images.first().cloned(),
            claimable: true,
        }
    }

    /// Presentation after the recipient claimed the gift.
    pub fn claimed(gift: GiftId, content: &GiftContent) -> Self {
        Self {
            gift,
            text: format!("{}{}", CLAIMED_MARK, content.summary()),
            image: content.images.first().cloned(),
            claimable: false,
        }
    }
}
