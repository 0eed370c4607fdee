//! Person records

use crate::ids::{GiftId, PersonId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// An actor who can view offers and claim gifts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Person {
    pub id: PersonId,

    /// Used only for eligibility matching.
    pub display_name: String,

    /// Set once the first full round of notifications went out. Never reset.
    #[serde(default)]
    pub onboarded: bool,

    /// Claimed count per gift; only positive counts are stored.
    #[serde(default)]
    pub selections: BTreeMap<GiftId, u32>,
}

impl Person {
    pub fn new(id: PersonId, display_name: impl Into<String>) -> Self {
        Self {
            id,
            display_name: display_name.into(),
            onboarded: false,
            selections: BTreeMap::new(),
        }
    }

    /// Claims this person holds for `gift`.
    pub fn claimed(&self, gift: &GiftId) -> u32 {
        self.selections.get(gift).copied().unwrap_or(0)
    }
}
