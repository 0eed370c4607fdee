//! Availability resolver
//!
//! Computes the offer set for one person: gifts still under global
//! capacity, under the person's own capacity, and allowed by the first
//! matching eligibility rule. Order follows the catalog.

use crate::ledger::{LedgerView, SelectionLedger};
use giftpool_types::{Gift, PersonId};
use std::sync::Arc;

/// Offer set for `display_name` over a consistent ledger view.
pub fn resolve_offers(view: &LedgerView, display_name: &str) -> Vec<Gift> {
    let allowed = view.catalog.matcher().allowed_gifts(display_name);

    view.catalog
        .list_gifts()
        .iter()
        .filter(|gift| view.global_count(&gift.id) < gift.global_capacity)
        .filter(|gift| view.claimed(&gift.id) < gift.per_person_capacity)
        .filter(|gift| allowed.permits(&gift.id))
        .cloned()
        .collect()
}

/// Composes catalog, ledger and eligibility rules into per-person offers.
#[derive(Clone)]
pub struct AvailabilityResolver {
    ledger: Arc<SelectionLedger>,
}

impl AvailabilityResolver {
    pub fn new(ledger: Arc<SelectionLedger>) -> Self {
        Self { ledger }
    }

    /// Gifts currently offerable to `person`.
    pub async fn offers_for(&self, person: &PersonId, display_name: &str) -> Vec<Gift> {
        let view = self.ledger.view_for(person).await;
        resolve_offers(&view, display_name)
    }

    pub fn ledger(&self) -> &Arc<SelectionLedger> {
        &self.ledger
    }
}
