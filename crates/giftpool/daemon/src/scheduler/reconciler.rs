//! Notification reconciliation
//!
//! Each pass compares, for every onboarded person, the gifts the resolver
//! currently offers with the notifications the registry holds:
//!
//! - Active handles whose gift dropped out of the offer set are deleted.
//! - Offered gifts without any handle get a new message, unless the person
//!   already claimed that gift.
//! - Active handles for gifts the person already claimed are settled to
//!   Fulfilled (repairing a claim whose registry update did not persist).
//!
//! Fulfilled handles are never touched. Channel failures leave the registry
//! as it was so the next pass retries.

use crate::context::PoolContext;
use crate::error::DaemonResult;
use crate::events::{EventSource, PoolEvent};
use giftpool_ledger::resolve_offers;
use giftpool_notify::ChannelError;
use giftpool_types::{
    GiftId, NotificationContent, NotificationHandle, NotificationKey, Person, PersonId,
};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::Arc;

/// Outcome counters of one reconciliation pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PassReport {
    /// Persons visited
    pub persons: usize,
    /// Messages sent
    pub created: usize,
    /// Messages withdrawn
    pub deleted: usize,
    /// Active handles settled to Fulfilled
    pub repaired: usize,
    /// Channel or registry operations that failed and will be retried
    pub failed: usize,
    /// Offers skipped for lack of content
    pub skipped: usize,
}

impl PassReport {
    fn merge(&mut self, other: PassReport) {
        self.persons += other.persons;
        self.created += other.created;
        self.deleted += other.deleted;
        self.repaired += other.repaired;
        self.failed += other.failed;
        self.skipped += other.skipped;
    }

    /// Whether the pass changed anything or hit a failure.
    pub fn is_quiet(&self) -> bool {
        self.created == 0 && self.deleted == 0 && self.repaired == 0 && self.failed == 0
    }
}

/// Level-triggered reconciler between offers and sent notifications.
pub struct NotificationReconciler {
    ctx: Arc<PoolContext>,
}

impl NotificationReconciler {
    pub fn new(ctx: Arc<PoolContext>) -> Self {
        Self { ctx }
    }

    pub fn context(&self) -> &Arc<PoolContext> {
        &self.ctx
    }

    /// Reconcile every onboarded person once.
    pub async fn run_pass(&self) -> PassReport {
        let mut report = PassReport::default();

        for person in self.ctx.ledger.onboarded().await {
            report.merge(self.reconcile_person(&person.id).await);
        }

        if report.is_quiet() {
            tracing::debug!(persons = report.persons, "Reconciliation pass complete");
        } else {
            tracing::info!(
                persons = report.persons,
                created = report.created,
                deleted = report.deleted,
                repaired = report.repaired,
                failed = report.failed,
                skipped = report.skipped,
                "Reconciliation pass complete"
            );
        }

        self.ctx.events.emit(
            PoolEvent::PassCompleted {
                report: report.clone(),
            },
            EventSource::Reconciler,
        );
        report
    }

    /// Reconcile a single person under their lock.
    pub async fn reconcile_person(&self, person: &PersonId) -> PassReport {
        let _guard = self.ctx.locks.lock(person).await;

        // Re-read under the lock; the display name may have changed.
        match self.ctx.ledger.person(person).await {
            Some(record) => self.sync(&record, EventSource::Reconciler).await,
            None => PassReport::default(),
        }
    }

    /// First contact: register `person`, send their current offers, then
    /// mark them onboarded.
    ///
    /// Repeating it for an onboarded person only fills in missing messages.
    pub async fn onboard(&self, person: PersonId, display_name: &str) -> DaemonResult<PassReport> {
        let _guard = self.ctx.locks.lock(&person).await;

        let record = self.ctx.ledger.register(person, display_name).await?;
        let report = self.sync(&record, EventSource::Onboarding).await;

        if self.ctx.ledger.mark_onboarded(&record.id).await? {
            tracing::info!(
                person = %record.id,
                name = %record.display_name,
                offers = report.created,
                "Person onboarded"
            );
            self.ctx.events.emit(
                PoolEvent::PersonOnboarded {
                    person: record.id.clone(),
                },
                EventSource::Onboarding,
            );
        }
        Ok(report)
    }

    /// Caller holds the person's lock.
    async fn sync(&self, person: &Person, source: EventSource) -> PassReport {
        let mut report = PassReport {
            persons: 1,
            ..PassReport::default()
        };

        let view = self.ctx.ledger.view_for(&person.id).await;
        let offers = resolve_offers(&view, &person.display_name);
        let offered: HashSet<&GiftId> = offers.iter().map(|gift| &gift.id).collect();
        let held = self.ctx.registry.entries_for(&person.id).await;

        for (gift, handle) in held.iter().filter(|(_, handle)| handle.is_active()) {
            let key = NotificationKey::new(person.id.clone(), gift.clone());
            if view.claimed(gift) > 0 {
                self.settle(&key, source, &mut report).await;
            } else if !offered.contains(gift) {
                self.retract(&key, handle, source, &mut report).await;
            }
        }

        // A claimed pair may only ever hold a Fulfilled handle.
        let unsent = offers
            .iter()
            .filter(|gift| !held.contains_key(&gift.id) && view.claimed(&gift.id) == 0);
        for gift in unsent {
            self.offer(&person.id, &gift.id, source, &mut report).await;
        }

        report
    }

    async fn offer(
        &self,
        person: &PersonId,
        gift: &GiftId,
        source: EventSource,
        report: &mut PassReport,
    ) {
        let content = match self.ctx.content.content_for(gift).await {
            Ok(content) => content,
            Err(err) => {
                tracing::warn!(person = %person, gift = %gift, error = %err, "Offer skipped");
                report.skipped += 1;
                return;
            }
        };

        let presentation = NotificationContent::offer(gift.clone(), &content);
        let channel_ref = match self.ctx.channel.create(person, &presentation).await {
            Ok(channel_ref) => channel_ref,
            Err(err) => {
                self.failed(person, gift, &err.to_string(), source, report);
                return;
            }
        };

        let key = NotificationKey::new(person.clone(), gift.clone());
        let handle = NotificationHandle::active(channel_ref.clone());
        if let Err(err) = self.ctx.registry.put(key, handle).await {
            // An unregistered message would never be withdrawn; take it back.
            if let Err(cleanup) = self.ctx.channel.delete(&channel_ref).await {
                tracing::warn!(
                    person = %person,
                    gift = %gift,
                    message = %channel_ref,
                    error = %cleanup,
                    "Orphaned message could not be withdrawn"
                );
            }
            self.failed(person, gift, &err.to_string(), source, report);
            return;
        }

        tracing::debug!(person = %person, gift = %gift, message = %channel_ref, "Offer sent");
        report.created += 1;
        self.ctx.events.emit(
            PoolEvent::NotificationCreated {
                person: person.clone(),
                gift: gift.clone(),
            },
            source,
        );
    }

    async fn retract(
        &self,
        key: &NotificationKey,
        handle: &NotificationHandle,
        source: EventSource,
        report: &mut PassReport,
    ) {
        match self.ctx.channel.delete(&handle.channel_ref).await {
            Ok(()) => {}
            Err(ChannelError::NotFound(_)) => {
                tracing::debug!(key = %key, "Message already gone");
            }
            Err(err) => {
                self.failed(&key.person, &key.gift, &err.to_string(), source, report);
                return;
            }
        }

        if let Err(err) = self.ctx.registry.remove(key).await {
            self.failed(&key.person, &key.gift, &err.to_string(), source, report);
            return;
        }

        tracing::debug!(key = %key, "Offer withdrawn");
        report.deleted += 1;
        self.ctx.events.emit(
            PoolEvent::NotificationDeleted {
                person: key.person.clone(),
                gift: key.gift.clone(),
            },
            source,
        );
    }

    async fn settle(&self, key: &NotificationKey, source: EventSource, report: &mut PassReport) {
        let handle = match self.ctx.registry.mark_fulfilled(key).await {
            Ok(handle) => handle,
            Err(err) => {
                self.failed(&key.person, &key.gift, &err.to_string(), source, report);
                return;
            }
        };

        tracing::info!(key = %key, "Claimed offer settled");
        report.repaired += 1;

        if let Err(err) = self.ctx.present_claimed(key, &handle, source).await {
            tracing::warn!(key = %key, error = %err, "Claimed presentation not applied");
        }
    }

    fn failed(
        &self,
        person: &PersonId,
        gift: &GiftId,
        reason: &str,
        source: EventSource,
        report: &mut PassReport,
    ) {
        tracing::warn!(
            person = %person,
            gift = %gift,
            error = %reason,
            "Notification operation failed"
        );
        report.failed += 1;
        self.ctx.events.emit(
            PoolEvent::NotificationFailed {
                person: person.clone(),
                gift: gift.clone(),
                reason: reason.to_string(),
            },
            source,
        );
    }
}
