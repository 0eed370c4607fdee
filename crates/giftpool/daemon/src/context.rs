//! Shared pool components

use crate::error::DaemonResult;
use crate::events::{EventBus, EventSource, PoolEvent};
use dashmap::DashMap;
use giftpool_catalog::Catalog;
use giftpool_ledger::{AvailabilityResolver, SelectionLedger};
use giftpool_notify::{ChannelError, ContentProvider, NotificationChannel, NotificationRegistry};
use giftpool_state::StateStore;
use giftpool_types::{
    GiftContent, GiftId, NotificationContent, NotificationHandle, NotificationKey, PersonId,
};
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};

/// One async lock per person.
///
/// Held for the whole of a claim, an onboarding, or one person's share of a
/// reconciliation pass, so work on the same person never interleaves.
#[derive(Debug, Default)]
pub struct PersonLocks {
    locks: DashMap<PersonId, Arc<Mutex<()>>>,
}

impl PersonLocks {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn lock(&self, person: &PersonId) -> OwnedMutexGuard<()> {
        let lock = Arc::clone(&self.locks.entry(person.clone()).or_default());
        lock.lock_owned().await
    }
}

/// Everything the reconciler, claim handler and API operate on.
pub struct PoolContext {
    pub store: Arc<dyn StateStore>,
    pub ledger: Arc<SelectionLedger>,
    pub resolver: AvailabilityResolver,
    pub registry: Arc<NotificationRegistry>,
    pub channel: Arc<dyn NotificationChannel>,
    pub content: Arc<dyn ContentProvider>,
    pub events: EventBus,
    pub locks: PersonLocks,
}

impl PoolContext {
    pub fn new(
        store: Arc<dyn StateStore>,
        ledger: Arc<SelectionLedger>,
        registry: Arc<NotificationRegistry>,
        channel: Arc<dyn NotificationChannel>,
        content: Arc<dyn ContentProvider>,
    ) -> Self {
        Self {
            store,
            resolver: AvailabilityResolver::new(Arc::clone(&ledger)),
            ledger,
            registry,
            channel,
            content,
            events: EventBus::new(),
            locks: PersonLocks::new(),
        }
    }

    /// Build the pool from whatever the store last committed.
    ///
    /// A store without a catalog document yields an empty catalog.
    pub async fn load(
        store: Arc<dyn StateStore>,
        channel: Arc<dyn NotificationChannel>,
        content: Arc<dyn ContentProvider>,
    ) -> DaemonResult<Self> {
        let catalog = Arc::new(load_catalog(store.as_ref()).await?);
        let ledger = Arc::new(SelectionLedger::load(catalog, Arc::clone(&store)).await?);
        let registry = Arc::new(NotificationRegistry::load(Arc::clone(&store)).await?);

        Ok(Self::new(store, ledger, registry, channel, content))
    }

    /// Re-read the catalog document and swap it into the ledger.
    ///
    /// An invalid document leaves the current catalog in place.
    pub async fn reload_catalog(&self) -> DaemonResult<Arc<Catalog>> {
        let catalog = Arc::new(load_catalog(self.store.as_ref()).await?);
        self.ledger.replace_catalog(Arc::clone(&catalog)).await;

        self.events.emit(
            PoolEvent::CatalogReloaded {
                gifts: catalog.len(),
                rules: catalog.list_rules().len(),
            },
            EventSource::Api,
        );
        Ok(catalog)
    }

    /// Presentation content for `gift`, falling back to its id as title.
    pub async fn content_or_title(&self, gift: &GiftId) -> GiftContent {
        match self.content.content_for(gift).await {
            Ok(content) => content,
            Err(err) => {
                tracing::debug!(gift = %gift, error = %err, "Using bare title");
                GiftContent {
                    title: Some(gift.to_string()),
                    ..GiftContent::default()
                }
            }
        }
    }

    /// Switch the message behind a fulfilled handle to its claimed presentation.
    pub async fn present_claimed(
        &self,
        key: &NotificationKey,
        handle: &NotificationHandle,
        source: EventSource,
    ) -> Result<(), ChannelError> {
        let content = self.content_or_title(&key.gift).await;
        let presentation = NotificationContent::claimed(key.gift.clone(), &content);

        self.channel.update(&handle.channel_ref, &presentation).await?;

        self.events.emit(
            PoolEvent::NotificationFulfilled {
                person: key.person.clone(),
                gift: key.gift.clone(),
            },
            source,
        );
        Ok(())
    }
}

async fn load_catalog(store: &dyn StateStore) -> DaemonResult<Catalog> {
    let document = match store.load_catalog().await? {
        Some(document) => document,
        None => {
            tracing::warn!("No catalog document found, starting with an empty catalog");
            Default::default()
        }
    };
    Ok(Catalog::from_document(document)?)
}
