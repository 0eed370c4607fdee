//! Shared harness for daemon integration tests

#![allow(dead_code)]

use giftpool_daemon::{ClaimHandler, NotificationReconciler, PassReport, PoolContext};
use giftpool_notify::{InMemoryChannel, StaticContentProvider};
use giftpool_state::{InMemoryStateStore, StateStore};
use giftpool_types::{
    CatalogDocument, EligibilityRule, Gift, GiftId, NotificationHandle, NotificationKey, PersonId,
};
use std::collections::BTreeSet;
use std::sync::Arc;

pub struct Harness {
    pub store: Arc<InMemoryStateStore>,
    pub channel: Arc<InMemoryChannel>,
    pub content: Arc<StaticContentProvider>,
    pub ctx: Arc<PoolContext>,
    pub reconciler: Arc<NotificationReconciler>,
    pub claims: ClaimHandler,
}

pub fn gift(id: &str, global: u32, per_person: u32) -> Gift {
    Gift::new(GiftId::new(id), global, per_person)
}

pub fn rule(pattern: &str, gifts: &[&str]) -> EligibilityRule {
    EligibilityRule::new(pattern, gifts.iter().map(|id| GiftId::new(*id))).unwrap()
}

pub fn catalog(gifts: Vec<Gift>, rules: Vec<EligibilityRule>) -> CatalogDocument {
    CatalogDocument { gifts, rules }
}

impl Harness {
    pub async fn new(document: CatalogDocument) -> Self {
        let ids: Vec<GiftId> = document.gifts.iter().map(|gift| gift.id.clone()).collect();
        let store = Arc::new(InMemoryStateStore::with_catalog(document));
        Self::with_store(store, &ids).await
    }

    pub async fn with_store(store: Arc<InMemoryStateStore>, gifts: &[GiftId]) -> Self {
        let channel = Arc::new(InMemoryChannel::new());
        let content = Arc::new(StaticContentProvider::titled(gifts).await);

        let ctx = PoolContext::load(
            Arc::clone(&store) as Arc<dyn StateStore>,
            channel.clone(),
            content.clone(),
        )
        .await
        .unwrap();
        let ctx = Arc::new(ctx);

        Self {
            store,
            channel,
            content,
            reconciler: Arc::new(NotificationReconciler::new(Arc::clone(&ctx))),
            claims: ClaimHandler::new(Arc::clone(&ctx)),
            ctx,
        }
    }

    /// Register and flag a person without sending anything.
    pub async fn enrol(&self, id: &str, name: &str) -> PersonId {
        let person = PersonId::new(id);
        self.ctx.ledger.register(person.clone(), name).await.unwrap();
        self.ctx.ledger.mark_onboarded(&person).await.unwrap();
        person
    }

    pub async fn tick(&self) -> PassReport {
        self.reconciler.run_pass().await
    }

    pub async fn handle(&self, person: &str, gift: &str) -> Option<NotificationHandle> {
        self.ctx
            .registry
            .get(&NotificationKey::new(PersonId::new(person), GiftId::new(gift)))
            .await
    }

    /// Gift ids of the claimable messages currently shown to `person`.
    pub async fn shown(&self, person: &str) -> BTreeSet<String> {
        self.channel
            .messages_for(&PersonId::new(person))
            .await
            .into_iter()
            .filter(|message| message.content.claimable)
            .map(|message| message.content.gift.to_string())
            .collect()
    }
}

pub fn ids(items: &[&str]) -> BTreeSet<String> {
    items.iter().map(|item| item.to_string()).collect()
}
