//! Selection ledger
//!
//! Owns every person record and their claimed counts. All mutations run
//! under one write lock and are persisted through the [`StateStore`] before
//! the lock is released, so a capacity check and its increment form a
//! single atomic step and readers never observe a half-applied claim.

use crate::error::{CapacityBound, LedgerError, Result};
use giftpool_catalog::Catalog;
use giftpool_state::StateStore;
use giftpool_types::{GiftId, LedgerSnapshot, Person, PersonId};
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tokio::sync::RwLock;

struct LedgerState {
    catalog: Arc<Catalog>,
    persons: HashMap<PersonId, Person>,
    global_counts: HashMap<GiftId, u32>,
}

impl LedgerState {
    fn new(catalog: Arc<Catalog>, persons: Vec<Person>) -> Self {
        let mut global_counts: HashMap<GiftId, u32> = HashMap::new();
        for person in &persons {
            for (gift, count) in &person.selections {
                *global_counts.entry(gift.clone()).or_insert(0) += count;
            }
        }

        Self {
            catalog,
            persons: persons
                .into_iter()
                .map(|person| (person.id.clone(), person))
                .collect(),
            global_counts,
        }
    }

    fn snapshot(&self) -> LedgerSnapshot {
        let mut persons: Vec<_> = self.persons.values().cloned().collect();
        persons.sort_by(|a, b| a.id.cmp(&b.id));
        LedgerSnapshot { persons }
    }

    fn global_count(&self, gift: &GiftId) -> u32 {
        self.global_counts.get(gift).copied().unwrap_or(0)
    }

    fn adjust(&mut self, person: &PersonId, gift: &GiftId, increment: bool) -> u32 {
        let held = match self.persons.get_mut(person) {
            Some(record) => record.selections.entry(gift.clone()).or_insert(0),
            None => return 0,
        };
        let total = self.global_counts.entry(gift.clone()).or_insert(0);

        if increment {
            *total += 1;
            *held += 1;
        } else {
            *total = total.saturating_sub(1);
            *held = held.saturating_sub(1);
        }

        let held = *held;
        if held == 0 {
            if let Some(record) = self.persons.get_mut(person) {
                record.selections.remove(gift);
            }
        }
        held
    }
}

/// Consistent read of the ledger as seen by one person.
#[derive(Debug, Clone)]
pub struct LedgerView {
    pub catalog: Arc<Catalog>,
    pub selections: BTreeMap<GiftId, u32>,
    pub global_counts: HashMap<GiftId, u32>,
}

impl LedgerView {
    pub fn global_count(&self, gift: &GiftId) -> u32 {
        self.global_counts.get(gift).copied().unwrap_or(0)
    }

    pub fn claimed(&self, gift: &GiftId) -> u32 {
        self.selections.get(gift).copied().unwrap_or(0)
    }
}

/// Per-person claim record enforcing global and per-person capacity.
pub struct SelectionLedger {
    state: RwLock<LedgerState>,
    store: Arc<dyn StateStore>,
}

impl SelectionLedger {
    /// Empty ledger over `catalog`.
    pub fn new(catalog: Arc<Catalog>, store: Arc<dyn StateStore>) -> Self {
        Self {
            state: RwLock::new(LedgerState::new(catalog, Vec::new())),
            store,
        }
    }

    /// Ledger restored from the store's last committed snapshot.
    pub async fn load(catalog: Arc<Catalog>, store: Arc<dyn StateStore>) -> Result<Self> {
        let snapshot = store.load_ledger().await?;
        let state = LedgerState::new(catalog, snapshot.persons);

        for gift in state.catalog.list_gifts() {
            let total = state.global_count(&gift.id);
            if total > gift.global_capacity {
                tracing::warn!(
                    gift = %gift.id,
                    total,
                    capacity = gift.global_capacity,
                    "Stored selections exceed global capacity"
                );
            }
        }

        tracing::info!(persons = state.persons.len(), "Selection ledger loaded");

        Ok(Self {
            state: RwLock::new(state),
            store,
        })
    }

    /// Register a person on first contact.
    ///
    /// Existing persons keep their selections and onboarding flag; only the
    /// display name is refreshed.
    pub async fn register(&self, id: PersonId, display_name: &str) -> Result<Person> {
        let mut state = self.state.write().await;

        let previous = match state.persons.get_mut(&id) {
            Some(person) if person.display_name == display_name => return Ok(person.clone()),
            Some(person) => Some(std::mem::replace(
                &mut person.display_name,
                display_name.to_string(),
            )),
            None => {
                state
                    .persons
                    .insert(id.clone(), Person::new(id.clone(), display_name));
                None
            }
        };

        if let Err(err) = self.store.save_ledger(&state.snapshot()).await {
            match previous {
                Some(name) => {
                    if let Some(person) = state.persons.get_mut(&id) {
                        person.display_name = name;
                    }
                }
                None => {
                    state.persons.remove(&id);
                }
            }
            return Err(err.into());
        }

        tracing::info!(person = %id, display_name, "Person registered");
        state
            .persons
            .get(&id)
            .cloned()
            .ok_or(LedgerError::UnknownPerson(id))
    }

    /// Set the onboarding flag. Returns `false` if it was already set.
    pub async fn mark_onboarded(&self, id: &PersonId) -> Result<bool> {
        let mut state = self.state.write().await;
        let person = state
            .persons
            .get_mut(id)
            .ok_or_else(|| LedgerError::UnknownPerson(id.clone()))?;
        if person.onboarded {
            return Ok(false);
        }
        person.onboarded = true;

        if let Err(err) = self.store.save_ledger(&state.snapshot()).await {
            if let Some(person) = state.persons.get_mut(id) {
                person.onboarded = false;
            }
            return Err(err.into());
        }

        tracing::debug!(person = %id, "Person onboarded");
        Ok(true)
    }

    /// Record one claim of `gift` by `person`, returning the new count.
    ///
    /// Fails with [`LedgerError::CapacityExceeded`] without side effects when
    /// either bound is already reached.
    pub async fn record(&self, person: &PersonId, gift: &GiftId) -> Result<u32> {
        let mut state = self.state.write().await;

        let entry = state
            .catalog
            .gift(gift)
            .cloned()
            .ok_or_else(|| LedgerError::UnknownGift(gift.clone()))?;
        let held = state
            .persons
            .get(person)
            .map(|record| record.claimed(gift))
            .ok_or_else(|| LedgerError::UnknownPerson(person.clone()))?;

        let bound = if state.global_count(gift) >= entry.global_capacity {
            Some((CapacityBound::Global, entry.global_capacity))
        } else if held >= entry.per_person_capacity {
            Some((CapacityBound::PerPerson, entry.per_person_capacity))
        } else {
            None
        };

        if let Some((bound, limit)) = bound {
            tracing::info!(
                person = %person,
                gift = %gift,
                bound = %bound,
                limit,
                "Claim rejected"
            );
            return Err(LedgerError::CapacityExceeded {
                person: person.clone(),
                gift: gift.clone(),
                bound,
                limit,
            });
        }

        let count = state.adjust(person, gift, true);
        if let Err(err) = self.store.save_ledger(&state.snapshot()).await {
            state.adjust(person, gift, false);
            tracing::error!(person = %person, gift = %gift, error = %err, "Claim not persisted");
            return Err(err.into());
        }

        tracing::info!(person = %person, gift = %gift, count, "Claim recorded");
        Ok(count)
    }

    /// Claimed counts of one person; empty for unknown persons.
    pub async fn selections_for(&self, person: &PersonId) -> BTreeMap<GiftId, u32> {
        let state = self.state.read().await;
        state
            .persons
            .get(person)
            .map(|record| record.selections.clone())
            .unwrap_or_default()
    }

    /// Claims of `gift` across all persons.
    pub async fn global_count(&self, gift: &GiftId) -> u32 {
        self.state.read().await.global_count(gift)
    }

    /// Catalog, selections of `person` and global counts from one read.
    pub async fn view_for(&self, person: &PersonId) -> LedgerView {
        let state = self.state.read().await;
        LedgerView {
            catalog: Arc::clone(&state.catalog),
            selections: state
                .persons
                .get(person)
                .map(|record| record.selections.clone())
                .unwrap_or_default(),
            global_counts: state.global_counts.clone(),
        }
    }

    pub async fn person(&self, id: &PersonId) -> Option<Person> {
        self.state.read().await.persons.get(id).cloned()
    }

    /// All persons, ordered by id.
    pub async fn persons(&self) -> Vec<Person> {
        self.state.read().await.snapshot().persons
    }

    /// Persons whose first round of notifications has gone out.
    pub async fn onboarded(&self) -> Vec<Person> {
        let mut persons = self.persons().await;
        persons.retain(|person| person.onboarded);
        persons
    }

    pub async fn catalog(&self) -> Arc<Catalog> {
        Arc::clone(&self.state.read().await.catalog)
    }

    /// Swap in a new catalog. Existing selections are kept as-is.
    pub async fn replace_catalog(&self, catalog: Arc<Catalog>) {
        let mut state = self.state.write().await;
        tracing::info!(
            gifts = catalog.len(),
            rules = catalog.list_rules().len(),
            "Catalog replaced"
        );
        state.catalog = catalog;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use giftpool_state::InMemoryStateStore;
    use giftpool_types::Gift;
    use proptest::prelude::*;

    fn catalog(gifts: &[(&str, u32, u32)]) -> Arc<Catalog> {
        Arc::new(
            Catalog::with_gifts(
                gifts
                    .iter()
                    .map(|(id, global, per)| Gift::new(GiftId::new(*id), *global, *per))
                    .collect(),
            )
            .unwrap(),
        )
    }

    async fn ledger_with(
        gifts: &[(&str, u32, u32)],
        persons: &[&str],
    ) -> (SelectionLedger, Arc<InMemoryStateStore>) {
        let store = Arc::new(InMemoryStateStore::new());
        let ledger = SelectionLedger::new(catalog(gifts), store.clone());
        for person in persons {
            ledger.register(PersonId::new(*person), person).await.unwrap();
        }
        (ledger, store)
    }

    #[tokio::test]
    async fn test_record_respects_global_capacity() {
        let (ledger, _) = ledger_with(&[("razor", 1, 1)], &["alice", "bob"]).await;
        let razor = GiftId::new("razor");

        assert_eq!(ledger.record(&PersonId::new("alice"), &razor).await.unwrap(), 1);
        let err = ledger.record(&PersonId::new("bob"), &razor).await.unwrap_err();
        assert!(matches!(
            err,
            LedgerError::CapacityExceeded {
                bound: CapacityBound::Global,
                limit: 1,
                ..
            }
        ));
        assert_eq!(ledger.global_count(&razor).await, 1);
        assert!(ledger.selections_for(&PersonId::new("bob")).await.is_empty());
    }

    #[tokio::test]
    async fn test_record_respects_per_person_capacity() {
        let (ledger, _) = ledger_with(&[("napkins", 10, 2)], &["alice"]).await;
        let alice = PersonId::new("alice");
        let napkins = GiftId::new("napkins");

        ledger.record(&alice, &napkins).await.unwrap();
        ledger.record(&alice, &napkins).await.unwrap();
        let err = ledger.record(&alice, &napkins).await.unwrap_err();
        assert!(matches!(
            err,
            LedgerError::CapacityExceeded {
                bound: CapacityBound::PerPerson,
                ..
            }
        ));
        assert_eq!(ledger.selections_for(&alice).await.get(&napkins), Some(&2));
    }

    #[tokio::test]
    async fn test_zero_capacity_gift_is_never_claimable() {
        let (ledger, _) = ledger_with(&[("ghost", 0, 1)], &["alice"]).await;
        let result = ledger.record(&PersonId::new("alice"), &GiftId::new("ghost")).await;
        assert!(result.unwrap_err().is_capacity_exceeded());
    }

    #[tokio::test]
    async fn test_unknown_person_and_gift_are_rejected() {
        let (ledger, _) = ledger_with(&[("razor", 1, 1)], &["alice"]).await;
        assert!(matches!(
            ledger.record(&PersonId::new("mallory"), &GiftId::new("razor")).await,
            Err(LedgerError::UnknownPerson(_))
        ));
        assert!(matches!(
            ledger.record(&PersonId::new("alice"), &GiftId::new("yacht")).await,
            Err(LedgerError::UnknownGift(_))
        ));
    }

    #[tokio::test]
    async fn test_failed_persistence_rolls_back_claim() {
        let (ledger, store) = ledger_with(&[("razor", 1, 1)], &["alice"]).await;
        let alice = PersonId::new("alice");
        let razor = GiftId::new("razor");

        store.fail_saves(true);
        assert!(matches!(
            ledger.record(&alice, &razor).await,
            Err(LedgerError::Persistence(_))
        ));
        assert_eq!(ledger.global_count(&razor).await, 0);
        assert!(ledger.selections_for(&alice).await.is_empty());

        store.fail_saves(false);
        assert_eq!(ledger.record(&alice, &razor).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_register_is_idempotent_and_keeps_selections() {
        let (ledger, _) = ledger_with(&[("razor", 1, 1)], &["alice"]).await;
        let alice = PersonId::new("alice");
        ledger.record(&alice, &GiftId::new("razor")).await.unwrap();
        ledger.mark_onboarded(&alice).await.unwrap();

        let person = ledger.register(alice.clone(), "Alice Liddell").await.unwrap();
        assert_eq!(person.display_name, "Alice Liddell");
        assert!(person.onboarded);
        assert_eq!(person.claimed(&GiftId::new("razor")), 1);
    }

    #[tokio::test]
    async fn test_onboarding_flag_is_set_once() {
        let (ledger, _) = ledger_with(&[], &["alice", "bob"]).await;
        let alice = PersonId::new("alice");

        assert!(ledger.mark_onboarded(&alice).await.unwrap());
        assert!(!ledger.mark_onboarded(&alice).await.unwrap());

        let onboarded: Vec<_> = ledger.onboarded().await.into_iter().map(|p| p.id).collect();
        assert_eq!(onboarded, vec![alice]);
    }

    #[tokio::test]
    async fn test_load_restores_counts_from_store() {
        let (ledger, store) = ledger_with(&[("razor", 3, 2)], &["alice", "bob"]).await;
        let razor = GiftId::new("razor");
        ledger.record(&PersonId::new("alice"), &razor).await.unwrap();
        ledger.record(&PersonId::new("bob"), &razor).await.unwrap();

        let restored = SelectionLedger::load(catalog(&[("razor", 3, 2)]), store)
            .await
            .unwrap();
        assert_eq!(restored.global_count(&razor).await, 2);
        assert_eq!(restored.persons().await.len(), 2);
    }

    #[derive(Debug, Clone)]
    struct ClaimCase {
        global: u32,
        per_person: u32,
        attempts: Vec<usize>,
    }

    fn claim_case() -> impl Strategy<Value = ClaimCase> {
        (0u32..5, 0u32..3, proptest::collection::vec(0usize..4, 0..24)).prop_map(
            |(global, per_person, attempts)| ClaimCase {
                global,
                per_person,
                attempts,
            },
        )
    }

    proptest! {
        #[test]
        fn property_concurrent_claims_never_exceed_capacity(case in claim_case()) {
            let rt = tokio::runtime::Builder::new_multi_thread()
                .worker_threads(4)
                .enable_all()
                .build()
                .expect("runtime");

            rt.block_on(async move {
                let persons = ["p0", "p1", "p2", "p3"];
                let (ledger, _) =
                    ledger_with(&[("gift", case.global, case.per_person)], &persons).await;
                let ledger = Arc::new(ledger);
                let gift = GiftId::new("gift");

                let claims = case.attempts.iter().map(|index| {
                    let ledger = Arc::clone(&ledger);
                    let person = PersonId::new(persons[*index]);
                    let gift = gift.clone();
                    tokio::spawn(async move { ledger.record(&person, &gift).await })
                });
                let results = futures::future::join_all(claims).await;

                let granted = results
                    .into_iter()
                    .map(|joined| joined.expect("task"))
                    .filter(|result| match result {
                        Ok(_) => true,
                        Err(err) => {
                            assert!(err.is_capacity_exceeded(), "unexpected error {err}");
                            false
                        }
                    })
                    .count() as u32;

                let mut wanted = 0;
                for (index, person) in persons.iter().enumerate() {
                    let tries = case.attempts.iter().filter(|i| **i == index).count() as u32;
                    let held = ledger
                        .selections_for(&PersonId::new(*person))
                        .await
                        .get(&gift)
                        .copied()
                        .unwrap_or(0);
                    assert!(held <= case.per_person);
                    wanted += tries.min(case.per_person);
                }

                let total = ledger.global_count(&gift).await;
                assert!(total <= case.global);
                assert_eq!(total, granted);
                assert_eq!(total, wanted.min(case.global));
            });
        }
    }
}
