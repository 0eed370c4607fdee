//! Notification registry
//!
//! Maps (person, gift) pairs to the handle of the message sent for them.
//! Every mutation is persisted before it becomes visible; a failed save
//! restores the previous entry.

use crate::error::{RegistryError, RegistryResult};
use chrono::Utc;
use giftpool_state::StateStore;
use giftpool_types::{
    GiftId, LifecycleState, NotificationHandle, NotificationKey, PersonId, RegistryEntry,
    RegistrySnapshot,
};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Handle counts by lifecycle state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RegistryCounts {
    pub active: usize,
    pub fulfilled: usize,
}

/// Keyed store of outstanding notification handles.
pub struct NotificationRegistry {
    entries: RwLock<HashMap<NotificationKey, NotificationHandle>>,
    store: Arc<dyn StateStore>,
}

impl NotificationRegistry {
    pub fn new(store: Arc<dyn StateStore>) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            store,
        }
    }

    /// Registry restored from the store's last committed snapshot.
    pub async fn load(store: Arc<dyn StateStore>) -> RegistryResult<Self> {
        let snapshot = store.load_registry().await?;
        let entries: HashMap<_, _> = snapshot
            .entries
            .into_iter()
            .map(|entry| (entry.key, entry.handle))
            .collect();

        tracing::info!(entries = entries.len(), "Notification registry loaded");

        Ok(Self {
            entries: RwLock::new(entries),
            store,
        })
    }

    pub async fn get(&self, key: &NotificationKey) -> Option<NotificationHandle> {
        self.entries.read().await.get(key).cloned()
    }

    /// Insert or replace the handle for `key`.
    pub async fn put(&self, key: NotificationKey, handle: NotificationHandle) -> RegistryResult<()> {
        let mut entries = self.entries.write().await;
        let previous = entries.insert(key.clone(), handle);

        if let Err(err) = self.persist(&entries).await {
            match previous {
                Some(handle) => entries.insert(key, handle),
                None => entries.remove(&key),
            };
            return Err(err);
        }
        Ok(())
    }

    /// Flip `key` to Fulfilled. Already-fulfilled handles are returned as-is.
    pub async fn mark_fulfilled(&self, key: &NotificationKey) -> RegistryResult<NotificationHandle> {
        let mut entries = self.entries.write().await;
        let handle = entries
            .get_mut(key)
            .ok_or_else(|| RegistryError::NotFound(key.clone()))?;
        if handle.is_fulfilled() {
            return Ok(handle.clone());
        }

        handle.state = LifecycleState::Fulfilled;
        handle.fulfilled_at = Some(Utc::now());
        let updated = handle.clone();

        if let Err(err) = self.persist(&entries).await {
            if let Some(handle) = entries.get_mut(key) {
                handle.state = LifecycleState::Active;
                handle.fulfilled_at = None;
            }
            return Err(err);
        }

        tracing::debug!(key = %key, "Notification fulfilled");
        Ok(updated)
    }

    /// Drop an Active handle.
    ///
    /// Removing an absent key succeeds and changes nothing. Fulfilled handles
    /// are rejected with [`RegistryError::NotActive`].
    pub async fn remove(&self, key: &NotificationKey) -> RegistryResult<Option<NotificationHandle>> {
        let mut entries = self.entries.write().await;
        match entries.get(key) {
            None => return Ok(None),
            Some(handle) if !handle.is_active() => {
                return Err(RegistryError::NotActive(key.clone()))
            }
            Some(_) => {}
        }

        let removed = entries.remove(key);
        if let Err(err) = self.persist(&entries).await {
            if let Some(handle) = removed {
                entries.insert(key.clone(), handle);
            }
            return Err(err);
        }
        Ok(removed)
    }

    /// Every handle held for `person`, keyed by gift.
    pub async fn entries_for(&self, person: &PersonId) -> HashMap<GiftId, NotificationHandle> {
        self.entries
            .read()
            .await
            .iter()
            .filter(|(key, _)| &key.person == person)
            .map(|(key, handle)| (key.gift.clone(), handle.clone()))
            .collect()
    }

    pub async fn counts(&self) -> RegistryCounts {
        let entries = self.entries.read().await;
        let fulfilled = entries.values().filter(|h| h.is_fulfilled()).count();
        RegistryCounts {
            active: entries.len() - fulfilled,
            fulfilled,
        }
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }

    async fn persist(&self, entries: &HashMap<NotificationKey, NotificationHandle>) -> RegistryResult<()> {
        let mut snapshot: Vec<_> = entries
            .iter()
            .map(|(key, handle)| RegistryEntry {
                key: key.clone(),
                handle: handle.clone(),
            })
            .collect();
        snapshot.sort_by(|a, b| a.key.cmp(&b.key));

        self.store
            .save_registry(&RegistrySnapshot { entries: snapshot })
            .await
            .map_err(RegistryError::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use giftpool_state::InMemoryStateStore;
    use giftpool_types::{ChannelRef, MessageKind};

    fn key(person: &str, gift: &str) -> NotificationKey {
        NotificationKey::new(PersonId::new(person), GiftId::new(gift))
    }

    fn handle(message: &str) -> NotificationHandle {
        NotificationHandle::active(ChannelRef::new("chat", message, MessageKind::Text))
    }

    #[tokio::test]
    async fn test_put_get_and_fulfil() {
        let registry = NotificationRegistry::new(Arc::new(InMemoryStateStore::new()));
        let k = key("alice", "razor");

        registry.put(k.clone(), handle("1")).await.unwrap();
        assert!(registry.get(&k).await.unwrap().is_active());

        let fulfilled = registry.mark_fulfilled(&k).await.unwrap();
        assert!(fulfilled.is_fulfilled());
        assert!(fulfilled.fulfilled_at.is_some());
        assert_eq!(
            registry.counts().await,
            RegistryCounts {
                active: 0,
                fulfilled: 1
            }
        );
    }

    #[tokio::test]
    async fn test_remove_absent_is_idempotent() {
        let store = Arc::new(InMemoryStateStore::new());
        let registry = NotificationRegistry::new(store.clone());
        registry.put(key("bob", "kettle"), handle("2")).await.unwrap();
        let saves = store.save_count();

        assert!(registry.remove(&key("bob", "razor")).await.unwrap().is_none());
        assert_eq!(registry.len().await, 1);
        assert_eq!(store.save_count(), saves);
    }

    #[tokio::test]
    async fn test_fulfilled_handles_cannot_be_removed() {
        let registry = NotificationRegistry::new(Arc::new(InMemoryStateStore::new()));
        let k = key("alice", "razor");
        registry.put(k.clone(), handle("1")).await.unwrap();
        registry.mark_fulfilled(&k).await.unwrap();

        assert!(matches!(
            registry.remove(&k).await,
            Err(RegistryError::NotActive(_))
        ));
        assert!(registry.get(&k).await.is_some());
    }

    #[tokio::test]
    async fn test_failed_persistence_restores_entry() {
        let store = Arc::new(InMemoryStateStore::new());
        let registry = NotificationRegistry::new(store.clone());
        let k = key("alice", "razor");
        registry.put(k.clone(), handle("1")).await.unwrap();

        store.fail_saves(true);
        assert!(registry.remove(&k).await.is_err());
        assert!(registry.mark_fulfilled(&k).await.is_err());
        assert!(registry.put(key("bob", "razor"), handle("2")).await.is_err());

        assert!(registry.get(&k).await.unwrap().is_active());
        assert!(registry.get(&key("bob", "razor")).await.is_none());
    }

    #[tokio::test]
    async fn test_load_restores_entries() {
        let store = Arc::new(InMemoryStateStore::new());
        let registry = NotificationRegistry::new(store.clone());
        registry.put(key("alice", "razor"), handle("1")).await.unwrap();
        registry.put(key("alice", "kettle"), handle("2")).await.unwrap();
        registry.put(key("bob", "razor"), handle("3")).await.unwrap();

        let restored = NotificationRegistry::load(store).await.unwrap();
        let alice = restored.entries_for(&PersonId::new("alice")).await;
        assert_eq!(alice.len(), 2);
        assert_eq!(alice[&GiftId::new("kettle")].channel_ref.message, "2");
    }
}
