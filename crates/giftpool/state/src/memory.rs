//! In-memory state store

use crate::error::{StateError, StateResult};
use crate::traits::StateStore;
use async_trait::async_trait;
use giftpool_types::{CatalogDocument, LedgerSnapshot, RegistrySnapshot};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use tokio::sync::RwLock;

/// In-memory store for development and testing.
///
/// Saves can be switched to fail so callers' rollback paths are testable.
#[derive(Debug, Default)]
pub struct InMemoryStateStore {
    catalog: RwLock<Option<CatalogDocument>>,
    ledger: RwLock<LedgerSnapshot>,
    registry: RwLock<RegistrySnapshot>,
    fail_saves: AtomicBool,
    saves: AtomicU64,
}

impl InMemoryStateStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store pre-seeded with a catalog document.
    pub fn with_catalog(catalog: CatalogDocument) -> Self {
        Self {
            catalog: RwLock::new(Some(catalog)),
            ..Self::default()
        }
    }

    pub async fn set_catalog(&self, catalog: CatalogDocument) {
        *self.catalog.write().await = Some(catalog);
    }

    /// Make every subsequent save fail (or succeed again).
    pub fn fail_saves(&self, fail: bool) {
        self.fail_saves.store(fail, Ordering::SeqCst);
    }

    /// Number of successful saves so far.
    pub fn save_count(&self) -> u64 {
        self.saves.load(Ordering::SeqCst)
    }

    fn check_writable(&self) -> StateResult<()> {
        if self.fail_saves.load(Ordering::SeqCst) {
            return Err(StateError::Unavailable("saves disabled".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl StateStore for InMemoryStateStore {
    async fn load_catalog(&self) -> StateResult<Option<CatalogDocument>> {
        Ok(self.catalog.read().await.clone())
    }

    async fn load_ledger(&self) -> StateResult<LedgerSnapshot> {
        Ok(self.ledger.read().await.clone())
    }

    async fn save_ledger(&self, snapshot: &LedgerSnapshot) -> StateResult<()> {
        self.check_writable()?;
        *self.ledger.write().await = snapshot.clone();
        self.saves.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn load_registry(&self) -> StateResult<RegistrySnapshot> {
        Ok(self.registry.read().await.clone())
    }

    async fn save_registry(&self, snapshot: &RegistrySnapshot) -> StateResult<()> {
        self.check_writable()?;
        *self.registry.write().await = snapshot.clone();
        self.saves.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
