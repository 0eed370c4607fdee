//! State store trait definition

use crate::error::StateResult;
use async_trait::async_trait;
use giftpool_types::{CatalogDocument, LedgerSnapshot, RegistrySnapshot};

/// Durable load/save of the three pool documents.
///
/// Callers persist a candidate state before committing it in memory, so a
/// successful `save_*` is the commit point of a mutation.
#[async_trait]
pub trait StateStore: Send + Sync {
    /// Catalog document, `None` if the store holds none.
    async fn load_catalog(&self) -> StateResult<Option<CatalogDocument>>;

    /// Persons and selections; empty when nothing was saved yet.
    async fn load_ledger(&self) -> StateResult<LedgerSnapshot>;

    async fn save_ledger(&self, snapshot: &LedgerSnapshot) -> StateResult<()>;

    /// Notification handles; empty when nothing was saved yet.
    async fn load_registry(&self) -> StateResult<RegistrySnapshot>;

    async fn save_registry(&self, snapshot: &RegistrySnapshot) -> StateResult<()>;
}
