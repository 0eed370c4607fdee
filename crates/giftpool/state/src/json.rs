//! JSON-file state store
//!
//! Keeps one pretty-printed JSON document per concern inside a directory:
//! `gifts.json`, `people.json` and `notifications.json`. Writes go to a
//! `.tmp` sibling first and are renamed into place.

use crate::error::{StateError, StateResult};
use crate::traits::StateStore;
use async_trait::async_trait;
use giftpool_types::{CatalogDocument, LedgerSnapshot, RegistrySnapshot};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::path::{Path, PathBuf};

const CATALOG_FILE: &str = "gifts.json";
const LEDGER_FILE: &str = "people.json";
const REGISTRY_FILE: &str = "notifications.json";

/// State store backed by JSON files in one directory.
#[derive(Debug, Clone)]
pub struct JsonFileStateStore {
    dir: PathBuf,
}

impl JsonFileStateStore {
    /// Open a store rooted at `dir`, creating the directory if needed.
    pub async fn open(dir: impl Into<PathBuf>) -> StateResult<Self> {
        let dir = dir.into();
        tokio::fs::create_dir_all(&dir)
            .await
            .map_err(|source| StateError::Io {
                path: dir.clone(),
                source,
            })?;
        tracing::debug!(dir = %dir.display(), "Opened JSON state store");
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    async fn read<T: DeserializeOwned>(
        &self,
        file: &str,
        document: &'static str,
    ) -> StateResult<Option<T>> {
        let path = self.dir.join(file);
        let contents = match tokio::fs::read_to_string(&path).await {
            Ok(contents) => contents,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(source) => return Err(StateError::Io { path, source }),
        };
        if contents.trim().is_empty() {
            return Ok(None);
        }
        serde_json::from_str(&contents)
            .map(Some)
            .map_err(|source| StateError::Serialization { document, source })
    }

    async fn write<T: Serialize>(
        &self,
        file: &str,
        document: &'static str,
        value: &T,
    ) -> StateResult<()> {
        let json = serde_json::to_string_pretty(value)
            .map_err(|source| StateError::Serialization { document, source })?;

        let path = self.dir.join(file);
        let tmp_path = path.with_extension("json.tmp");
        tokio::fs::write(&tmp_path, json)
            .await
            .map_err(|source| StateError::Io {
                path: tmp_path.clone(),
                source,
            })?;
        tokio::fs::rename(&tmp_path, &path)
            .await
            .map_err(|source| StateError::Io { path, source })
    }
}

#[async_trait]
impl StateStore for JsonFileStateStore {
    async fn load_catalog(&self) -> StateResult<Option<CatalogDocument>> {
        self.read(CATALOG_FILE, "catalog").await
    }

    async fn load_ledger(&self) -> StateResult<LedgerSnapshot> {
        Ok(self.read(LEDGER_FILE, "ledger").await?.unwrap_or_default())
    }

    async fn save_ledger(&self, snapshot: &LedgerSnapshot) -> StateResult<()> {
        self.write(LEDGER_FILE, "ledger", snapshot).await
    }

    async fn load_registry(&self) -> StateResult<RegistrySnapshot> {
        Ok(self.read(REGISTRY_FILE, "registry").await?.unwrap_or_default())
    }

    async fn save_registry(&self, snapshot: &RegistrySnapshot) -> StateResult<()> {
        self.write(REGISTRY_FILE, "registry", snapshot).await
    }
}
