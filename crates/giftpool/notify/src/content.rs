//! Gift content lookup

use crate::error::ContentError;
use async_trait::async_trait;
use giftpool_types::{GiftContent, GiftId};
use std::collections::HashMap;
use std::path::{Component, Path, PathBuf};
use tokio::sync::RwLock;

/// Source of the title, description and images shown for a gift.
#[async_trait]
pub trait ContentProvider: Send + Sync {
    async fn content_for(&self, gift: &GiftId) -> Result<GiftContent, ContentError>;
}

/// Reads content from a directory per gift.
///
/// `<root>/<gift>/name.md` is the title, `desc.md` the description, and
/// every file whose name contains `pic` is an image, in name order.
#[derive(Debug, Clone)]
pub struct FsContentProvider {
    root: PathBuf,
}

impl FsContentProvider {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn gift_dir(&self, gift: &GiftId) -> Option<PathBuf> {
        let relative = Path::new(gift.as_str());
        let mut components = relative.components();
        match (components.next(), components.next()) {
            (Some(Component::Normal(_)), None) => Some(self.root.join(relative)),
            _ => None,
        }
    }
}

#[async_trait]
impl ContentProvider for FsContentProvider {
    async fn content_for(&self, gift: &GiftId) -> Result<GiftContent, ContentError> {
        let dir = self
            .gift_dir(gift)
            .ok_or_else(|| ContentError::Missing(gift.clone()))?;

        let io_err = |source: std::io::Error| ContentError::Io {
            gift: gift.clone(),
            source,
        };

        let mut entries = match tokio::fs::read_dir(&dir).await {
            Ok(entries) => entries,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                return Err(ContentError::Missing(gift.clone()))
            }
            Err(err) => return Err(io_err(err)),
        };

        let mut content = GiftContent::default();
        while let Some(entry) = entries.next_entry().await.map_err(io_err)? {
            let name = entry.file_name().to_string_lossy().into_owned();
            let path = entry.path();
            match name.as_str() {
                "name.md" => {
                    content.title = Some(tokio::fs::read_to_string(&path).await.map_err(io_err)?)
                }
                "desc.md" => {
                    content.description =
                        Some(tokio::fs::read_to_string(&path).await.map_err(io_err)?)
                }
                _ if name.contains("pic") => content.images.push(path),
                _ => {}
            }
        }
        content.images.sort();

        Ok(content)
    }
}

/// Fixed content table, for tests and for running without a content tree.
#[derive(Debug, Default)]
pub struct StaticContentProvider {
    entries: RwLock<HashMap<GiftId, GiftContent>>,
}

impl StaticContentProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert(&self, gift: GiftId, content: GiftContent) {
        self.entries.write().await.insert(gift, content);
    }

    /// Titled entries for every id, description left empty.
    pub async fn titled<'a>(gifts: impl IntoIterator<Item = &'a GiftId>) -> Self {
        let provider = Self::new();
        for gift in gifts {
            provider
                .insert(
                    gift.clone(),
                    GiftContent {
                        title: Some(gift.to_string()),
                        ..GiftContent::default()
                    },
                )
                .await;
        }
        provider
    }

    pub async fn remove(&self, gift: &GiftId) {
        self.entries.write().await.remove(gift);
    }
}

#[async_trait]
impl ContentProvider for StaticContentProvider {
    async fn content_for(&self, gift: &GiftId) -> Result<GiftContent, ContentError> {
        self.entries
            .read()
            .await
            .get(gift)
            .cloned()
            .ok_or_else(|| ContentError::Missing(gift.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_reads_gift_directory() {
        let root = tempfile::tempdir().unwrap();
        let dir = root.path().join("razor");
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("name.md"), "Electric razor").unwrap();
        std::fs::write(dir.join("desc.md"), "Three floating heads").unwrap();
        std::fs::write(dir.join("pic2.jpg"), b"jpg").unwrap();
        std::fs::write(dir.join("pic1.jpg"), b"jpg").unwrap();
        std::fs::write(dir.join("notes.txt"), "ignored").unwrap();

        let provider = FsContentProvider::new(root.path());
        let content = provider.content_for(&GiftId::new("razor")).await.unwrap();

        assert_eq!(content.summary(), "Electric razor\n\nThree floating heads");
        assert_eq!(content.images, vec![dir.join("pic1.jpg"), dir.join("pic2.jpg")]);
    }

    #[tokio::test]
    async fn test_missing_directory_is_missing_content() {
        let root = tempfile::tempdir().unwrap();
        let provider = FsContentProvider::new(root.path());
        assert!(matches!(
            provider.content_for(&GiftId::new("kettle")).await,
            Err(ContentError::Missing(_))
        ));
    }

    #[tokio::test]
    async fn test_ids_cannot_escape_root() {
        let root = tempfile::tempdir().unwrap();
        let provider = FsContentProvider::new(root.path().join("gifts"));
        for id in ["../gifts", "a/b", "/etc"] {
            assert!(matches!(
                provider.content_for(&GiftId::new(id)).await,
                Err(ContentError::Missing(_))
            ));
        }
    }
}
