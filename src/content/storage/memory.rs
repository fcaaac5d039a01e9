use std::sync::Arc;

use async_trait::async_trait;

use super::{SectionWrite, Storage, StorageError, StorageKind};
use crate::content::cache::SectionCache;
use crate::content::section::ContentSnapshot;

/// Backend used when no database is configured or the database failed
/// at startup.
///
/// It shares the store's section cache. Writes reach the cache before
/// `save` is called, so there is nothing left to persist.
pub struct InMemoryStorage {
    cache: Arc<SectionCache>,
}

impl InMemoryStorage {
    pub fn new(cache: Arc<SectionCache>) -> Self {
        Self { cache }
    }
}

#[async_trait]
impl Storage for InMemoryStorage {
    fn kind(&self) -> StorageKind {
        StorageKind::InMemory
    }

    fn is_durable(&self) -> bool {
        false
    }

    async fn load(&self) -> Result<Option<ContentSnapshot>, StorageError> {
        Ok(Some(self.cache.snapshot()))
    }

    async fn save(&self, write: SectionWrite<'_>) -> Result<(), StorageError> {
        tracing::trace!(section = %write.section.name(), "in-memory save");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::section::{SectionName, SectionUpdate};
    use serde_json::json;

    #[tokio::test]
    async fn test_load_reflects_shared_cache() {
        let cache = Arc::new(SectionCache::seeded());
        let storage = InMemoryStorage::new(Arc::clone(&cache));

        cache.apply(SectionUpdate::parse(SectionName::Hero, json!({"title": "Shared"})));

        let loaded = storage.load().await.unwrap().unwrap();
        assert_eq!(
            loaded.get(SectionName::Hero).unwrap().field("title"),
            Some(&json!("Shared"))
        );
    }
}
