//! ContentStore: the read/write contract used by request handlers.
//!
//! Reads are always served from the section cache. Writes are applied to
//! the cache first and then written through to the configured backend.
//!
//! A failed or slow backend write is logged and counted in
//! [`PersistenceStats`], and the caller still gets the updated section.
//! The update stays visible for the lifetime of the process but is NOT
//! durable: if the process restarts before a later write to the same
//! section succeeds, the change is lost. Availability wins over
//! durability here.
//!
//! Backend writes for one section are serialized, and each write saves the
//! section as cached when it starts. A write that finishes late can then
//! never overwrite a newer value in the backend.

use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use utoipa::ToSchema;

use super::cache::SectionCache;
use super::section::{ContentSnapshot, Section, SectionName, SectionUpdate};
use super::storage::{self, SectionWrite, Storage, StorageError, StorageKind};
use crate::config::StorageConfig;

/// Default bound on a single backend call.
pub const DEFAULT_BACKEND_TIMEOUT: Duration = Duration::from_secs(2);

/// Counters for backend writes.
#[derive(Debug, Default)]
pub struct PersistenceStats {
    successes: AtomicU64,
    failures: AtomicU64,
    last_failure: Mutex<Option<PersistenceFailure>>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct PersistenceFailure {
    pub section: SectionName,
    pub error: String,
    pub at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct PersistenceStatsSnapshot {
    pub successes: u64,
    pub failures: u64,
    /// True once any backend write has failed.
    pub degraded: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_failure: Option<PersistenceFailure>,
}

impl PersistenceStats {
    fn record_success(&self) {
        self.successes.fetch_add(1, Ordering::Relaxed);
    }

    fn record_failure(&self, section: SectionName, error: &StorageError) {
        self.failures.fetch_add(1, Ordering::Relaxed);
        let failure = PersistenceFailure {
            section,
            error: error.to_string(),
            at: Utc::now(),
        };
        match self.last_failure.lock() {
            Ok(mut slot) => *slot = Some(failure),
            Err(poisoned) => *poisoned.into_inner() = Some(failure),
        }
    }

    pub fn snapshot(&self) -> PersistenceStatsSnapshot {
        let failures = self.failures.load(Ordering::Relaxed);
        let last_failure = match self.last_failure.lock() {
            Ok(slot) => slot.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        };
        PersistenceStatsSnapshot {
            successes: self.successes.load(Ordering::Relaxed),
            failures,
            degraded: failures > 0,
            last_failure,
        }
    }
}

pub struct ContentStore {
    cache: Arc<SectionCache>,
    storage: Arc<dyn Storage>,
    /// One lock per section, indexed by `SectionName as usize`.
    save_locks: [tokio::sync::Mutex<()>; SectionName::ALL.len()],
    backend_timeout: Duration,
    stats: PersistenceStats,
    fallback_reason: Option<String>,
}

impl ContentStore {
    pub fn new(cache: Arc<SectionCache>, storage: Arc<dyn Storage>, backend_timeout: Duration) -> Self {
        Self {
            cache,
            storage,
            save_locks: Default::default(),
            backend_timeout,
            stats: PersistenceStats::default(),
            fallback_reason: None,
        }
    }

    /// Store seeded with defaults and no durable backend.
    pub fn in_memory() -> Self {
        let cache = Arc::new(SectionCache::seeded());
        let storage = Arc::new(storage::InMemoryStorage::new(Arc::clone(&cache)));
        Self::new(cache, storage, DEFAULT_BACKEND_TIMEOUT)
    }

    /// Select the backend from config and hydrate the cache. Never fails:
    /// an unusable backend degrades to in-memory.
    pub async fn open(config: &StorageConfig) -> Self {
        let cache = Arc::new(SectionCache::seeded());
        let selection = storage::open(config, &cache).await;
        let mut store = Self::new(cache, selection.storage, config.backend_timeout());
        store.fallback_reason = selection.fallback_reason;
        store
    }

    /// Current value of every section.
    pub fn get_all(&self) -> ContentSnapshot {
        self.cache.snapshot()
    }

    pub fn get(&self, name: SectionName) -> Section {
        self.cache.get(name)
    }

    /// Merge or replace a section and return the result.
    ///
    /// Callers must have authenticated the request; the store does not
    /// check. Always returns the updated section, even when the backend
    /// write fails (see module docs).
    pub async fn upsert(&self, update: SectionUpdate) -> Section {
        let name = update.name();
        let rule = update.rule();
        let section = self.cache.apply(update);
        tracing::info!(section = %name, rule = ?rule, "Section updated");

        if self.storage.is_durable() {
            self.persist(name).await;
        }
        section
    }

    /// Write the cached value of `name` to the backend. Holding the section
    /// lock while reading the cache keeps backend order equal to cache order.
    async fn persist(&self, name: SectionName) {
        let _guard = self.save_locks[name as usize].lock().await;
        let section = self.cache.get(name);
        let snapshot = self.cache.snapshot();
        let write = SectionWrite {
            section: &section,
            snapshot: &snapshot,
            updated_at: Utc::now(),
        };

        let result = match tokio::time::timeout(self.backend_timeout, self.storage.save(write)).await
        {
            Ok(result) => result,
            Err(_) => Err(StorageError::Timeout(self.backend_timeout)),
        };

        match result {
            Ok(()) => self.stats.record_success(),
            Err(e) => {
                tracing::warn!(
                    section = %name,
                    "Backend write failed, change kept in memory only: {}",
                    e
                );
                self.stats.record_failure(name, &e);
            }
        }
    }

    pub fn storage_kind(&self) -> StorageKind {
        self.storage.kind()
    }

    pub fn persistence(&self) -> PersistenceStatsSnapshot {
        self.stats.snapshot()
    }

    /// Why the configured database was not used, if it was abandoned at
    /// startup.
    pub fn fallback_reason(&self) -> Option<&str> {
        self.fallback_reason.as_deref()
    }
}


#[cfg(test)]
mod tests {
    use super::test_support::ScriptedStorage;
    use super::*;
    use serde_json::json;

    fn store_with(storage: Arc<ScriptedStorage>, timeout: Duration) -> ContentStore {
        ContentStore::new(Arc::new(SectionCache::seeded()), storage, timeout)
    }

    fn hero_title(title: &str) -> SectionUpdate {
        SectionUpdate::parse(SectionName::Hero, json!({ "title": title }))
    }

    #[test]
    fn test_get_all_before_any_write_returns_seed() {
        let store = ContentStore::in_memory();
        let content = store.get_all();
        assert_eq!(
            content.get(SectionName::Hero).unwrap().field("title"),
            Some(&json!("Karmic Intelligence"))
        );
        assert_eq!(store.storage_kind(), StorageKind::InMemory);
    }

    #[tokio::test]
    async fn test_in_memory_upsert_skips_backend_stats() {
        let store = ContentStore::in_memory();
        store.upsert(hero_title("Memory")).await;
        let stats = store.persistence();
        assert_eq!(stats.successes, 0);
        assert_eq!(stats.failures, 0);
        assert!(!stats.degraded);
    }

    #[tokio::test]
    async fn test_successful_write_through() {
        let backend = Arc::new(ScriptedStorage::default());
        let store = store_with(Arc::clone(&backend), DEFAULT_BACKEND_TIMEOUT);

        let section = store.upsert(hero_title("Persisted")).await;

        assert_eq!(backend.saved.lock().unwrap().as_slice(), &[section]);
        assert_eq!(store.persistence().successes, 1);
        assert!(!store.persistence().degraded);
    }

    #[tokio::test]
    async fn test_backend_failure_keeps_update_and_flags_it() {
        let backend = Arc::new(ScriptedStorage::default());
        backend.fail.store(true, Ordering::SeqCst);
        let store = store_with(Arc::clone(&backend), DEFAULT_BACKEND_TIMEOUT);

        let section = store.upsert(hero_title("Survives")).await;

        assert_eq!(section.field("title"), Some(&json!("Survives")));
        assert_eq!(
            store.get(SectionName::Hero).field("title"),
            Some(&json!("Survives"))
        );
        let stats = store.persistence();
        assert_eq!(stats.failures, 1);
        assert!(stats.degraded);
        assert_eq!(stats.last_failure.unwrap().section, SectionName::Hero);
    }

    #[tokio::test]
    async fn test_stalled_backend_is_bounded_by_timeout() {
        let backend = Arc::new(ScriptedStorage {
            stall: Some(Duration::from_secs(30)),
            ..ScriptedStorage::default()
        });
        let store = store_with(Arc::clone(&backend), Duration::from_millis(20));

        let started = std::time::Instant::now();
        store.upsert(hero_title("Slow")).await;

        assert!(started.elapsed() < Duration::from_secs(5));
        assert_eq!(backend.saves.load(Ordering::SeqCst), 1);
        let stats = store.persistence();
        assert!(stats.degraded);
        assert!(stats.last_failure.unwrap().error.contains("did not answer"));
    }

    #[tokio::test]
    async fn test_failed_write_is_not_retried() {
        let backend = Arc::new(ScriptedStorage::default());
        backend.fail.store(true, Ordering::SeqCst);
        let store = store_with(Arc::clone(&backend), DEFAULT_BACKEND_TIMEOUT);

        store.upsert(hero_title("Once")).await;
        assert_eq!(backend.saves.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_slow_first_write_does_not_overwrite_newer_value() {
        let backend = Arc::new(ScriptedStorage {
            stall_first: Some(Duration::from_millis(200)),
            ..ScriptedStorage::default()
        });
        let store = Arc::new(store_with(Arc::clone(&backend), DEFAULT_BACKEND_TIMEOUT));

        let first_store = Arc::clone(&store);
        let first = tokio::spawn(async move { first_store.upsert(hero_title("A")).await });
        tokio::time::sleep(Duration::from_millis(20)).await;
        store.upsert(hero_title("B")).await;
        first.await.unwrap();

        let saved = backend.saved.lock().unwrap();
        assert_eq!(saved.len(), 2);
        assert_eq!(saved.last().unwrap().field("title"), Some(&json!("B")));
        assert_eq!(
            store.get(SectionName::Hero).field("title"),
            Some(&json!("B"))
        );
        assert!(!store.persistence().degraded);
    }

    #[tokio::test]
    async fn test_concurrent_upserts_to_different_sections() {
        let store = Arc::new(ContentStore::in_memory());
        let hero_store = Arc::clone(&store);
        let services_store = Arc::clone(&store);

        let (hero, services) = tokio::join!(
            tokio::spawn(async move { hero_store.upsert(hero_title("Parallel")).await }),
            tokio::spawn(async move {
                services_store
                    .upsert(SectionUpdate::Services(vec![json!({"id": 42})]))
                    .await
            }),
        );
        hero.unwrap();
        services.unwrap();

        let content = store.get_all();
        assert_eq!(
            content.get(SectionName::Hero).unwrap().field("title"),
            Some(&json!("Parallel"))
        );
        assert_eq!(
            content.get(SectionName::Services).unwrap().items().unwrap(),
            &[json!({"id": 42})]
        );
    }
}
