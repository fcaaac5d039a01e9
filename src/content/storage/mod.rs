//! Content persistence backends
//!
//! - [`InMemoryStorage`]: process-local only, shares the section cache
//! - [`PostgresStorage`]: durable, document or per-field table layout
//!
//! The backend is chosen once at startup by [`open`]. A configured but
//! unreachable database is not retried: the process keeps running on the
//! in-memory backend for its whole lifetime.

pub mod memory;
pub mod postgres;

pub use memory::InMemoryStorage;
pub use postgres::PostgresStorage;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;

use super::cache::SectionCache;
use super::section::{ContentSnapshot, Section, SectionError};
use crate::config::StorageConfig;

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("failed to connect to storage backend: {0}")]
    Connect(#[source] sqlx::Error),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("storage backend did not answer within {0:?}")]
    Timeout(Duration),

    #[error("stored content is corrupt: {0}")]
    Corrupt(#[from] SectionError),
}

/// Which backend is serving the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum StorageKind {
    InMemory,
    PostgresDocument,
    PostgresTable,
}

/// Persisted shape used by the PostgreSQL backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageLayout {
    /// One row holding the whole section mapping plus a timestamp.
    #[default]
    Document,
    /// One row per (section, field) pair.
    Table,
}

/// A section that was just updated in the cache, with the snapshot it
/// belongs to.
#[derive(Debug, Clone, Copy)]
pub struct SectionWrite<'a> {
    pub section: &'a Section,
    pub snapshot: &'a ContentSnapshot,
    pub updated_at: DateTime<Utc>,
}

#[async_trait]
pub trait Storage: Send + Sync {
    fn kind(&self) -> StorageKind;

    /// Whether writes outlive the process.
    fn is_durable(&self) -> bool {
        true
    }

    /// Load persisted content. `None` means the backend holds nothing yet.
    async fn load(&self) -> Result<Option<ContentSnapshot>, StorageError>;

    /// Persist one updated section.
    async fn save(&self, write: SectionWrite<'_>) -> Result<(), StorageError>;
}

/// Outcome of backend selection.
pub struct StorageSelection {
    pub storage: Arc<dyn Storage>,
    /// Why a configured external backend was abandoned, if it was.
    pub fallback_reason: Option<String>,
}

/// Select and initialize the backend.
///
/// On success with a durable backend the cache is hydrated from it, or
/// the backend is seeded from the cache when it is empty.
pub async fn open(config: &StorageConfig, cache: &Arc<SectionCache>) -> StorageSelection {
    let in_memory = || -> Arc<dyn Storage> { Arc::new(InMemoryStorage::new(Arc::clone(cache))) };

    let Some(url) = config.database_url.as_deref().filter(|url| !url.is_empty()) else {
        tracing::info!("No database configured, content is kept in memory only");
        return StorageSelection {
            storage: in_memory(),
            fallback_reason: None,
        };
    };

    match init_external(config, url, cache).await {
        Ok(storage) => {
            tracing::info!(kind = ?storage.kind(), "Durable content storage ready");
            StorageSelection {
                storage,
                fallback_reason: None,
            }
        }
        Err(e) => {
            tracing::error!(
                "Storage backend unavailable, falling back to in-memory for this process: {}",
                e
            );
            StorageSelection {
                storage: in_memory(),
                fallback_reason: Some(e.to_string()),
            }
        }
    }
}

async fn init_external(
    config: &StorageConfig,
    url: &str,
    cache: &Arc<SectionCache>,
) -> Result<Arc<dyn Storage>, StorageError> {
    let limit = config.backend_timeout();
    let bounded = async {
        let storage = PostgresStorage::connect(url, config).await?;
        match storage.load().await? {
            Some(snapshot) => {
                cache.replace_all(&snapshot);
                tracing::info!("Loaded {} sections from storage", snapshot.len());
            }
            None => {
                let snapshot = cache.snapshot();
                for section in snapshot.iter() {
                    storage
                        .save(SectionWrite {
                            section,
                            snapshot: &snapshot,
                            updated_at: Utc::now(),
                        })
                        .await?;
                }
                tracing::info!("Seeded empty storage with default content");
            }
        }
        Ok::<_, StorageError>(storage)
    };

    // Connection establishment gets its own acquire timeout; this bounds
    // the whole connect + schema + load sequence.
    let storage = tokio::time::timeout(limit * 4, bounded)
        .await
        .map_err(|_| StorageError::Timeout(limit * 4))??;
    Ok(Arc::new(storage))
}
