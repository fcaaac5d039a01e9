//! PostgreSQL content storage
//!
//! Two layouts share one connection pool:
//!
//! - `document`: `cms_content`, a single row (`id = 'main'`) with the full
//!   section mapping as JSONB and the last-updated timestamp
//! - `table`: `cms_fields`, one row per `(section, field)`; list sections
//!   keep their whole list under the `items` field

use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;
use sqlx::postgres::{PgPool, PgPoolOptions};
use sqlx::types::Json;

use super::{SectionWrite, Storage, StorageError, StorageKind, StorageLayout};
use crate::config::StorageConfig;
use crate::content::section::{ContentSnapshot, Fields, Section, SectionName, UpdateRule};

/// Row id of the document layout's single snapshot.
pub const DOCUMENT_ID: &str = "main";
/// Field name holding the whole value of a replace section in the table layout.
pub const LIST_FIELD: &str = "items";
/// Field row holding a merge section stored as something other than an object.
pub const RAW_FIELD: &str = "$raw";

const CREATE_DOCUMENT_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS cms_content (
    id          TEXT PRIMARY KEY,
    content     JSONB NOT NULL,
    updated_at  TIMESTAMPTZ NOT NULL DEFAULT NOW()
)"#;

const CREATE_FIELDS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS cms_fields (
    section     TEXT NOT NULL,
    field       TEXT NOT NULL,
    value       JSONB NOT NULL,
    updated_at  TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    PRIMARY KEY (section, field)
)"#;

pub struct PostgresStorage {
    pool: PgPool,
    layout: StorageLayout,
}

impl PostgresStorage {
    /// Create the pool and make sure the layout's table exists.
    pub async fn connect(database_url: &str, config: &StorageConfig) -> Result<Self, StorageError> {
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(config.backend_timeout())
            .connect(database_url)
            .await
            .map_err(StorageError::Connect)?;

        tracing::info!("PostgreSQL connection pool established");
        let storage = Self {
            pool,
            layout: config.layout,
        };
        storage.init_schema().await?;
        Ok(storage)
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    pub fn layout(&self) -> StorageLayout {
        self.layout
    }

    /// Check database health
    pub async fn health_check(&self) -> Result<(), StorageError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    async fn init_schema(&self) -> Result<(), StorageError> {
        let ddl = match self.layout {
            StorageLayout::Document => CREATE_DOCUMENT_TABLE,
            StorageLayout::Table => CREATE_FIELDS_TABLE,
        };
        sqlx::query(ddl).execute(&self.pool).await?;
        Ok(())
    }

    async fn load_document(&self) -> Result<Option<ContentSnapshot>, StorageError> {
        let row: Option<(Json<Value>, DateTime<Utc>)> =
            sqlx::query_as("SELECT content, updated_at FROM cms_content WHERE id = $1")
                .bind(DOCUMENT_ID)
                .fetch_optional(&self.pool)
                .await?;

        match row {
            Some((Json(content), updated_at)) => {
                tracing::debug!(%updated_at, "Loaded content document");
                Ok(Some(ContentSnapshot::from_value(content)?))
            }
            None => Ok(None),
        }
    }

    /// Replaces only this section's key inside the stored document, so
    /// concurrent writes to other sections are not overwritten by an older
    /// snapshot. The full snapshot is used when the row does not exist yet.
    async fn save_document(&self, write: SectionWrite<'_>) -> Result<(), StorageError> {
        sqlx::query(
            r#"
            INSERT INTO cms_content (id, content, updated_at)
            VALUES ($1, $2, $3)
            ON CONFLICT (id) DO UPDATE
            SET content = cms_content.content || jsonb_build_object($4::text, $5::jsonb),
                updated_at = EXCLUDED.updated_at
            "#,
        )
        .bind(DOCUMENT_ID)
        .bind(Json(write.snapshot.to_value()))
        .bind(write.updated_at)
        .bind(write.section.name().as_str())
        .bind(Json(write.section.to_value()))
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn load_table(&self) -> Result<Option<ContentSnapshot>, StorageError> {
        let rows: Vec<(String, String, Json<Value>)> =
            sqlx::query_as("SELECT section, field, value FROM cms_fields ORDER BY section, field")
                .fetch_all(&self.pool)
                .await?;

        if rows.is_empty() {
            return Ok(None);
        }
        let sections = sections_from_rows(rows.into_iter().map(|(s, f, Json(v))| (s, f, v)));
        Ok(Some(ContentSnapshot::from_sections(sections)))
    }

    async fn save_table(&self, write: SectionWrite<'_>) -> Result<(), StorageError> {
        let name = write.section.name();
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM cms_fields WHERE section = $1")
            .bind(name.as_str())
            .execute(&mut *tx)
            .await?;

        for (field, value) in field_rows(write.section) {
            sqlx::query(
                "INSERT INTO cms_fields (section, field, value, updated_at) VALUES ($1, $2, $3, $4)",
            )
            .bind(name.as_str())
            .bind(field)
            .bind(Json(value))
            .bind(write.updated_at)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(())
    }
}

#[async_trait]
impl Storage for PostgresStorage {
    fn kind(&self) -> StorageKind {
        match self.layout {
            StorageLayout::Document => StorageKind::PostgresDocument,
            StorageLayout::Table => StorageKind::PostgresTable,
        }
    }

    async fn load(&self) -> Result<Option<ContentSnapshot>, StorageError> {
        match self.layout {
            StorageLayout::Document => self.load_document().await,
            StorageLayout::Table => self.load_table().await,
        }
    }

    async fn save(&self, write: SectionWrite<'_>) -> Result<(), StorageError> {
        match self.layout {
            StorageLayout::Document => self.save_document(write).await,
            StorageLayout::Table => self.save_table(write).await,
        }
    }
}

/// Split a section into `(field, value)` rows for the table layout.
fn field_rows(section: &Section) -> Vec<(String, Value)> {
    match (section.name().update_rule(), section.to_value()) {
        (UpdateRule::Merge, Value::Object(fields)) => fields.into_iter().collect(),
        (UpdateRule::Merge, raw) => vec![(RAW_FIELD.to_string(), raw)],
        (UpdateRule::Replace, value) => vec![(LIST_FIELD.to_string(), value)],
    }
}

/// Reassemble sections from `(section, field, value)` rows. Rows for
/// unknown sections are skipped.
fn sections_from_rows(
    rows: impl IntoIterator<Item = (String, String, Value)>,
) -> Vec<Section> {
    let mut grouped: BTreeMap<SectionName, Fields> = BTreeMap::new();
    for (section, field, value) in rows {
        match section.parse::<SectionName>() {
            Ok(name) => {
                grouped.entry(name).or_default().insert(field, value);
            }
            Err(_) => tracing::warn!(section = %section, "ignoring row for unknown section"),
        }
    }

    grouped
        .into_iter()
        .map(|(name, mut fields)| {
            let value = match name.update_rule() {
                UpdateRule::Merge if fields.len() == 1 && fields.contains_key(RAW_FIELD) => {
                    fields.remove(RAW_FIELD).unwrap_or(Value::Null)
                }
                UpdateRule::Merge => Value::Object(fields),
                UpdateRule::Replace => fields.remove(LIST_FIELD).unwrap_or(Value::Array(vec![])),
            };
            Section::from_value(name, value)
        })
        .collect()
}
