//! SQLite-backed metadata store.
//!
//! The engine's local state is a single table keyed on
//! (instance_id, schema_name). Instance ids are stored as hyphenated UUID
//! text so rows stay readable with plain sqlite3 tooling.

use super::MetadataStore;
use crate::Result;
use crate::error::SyncError;
use crate::models::SchemaRecord;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::Row;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions, SqliteRow};
use std::path::Path;
use uuid::Uuid;

const CREATE_TABLE: &str = "
    CREATE TABLE IF NOT EXISTS schema_records (
        instance_id TEXT    NOT NULL,
        schema_name TEXT    NOT NULL,
        deleted     INTEGER NOT NULL DEFAULT 0,
        created_at  TEXT    NOT NULL,
        updated_at  TEXT    NOT NULL,
        PRIMARY KEY (instance_id, schema_name)
    )
";

/// Metadata store over a local SQLite database.
///
/// SQLite serializes writers internally; concurrent instance tasks write
/// disjoint key ranges, so a small pool is enough.
#[derive(Debug, Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    /// Opens (and creates, if needed) the store at the given path.
    ///
    /// # Errors
    /// Returns a persistence error if the file cannot be opened or the
    /// table cannot be ensured.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(4)
            .connect_with(options)
            .await
            .map_err(|e| SyncError::persistence("failed to open metadata store", e))?;

        let store = Self { pool };
        store.ensure_schema().await?;
        Ok(store)
    }

    /// Opens a private in-memory store, mainly for tests.
    ///
    /// # Errors
    /// Returns a persistence error if the connection cannot be created.
    pub async fn open_in_memory() -> Result<Self> {
        // One connection only: every new connection to :memory: would get
        // its own empty database.
        let options = SqliteConnectOptions::new().in_memory(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await
            .map_err(|e| SyncError::persistence("failed to open in-memory metadata store", e))?;

        let store = Self { pool };
        store.ensure_schema().await?;
        Ok(store)
    }

    /// Closes the connection pool gracefully.
    pub async fn close(&self) {
        self.pool.close().await;
    }

    async fn ensure_schema(&self) -> Result<()> {
        sqlx::query(CREATE_TABLE)
            .execute(&self.pool)
            .await
            .map_err(|e| SyncError::persistence("failed to create schema_records table", e))?;
        Ok(())
    }
}

fn record_from_row(row: &SqliteRow) -> Result<SchemaRecord> {
    let instance_id: String = row
        .try_get("instance_id")
        .map_err(|e| SyncError::persistence("failed to read instance_id column", e))?;
    let instance_id = Uuid::parse_str(&instance_id)
        .map_err(|e| SyncError::persistence("malformed instance_id in schema_records", e))?;

    let schema_name: String = row
        .try_get("schema_name")
        .map_err(|e| SyncError::persistence("failed to read schema_name column", e))?;
    let deleted: bool = row
        .try_get("deleted")
        .map_err(|e| SyncError::persistence("failed to read deleted column", e))?;
    let created_at: DateTime<Utc> = row
        .try_get("created_at")
        .map_err(|e| SyncError::persistence("failed to read created_at column", e))?;
    let updated_at: DateTime<Utc> = row
        .try_get("updated_at")
        .map_err(|e| SyncError::persistence("failed to read updated_at column", e))?;

    Ok(SchemaRecord {
        instance_id,
        schema_name,
        deleted,
        created_at,
        updated_at,
    })
}

#[async_trait]
impl MetadataStore for SqliteStore {
    async fn find_schema(&self, instance_id: Uuid, name: &str) -> Result<Option<SchemaRecord>> {
        let row = sqlx::query(
            "SELECT instance_id, schema_name, deleted, created_at, updated_at
             FROM schema_records
             WHERE instance_id = ? AND schema_name = ?",
        )
        .bind(instance_id.to_string())
        .bind(name)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| SyncError::persistence("failed to look up schema record", e))?;

        row.as_ref().map(record_from_row).transpose()
    }

    async fn create_schema(&self, instance_id: Uuid, name: &str) -> Result<()> {
        let now = Utc::now();
        sqlx::query(
            "INSERT INTO schema_records (instance_id, schema_name, deleted, created_at, updated_at)
             VALUES (?, ?, 0, ?, ?)",
        )
        .bind(instance_id.to_string())
        .bind(name)
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(|e| SyncError::persistence("failed to insert schema record", e))?;

        Ok(())
    }

    async fn set_deleted_flag(&self, instance_id: Uuid, name: &str, deleted: bool) -> Result<()> {
        sqlx::query(
            "UPDATE schema_records
             SET deleted = ?, updated_at = ?
             WHERE instance_id = ? AND schema_name = ?",
        )
        .bind(deleted)
        .bind(Utc::now())
        .bind(instance_id.to_string())
        .bind(name)
        .execute(&self.pool)
        .await
        .map_err(|e| SyncError::persistence("failed to update schema record flag", e))?;

        Ok(())
    }

    async fn list_known_schemas(&self, instance_id: Uuid) -> Result<Vec<SchemaRecord>> {
        let rows = sqlx::query(
            "SELECT instance_id, schema_name, deleted, created_at, updated_at
             FROM schema_records
             WHERE instance_id = ?
             ORDER BY schema_name",
        )
        .bind(instance_id.to_string())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| SyncError::persistence("failed to list schema records", e))?;

        rows.iter().map(record_from_row).collect()
    }
}
