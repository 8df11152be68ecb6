//! Metadata store: persisted knowledge of remote schemas.
//!
//! The store is accessed concurrently by instance tasks, but every task
//! only touches rows scoped to its own instance id, so implementations
//! need no coordination beyond their own internal synchronization. The
//! reconciliation engine is the only writer.
//!
//! # Module Structure
//! - `sqlite`: sqlx-backed store over a local SQLite file
//! - `memory`: in-process store for tests and embedding

use crate::Result;
use crate::models::SchemaRecord;
use async_trait::async_trait;
use uuid::Uuid;

pub mod memory;
pub mod sqlite;

pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

/// Persisted table of (instance, schema, deleted-flag) rows.
///
/// Rows are unique on (instance_id, schema_name) and are never physically
/// removed; `set_deleted_flag` is the only form of deletion.
#[async_trait]
pub trait MetadataStore: Send + Sync {
    /// Looks up one record by its composite key.
    async fn find_schema(&self, instance_id: Uuid, name: &str) -> Result<Option<SchemaRecord>>;

    /// Creates a live record for a newly observed schema.
    ///
    /// Callers check existence first; creating a key that already exists
    /// is a persistence error.
    async fn create_schema(&self, instance_id: Uuid, name: &str) -> Result<()>;

    /// Flips the deleted flag on an existing record. A missing key is a
    /// no-op, matching UPDATE semantics.
    async fn set_deleted_flag(&self, instance_id: Uuid, name: &str, deleted: bool) -> Result<()>;

    /// All records known for an instance, regardless of flag, ordered by
    /// schema name.
    async fn list_known_schemas(&self, instance_id: Uuid) -> Result<Vec<SchemaRecord>>;
}
