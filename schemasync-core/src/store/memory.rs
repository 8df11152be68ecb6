//! In-process metadata store.
//!
//! Backs unit tests and embedded use. Behavior mirrors the SQLite store:
//! flag updates on missing keys are no-ops and listings are ordered by
//! schema name.

use super::MetadataStore;
use crate::Result;
use crate::models::SchemaRecord;
use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::Mutex;
use uuid::Uuid;

/// Metadata store over a guarded in-memory map.
#[derive(Debug, Default)]
pub struct MemoryStore {
    records: Mutex<HashMap<(Uuid, String), SchemaRecord>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<(Uuid, String), SchemaRecord>> {
        // A poisoned lock only means another test thread panicked mid-write;
        // the map itself is still usable.
        self.records
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

#[async_trait]
impl MetadataStore for MemoryStore {
    async fn find_schema(&self, instance_id: Uuid, name: &str) -> Result<Option<SchemaRecord>> {
        let records = self.lock();
        Ok(records.get(&(instance_id, name.to_string())).cloned())
    }

    async fn create_schema(&self, instance_id: Uuid, name: &str) -> Result<()> {
        let mut records = self.lock();
        let key = (instance_id, name.to_string());
        if records.contains_key(&key) {
            return Err(crate::error::SyncError::configuration(format!(
                "schema record ({instance_id}, {name}) already exists"
            )));
        }
        records.insert(key, SchemaRecord::new(instance_id, name));
        Ok(())
    }

    async fn set_deleted_flag(&self, instance_id: Uuid, name: &str, deleted: bool) -> Result<()> {
        let mut records = self.lock();
        if let Some(record) = records.get_mut(&(instance_id, name.to_string())) {
            record.deleted = deleted;
            record.updated_at = Utc::now();
        }
        Ok(())
    }

    async fn list_known_schemas(&self, instance_id: Uuid) -> Result<Vec<SchemaRecord>> {
        let records = self.lock();
        let mut known: Vec<SchemaRecord> = records
            .values()
            .filter(|record| record.instance_id == instance_id)
            .cloned()
            .collect();
        known.sort_by(|a, b| a.schema_name.cmp(&b.schema_name));
        Ok(known)
    }
}
