//! Reconciliation engine: diff a fetched schema set against the store.
//!
//! The algorithm is two strictly ordered phases over the complete fetched
//! set for one instance:
//!
//! 1. Every fetched name is created (if unknown) or resurrected (if known
//!    but soft-deleted).
//! 2. Only after the whole fetched set has been applied, every known name
//!    absent from it is soft-deleted.
//!
//! Phase 2 never runs against a partial prefix of the fetch, so a schema
//! can never be transiently marked deleted because reconciliation raced a
//! fetch. Re-running with an identical fetched set is a store no-op.

use crate::Result;
use crate::models::ReconcileSummary;
use crate::store::MetadataStore;
use std::collections::HashSet;
use tracing::debug;
use uuid::Uuid;

/// Applies one complete fetched schema set to the store.
///
/// `fetched` must be the full set for this run; callers must not feed
/// partial lists (a failed fetch never reaches this function, which is
/// what keeps existing records untouched on fetch errors).
///
/// # Errors
/// Returns the first persistence error; earlier mutations of this pass
/// remain applied, and the next run converges again from the new state.
pub async fn reconcile(
    store: &dyn MetadataStore,
    instance_id: Uuid,
    fetched: &[String],
) -> Result<ReconcileSummary> {
    let mut summary = ReconcileSummary::default();

    for name in fetched {
        match store.find_schema(instance_id, name).await? {
            None => {
                store.create_schema(instance_id, name).await?;
                summary.created += 1;
                debug!(%instance_id, schema = %name, "schema record created");
            }
            Some(record) if record.deleted => {
                store.set_deleted_flag(instance_id, name, false).await?;
                summary.resurrected += 1;
                debug!(%instance_id, schema = %name, "schema record resurrected");
            }
            Some(_) => summary.unchanged += 1,
        }
    }

    let fetched_set: HashSet<&str> = fetched.iter().map(String::as_str).collect();
    for record in store.list_known_schemas(instance_id).await? {
        if !fetched_set.contains(record.schema_name.as_str()) && !record.deleted {
            store
                .set_deleted_flag(instance_id, &record.schema_name, true)
                .await?;
            summary.soft_deleted += 1;
            debug!(%instance_id, schema = %record.schema_name, "schema record soft-deleted");
        }
    }

    Ok(summary)
}
