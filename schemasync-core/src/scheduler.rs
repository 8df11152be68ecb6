//! Scheduler: drives one synchronization pass over the whole fleet.
//!
//! One task per instance, admitted through a fixed-capacity semaphore, all
//! joined before the pass is considered complete. Failure of one instance's
//! task never aborts or delays siblings beyond gate contention; everything
//! an instance task can raise is logged at the task boundary and swallowed
//! there. The pass returns nothing: operators observe it through logs and
//! metadata store side effects.

use crate::catalog::InstanceCatalog;
use crate::config::{RemoteCredentials, SyncSettings};
use crate::fetcher::{FetchSchemas, SchemaFetcher};
use crate::models::{FetchOutcome, Instance};
use crate::reconcile::reconcile;
use crate::store::MetadataStore;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, error, info};

/// Top-level driver for synchronization passes.
///
/// Construct once with explicit dependencies, then invoke [`run_once`]
/// from whatever periodic trigger the deployment uses.
///
/// [`run_once`]: Scheduler::run_once
pub struct Scheduler {
    catalog: Arc<dyn InstanceCatalog>,
    store: Arc<dyn MetadataStore>,
    fetcher: Arc<dyn FetchSchemas>,
    settings: SyncSettings,
}

impl Scheduler {
    pub fn new(
        catalog: Arc<dyn InstanceCatalog>,
        store: Arc<dyn MetadataStore>,
        fetcher: Arc<dyn FetchSchemas>,
        settings: SyncSettings,
    ) -> Self {
        Self {
            catalog,
            store,
            fetcher,
            settings,
        }
    }

    /// Convenience constructor wiring in the production [`SchemaFetcher`].
    pub fn with_connectors(
        catalog: Arc<dyn InstanceCatalog>,
        store: Arc<dyn MetadataStore>,
        credentials: RemoteCredentials,
        settings: SyncSettings,
    ) -> Self {
        let fetcher = Arc::new(SchemaFetcher::new(credentials, settings.clone()));
        Self::new(catalog, store, fetcher, settings)
    }

    /// Runs one synchronization pass to completion.
    ///
    /// Snapshots the instance list once; instances registered after the
    /// snapshot wait for the next pass. Returns only when every instance
    /// task has finished, whatever its outcome.
    pub async fn run_once(&self) {
        let instances = match self.catalog.list_instances().await {
            Ok(instances) => instances,
            Err(e) => {
                error!("failed to load instance snapshot: {e}");
                return;
            }
        };

        info!(instances = instances.len(), "starting synchronization pass");

        let gate = Arc::new(Semaphore::new(self.settings.max_concurrency));
        let mut tasks: JoinSet<()> = JoinSet::new();

        for instance in instances {
            let gate = Arc::clone(&gate);
            let store = Arc::clone(&self.store);
            let fetcher = Arc::clone(&self.fetcher);

            tasks.spawn(async move {
                // The gate lives as long as every task; acquire can only
                // fail on a closed semaphore, which never happens here.
                let Ok(_permit) = gate.acquire_owned().await else {
                    return;
                };
                sync_instance(fetcher.as_ref(), store.as_ref(), &instance).await;
            });
        }

        while let Some(joined) = tasks.join_next().await {
            if let Err(e) = joined {
                // A panicking task is contained here, siblings keep running
                error!("instance task aborted: {e}");
            }
        }

        info!("synchronization pass complete");
    }
}

/// One instance's pipeline: fetch, then reconcile on a schema outcome.
///
/// This is the error boundary: every failure is logged with host:port
/// context and nothing propagates.
async fn sync_instance(
    fetcher: &dyn FetchSchemas,
    store: &dyn MetadataStore,
    instance: &Instance,
) {
    match fetcher.fetch(instance).await {
        Ok(FetchOutcome::Schemas(names)) => {
            match reconcile(store, instance.instance_id, &names).await {
                Ok(summary) => {
                    debug!(
                        endpoint = %instance.endpoint(),
                        instance_id = %instance.instance_id,
                        "synchronized: {summary}"
                    );
                }
                Err(e) => {
                    error!(
                        endpoint = %instance.endpoint(),
                        "reconciliation failed: {e}"
                    );
                }
            }
        }
        // Already logged by the fetcher; no mutation for this instance
        Ok(FetchOutcome::UnsupportedDialect(_)) => {}
        Err(e) => {
            error!(endpoint = %instance.endpoint(), "metadata fetch failed: {e}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::StaticCatalog;
    use crate::error::SyncError;
    use crate::models::Dialect;
    use crate::store::MemoryStore;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;
    use uuid::Uuid;

    /// Scripted fetcher: behavior keyed on the instance hostname.
    /// Tracks in-flight calls so tests can assert the gate capacity.
    #[derive(Default)]
    struct ScriptedFetcher {
        in_flight: AtomicUsize,
        peak_in_flight: AtomicUsize,
        completed: AtomicUsize,
    }

    #[async_trait]
    impl FetchSchemas for ScriptedFetcher {
        async fn fetch(&self, instance: &Instance) -> crate::Result<FetchOutcome> {
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak_in_flight.fetch_max(now, Ordering::SeqCst);

            // Long enough that all admitted tasks overlap
            tokio::time::sleep(Duration::from_millis(20)).await;

            self.in_flight.fetch_sub(1, Ordering::SeqCst);
            self.completed.fetch_add(1, Ordering::SeqCst);

            match instance.hostname.split('-').next() {
                Some("down") => Err(SyncError::query_timeout(
                    &instance.hostname,
                    instance.port,
                    Duration::from_secs(10),
                )),
                Some("empty") => Ok(FetchOutcome::Schemas(Vec::new())),
                Some("oracle") => {
                    Ok(FetchOutcome::UnsupportedDialect("oracle".to_string()))
                }
                _ => Ok(FetchOutcome::Schemas(vec![
                    "sales".to_string(),
                    "hr".to_string(),
                ])),
            }
        }
    }

    fn instance(hostname: &str) -> Instance {
        Instance::new(Uuid::new_v4(), hostname, 3306, Dialect::MySql)
    }

    fn scheduler(
        instances: Vec<Instance>,
        store: Arc<MemoryStore>,
        fetcher: Arc<ScriptedFetcher>,
    ) -> Scheduler {
        Scheduler::new(
            Arc::new(StaticCatalog::new(instances)),
            store,
            fetcher,
            SyncSettings::default(),
        )
    }

    #[tokio::test]
    async fn test_all_tasks_complete_despite_failures() {
        let instances: Vec<Instance> = (0..9)
            .map(|i| {
                if i % 3 == 0 {
                    instance(&format!("down-{i}"))
                } else {
                    instance(&format!("up-{i}"))
                }
            })
            .collect();
        let fetcher = Arc::new(ScriptedFetcher::default());

        scheduler(instances, Arc::new(MemoryStore::new()), Arc::clone(&fetcher))
            .run_once()
            .await;

        assert_eq!(fetcher.completed.load(Ordering::SeqCst), 9);
    }

    #[tokio::test]
    async fn test_concurrency_gate_capacity() {
        let instances: Vec<Instance> = (0..12).map(|i| instance(&format!("up-{i}"))).collect();
        let fetcher = Arc::new(ScriptedFetcher::default());

        scheduler(instances, Arc::new(MemoryStore::new()), Arc::clone(&fetcher))
            .run_once()
            .await;

        let peak = fetcher.peak_in_flight.load(Ordering::SeqCst);
        assert!(peak <= 4, "gate admitted {peak} concurrent fetches");
        assert_eq!(fetcher.completed.load(Ordering::SeqCst), 12);
    }

    #[tokio::test]
    async fn test_failed_fetch_leaves_store_untouched() {
        let broken = instance("down-1");
        let store = Arc::new(MemoryStore::new());
        store.create_schema(broken.instance_id, "sales").await.unwrap();
        store.create_schema(broken.instance_id, "legacy").await.unwrap();

        scheduler(
            vec![broken.clone()],
            Arc::clone(&store),
            Arc::new(ScriptedFetcher::default()),
        )
        .run_once()
        .await;

        // No partial-list deletions: the failed instance keeps its records
        let records = store.list_known_schemas(broken.instance_id).await.unwrap();
        assert_eq!(records.len(), 2);
        assert!(records.iter().all(|record| !record.deleted));
    }

    #[tokio::test]
    async fn test_unsupported_dialect_mutates_nothing_and_blocks_nobody() {
        let odd = instance("oracle-1");
        let healthy = instance("up-1");
        let store = Arc::new(MemoryStore::new());

        scheduler(
            vec![odd.clone(), healthy.clone()],
            Arc::clone(&store),
            Arc::new(ScriptedFetcher::default()),
        )
        .run_once()
        .await;

        assert!(store.list_known_schemas(odd.instance_id).await.unwrap().is_empty());
        assert_eq!(
            store
                .list_known_schemas(healthy.instance_id)
                .await
                .unwrap()
                .len(),
            2
        );
    }

    #[tokio::test]
    async fn test_successful_pass_reconciles_each_instance() {
        let a = instance("up-a");
        let b = instance("up-b");
        let store = Arc::new(MemoryStore::new());
        // "legacy" exists locally but the fetch no longer reports it
        store.create_schema(a.instance_id, "legacy").await.unwrap();

        scheduler(
            vec![a.clone(), b.clone()],
            Arc::clone(&store),
            Arc::new(ScriptedFetcher::default()),
        )
        .run_once()
        .await;

        let records = store.list_known_schemas(a.instance_id).await.unwrap();
        let states: Vec<(&str, bool)> = records
            .iter()
            .map(|record| (record.schema_name.as_str(), record.deleted))
            .collect();
        assert_eq!(states, vec![("hr", false), ("legacy", true), ("sales", false)]);

        assert_eq!(store.list_known_schemas(b.instance_id).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_empty_snapshot_is_a_quiet_noop() {
        let fetcher = Arc::new(ScriptedFetcher::default());
        scheduler(Vec::new(), Arc::new(MemoryStore::new()), Arc::clone(&fetcher))
            .run_once()
            .await;

        assert_eq!(fetcher.completed.load(Ordering::SeqCst), 0);
    }
}
