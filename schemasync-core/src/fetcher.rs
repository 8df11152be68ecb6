//! Schema fetcher: one instance in, one classified outcome out.
//!
//! Sits between the scheduler and the dialect connectors. Dialect
//! validation happens here, so unsupported tags never turn into hard
//! failures, and an empty (but successful) result is flagged as a likely
//! privilege problem while still being a valid outcome.

use crate::Result;
use crate::config::{RemoteCredentials, SyncSettings};
use crate::connectors::create_connector;
use crate::models::{Dialect, FetchOutcome, Instance};
use async_trait::async_trait;
use tracing::{debug, warn};

/// Produces the current schema set for one instance.
///
/// Object-safe so the scheduler can be driven by a test double without a
/// network in reach.
#[async_trait]
pub trait FetchSchemas: Send + Sync {
    /// Fetches and classifies the schema set for one instance.
    ///
    /// # Errors
    /// Returns connection and timeout errors from the connector; no retry
    /// is attempted within a run.
    async fn fetch(&self, instance: &Instance) -> Result<FetchOutcome>;
}

/// Production fetcher over the real dialect connectors.
#[derive(Debug)]
pub struct SchemaFetcher {
    credentials: RemoteCredentials,
    settings: SyncSettings,
}

impl SchemaFetcher {
    pub fn new(credentials: RemoteCredentials, settings: SyncSettings) -> Self {
        Self {
            credentials,
            settings,
        }
    }
}

#[async_trait]
impl FetchSchemas for SchemaFetcher {
    async fn fetch(&self, instance: &Instance) -> Result<FetchOutcome> {
        if let Dialect::Other(tag) = &instance.dialect {
            warn!(
                endpoint = %instance.endpoint(),
                dialect = %tag,
                "unsupported database dialect, instance skipped"
            );
            return Ok(FetchOutcome::UnsupportedDialect(tag.clone()));
        }

        let connector = create_connector(instance, &self.credentials, &self.settings)?;
        let mut names = connector.list_schemas().await?;

        // The outcome carries a distinct set
        names.sort_unstable();
        names.dedup();

        if names.is_empty() {
            warn!(
                endpoint = %instance.endpoint(),
                "no schemas visible; check that account {} has SELECT privilege on the catalog",
                self.credentials.username
            );
        } else {
            debug!(
                endpoint = %instance.endpoint(),
                count = names.len(),
                "fetched schema list"
            );
        }

        Ok(FetchOutcome::Schemas(names))
    }
}
