//! ClickHouse-family connector.
//!
//! ClickHouse has no `INFORMATION_SCHEMA.SCHEMATA` worth trusting across
//! versions; the engine's own catalog table `system.databases` is the
//! authoritative source. Talks to the instance's HTTP interface.

use super::{DialectConnector, system_schema_filter};
use crate::Result;
use crate::config::RemoteCredentials;
use crate::error::SyncError;
use crate::models::{Dialect, Instance};
use async_trait::async_trait;
use clickhouse::{Client, Row};
use serde::Deserialize;
use std::time::Duration;

#[derive(Row, Deserialize)]
struct DatabaseRow {
    name: String,
}

/// Connector for ClickHouse instances.
pub struct ClickHouseConnector {
    client: Client,
    host: String,
    port: u16,
    timeout: Duration,
}

impl std::fmt::Debug for ClickHouseConnector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClickHouseConnector")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("timeout", &self.timeout)
            // Credentials live inside the client and are never printed
            .finish_non_exhaustive()
    }
}

impl ClickHouseConnector {
    /// Builds a connector for one instance. The client is connectionless
    /// until the first query, so construction is infallible.
    pub fn new(instance: &Instance, credentials: &RemoteCredentials, timeout: Duration) -> Self {
        let client = Client::default()
            .with_url(format!("http://{}:{}", instance.hostname, instance.port))
            .with_user(credentials.username.clone())
            .with_password(credentials.password.clone());

        Self {
            client,
            host: instance.hostname.clone(),
            port: instance.port,
            timeout,
        }
    }

    fn schema_query() -> String {
        format!(
            "SELECT name FROM system.databases WHERE name NOT IN ({})",
            system_schema_filter()
        )
    }
}

#[async_trait]
impl DialectConnector for ClickHouseConnector {
    fn dialect(&self) -> Dialect {
        Dialect::ClickHouse
    }

    async fn list_schemas(&self) -> Result<Vec<String>> {
        let query = Self::schema_query();
        let fetch = self.client.query(&query).fetch_all::<DatabaseRow>();

        // Dropping the future on deadline cancels the in-flight request
        let rows = tokio::time::timeout(self.timeout, fetch)
            .await
            .map_err(|_| SyncError::query_timeout(&self.host, self.port, self.timeout))?
            .map_err(|e| SyncError::connection_failed(&self.host, self.port, e))?;

        Ok(rows.into_iter().map(|row| row.name).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn test_schema_query_uses_system_databases() {
        let query = ClickHouseConnector::schema_query();
        assert!(query.starts_with("SELECT name FROM system.databases"));
        assert!(query.contains("NOT IN ('PERFORMANCE_SCHEMA'"));
        assert!(query.contains("'information_schema'"));
    }

    #[test]
    fn test_connector_construction_is_lazy() {
        let instance = Instance::new(Uuid::new_v4(), "203.0.113.2", 8123, Dialect::ClickHouse);
        let credentials = RemoteCredentials::new("sync_ro", "secret");

        let connector = ClickHouseConnector::new(&instance, &credentials, Duration::from_secs(10));
        assert_eq!(connector.dialect(), Dialect::ClickHouse);

        let debug = format!("{:?}", connector);
        assert!(!debug.contains("secret"));
    }
}
