//! MySQL-family connector (MySQL, TiDB).
//!
//! The schema list comes from `INFORMATION_SCHEMA.SCHEMATA`. The session
//! raises `group_concat_max_len` on connect because the same connector is
//! reused by downstream dictionary queries whose GROUP_CONCAT output would
//! otherwise be truncated at the 1024-byte default.

use super::{DialectConnector, system_schema_filter};
use crate::Result;
use crate::config::RemoteCredentials;
use crate::error::SyncError;
use crate::models::{Dialect, Instance};
use async_trait::async_trait;
use sqlx::Executor;
use sqlx::mysql::{MySqlConnectOptions, MySqlPool, MySqlPoolOptions};
use std::time::Duration;

const GROUP_CONCAT_MAX_LEN: u64 = 67_108_864;

/// Connector for instances speaking the MySQL wire protocol.
pub struct MySqlConnector {
    pool: MySqlPool,
    dialect: Dialect,
    host: String,
    port: u16,
    timeout: Duration,
}

impl std::fmt::Debug for MySqlConnector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MySqlConnector")
            .field("dialect", &self.dialect)
            .field("host", &self.host)
            .field("port", &self.port)
            .field("timeout", &self.timeout)
            // Credentials live inside the pool options and are never printed
            .finish_non_exhaustive()
    }
}

impl MySqlConnector {
    /// Builds a connector for one instance. The pool connects lazily, so
    /// construction is infallible and the first query pays for the
    /// connection inside its own deadline.
    pub fn new(instance: &Instance, credentials: &RemoteCredentials, timeout: Duration) -> Self {
        let options = MySqlConnectOptions::new()
            .host(&instance.hostname)
            .port(instance.port)
            .username(&credentials.username)
            .password(&credentials.password);

        let pool = MySqlPoolOptions::new()
            .max_connections(1)
            .acquire_timeout(timeout)
            .after_connect(|conn, _meta| {
                Box::pin(async move {
                    conn.execute(
                        format!("SET SESSION group_concat_max_len = {GROUP_CONCAT_MAX_LEN}")
                            .as_str(),
                    )
                    .await?;
                    Ok(())
                })
            })
            .connect_lazy_with(options);

        Self {
            pool,
            dialect: instance.dialect.clone(),
            host: instance.hostname.clone(),
            port: instance.port,
            timeout,
        }
    }

    fn schema_query() -> String {
        format!(
            "SELECT SCHEMA_NAME FROM INFORMATION_SCHEMA.SCHEMATA \
             WHERE SCHEMA_NAME NOT IN ({})",
            system_schema_filter()
        )
    }
}

#[async_trait]
impl DialectConnector for MySqlConnector {
    fn dialect(&self) -> Dialect {
        self.dialect.clone()
    }

    async fn list_schemas(&self) -> Result<Vec<String>> {
        let query = Self::schema_query();
        let fetch = sqlx::query_scalar::<_, String>(&query).fetch_all(&self.pool);

        // Dropping the future on deadline cancels the in-flight query
        let names = tokio::time::timeout(self.timeout, fetch)
            .await
            .map_err(|_| SyncError::query_timeout(&self.host, self.port, self.timeout))?
            .map_err(|e| SyncError::connection_failed(&self.host, self.port, e))?;

        Ok(names)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn test_schema_query_excludes_system_schemas() {
        let query = MySqlConnector::schema_query();
        assert!(query.starts_with("SELECT SCHEMA_NAME FROM INFORMATION_SCHEMA.SCHEMATA"));
        assert!(query.contains("NOT IN ('PERFORMANCE_SCHEMA'"));
        assert!(query.contains("'mysql')"));
    }

    #[tokio::test]
    async fn test_connector_construction_is_lazy() {
        // No server behind this address; construction must still succeed
        let instance = Instance::new(Uuid::new_v4(), "203.0.113.1", 3306, Dialect::TiDb);
        let credentials = RemoteCredentials::new("sync_ro", "secret");

        let connector = MySqlConnector::new(&instance, &credentials, Duration::from_secs(10));
        assert_eq!(connector.dialect(), Dialect::TiDb);

        let debug = format!("{:?}", connector);
        assert!(!debug.contains("secret"));
    }
}
