//! Dialect connectors: one metadata query against one remote instance.
//!
//! A connector is built per instance and per run from the shared remote
//! credentials, runs the schema-listing query under the configured
//! deadline, and is dropped afterwards. Dialect dispatch happens once,
//! against the validated [`Dialect`] value, never against a raw tag
//! string at query time.
//!
//! # Module Structure
//! - `mysql`: MySQL-family connector (MySQL, TiDB) over sqlx
//! - `clickhouse`: ClickHouse-family connector over the HTTP client

use crate::Result;
use crate::config::{RemoteCredentials, SyncSettings};
use crate::models::{Dialect, Instance};
use async_trait::async_trait;

pub mod clickhouse;
pub mod mysql;

pub use clickhouse::ClickHouseConnector;
pub use mysql::MySqlConnector;

/// Schemas that belong to the engines themselves and are never synchronized.
///
/// Both letter cases are listed because MySQL's catalog comparison is
/// collation-dependent and ClickHouse's is case-sensitive.
pub const SYSTEM_SCHEMAS: [&str; 6] = [
    "PERFORMANCE_SCHEMA",
    "INFORMATION_SCHEMA",
    "performance_schema",
    "information_schema",
    "MYSQL",
    "mysql",
];

/// Builds the `NOT IN (...)` list excluding [`SYSTEM_SCHEMAS`].
///
/// The set is a compile-time constant, so inlining it into the query text
/// involves no untrusted input.
pub(crate) fn system_schema_filter() -> String {
    SYSTEM_SCHEMAS
        .iter()
        .map(|schema| format!("'{schema}'"))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Executes the schema-listing query for one instance.
///
/// Implementations bound every query (connection setup included) by the
/// configured deadline; exceeding it cancels the in-flight query and
/// surfaces [`crate::error::SyncError::QueryTimeout`].
#[async_trait]
pub trait DialectConnector: Send + Sync + std::fmt::Debug {
    /// The dialect this connector speaks.
    fn dialect(&self) -> Dialect;

    /// Fetches the names of all non-system schemas on the instance.
    ///
    /// # Errors
    /// Returns a connection error for network or auth failures and a
    /// timeout error when the deadline is exceeded.
    async fn list_schemas(&self) -> Result<Vec<String>>;
}

/// Creates the connector variant for an instance's dialect.
///
/// # Errors
/// Returns [`crate::error::SyncError::UnsupportedDialect`] for tags without
/// a connector; the fetcher turns that into a warning outcome before this
/// factory is ever reached, so hitting it here means a caller skipped
/// dialect validation.
pub fn create_connector(
    instance: &Instance,
    credentials: &RemoteCredentials,
    settings: &SyncSettings,
) -> Result<Box<dyn DialectConnector>> {
    match &instance.dialect {
        Dialect::MySql | Dialect::TiDb => Ok(Box::new(MySqlConnector::new(
            instance,
            credentials,
            settings.query_timeout,
        ))),
        Dialect::ClickHouse => Ok(Box::new(ClickHouseConnector::new(
            instance,
            credentials,
            settings.query_timeout,
        ))),
        Dialect::Other(tag) => Err(crate::error::SyncError::unsupported_dialect(tag)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn credentials() -> RemoteCredentials {
        RemoteCredentials::new("sync_ro", "secret")
    }

    #[test]
    fn test_system_schema_filter() {
        let filter = system_schema_filter();
        assert_eq!(filter.matches(',').count(), SYSTEM_SCHEMAS.len() - 1);
        assert!(filter.contains("'INFORMATION_SCHEMA'"));
        assert!(filter.contains("'information_schema'"));
        assert!(filter.contains("'mysql'"));
        assert!(filter.contains("'PERFORMANCE_SCHEMA'"));
    }

    #[tokio::test]
    async fn test_create_connector_dispatch() {
        let settings = SyncSettings::default();

        for (tag, expected) in [
            ("mysql", Dialect::MySql),
            ("tidb", Dialect::TiDb),
            ("clickhouse", Dialect::ClickHouse),
        ] {
            let instance =
                Instance::new(Uuid::new_v4(), "db1.internal", 3306, Dialect::parse(tag));
            let connector = create_connector(&instance, &credentials(), &settings).unwrap();
            assert_eq!(connector.dialect(), expected);
        }
    }

    #[test]
    fn test_create_connector_unsupported() {
        let settings = SyncSettings::default();
        let instance = Instance::new(
            Uuid::new_v4(),
            "db1.internal",
            1521,
            Dialect::parse("oracle"),
        );

        let error = create_connector(&instance, &credentials(), &settings).unwrap_err();
        assert!(matches!(
            error,
            crate::error::SyncError::UnsupportedDialect { .. }
        ));
    }
}
