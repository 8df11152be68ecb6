//! Data model for the synchronization engine.
//!
//! The unit of synchronization is the schema (a named database/catalog on a
//! remote instance). Local knowledge of remote schemas is kept as
//! [`SchemaRecord`] rows that are only ever soft-deleted, never removed.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Wire/query variant required to talk to a given instance type.
///
/// The tag stored for an instance is parsed case-insensitively when the
/// instance list is loaded, so a query never dispatches on a raw string.
/// Unknown tags are preserved in [`Dialect::Other`] and reported as an
/// unsupported-dialect warning by the fetcher instead of failing the run.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Dialect {
    MySql,
    TiDb,
    ClickHouse,
    Other(String),
}

impl Dialect {
    /// Parses a dialect tag case-insensitively.
    pub fn parse(tag: &str) -> Self {
        match tag.to_lowercase().as_str() {
            "mysql" => Self::MySql,
            "tidb" => Self::TiDb,
            "clickhouse" => Self::ClickHouse,
            _ => Self::Other(tag.to_string()),
        }
    }

    /// The canonical lowercase tag for this dialect.
    pub fn tag(&self) -> &str {
        match self {
            Self::MySql => "mysql",
            Self::TiDb => "tidb",
            Self::ClickHouse => "clickhouse",
            Self::Other(tag) => tag,
        }
    }

    /// Whether a connector exists for this dialect.
    pub fn is_supported(&self) -> bool {
        !matches!(self, Self::Other(_))
    }
}

impl From<String> for Dialect {
    fn from(tag: String) -> Self {
        Self::parse(&tag)
    }
}

impl From<Dialect> for String {
    fn from(dialect: Dialect) -> Self {
        dialect.tag().to_string()
    }
}

impl fmt::Display for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// One configured remote database server.
///
/// Immutable for the duration of a synchronization run; owned by the
/// instance catalog. Identity is the opaque `instance_id`, not host:port,
/// so an instance keeps its schema history across a host migration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Instance {
    pub instance_id: Uuid,
    pub hostname: String,
    pub port: u16,
    pub dialect: Dialect,
}

impl Instance {
    pub fn new(instance_id: Uuid, hostname: impl Into<String>, port: u16, dialect: Dialect) -> Self {
        Self {
            instance_id,
            hostname: hostname.into(),
            port,
            dialect,
        }
    }

    /// host:port string used for log and error context.
    pub fn endpoint(&self) -> String {
        format!("{}:{}", self.hostname, self.port)
    }
}

/// Local knowledge of one schema on one instance.
///
/// Unique on (instance_id, schema_name). Rows are never physically removed:
/// a schema dropped on the remote side keeps its row with `deleted` set,
/// preserving an append-only history of presence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaRecord {
    pub instance_id: Uuid,
    pub schema_name: String,
    pub deleted: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl SchemaRecord {
    /// A freshly observed schema, live as of now.
    pub fn new(instance_id: Uuid, schema_name: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            instance_id,
            schema_name: schema_name.into(),
            deleted: false,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Per-instance result of one fetch, consumed exactly once by reconciliation.
///
/// Connector failures are not part of this type; they surface as
/// [`crate::error::SyncError`] from the fetcher so the task boundary can log
/// them uniformly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchOutcome {
    /// Distinct schema names currently visible on the instance. May be empty,
    /// which is a warning condition but still a valid outcome.
    Schemas(Vec<String>),
    /// The instance's dialect tag has no connector; nothing was fetched and
    /// the instance is skipped without store mutations.
    UnsupportedDialect(String),
}

/// Mutation counters from one reconciliation pass, for logging and tests.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReconcileSummary {
    pub created: usize,
    pub resurrected: usize,
    pub soft_deleted: usize,
    pub unchanged: usize,
}

impl ReconcileSummary {
    /// True when the pass changed nothing in the store.
    pub fn is_noop(&self) -> bool {
        self.created == 0 && self.resurrected == 0 && self.soft_deleted == 0
    }
}

impl fmt::Display for ReconcileSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} created, {} resurrected, {} soft-deleted, {} unchanged",
            self.created, self.resurrected, self.soft_deleted, self.unchanged
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dialect_parse_case_insensitive() {
        assert_eq!(Dialect::parse("MySQL"), Dialect::MySql);
        assert_eq!(Dialect::parse("mysql"), Dialect::MySql);
        assert_eq!(Dialect::parse("TiDB"), Dialect::TiDb);
        assert_eq!(Dialect::parse("ClickHouse"), Dialect::ClickHouse);
        assert_eq!(Dialect::parse("oracle"), Dialect::Other("oracle".to_string()));
    }

    #[test]
    fn test_dialect_support() {
        assert!(Dialect::MySql.is_supported());
        assert!(Dialect::TiDb.is_supported());
        assert!(Dialect::ClickHouse.is_supported());
        assert!(!Dialect::Other("oracle".to_string()).is_supported());
    }

    #[test]
    fn test_dialect_tag_roundtrip() {
        for tag in ["mysql", "tidb", "clickhouse"] {
            assert_eq!(Dialect::parse(tag).tag(), tag);
        }
        // Unknown tags keep their original spelling for log context
        assert_eq!(Dialect::parse("Oracle").tag(), "Oracle");
    }

    #[test]
    fn test_instance_endpoint() {
        let instance = Instance::new(Uuid::new_v4(), "db1.internal", 3306, Dialect::MySql);
        assert_eq!(instance.endpoint(), "db1.internal:3306");
    }

    #[test]
    fn test_schema_record_new_is_live() {
        let record = SchemaRecord::new(Uuid::new_v4(), "sales");
        assert!(!record.deleted);
        assert_eq!(record.created_at, record.updated_at);
    }

    #[test]
    fn test_summary_noop() {
        let summary = ReconcileSummary {
            unchanged: 12,
            ..Default::default()
        };
        assert!(summary.is_noop());

        let summary = ReconcileSummary {
            soft_deleted: 1,
            ..Default::default()
        };
        assert!(!summary.is_noop());
        assert_eq!(summary.to_string(), "0 created, 0 resurrected, 1 soft-deleted, 0 unchanged");
    }
}
