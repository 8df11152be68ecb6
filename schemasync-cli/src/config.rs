//! Configuration file loading for the synchronization runner.
//!
//! The file describes the registered instance fleet, the shared remote
//! account, and run tunables. Instances may carry an explicit id; entries
//! without one get a stable UUID derived from endpoint and dialect, so
//! schema history survives restarts without requiring operators to mint
//! UUIDs by hand.

use anyhow::Context;
use schemasync_core::{Dialect, Instance, RemoteCredentials, SyncSettings};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use uuid::Uuid;

/// Top-level TOML configuration.
///
/// ```toml
/// store_path = "/var/lib/schemasync/metadata.db"
///
/// [remote]
/// username = "sync_ro"
/// password = "..."
///
/// [sync]
/// query_timeout_secs = 10
/// max_concurrency = 4
///
/// [[instances]]
/// hostname = "db1.internal"
/// port = 3306
/// dialect = "mysql"
/// ```
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
    /// Path of the SQLite metadata store.
    pub store_path: PathBuf,
    pub remote: RemoteSection,
    #[serde(default)]
    pub sync: SyncSection,
    #[serde(default)]
    pub instances: Vec<InstanceEntry>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RemoteSection {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct SyncSection {
    pub query_timeout_secs: u64,
    pub max_concurrency: usize,
}

impl Default for SyncSection {
    fn default() -> Self {
        let defaults = SyncSettings::default();
        Self {
            query_timeout_secs: defaults.query_timeout.as_secs(),
            max_concurrency: defaults.max_concurrency,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct InstanceEntry {
    /// Stable identity; derived from endpoint and dialect when omitted.
    pub id: Option<Uuid>,
    pub hostname: String,
    pub port: u16,
    pub dialect: String,
}

impl FileConfig {
    /// Loads and parses the configuration file.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        let config: Self = toml::from_str(&raw)
            .with_context(|| format!("failed to parse config file {}", path.display()))?;
        Ok(config)
    }

    pub fn credentials(&self) -> RemoteCredentials {
        RemoteCredentials::new(self.remote.username.as_str(), self.remote.password.as_str())
    }

    /// Validated run settings.
    pub fn settings(&self) -> anyhow::Result<SyncSettings> {
        let settings = SyncSettings::default()
            .with_query_timeout(Duration::from_secs(self.sync.query_timeout_secs))
            .with_max_concurrency(self.sync.max_concurrency);
        settings.validate()?;
        Ok(settings)
    }

    /// The registered fleet, with dialect tags validated into [`Dialect`].
    pub fn instances(&self) -> Vec<Instance> {
        self.instances
            .iter()
            .map(|entry| {
                let id = entry.id.unwrap_or_else(|| derived_instance_id(entry));
                Instance::new(
                    id,
                    entry.hostname.as_str(),
                    entry.port,
                    Dialect::parse(&entry.dialect),
                )
            })
            .collect()
    }
}

/// Stable id for entries without an explicit one: v5 UUID over the
/// endpoint and dialect, identical across restarts.
fn derived_instance_id(entry: &InstanceEntry) -> Uuid {
    let key = format!(
        "{}:{}/{}",
        entry.hostname,
        entry.port,
        entry.dialect.to_lowercase()
    );
    Uuid::new_v5(&Uuid::NAMESPACE_OID, key.as_bytes())
}
