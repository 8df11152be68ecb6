//! Metadata synchronization engine for remote database instances.
//!
//! For every registered instance, a synchronization pass fetches the
//! current set of schemas through the instance's dialect connector and
//! reconciles them into the local metadata store: new schemas are created,
//! previously dropped ones resurrected, and schemas no longer present are
//! soft-deleted. Partial failures stay contained to the instance they hit.
//!
//! # Architecture
//! - Dialect connectors execute one bounded metadata query each
//!   (MySQL-family over sqlx, ClickHouse-family over its HTTP client)
//! - The fetcher validates dialects and classifies outcomes
//! - The reconciliation engine applies an idempotent two-phase diff with
//!   soft-delete semantics
//! - The scheduler fans out one task per instance behind a fixed-capacity
//!   concurrency gate and joins them all before a pass completes
//!
//! Dependencies (catalog, store, fetcher) are explicit trait objects
//! constructed by the caller; nothing reads process-global state.

pub mod catalog;
pub mod config;
pub mod connectors;
pub mod error;
pub mod fetcher;
pub mod logging;
pub mod models;
pub mod reconcile;
pub mod scheduler;
pub mod store;

// Re-export commonly used types
pub use catalog::{InstanceCatalog, StaticCatalog};
pub use config::{RemoteCredentials, SyncSettings};
pub use connectors::{DialectConnector, create_connector};
pub use error::{Result, SyncError};
pub use fetcher::{FetchSchemas, SchemaFetcher};
pub use logging::init_logging;
pub use models::{Dialect, FetchOutcome, Instance, ReconcileSummary, SchemaRecord};
pub use reconcile::reconcile;
pub use scheduler::Scheduler;
pub use store::{MemoryStore, MetadataStore, SqliteStore};
