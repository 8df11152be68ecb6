//! Instance catalog: the source of the registered instance fleet.
//!
//! The scheduler only ever sees a snapshot taken at the start of a run;
//! instances registered afterwards are picked up on the next run.

use crate::Result;
use crate::models::Instance;
use async_trait::async_trait;

/// Supplies the list of configured remote instances.
///
/// Object-safe so the scheduler can hold `Arc<dyn InstanceCatalog>` and
/// tests can substitute a fixture.
#[async_trait]
pub trait InstanceCatalog: Send + Sync {
    /// Returns the registered instances as a read-only snapshot.
    ///
    /// # Errors
    /// Returns an error if the catalog's backing source is unavailable.
    async fn list_instances(&self) -> Result<Vec<Instance>>;
}

/// A catalog over a fixed, pre-loaded instance list.
///
/// Used by the CLI (instances come from the configuration file) and by
/// tests. Dialect tags are already validated into [`crate::models::Dialect`]
/// by the time instances land here.
#[derive(Debug, Clone, Default)]
pub struct StaticCatalog {
    instances: Vec<Instance>,
}

impl StaticCatalog {
    pub fn new(instances: Vec<Instance>) -> Self {
        Self { instances }
    }

    pub fn len(&self) -> usize {
        self.instances.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instances.is_empty()
    }
}

#[async_trait]
impl InstanceCatalog for StaticCatalog {
    async fn list_instances(&self) -> Result<Vec<Instance>> {
        Ok(self.instances.clone())
    }
}
