//! Resource stores
//!
//! - [`MemoryStore`]: operation log plus resource map, mutated only through
//!   executors
//! - [`FederatedStore`]: several member stores behind one namespace
//! - [`ReadOnlyMemoryStore`]: immutable snapshot used by generation runs

pub mod connector;
pub mod federated;
pub mod memory;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;

use crate::error::StoreResult;
use crate::executor::IdentifierCounters;
use crate::resource::{Iri, Resource};

pub use connector::{JsonFileConnector, StoreConnector};
pub use federated::{ChangeEvent, ChangeKind, FederatedStore, StoreId, Subscription};
pub use memory::{MemoryStore, OperationRecord, StoreState};

/// Read access shared by every store
#[async_trait]
pub trait ResourceReader: Send + Sync {
    async fn list_resources(&self) -> Vec<Iri>;

    async fn read_resource(&self, iri: &str) -> Option<Resource>;
}

/// How a member store is backed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum StoreDescriptor {
    Memory,
    /// Mirrored to a remote location through a [`StoreConnector`]
    Synchronized { url: String },
}

/// Persisted form of a store
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StoreSnapshot {
    #[serde(default)]
    pub operations: Vec<OperationRecord>,
    #[serde(default)]
    pub resources: BTreeMap<Iri, Resource>,
    /// Keeps IRIs of deleted resources from being minted again
    #[serde(default)]
    pub counters: IdentifierCounters,
}

// =============================================================================
// Read-only snapshot
// =============================================================================

/// Immutable, cheaply clonable resource map
#[derive(Debug, Clone, Default)]
pub struct ReadOnlyMemoryStore {
    resources: Arc<BTreeMap<Iri, Resource>>,
}

impl ReadOnlyMemoryStore {
    pub fn new(resources: BTreeMap<Iri, Resource>) -> Self {
        Self {
            resources: Arc::new(resources),
        }
    }

    pub fn from_resources(resources: impl IntoIterator<Item = Resource>) -> Self {
        Self::new(
            resources
                .into_iter()
                .map(|resource| (resource.iri().to_string(), resource))
                .collect(),
        )
    }

    /// Copy every resource visible through `reader` at this moment
    pub async fn snapshot(reader: &dyn ResourceReader) -> Self {
        let mut resources = BTreeMap::new();
        for iri in reader.list_resources().await {
            if let Some(resource) = reader.read_resource(&iri).await {
                resources.insert(iri, resource);
            }
        }
        Self::new(resources)
    }

    pub fn get(&self, iri: &str) -> Option<&Resource> {
        self.resources.get(iri)
    }

    pub fn len(&self) -> usize {
        self.resources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }
}

#[async_trait]
impl ResourceReader for ReadOnlyMemoryStore {
    async fn list_resources(&self) -> Vec<Iri> {
        self.resources.keys().cloned().collect()
    }

    async fn read_resource(&self, iri: &str) -> Option<Resource> {
        self.resources.get(iri).cloned()
    }
}

/// Load a store snapshot through `connector`, or an empty one when nothing is stored
pub(crate) async fn load_snapshot(connector: &dyn StoreConnector) -> StoreResult<StoreSnapshot> {
    Ok(connector.load().await?.unwrap_or_default())
}

/// Read a resource that a model build depends on
pub(crate) async fn require_resource(
    reader: &dyn ResourceReader,
    iri: &str,
) -> crate::error::ModelResult<Resource> {
    reader
        .read_resource(iri)
        .await
        .ok_or_else(|| crate::error::ModelError::MissingResource(iri.to_string()))
}

/// Fail unless `resource` carries `kind`
pub(crate) fn expect_type(resource: &Resource, kind: crate::resource::ResourceType) -> crate::error::ModelResult<()> {
    if resource.is(kind) {
        Ok(())
    } else {
        Err(crate::error::ModelError::UnexpectedResourceType {
            iri: resource.iri().to_string(),
            expected: kind.to_string(),
        })
    }
}
