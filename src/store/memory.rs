//! In-memory resource store
//!
//! Applying an operation:
//! 1. look up the executor for the operation tag
//! 2. run it against the current (read-only) resource map
//! 3. commit the diff, counters and log record together
//!
//! Applies are serialized through a FIFO mutex, so an executor never sees a
//! half-applied state.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::{Mutex, MutexGuard};
use tracing::{debug, info, warn};

use super::{load_snapshot, ReadOnlyMemoryStore, ResourceReader, StoreConnector, StoreDescriptor, StoreSnapshot};
use crate::error::{StoreError, StoreResult};
use crate::executor::{
    CounterIdentifiers, ExecutionContext, ExecutorRegistry, IdentifierCounters, IdentifierStrategy,
    ResourceDiff,
};
use crate::operation::Operation;
use crate::resource::{Iri, Resource};

/// One committed operation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OperationRecord {
    pub operation: Operation,
    pub applied_at: DateTime<Utc>,
    #[serde(default)]
    pub created: Vec<Iri>,
    #[serde(default)]
    pub changed: Vec<Iri>,
    #[serde(default)]
    pub deleted: Vec<Iri>,
}

/// Everything a store commits atomically
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StoreState {
    pub resources: BTreeMap<Iri, Resource>,
    pub log: Vec<OperationRecord>,
    pub counters: IdentifierCounters,
}

/// Operation-sourced resource store
#[derive(Debug)]
pub struct MemoryStore {
    descriptor: StoreDescriptor,
    base_iri: String,
    registry: Arc<ExecutorRegistry>,
    identifiers: Arc<dyn IdentifierStrategy>,
    connector: Option<Arc<dyn StoreConnector>>,
    state: Mutex<StoreState>,
}

impl MemoryStore {
    /// Store with the standard executors and counter identifiers
    pub fn new(base_iri: impl Into<String>) -> Self {
        Self {
            descriptor: StoreDescriptor::Memory,
            base_iri: base_iri.into(),
            registry: Arc::new(ExecutorRegistry::standard()),
            identifiers: Arc::new(CounterIdentifiers),
            connector: None,
            state: Mutex::new(StoreState::default()),
        }
    }

    pub fn with_registry(mut self, registry: Arc<ExecutorRegistry>) -> Self {
        self.registry = registry;
        self
    }

    pub fn with_identifier_strategy(mut self, strategy: Arc<dyn IdentifierStrategy>) -> Self {
        self.identifiers = strategy;
        self
    }

    /// Mirror this store through `connector`, addressed by `url`
    pub fn with_connector(mut self, url: impl Into<String>, connector: Arc<dyn StoreConnector>) -> Self {
        self.descriptor = StoreDescriptor::Synchronized { url: url.into() };
        self.connector = Some(connector);
        self
    }

    pub fn descriptor(&self) -> &StoreDescriptor {
        &self.descriptor
    }

    pub fn base_iri(&self) -> &str {
        &self.base_iri
    }

    /// Apply one operation. On failure the store is unchanged.
    pub async fn apply_operation(&self, operation: Operation) -> StoreResult<ResourceDiff> {
        let mut state = self.state.lock().await;
        self.apply_to_state(&mut state, operation)
    }

    /// Execute against `state` and commit into it on success.
    /// `state` is untouched when an error is returned.
    pub(crate) fn apply_to_state(
        &self,
        state: &mut StoreState,
        operation: Operation,
    ) -> StoreResult<ResourceDiff> {
        let mut context = ExecutionContext::new(
            &state.resources,
            self.identifiers.as_ref(),
            &self.base_iri,
            state.counters.clone(),
        );
        let diff = match self.registry.execute(&operation, &mut context) {
            Ok(diff) => diff,
            Err(e) => {
                warn!(operation = %operation.tag(), error = %e, "Operation rejected");
                return Err(e);
            }
        };
        if !diff.is_disjoint() {
            return Err(StoreError::PreconditionFailed(format!(
                "{} produced overlapping created, changed and deleted sets",
                operation.tag()
            )));
        }
        let counters = context.into_counters();

        diff.apply_to(&mut state.resources);
        state.counters = counters;
        debug!(
            operation = %operation.tag(),
            created = diff.created.len(),
            changed = diff.changed.len(),
            deleted = diff.deleted.len(),
            "Operation applied"
        );
        state.log.push(OperationRecord {
            operation,
            applied_at: Utc::now(),
            created: diff.created.keys().cloned().collect(),
            changed: diff.changed.keys().cloned().collect(),
            deleted: diff.deleted.iter().cloned().collect(),
        });
        Ok(diff)
    }

    /// Exclusive access for multi-store staging
    pub(crate) async fn lock_state(&self) -> MutexGuard<'_, StoreState> {
        self.state.lock().await
    }

    /// Copy of the full committed state
    pub async fn state(&self) -> StoreState {
        self.state.lock().await.clone()
    }

    /// Committed operations, oldest first
    pub async fn operations(&self) -> Vec<OperationRecord> {
        self.state.lock().await.log.clone()
    }

    pub async fn snapshot(&self) -> ReadOnlyMemoryStore {
        ReadOnlyMemoryStore::new(self.state.lock().await.resources.clone())
    }

    /// Replace local state with the connector's snapshot
    pub async fn load(&self) -> StoreResult<()> {
        let connector = self.require_connector()?;
        let snapshot = load_snapshot(connector.as_ref()).await?;
        let mut state = self.state.lock().await;
        info!(
            resources = snapshot.resources.len(),
            operations = snapshot.operations.len(),
            "Store loaded"
        );
        *state = StoreState {
            resources: snapshot.resources,
            log: snapshot.operations,
            counters: snapshot.counters,
        };
        Ok(())
    }

    /// Push local state through the connector
    pub async fn save(&self) -> StoreResult<()> {
        let connector = self.require_connector()?;
        let snapshot = {
            let state = self.state.lock().await;
            StoreSnapshot {
                operations: state.log.clone(),
                resources: state.resources.clone(),
                counters: state.counters.clone(),
            }
        };
        connector.save(&snapshot).await?;
        info!(resources = snapshot.resources.len(), "Store saved");
        Ok(())
    }

    fn require_connector(&self) -> StoreResult<&Arc<dyn StoreConnector>> {
        self.connector.as_ref().ok_or_else(|| {
            StoreError::Connector("store is not synchronized with a connector".to_string())
        })
    }
}

#[async_trait]
impl ResourceReader for MemoryStore {
    async fn list_resources(&self) -> Vec<Iri> {
        self.state.lock().await.resources.keys().cloned().collect()
    }

    async fn read_resource(&self, iri: &str) -> Option<Resource> {
        self.state.lock().await.resources.get(iri).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resource::{AttributeKey, ResourceType};

    #[tokio::test]
    async fn test_counter_identifiers_and_linking() {
        let store = MemoryStore::new("http://localhost");
        let schema = store
            .apply_operation(Operation::create(ResourceType::StructuralSchema, None))
            .await
            .unwrap();
        assert_eq!(schema.created.keys().collect::<Vec<_>>(), ["http://localhost/psm-schema/1"]);

        let class = store
            .apply_operation(Operation::create(
                ResourceType::StructuralClass,
                Some("http://localhost/psm-schema/1"),
            ))
            .await
            .unwrap();
        assert!(class.created.contains_key("http://localhost/psm-class/1"));
        assert_eq!(
            class.changed["http://localhost/psm-schema/1"].parts(),
            ["http://localhost/psm-class/1"]
        );

        let attribute = store
            .apply_operation(Operation::create(
                ResourceType::StructuralAttribute,
                Some("http://localhost/psm-class/1"),
            ))
            .await
            .unwrap();
        let created = &attribute.created["http://localhost/psm-attribute/1"];
        assert_eq!(created.iri_ref(AttributeKey::Owner), Some("http://localhost/psm-class/1"));
        assert_eq!(attribute.changed.len(), 2);
        assert_eq!(store.operations().await.len(), 3);
    }

    #[tokio::test]
    async fn test_failed_apply_leaves_state_untouched() {
        let store = MemoryStore::new("http://localhost");
        store
            .apply_operation(Operation::create(ResourceType::StructuralSchema, None))
            .await
            .unwrap();
        let before = store.state().await;

        let result = store
            .apply_operation(Operation::create(ResourceType::StructuralClass, Some("http://nowhere")))
            .await;
        assert!(matches!(result, Err(StoreError::InvalidReference(_))));
        assert_eq!(store.state().await, before);
    }

    #[tokio::test]
    async fn test_unregistered_operation() {
        let registry = ExecutorRegistry::builder().build();
        let store = MemoryStore::new("http://localhost").with_registry(Arc::new(registry));
        let result = store
            .apply_operation(Operation::create(ResourceType::StructuralSchema, None))
            .await;
        assert_eq!(result, Err(StoreError::UnknownOperation("create".into())));
        assert!(store.operations().await.is_empty());
    }

    #[tokio::test]
    async fn test_save_requires_connector() {
        let store = MemoryStore::new("http://localhost");
        assert!(matches!(store.save().await, Err(StoreError::Connector(_))));
    }
}
