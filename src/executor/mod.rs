//! Operation executors
//!
//! An executor turns one [`Operation`] into a [`ResourceDiff`] computed against
//! a read-only view of the store. Executors never mutate state; the store
//! commits the diff afterwards, all at once.
//!
//! ```text
//! Operation ──tag──▶ ExecutorRegistry ──fn──▶ ResourceDiff ──commit──▶ store
//! ```

mod attribute;
mod create;
mod delete;
pub mod identifier;
mod order;

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fmt;

use crate::error::{StoreError, StoreResult};
use crate::operation::{Operation, OperationTag};
use crate::resource::{Iri, Resource, ResourceType};

pub use identifier::{CounterIdentifiers, IdentifierCounters, IdentifierStrategy};

// =============================================================================
// Resource Diff
// =============================================================================

/// Outcome of one successful operation. The three sets are pairwise disjoint.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceDiff {
    pub created: BTreeMap<Iri, Resource>,
    pub changed: BTreeMap<Iri, Resource>,
    pub deleted: BTreeSet<Iri>,
}

impl ResourceDiff {
    pub fn is_empty(&self) -> bool {
        self.created.is_empty() && self.changed.is_empty() && self.deleted.is_empty()
    }

    pub fn is_disjoint(&self) -> bool {
        self.created.keys().all(|iri| !self.changed.contains_key(iri) && !self.deleted.contains(iri))
            && self.changed.keys().all(|iri| !self.deleted.contains(iri))
    }

    /// Every IRI touched by this diff
    pub fn iris(&self) -> impl Iterator<Item = &Iri> {
        self.created
            .keys()
            .chain(self.changed.keys())
            .chain(self.deleted.iter())
    }

    /// Record a newly created resource
    pub fn create(&mut self, resource: Resource) {
        self.created.insert(resource.iri().to_string(), resource);
    }

    /// Record a deletion, dropping any pending edit of the same resource
    pub fn delete(&mut self, iri: &str) {
        self.changed.remove(iri);
        if self.created.remove(iri).is_none() {
            self.deleted.insert(iri.to_string());
        }
    }

    /// Mutable access to the pending body of `iri`, seeded from the store view
    pub(crate) fn edit(
        &mut self,
        context: &ExecutionContext<'_>,
        iri: &str,
    ) -> StoreResult<&mut Resource> {
        if self.deleted.contains(iri) {
            return Err(StoreError::InvalidReference(format!("{} is being deleted", iri)));
        }
        if !self.created.contains_key(iri) && !self.changed.contains_key(iri) {
            let resource = context.require(iri)?.clone();
            self.changed.insert(iri.to_string(), resource);
        }
        match self.created.get_mut(iri) {
            Some(resource) => Ok(resource),
            None => self
                .changed
                .get_mut(iri)
                .ok_or_else(|| StoreError::InvalidReference(iri.to_string())),
        }
    }

    /// Apply this diff to a resource map
    pub(crate) fn apply_to(&self, resources: &mut BTreeMap<Iri, Resource>) {
        for iri in &self.deleted {
            resources.remove(iri);
        }
        for (iri, resource) in self.created.iter().chain(self.changed.iter()) {
            resources.insert(iri.clone(), resource.clone());
        }
    }

    /// Fold a later diff into this one, as if both were one apply.
    /// A resource created and then deleted disappears entirely.
    pub fn merge(mut self, later: ResourceDiff) -> ResourceDiff {
        for (iri, resource) in later.created {
            self.deleted.remove(&iri);
            self.created.insert(iri, resource);
        }
        for (iri, resource) in later.changed {
            if let Some(created) = self.created.get_mut(&iri) {
                *created = resource;
            } else {
                self.changed.insert(iri, resource);
            }
        }
        for iri in later.deleted {
            self.delete(&iri);
        }
        self
    }
}

// =============================================================================
// Execution Context
// =============================================================================

/// Read-only store view plus staged identifier allocation
pub struct ExecutionContext<'a> {
    resources: &'a BTreeMap<Iri, Resource>,
    strategy: &'a dyn IdentifierStrategy,
    base_iri: &'a str,
    counters: IdentifierCounters,
    minted: BTreeSet<Iri>,
}

impl<'a> ExecutionContext<'a> {
    pub fn new(
        resources: &'a BTreeMap<Iri, Resource>,
        strategy: &'a dyn IdentifierStrategy,
        base_iri: &'a str,
        counters: IdentifierCounters,
    ) -> Self {
        Self {
            resources,
            strategy,
            base_iri,
            counters,
            minted: BTreeSet::new(),
        }
    }

    pub fn read(&self, iri: &str) -> Option<&'a Resource> {
        self.resources.get(iri)
    }

    /// Read a resource that must exist
    pub fn require(&self, iri: &str) -> StoreResult<&'a Resource> {
        self.read(iri)
            .ok_or_else(|| StoreError::InvalidReference(format!("resource {} does not exist", iri)))
    }

    /// Read a resource that must exist and carry `kind`
    pub fn require_as(&self, iri: &str, kind: ResourceType) -> StoreResult<&'a Resource> {
        self.require(iri)?.require(kind)
    }

    /// Mint an unused identifier for a new resource of `kind`
    pub fn mint(&mut self, kind: ResourceType) -> Iri {
        loop {
            let sequence = self.counters.next(kind);
            let iri = self.strategy.create_new_identifier(kind, self.base_iri, sequence);
            if !self.resources.contains_key(&iri) && self.minted.insert(iri.clone()) {
                return iri;
            }
        }
    }

    /// Counters after this execution, to be committed with the diff
    pub fn into_counters(self) -> IdentifierCounters {
        self.counters
    }
}

// =============================================================================
// Executor Registry
// =============================================================================

/// Handler for one operation tag
pub type ExecutorFn = fn(&Operation, &mut ExecutionContext<'_>) -> StoreResult<ResourceDiff>;

/// Immutable mapping from operation tag to executor
#[derive(Clone)]
pub struct ExecutorRegistry {
    executors: HashMap<OperationTag, ExecutorFn>,
}

impl ExecutorRegistry {
    /// Registry with an executor for every built-in operation
    pub fn standard() -> Self {
        Self::builder()
            .register(OperationTag::Create, create::execute)
            .register(OperationTag::SetAttribute, attribute::execute_set_attribute)
            .register(OperationTag::SetRoots, attribute::execute_set_roots)
            .register(OperationTag::SetOrder, order::execute)
            .register(OperationTag::Delete, delete::execute)
            .build()
    }

    pub fn builder() -> ExecutorRegistryBuilder {
        ExecutorRegistryBuilder::default()
    }

    pub fn supports(&self, tag: OperationTag) -> bool {
        self.executors.contains_key(&tag)
    }

    /// Compute the diff for `operation`
    pub fn execute(
        &self,
        operation: &Operation,
        context: &mut ExecutionContext<'_>,
    ) -> StoreResult<ResourceDiff> {
        let executor = self
            .executors
            .get(&operation.tag())
            .ok_or_else(|| StoreError::UnknownOperation(operation.tag().to_string()))?;
        executor(operation, context)
    }
}

impl Default for ExecutorRegistry {
    fn default() -> Self {
        Self::standard()
    }
}

impl fmt::Debug for ExecutorRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut tags: Vec<_> = self.executors.keys().map(OperationTag::as_str).collect();
        tags.sort_unstable();
        f.debug_struct("ExecutorRegistry").field("operations", &tags).finish()
    }
}

/// Collects executors before the registry is frozen
#[derive(Default)]
pub struct ExecutorRegistryBuilder {
    executors: HashMap<OperationTag, ExecutorFn>,
}

impl ExecutorRegistryBuilder {
    pub fn register(mut self, tag: OperationTag, executor: ExecutorFn) -> Self {
        self.executors.insert(tag, executor);
        self
    }

    pub fn build(self) -> ExecutorRegistry {
        ExecutorRegistry {
            executors: self.executors,
        }
    }
}

pub(crate) fn mismatched(expected: OperationTag, operation: &Operation) -> StoreError {
    StoreError::PreconditionFailed(format!(
        "{} executor cannot apply a {} operation",
        expected,
        operation.tag()
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn class(iri: &str) -> Resource {
        Resource::new(iri, ResourceType::StructuralClass)
    }

    #[test]
    fn test_merge_created_then_deleted_vanishes() {
        let mut first = ResourceDiff::default();
        first.create(class("a"));
        let mut second = ResourceDiff::default();
        second.deleted.insert("a".into());

        let merged = first.merge(second);
        assert!(merged.is_empty());
    }

    #[test]
    fn test_merge_created_then_changed_stays_created() {
        let mut first = ResourceDiff::default();
        first.create(class("a"));
        let mut second = ResourceDiff::default();
        second.changed.insert("a".into(), class("a").with(crate::resource::AttributeKey::IsCodelist, true));

        let merged = first.merge(second);
        assert!(merged.changed.is_empty());
        assert!(merged.created["a"].flag(crate::resource::AttributeKey::IsCodelist));
        assert!(merged.is_disjoint());
    }

    #[test]
    fn test_unknown_operation() {
        let registry = ExecutorRegistry::builder().build();
        let resources = BTreeMap::new();
        let mut context =
            ExecutionContext::new(&resources, &CounterIdentifiers, "http://x", IdentifierCounters::default());
        let result = registry.execute(&Operation::delete("a"), &mut context);
        assert_eq!(result, Err(StoreError::UnknownOperation("delete".into())));
    }

    #[test]
    fn test_mint_skips_taken_identifiers() {
        let mut resources = BTreeMap::new();
        resources.insert("http://x/psm-class/1".to_string(), class("http://x/psm-class/1"));
        let mut context =
            ExecutionContext::new(&resources, &CounterIdentifiers, "http://x", IdentifierCounters::default());
        assert_eq!(context.mint(ResourceType::StructuralClass), "http://x/psm-class/2");
        assert_eq!(context.mint(ResourceType::StructuralClass), "http://x/psm-class/3");
    }
}
