//! Federated Store
//!
//! Composes member stores into one namespace.
//!
//! - Reads fan out; the last-registered member that has an IRI wins.
//! - Writes go to the member that owns the routing IRI of the operation.
//! - Observers receive [`ChangeEvent`]s over channels, one per IRI per apply,
//!   numbered in commit order.
//!
//! Complex operations lock every member, stage all steps on copies of the
//! member states and commit only when every step succeeded.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::{mpsc, Mutex, RwLock};
use tracing::{debug, info, warn};

use super::{MemoryStore, ResourceReader, StoreDescriptor};
use crate::error::{ComplexOperationError, StoreError, StoreResult};
use crate::executor::ResourceDiff;
use crate::operation::Operation;
use crate::resource::{Iri, Resource};

// =============================================================================
// Identifiers and Events
// =============================================================================

/// Handle of a member store inside one federation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct StoreId(u64);

impl fmt::Display for StoreId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "store-{}", self.0)
    }
}

/// What a subscriber wants to hear about
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Subscription {
    All,
    Iri(Iri),
}

impl Subscription {
    fn matches(&self, iri: &str) -> bool {
        match self {
            Self::All => true,
            Self::Iri(wanted) => wanted == iri,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ChangeKind {
    Created,
    Changed,
    Deleted,
}

/// Notification for one IRI touched by a committed apply
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChangeEvent {
    /// Commit order across the whole federation
    pub sequence: u64,
    pub iri: Iri,
    pub kind: ChangeKind,
    /// Resulting body; `None` for deletions
    pub resource: Option<Resource>,
}

struct Member {
    id: StoreId,
    store: Arc<MemoryStore>,
}

struct Subscriber {
    filter: Subscription,
    sender: mpsc::UnboundedSender<ChangeEvent>,
}

// =============================================================================
// Federated Store
// =============================================================================

#[derive(Default)]
pub struct FederatedStore {
    members: RwLock<Vec<Member>>,
    ownership: RwLock<HashMap<Iri, StoreId>>,
    subscribers: Mutex<Vec<Subscriber>>,
    /// Serializes applies so event sequence numbers follow commit order
    apply_lock: Mutex<()>,
    next_store: AtomicU64,
    next_sequence: AtomicU64,
}

impl FederatedStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a member. Its resources shadow those of earlier members and
    /// are owned by it from now on.
    pub async fn add_store(&self, store: Arc<MemoryStore>) -> StoreResult<StoreId> {
        let _apply = self.apply_lock.lock().await;
        let mut members = self.members.write().await;
        if members.iter().any(|member| Arc::ptr_eq(&member.store, &store)) {
            return Err(StoreError::PreconditionFailed(
                "store is already a member of this federation".to_string(),
            ));
        }
        let id = StoreId(self.next_store.fetch_add(1, Ordering::SeqCst));
        let iris = store.list_resources().await;

        let mut ownership = self.ownership.write().await;
        for iri in iris {
            if let Some(previous) = ownership.insert(iri.clone(), id) {
                warn!(%iri, %previous, store = %id, "IRI shadowed by newer member store");
            }
        }
        info!(store = %id, descriptor = ?store.descriptor(), "Member store added");
        members.push(Member { id, store });
        Ok(id)
    }

    /// Unregister a member and hand ownership of shadowed IRIs back to earlier members
    pub async fn remove_store(&self, id: StoreId) -> StoreResult<Arc<MemoryStore>> {
        let _apply = self.apply_lock.lock().await;
        let mut members = self.members.write().await;
        let position = members
            .iter()
            .position(|member| member.id == id)
            .ok_or_else(|| StoreError::InvalidReference(format!("{} is not a member", id)))?;
        let removed = members.remove(position);

        let mut ownership = HashMap::new();
        for member in members.iter() {
            for iri in member.store.list_resources().await {
                ownership.insert(iri, member.id);
            }
        }
        *self.ownership.write().await = ownership;
        info!(store = %id, "Member store removed");
        Ok(removed.store)
    }

    pub async fn store_ids(&self) -> Vec<StoreId> {
        self.members.read().await.iter().map(|member| member.id).collect()
    }

    pub async fn descriptor(&self, id: StoreId) -> Option<StoreDescriptor> {
        self.members
            .read()
            .await
            .iter()
            .find(|member| member.id == id)
            .map(|member| member.store.descriptor().clone())
    }

    /// Member that owns `iri`
    pub async fn owner_of(&self, iri: &str) -> Option<StoreId> {
        self.ownership.read().await.get(iri).copied()
    }

    /// Apply one operation on the member that owns it
    pub async fn apply_operation(&self, operation: Operation) -> StoreResult<ResourceDiff> {
        let _apply = self.apply_lock.lock().await;
        let (id, store) = {
            let members = self.members.read().await;
            let ownership = self.ownership.read().await;
            let index = route(&members, &ownership, &operation)?;
            (members[index].id, members[index].store.clone())
        };
        debug!(operation = %operation.tag(), store = %id, "Routing operation");
        let diff = store.apply_operation(operation).await?;
        self.commit_ownership(id, &diff).await;
        self.publish(&diff).await;
        Ok(diff)
    }

    /// Apply one operation on an explicitly chosen member
    pub async fn apply_operation_on(&self, id: StoreId, operation: Operation) -> StoreResult<ResourceDiff> {
        let _apply = self.apply_lock.lock().await;
        let store = {
            let members = self.members.read().await;
            members
                .iter()
                .find(|member| member.id == id)
                .map(|member| member.store.clone())
                .ok_or_else(|| StoreError::InvalidReference(format!("{} is not a member", id)))?
        };
        let diff = store.apply_operation(operation).await?;
        self.commit_ownership(id, &diff).await;
        self.publish(&diff).await;
        Ok(diff)
    }

    /// Apply a sequence of operations as one unit. Later steps observe the
    /// effects of earlier ones; nothing is committed unless every step succeeds.
    pub async fn execute_complex_operation(
        &self,
        operations: Vec<Operation>,
    ) -> Result<ResourceDiff, ComplexOperationError> {
        let _apply = self.apply_lock.lock().await;
        let members = self.members.read().await;

        let mut guards = Vec::with_capacity(members.len());
        for member in members.iter() {
            guards.push(member.store.lock_state().await);
        }
        let mut staged: Vec<_> = guards.iter().map(|guard| (**guard).clone()).collect();
        let mut ownership = self.ownership.read().await.clone();
        let mut aggregate = ResourceDiff::default();

        for (step, operation) in operations.into_iter().enumerate() {
            let fail = |source| ComplexOperationError { step, source };
            let index = route(&members, &ownership, &operation).map_err(fail)?;
            let tag = operation.tag();
            let diff = members[index]
                .store
                .apply_to_state(&mut staged[index], operation)
                .map_err(|source| {
                    warn!(step, operation = %tag, error = %source, "Complex operation aborted");
                    ComplexOperationError { step, source }
                })?;
            apply_ownership(&mut ownership, members[index].id, &diff);
            aggregate = aggregate.merge(diff);
        }

        for (guard, state) in guards.iter_mut().zip(staged) {
            **guard = state;
        }
        drop(guards);
        *self.ownership.write().await = ownership;
        drop(members);

        self.publish(&aggregate).await;
        Ok(aggregate)
    }

    /// Receive change events for `subscription` until the receiver is dropped
    pub async fn subscribe(&self, subscription: Subscription) -> mpsc::UnboundedReceiver<ChangeEvent> {
        let (sender, receiver) = mpsc::unbounded_channel();
        self.subscribers.lock().await.push(Subscriber {
            filter: subscription,
            sender,
        });
        receiver
    }

    async fn commit_ownership(&self, id: StoreId, diff: &ResourceDiff) {
        let mut ownership = self.ownership.write().await;
        apply_ownership(&mut ownership, id, diff);
    }

    async fn publish(&self, diff: &ResourceDiff) {
        let events = diff
            .created
            .iter()
            .map(|(iri, resource)| (iri, ChangeKind::Created, Some(resource)))
            .chain(
                diff.changed
                    .iter()
                    .map(|(iri, resource)| (iri, ChangeKind::Changed, Some(resource))),
            )
            .chain(diff.deleted.iter().map(|iri| (iri, ChangeKind::Deleted, None)));

        let mut subscribers = self.subscribers.lock().await;
        for (iri, kind, resource) in events {
            let event = ChangeEvent {
                sequence: self.next_sequence.fetch_add(1, Ordering::SeqCst),
                iri: iri.clone(),
                kind,
                resource: resource.cloned(),
            };
            subscribers.retain(|subscriber| {
                !subscriber.filter.matches(iri) || subscriber.sender.send(event.clone()).is_ok()
            });
        }
    }
}

impl fmt::Debug for FederatedStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FederatedStore")
            .field("next_sequence", &self.next_sequence.load(Ordering::SeqCst))
            .finish_non_exhaustive()
    }
}

/// Index of the member that must execute `operation`
fn route(
    members: &[Member],
    ownership: &HashMap<Iri, StoreId>,
    operation: &Operation,
) -> StoreResult<usize> {
    if members.is_empty() {
        return Err(StoreError::PreconditionFailed(
            "federated store has no member stores".to_string(),
        ));
    }
    match operation.routing_iri() {
        None => Ok(members.len() - 1),
        Some(iri) => {
            let id = ownership
                .get(iri)
                .ok_or_else(|| StoreError::InvalidReference(format!("no member store owns {}", iri)))?;
            members
                .iter()
                .position(|member| member.id == *id)
                .ok_or_else(|| StoreError::InvalidReference(format!("{} is not a member", id)))
        }
    }
}

fn apply_ownership(ownership: &mut HashMap<Iri, StoreId>, id: StoreId, diff: &ResourceDiff) {
    for iri in diff.created.keys() {
        ownership.insert(iri.clone(), id);
    }
    for iri in &diff.deleted {
        ownership.remove(iri);
    }
}

#[async_trait]
impl ResourceReader for FederatedStore {
    async fn list_resources(&self) -> Vec<Iri> {
        let members = self.members.read().await;
        let mut iris = BTreeSet::new();
        for member in members.iter() {
            iris.extend(member.store.list_resources().await);
        }
        iris.into_iter().collect()
    }

    async fn read_resource(&self, iri: &str) -> Option<Resource> {
        let members = self.members.read().await;
        for member in members.iter().rev() {
            if let Some(resource) = member.store.read_resource(iri).await {
                return Some(resource);
            }
        }
        None
    }
}
