//! Identifier minting
//!
//! Strategies are pure functions of kind, base IRI and a sequence number. The
//! per-kind sequence lives in [`IdentifierCounters`], which is part of the
//! store state, so staged applies can be discarded without burning numbers.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt::Debug;

use crate::resource::{Iri, ResourceType};

/// Pluggable naming for newly created resources
pub trait IdentifierStrategy: Debug + Send + Sync {
    fn create_new_identifier(&self, kind: ResourceType, base_iri: &str, sequence: u64) -> Iri;
}

/// `{base}/{kind segment}/{n}`, counting from 1 per kind
#[derive(Debug, Clone, Copy, Default)]
pub struct CounterIdentifiers;

impl IdentifierStrategy for CounterIdentifiers {
    fn create_new_identifier(&self, kind: ResourceType, base_iri: &str, sequence: u64) -> Iri {
        format!("{}/{}/{}", base_iri.trim_end_matches('/'), kind.segment(), sequence)
    }
}

/// Last issued sequence number per resource kind
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentifierCounters(BTreeMap<ResourceType, u64>);

impl IdentifierCounters {
    pub fn next(&mut self, kind: ResourceType) -> u64 {
        let counter = self.0.entry(kind).or_insert(0);
        *counter += 1;
        *counter
    }

    pub fn current(&self, kind: ResourceType) -> u64 {
        self.0.get(&kind).copied().unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counters_are_scoped_per_kind() {
        let mut counters = IdentifierCounters::default();
        assert_eq!(counters.next(ResourceType::StructuralClass), 1);
        assert_eq!(counters.next(ResourceType::StructuralClass), 2);
        assert_eq!(counters.next(ResourceType::StructuralAttribute), 1);
        assert_eq!(counters.current(ResourceType::StructuralSchema), 0);
    }

    #[test]
    fn test_counter_identifier_format() {
        let iri = CounterIdentifiers.create_new_identifier(
            ResourceType::ConceptualClass,
            "http://localhost/",
            3,
        );
        assert_eq!(iri, "http://localhost/class/3");
    }
}
