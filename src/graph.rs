//! Class extension graph
//!
//! Edges point from a class to each class it extends. Used by the model
//! builders to reject cycles and by inheritance flattening to visit parents
//! before their subclasses.

use petgraph::algo::{kosaraju_scc, toposort};
use petgraph::graph::{DiGraph, NodeIndex};
use std::collections::HashMap;

use crate::error::{ModelError, ModelResult};
use crate::resource::Iri;

#[derive(Debug, Default)]
pub struct ExtensionGraph {
    graph: DiGraph<Iri, ()>,
    index: HashMap<Iri, NodeIndex>,
}

impl ExtensionGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from `(class, parents)` pairs
    pub fn from_edges<'a>(classes: impl IntoIterator<Item = (&'a Iri, &'a [Iri])>) -> Self {
        let mut graph = Self::new();
        for (class, parents) in classes {
            graph.add_class(class);
            for parent in parents {
                graph.add_extension(class, parent);
            }
        }
        graph
    }

    pub fn add_class(&mut self, iri: &str) -> NodeIndex {
        if let Some(index) = self.index.get(iri) {
            return *index;
        }
        let index = self.graph.add_node(iri.to_string());
        self.index.insert(iri.to_string(), index);
        index
    }

    pub fn add_extension(&mut self, class: &str, parent: &str) {
        let from = self.add_class(class);
        let to = self.add_class(parent);
        self.graph.update_edge(from, to, ());
    }

    /// A class that takes part in an extension cycle, if any
    pub fn find_cycle(&self) -> Option<&Iri> {
        kosaraju_scc(&self.graph)
            .into_iter()
            .find(|component| {
                component.len() > 1
                    || self.graph.find_edge(component[0], component[0]).is_some()
            })
            .and_then(|component| component.iter().map(|node| &self.graph[*node]).min())
    }

    /// Fail with `CycleDetected` when extension edges loop
    pub fn check_acyclic(&self) -> ModelResult<()> {
        match self.find_cycle() {
            Some(iri) => Err(ModelError::CycleDetected(iri.clone())),
            None => Ok(()),
        }
    }

    /// Every class, each listed after all classes it extends
    pub fn parents_first(&self) -> ModelResult<Vec<Iri>> {
        let order = toposort(&self.graph, None)
            .map_err(|cycle| ModelError::CycleDetected(self.graph[cycle.node_id()].clone()))?;
        Ok(order
            .into_iter()
            .rev()
            .map(|node| self.graph[node].clone())
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parents_come_first() {
        let mut graph = ExtensionGraph::new();
        graph.add_extension("student", "person");
        graph.add_extension("person", "agent");
        graph.add_class("building");

        let order = graph.parents_first().unwrap();
        let position = |iri: &str| order.iter().position(|item| item == iri).unwrap();
        assert!(position("agent") < position("person"));
        assert!(position("person") < position("student"));
        assert_eq!(order.len(), 4);
    }

    #[test]
    fn test_cycle_detection() {
        let mut graph = ExtensionGraph::new();
        graph.add_extension("a", "b");
        graph.add_extension("b", "c");
        assert!(graph.check_acyclic().is_ok());

        graph.add_extension("c", "a");
        assert!(matches!(graph.check_acyclic(), Err(ModelError::CycleDetected(iri)) if iri == "a"));
    }

    #[test]
    fn test_self_extension_is_a_cycle() {
        let mut graph = ExtensionGraph::new();
        graph.add_extension("a", "a");
        assert_eq!(graph.find_cycle().map(String::as_str), Some("a"));
    }
}
