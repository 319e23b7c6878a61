use std::collections::BTreeSet;
use tracing::debug;

use super::StructuralTransform;
use crate::conceptual::ConceptualModel;
use crate::error::{ModelError, ModelResult};
use crate::graph::ExtensionGraph;
use crate::structural::{StructuralModel, StructuralProperty};

/// Copies parent properties into every subclass, parents before children, so
/// each class carries its complete property list. Inherited properties come
/// first. `extends` is emptied and the former parents move to
/// `inherits_from`.
///
/// A class with several parents is accepted only when the parents share no
/// property.
#[derive(Debug, Clone, Copy, Default)]
pub struct InheritanceFlattening;

impl StructuralTransform for InheritanceFlattening {
    fn name(&self) -> &'static str {
        "inheritance-flattening"
    }

    fn apply(&self, _conceptual: &ConceptualModel, mut model: StructuralModel) -> ModelResult<StructuralModel> {
        for class in model.classes.values() {
            if let Some(parent) = class.extends.iter().find(|parent| !model.classes.contains_key(*parent)) {
                return Err(ModelError::MissingResource(parent.clone()));
            }
        }

        let graph = ExtensionGraph::from_edges(
            model
                .classes
                .iter()
                .map(|(iri, class)| (iri, class.extends.as_slice())),
        );

        for iri in graph.parents_first()? {
            let Some(parents) = model.classes.get(&iri).map(|class| class.extends.clone()) else {
                continue;
            };
            if parents.is_empty() {
                continue;
            }

            let mut inherited: Vec<StructuralProperty> = Vec::new();
            let mut seen = BTreeSet::new();
            for parent in &parents {
                let parent_class = model.require_class(parent)?;
                for property in &parent_class.properties {
                    if !seen.insert(property.iri.clone()) {
                        return Err(ModelError::UnsupportedModel(format!(
                            "class {} inherits property {} from more than one parent",
                            iri, property.iri
                        )));
                    }
                    inherited.push(property.clone());
                }
            }

            if let Some(class) = model.classes.get_mut(&iri) {
                debug!(class = %iri, inherited = inherited.len(), "Flattening inheritance");
                let own = std::mem::take(&mut class.properties);
                inherited.extend(own.into_iter().filter(|property| !seen.contains(&property.iri)));
                class.properties = inherited;
                class.inherits_from = std::mem::take(&mut class.extends);
            }
        }
        Ok(model)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transform::fixtures::*;

    fn names(model: &StructuralModel, class: &str) -> Vec<String> {
        model.classes[class]
            .properties
            .iter()
            .map(|property| property.iri.clone())
            .collect()
    }

    #[test]
    fn test_inherited_properties_come_first() {
        let base = structural_class("base", vec![attribute("id")]);
        let mut middle = structural_class("middle", vec![attribute("name")]);
        middle.extends = vec!["base".into()];
        let mut leaf = structural_class("leaf", vec![attribute("size")]);
        leaf.extends = vec!["middle".into()];

        let result = InheritanceFlattening
            .apply(&ConceptualModel::empty(), model(vec![leaf, middle, base], &["leaf"]))
            .unwrap();

        assert_eq!(names(&result, "leaf"), ["id", "name", "size"]);
        assert_eq!(names(&result, "middle"), ["id", "name"]);
        assert!(result.classes["leaf"].extends.is_empty());
        assert_eq!(result.classes["leaf"].inherits_from, ["middle"]);

        let leaf = &result.classes["leaf"];
        let own: Vec<&str> = leaf.own_properties(&result).map(|property| property.iri.as_str()).collect();
        assert_eq!(own, ["size"]);
    }

    #[test]
    fn test_overlapping_parents_are_unsupported() {
        let left = structural_class("left", vec![attribute("id")]);
        let right = structural_class("right", vec![attribute("id")]);
        let mut child = structural_class("child", vec![]);
        child.extends = vec!["left".into(), "right".into()];

        let result = InheritanceFlattening.apply(&ConceptualModel::empty(), model(vec![left, right, child], &[]));
        assert!(matches!(result, Err(ModelError::UnsupportedModel(_))));
    }

    #[test]
    fn test_disjoint_parents_are_merged() {
        let left = structural_class("left", vec![attribute("a")]);
        let right = structural_class("right", vec![attribute("b")]);
        let mut child = structural_class("child", vec![attribute("c")]);
        child.extends = vec!["left".into(), "right".into()];

        let result = InheritanceFlattening
            .apply(&ConceptualModel::empty(), model(vec![left, right, child], &[]))
            .unwrap();
        assert_eq!(names(&result, "child"), ["a", "b", "c"]);
    }

    #[test]
    fn test_missing_parent() {
        let mut orphan = structural_class("orphan", vec![]);
        orphan.extends = vec!["gone".into()];
        let result = InheritanceFlattening.apply(&ConceptualModel::empty(), model(vec![orphan], &[]));
        assert!(matches!(result, Err(ModelError::MissingResource(iri)) if iri == "gone"));
    }
}
