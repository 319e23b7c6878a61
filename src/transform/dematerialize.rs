use std::collections::BTreeMap;
use tracing::debug;

use super::StructuralTransform;
use crate::conceptual::ConceptualModel;
use crate::error::{ModelError, ModelResult};
use crate::resource::{Cardinality, Iri};
use crate::structural::{PropertyType, StructuralClass, StructuralModel, StructuralProperty};

/// Replaces each dematerialized association with the properties of its
/// target class, recursively. Inlined properties record the chain of
/// dematerialized properties they came through in `path_to_origin`.
///
/// The association must be single-valued with exactly one class in its
/// range. An optional association makes every inlined property optional.
#[derive(Debug, Clone, Copy, Default)]
pub struct Dematerialization;

impl StructuralTransform for Dematerialization {
    fn name(&self) -> &'static str {
        "dematerialization"
    }

    fn apply(&self, _conceptual: &ConceptualModel, mut model: StructuralModel) -> ModelResult<StructuralModel> {
        let original = model.classes.clone();
        for class in model.classes.values_mut() {
            if !class.properties.iter().any(|property| property.dematerialize) {
                continue;
            }
            let mut stack = vec![class.iri.clone()];
            let mut properties = Vec::new();
            for property in &class.properties {
                properties.extend(expand(&original, property, &mut stack)?);
            }
            debug!(class = %class.iri, properties = properties.len(), "Dematerialized class");
            class.properties = properties;
        }
        Ok(model)
    }
}

fn expand(
    classes: &BTreeMap<Iri, StructuralClass>,
    property: &StructuralProperty,
    stack: &mut Vec<Iri>,
) -> ModelResult<Vec<StructuralProperty>> {
    if !property.dematerialize {
        return Ok(vec![property.clone()]);
    }
    let target = match property.data_types.as_slice() {
        [PropertyType::Association { class }] => class,
        _ => {
            return Err(ModelError::UnsupportedModel(format!(
                "dematerialized property {} must have exactly one class in its range",
                property.iri
            )))
        }
    };
    let outer = property.effective_cardinality();
    if outer.is_multiple() {
        return Err(ModelError::UnsupportedModel(format!(
            "dematerialized property {} must not be multi-valued",
            property.iri
        )));
    }
    if stack.contains(target) {
        return Err(ModelError::UnsupportedModel(format!(
            "dematerialization of {} loops back to {}",
            property.iri, target
        )));
    }
    let target_class = classes
        .get(target)
        .ok_or_else(|| ModelError::MissingResource(target.clone()))?;

    stack.push(target.clone());
    let mut inlined = Vec::new();
    for inner in &target_class.properties {
        for mut expanded in expand(classes, inner, stack)? {
            expanded.path_to_origin.insert(0, property.iri.clone());
            if outer.min == 0 {
                let bounds = expanded.effective_cardinality();
                expanded.cardinality = Some(Cardinality::new(0, bounds.max));
            }
            inlined.push(expanded);
        }
    }
    stack.pop();
    Ok(inlined)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transform::fixtures::*;

    fn dematerialized(iri: &str, class: &str, cardinality: Cardinality) -> StructuralProperty {
        let mut property = association(iri, class);
        property.dematerialize = true;
        property.cardinality = Some(cardinality);
        property
    }

    #[test]
    fn test_inlines_recursively() {
        let mut street = attribute("street");
        street.cardinality = Some(Cardinality::exactly_one());
        let address = structural_class("address", vec![street, dematerialized("geo", "point", Cardinality::exactly_one())]);
        let point = structural_class("point", vec![attribute("lat")]);
        let person = structural_class(
            "person",
            vec![attribute("name"), dematerialized("home", "address", Cardinality::new(0, Some(1)))],
        );

        let result = Dematerialization
            .apply(&ConceptualModel::empty(), model(vec![person, address, point], &["person"]))
            .unwrap();

        let properties = &result.classes["person"].properties;
        let iris: Vec<&str> = properties.iter().map(|property| property.iri.as_str()).collect();
        assert_eq!(iris, ["name", "street", "lat"]);
        assert_eq!(properties[1].path_to_origin, ["home"]);
        assert_eq!(properties[2].path_to_origin, ["home", "geo"]);
        assert_eq!(properties[1].cardinality, Some(Cardinality::new(0, Some(1))));

        let address: Vec<&str> = result.classes["address"]
            .properties
            .iter()
            .map(|property| property.iri.as_str())
            .collect();
        assert_eq!(address, ["street", "lat"]);
    }

    #[test]
    fn test_rejects_loops() {
        let a = structural_class("a", vec![dematerialized("to-b", "b", Cardinality::exactly_one())]);
        let b = structural_class("b", vec![dematerialized("to-a", "a", Cardinality::exactly_one())]);
        let result = Dematerialization.apply(&ConceptualModel::empty(), model(vec![a, b], &["a"]));
        assert!(matches!(result, Err(ModelError::UnsupportedModel(_))));
    }

    #[test]
    fn test_rejects_multi_valued() {
        let a = structural_class("a", vec![dematerialized("to-b", "b", Cardinality::new(0, None))]);
        let b = structural_class("b", vec![attribute("x")]);
        let result = Dematerialization.apply(&ConceptualModel::empty(), model(vec![a, b], &["a"]));
        assert!(matches!(result, Err(ModelError::UnsupportedModel(_))));
    }
}
