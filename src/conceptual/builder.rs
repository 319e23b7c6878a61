use std::collections::{BTreeMap, BTreeSet, VecDeque};
use tracing::{debug, info};

use super::{ConceptualClass, ConceptualModel, ConceptualProperty, ConceptualRange};
use crate::error::{ModelError, ModelResult};
use crate::graph::ExtensionGraph;
use crate::resource::{AttributeKey, Iri, Resource, ResourceType};
use crate::store::{expect_type, require_resource, ResourceReader};

/// Build the conceptual model reachable from `schema_iri`.
///
/// Follows schema parts, class parents, attribute owners and association
/// ends. Fails with `MissingResource` on a dangling reference and with
/// `CycleDetected` when class extension loops.
pub async fn build_conceptual_model(
    reader: &dyn ResourceReader,
    schema_iri: &str,
) -> ModelResult<ConceptualModel> {
    let schema = require_resource(reader, schema_iri).await?;
    expect_type(&schema, ResourceType::ConceptualSchema)?;

    let mut queue: VecDeque<Iri> = schema.parts().iter().cloned().collect();
    let mut visited = BTreeSet::new();
    let mut classes = BTreeMap::new();
    let mut attributes = Vec::new();
    let mut associations = Vec::new();
    let mut ends = BTreeMap::new();

    while let Some(iri) = queue.pop_front() {
        if !visited.insert(iri.clone()) {
            continue;
        }
        let resource = require_resource(reader, &iri).await?;
        if resource.is(ResourceType::ConceptualClass) {
            queue.extend(resource.iri_list(AttributeKey::Extends).iter().cloned());
            classes.insert(iri, resource);
        } else if resource.is(ResourceType::ConceptualAttribute) {
            queue.extend(resource.iri_ref(AttributeKey::Owner).map(str::to_string));
            attributes.push(resource);
        } else if resource.is(ResourceType::ConceptualAssociation) {
            queue.extend(resource.parts().iter().cloned());
            associations.push(resource);
        } else if resource.is(ResourceType::ConceptualAssociationEnd) {
            queue.extend(resource.iri_list(AttributeKey::Range).iter().cloned());
            ends.insert(iri, resource);
        } else {
            debug!(%iri, "Skipping non-conceptual resource");
        }
    }

    let graph = ExtensionGraph::from_edges(
        classes
            .iter()
            .map(|(iri, class)| (iri, class.iri_list(AttributeKey::Extends))),
    );
    graph.check_acyclic()?;
    for parents in classes.values().map(|class| class.iri_list(AttributeKey::Extends)) {
        if let Some(parent) = parents.iter().find(|parent| !classes.contains_key(*parent)) {
            return Err(ModelError::UnexpectedResourceType {
                iri: parent.clone(),
                expected: ResourceType::ConceptualClass.to_string(),
            });
        }
    }

    let mut model_classes: BTreeMap<Iri, ConceptualClass> = classes
        .iter()
        .map(|(iri, resource)| (iri.clone(), class_from(resource)))
        .collect();

    // Attributes follow the order of their owner's parts.
    let mut by_owner: BTreeMap<&str, Vec<&Resource>> = BTreeMap::new();
    for attribute in &attributes {
        let owner = attribute
            .iri_ref(AttributeKey::Owner)
            .ok_or_else(|| ModelError::MissingResource(format!("owner of {}", attribute.iri())))?;
        by_owner.entry(owner).or_default().push(attribute);
    }
    for (owner, mut owned) in by_owner {
        let class_resource = classes.get(owner).ok_or_else(|| ModelError::UnexpectedResourceType {
            iri: owner.to_string(),
            expected: ResourceType::ConceptualClass.to_string(),
        })?;
        let parts = class_resource.parts();
        owned.sort_by_key(|attribute| parts.iter().position(|part| part == attribute.iri()));
        if let Some(class) = model_classes.get_mut(owner) {
            class.properties.extend(owned.into_iter().map(attribute_from));
        }
    }

    for association in &associations {
        add_association(association, &ends, &mut model_classes)?;
    }

    info!(
        schema = %schema_iri,
        classes = model_classes.len(),
        "Built conceptual model"
    );
    Ok(ConceptualModel {
        iri: Some(schema_iri.to_string()),
        human_label: schema.language_string(AttributeKey::HumanLabel).cloned().unwrap_or_default(),
        human_description: schema
            .language_string(AttributeKey::HumanDescription)
            .cloned()
            .unwrap_or_default(),
        classes: model_classes,
    })
}

fn class_from(resource: &Resource) -> ConceptualClass {
    ConceptualClass {
        iri: resource.iri().to_string(),
        concept_iri: resource.iri_ref(AttributeKey::ConceptIri).map(str::to_string),
        human_label: resource.language_string(AttributeKey::HumanLabel).cloned().unwrap_or_default(),
        human_description: resource
            .language_string(AttributeKey::HumanDescription)
            .cloned()
            .unwrap_or_default(),
        is_codelist: resource.flag(AttributeKey::IsCodelist),
        extends: resource.iri_list(AttributeKey::Extends).to_vec(),
        properties: Vec::new(),
    }
}

fn attribute_from(resource: &Resource) -> ConceptualProperty {
    ConceptualProperty {
        iri: resource.iri().to_string(),
        concept_iri: resource.iri_ref(AttributeKey::ConceptIri).map(str::to_string),
        human_label: resource.language_string(AttributeKey::HumanLabel).cloned().unwrap_or_default(),
        human_description: resource
            .language_string(AttributeKey::HumanDescription)
            .cloned()
            .unwrap_or_default(),
        cardinality: resource.cardinality(),
        range: ConceptualRange::Datatype(resource.iri_ref(AttributeKey::Datatype).map(str::to_string)),
    }
}

/// Each end becomes a property of the class at the opposite end
fn add_association(
    association: &Resource,
    ends: &BTreeMap<Iri, Resource>,
    classes: &mut BTreeMap<Iri, ConceptualClass>,
) -> ModelResult<()> {
    let [first, second] = association.parts() else {
        return Err(ModelError::UnsupportedModel(format!(
            "association {} must have exactly two ends",
            association.iri()
        )));
    };
    let (first_end, first_class) = participant(ends, first)?;
    let (second_end, second_class) = participant(ends, second)?;

    for (end, owner, target) in [
        (second_end, &first_class, &second_class),
        (first_end, &second_class, &first_class),
    ] {
        let label = end
            .language_string(AttributeKey::HumanLabel)
            .or_else(|| association.language_string(AttributeKey::HumanLabel))
            .cloned()
            .unwrap_or_default();
        let description = end
            .language_string(AttributeKey::HumanDescription)
            .or_else(|| association.language_string(AttributeKey::HumanDescription))
            .cloned()
            .unwrap_or_default();
        let owner_class = classes.get_mut(owner).ok_or_else(|| ModelError::UnexpectedResourceType {
            iri: owner.clone(),
            expected: ResourceType::ConceptualClass.to_string(),
        })?;
        owner_class.properties.push(ConceptualProperty {
            iri: end.iri().to_string(),
            concept_iri: end
                .iri_ref(AttributeKey::ConceptIri)
                .or_else(|| association.iri_ref(AttributeKey::ConceptIri))
                .map(str::to_string),
            human_label: label,
            human_description: description,
            cardinality: end.cardinality(),
            range: ConceptualRange::Class(target.clone()),
        });
    }
    Ok(())
}

fn participant<'e>(ends: &'e BTreeMap<Iri, Resource>, end: &str) -> ModelResult<(&'e Resource, Iri)> {
    let resource = ends
        .get(end)
        .ok_or_else(|| ModelError::MissingResource(end.to_string()))?;
    let class = resource
        .iri_list(AttributeKey::Range)
        .first()
        .cloned()
        .ok_or_else(|| ModelError::incomplete(end, "has no participant class"))?;
    Ok((resource, class))
}
