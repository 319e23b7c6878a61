use std::collections::{BTreeMap, BTreeSet, VecDeque};
use tracing::info;

use super::{PropertyType, StructuralClass, StructuralModel, StructuralProperty};
use crate::datatype::is_datatype_iri;
use crate::error::{ModelError, ModelResult};
use crate::graph::ExtensionGraph;
use crate::resource::{AttributeKey, Iri, Resource, ResourceType};
use crate::store::{expect_type, require_resource, ResourceReader};

/// Build the structural model of `schema_iri`.
///
/// Every class in the schema's parts and roots is included, together with
/// everything reachable from them through association ranges, class
/// references and parents. Classes defined by other schemas are marked
/// `is_referenced`.
pub async fn build_structural_model(
    reader: &dyn ResourceReader,
    schema_iri: &str,
) -> ModelResult<StructuralModel> {
    let schema = require_resource(reader, schema_iri).await?;
    expect_type(&schema, ResourceType::StructuralSchema)?;

    let mut builder = Builder {
        reader,
        schema_iri,
        queue: VecDeque::new(),
        visited: BTreeSet::new(),
        aliases: BTreeMap::new(),
        classes: BTreeMap::new(),
    };

    let mut roots = Vec::new();
    for root in schema.iri_list(AttributeKey::Roots) {
        roots.push(builder.resolve_class(root).await?);
    }
    for part in schema.parts() {
        let resource = require_resource(reader, part).await?;
        if resource.is(ResourceType::StructuralClass) {
            builder.queue.push_back(part.clone());
        }
    }
    builder.drain().await?;

    let graph = ExtensionGraph::from_edges(
        builder
            .classes
            .iter()
            .map(|(iri, class)| (iri, class.extends.as_slice())),
    );
    graph.check_acyclic()?;

    info!(
        schema = %schema_iri,
        classes = builder.classes.len(),
        roots = roots.len(),
        "Built structural model"
    );
    Ok(StructuralModel {
        iri: schema_iri.to_string(),
        human_label: schema.language_string(AttributeKey::HumanLabel).cloned().unwrap_or_default(),
        human_description: schema
            .language_string(AttributeKey::HumanDescription)
            .cloned()
            .unwrap_or_default(),
        technical_label: schema.text(AttributeKey::TechnicalLabel).map(str::to_string),
        roots,
        classes: builder.classes,
        specification: None,
        namespace: schema.text(AttributeKey::Namespace).map(str::to_string),
        namespace_prefix: schema.text(AttributeKey::NamespacePrefix).map(str::to_string),
    })
}

struct Builder<'r> {
    reader: &'r dyn ResourceReader,
    schema_iri: &'r str,
    queue: VecDeque<Iri>,
    visited: BTreeSet<Iri>,
    /// Class reference IRI to referenced class IRI
    aliases: BTreeMap<Iri, Iri>,
    classes: BTreeMap<Iri, StructuralClass>,
}

impl<'r> Builder<'r> {
    /// Class IRI behind `iri`, following a class reference; queues the class
    async fn resolve_class(&mut self, iri: &str) -> ModelResult<Iri> {
        if let Some(target) = self.aliases.get(iri) {
            return Ok(target.clone());
        }
        let resource = require_resource(self.reader, iri).await?;
        if resource.is(ResourceType::StructuralClass) {
            self.queue.push_back(iri.to_string());
            return Ok(iri.to_string());
        }
        if resource.is(ResourceType::StructuralClassReference) {
            let target = resource
                .iri_ref(AttributeKey::ReferencedClass)
                .ok_or_else(|| ModelError::incomplete(iri, "references no class"))?
                .to_string();
            let referenced = require_resource(self.reader, &target).await?;
            expect_type(&referenced, ResourceType::StructuralClass)?;
            self.aliases.insert(iri.to_string(), target.clone());
            self.queue.push_back(target.clone());
            return Ok(target);
        }
        Err(ModelError::UnexpectedResourceType {
            iri: iri.to_string(),
            expected: ResourceType::StructuralClass.to_string(),
        })
    }

    async fn drain(&mut self) -> ModelResult<()> {
        while let Some(iri) = self.queue.pop_front() {
            if !self.visited.insert(iri.clone()) {
                continue;
            }
            let resource = require_resource(self.reader, &iri).await?;
            let class = self.class_from(&resource).await?;
            self.classes.insert(iri, class);
        }
        Ok(())
    }

    async fn class_from(&mut self, resource: &Resource) -> ModelResult<StructuralClass> {
        let structure_schema = resource
            .iri_ref(AttributeKey::Schema)
            .unwrap_or(self.schema_iri)
            .to_string();

        let mut extends = Vec::new();
        for parent in resource.iri_list(AttributeKey::Extends) {
            extends.push(self.resolve_class(parent).await?);
        }

        let mut properties = Vec::new();
        for part in resource.parts() {
            let part_resource = require_resource(self.reader, part).await?;
            if part_resource.is(ResourceType::StructuralAttribute)
                || part_resource.is(ResourceType::StructuralAssociationEnd)
            {
                properties.push(self.property_from(&part_resource).await?);
            }
        }

        Ok(StructuralClass {
            iri: resource.iri().to_string(),
            pim_iri: resource.iri_ref(AttributeKey::Interpretation).map(str::to_string),
            cim_iri: None,
            human_label: resource.language_string(AttributeKey::HumanLabel).cloned().unwrap_or_default(),
            human_description: resource
                .language_string(AttributeKey::HumanDescription)
                .cloned()
                .unwrap_or_default(),
            technical_label: resource.text(AttributeKey::TechnicalLabel).map(str::to_string),
            is_codelist: resource.flag(AttributeKey::IsCodelist),
            extends,
            inherits_from: Vec::new(),
            properties,
            is_referenced: structure_schema != self.schema_iri,
            structure_schema,
            specification: None,
        })
    }

    async fn property_from(&mut self, resource: &Resource) -> ModelResult<StructuralProperty> {
        let mut data_types = Vec::new();
        if resource.is(ResourceType::StructuralAttribute) {
            data_types.push(PropertyType::Attribute {
                datatype: resource.iri_ref(AttributeKey::Datatype).map(str::to_string),
            });
        } else {
            for range in resource.iri_list(AttributeKey::Range) {
                if is_datatype_iri(range) {
                    data_types.push(PropertyType::Attribute {
                        datatype: Some(range.clone()),
                    });
                } else {
                    let class = self.resolve_class(range).await?;
                    data_types.push(PropertyType::Association { class });
                }
            }
        }

        Ok(StructuralProperty {
            iri: resource.iri().to_string(),
            pim_iri: resource.iri_ref(AttributeKey::Interpretation).map(str::to_string),
            cim_iri: None,
            human_label: resource.language_string(AttributeKey::HumanLabel).cloned().unwrap_or_default(),
            human_description: resource
                .language_string(AttributeKey::HumanDescription)
                .cloned()
                .unwrap_or_default(),
            technical_label: resource.text(AttributeKey::TechnicalLabel).map(str::to_string),
            cardinality: resource.cardinality(),
            data_types,
            dematerialize: resource.flag(AttributeKey::Dematerialize),
            path_to_origin: Vec::new(),
        })
    }
}
