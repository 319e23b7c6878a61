//! Structural model to JSON Schema tree

use std::collections::{BTreeMap, BTreeSet};
use tracing::debug;

use super::model::{JsonDefinition, JsonKind, JsonSchema};
use crate::checksum::Checksum;
use crate::config::GenerationConfig;
use crate::datatype::KnownDatatype;
use crate::error::ModelResult;
use crate::generator::GeneratorContext;
use crate::resource::{Iri, LanguageString};
use crate::specification::{generators, path_relative, ArtefactDescriptor};
use crate::structural::{PropertyRange, StructuralClass, StructuralModel, StructuralProperty};

const DEF_HASH_LENGTH: usize = 8;

pub struct JsonSchemaAdapter<'a> {
    context: &'a GeneratorContext,
    model: &'a StructuralModel,
    artefact: &'a ArtefactDescriptor,
    config: &'a GenerationConfig,
    /// Classes currently being inlined, outermost first
    stack: Vec<Iri>,
    /// Classes reached again while being inlined
    recursive: BTreeSet<Iri>,
    /// `$defs` key of every recursive class
    def_names: BTreeMap<Iri, String>,
    defs: BTreeMap<String, JsonDefinition>,
}

impl<'a> JsonSchemaAdapter<'a> {
    pub fn new(
        context: &'a GeneratorContext,
        model: &'a StructuralModel,
        artefact: &'a ArtefactDescriptor,
        config: &'a GenerationConfig,
    ) -> Self {
        Self {
            context,
            model,
            artefact,
            config,
            stack: Vec::new(),
            recursive: BTreeSet::new(),
            def_names: BTreeMap::new(),
            defs: BTreeMap::new(),
        }
    }

    pub fn adapt(mut self) -> ModelResult<JsonSchema> {
        let roots = self.model.root_classes()?;
        let mut definitions = Vec::with_capacity(roots.len());
        for root in roots {
            definitions.push(self.class_definition(root)?);
        }
        let root = match definitions.len() {
            1 => definitions.remove(0),
            _ => JsonDefinition::new(JsonKind::AnyOf(definitions)),
        };

        Ok(JsonSchema {
            schema: Some(self.config.json_schema.dialect.clone()),
            id: Some(self.artefact.public_url.clone()).filter(|url| !url.is_empty()),
            root,
            defs: self.defs,
        })
    }

    fn label(&self, text: &'a LanguageString) -> Option<&'a str> {
        text.select(&self.config.documentation.languages)
    }

    fn class_definition(&mut self, class: &'a StructuralClass) -> ModelResult<JsonDefinition> {
        let annotated = |definition: JsonDefinition, adapter: &Self| {
            definition.with_annotation(adapter.label(&class.human_label), adapter.label(&class.human_description))
        };

        if class.is_codelist {
            return Ok(annotated(JsonDefinition::string(Some("iri")), self));
        }
        if self.model.is_foreign(class) {
            if let Some(foreign) = self.context.foreign_artefact(class, generators::JSON_SCHEMA) {
                let target = path_relative(&self.artefact.public_url, &foreign.public_url);
                return Ok(annotated(JsonDefinition::reference(target), self));
            }
            debug!(class = %class.iri, "No JSON Schema artefact for foreign class, inlining");
        }
        if self.stack.contains(&class.iri) {
            self.recursive.insert(class.iri.clone());
            let name = self.def_name(class);
            return Ok(JsonDefinition::reference(def_ref(&name)));
        }

        self.stack.push(class.iri.clone());
        let mut properties = Vec::new();
        let mut required = Vec::new();
        for property in &class.properties {
            let name = property.name().to_string();
            if property.effective_cardinality().is_required() {
                required.push(name.clone());
            }
            properties.push((name, self.property_definition(property)?));
        }
        self.stack.pop();

        let definition = annotated(JsonDefinition::new(JsonKind::Object { properties, required }), self);
        if self.recursive.contains(&class.iri) {
            let name = self.def_name(class);
            self.defs.insert(name.clone(), definition);
            return Ok(JsonDefinition::reference(def_ref(&name)));
        }
        Ok(definition)
    }

    /// `$defs` key of a recursive class. Technical labels are not unique, so
    /// a label taken by another class gets a hash of the IRI appended.
    fn def_name(&mut self, class: &StructuralClass) -> String {
        if let Some(name) = self.def_names.get(&class.iri) {
            return name.clone();
        }
        let label = class.name();
        let name = if self.def_names.values().any(|taken| taken.as_str() == label) {
            format!("{}-{}", label, Checksum::of(&class.iri).short(DEF_HASH_LENGTH))
        } else {
            label.to_string()
        };
        self.def_names.insert(class.iri.clone(), name.clone());
        name
    }

    fn property_definition(&mut self, property: &'a StructuralProperty) -> ModelResult<JsonDefinition> {
        let mut alternatives = match property.range()? {
            PropertyRange::Datatypes(datatypes) => datatypes.into_iter().map(primitive).collect::<Vec<_>>(),
            PropertyRange::Classes(classes) => {
                let mut definitions = Vec::with_capacity(classes.len());
                for iri in classes {
                    let class = self.model.require_class(iri)?;
                    definitions.push(self.class_definition(class)?);
                }
                definitions
            }
        };
        let value = match alternatives.len() {
            1 => alternatives.remove(0),
            _ => JsonDefinition::new(JsonKind::AnyOf(alternatives)),
        };

        let cardinality = property.effective_cardinality();
        let definition = if cardinality.is_multiple() {
            JsonDefinition::new(JsonKind::Array {
                items: Box::new(value),
                min_items: Some(cardinality.min).filter(|min| *min > 0),
                max_items: cardinality.max,
            })
        } else {
            value
        };
        Ok(definition.with_annotation(
            self.label(&property.human_label),
            self.label(&property.human_description),
        ))
    }
}

fn def_ref(name: &str) -> String {
    format!("#/$defs/{}", name)
}

/// Fixed mapping of primitive datatypes
fn primitive(datatype: Option<&str>) -> JsonDefinition {
    let Some(iri) = datatype else {
        return JsonDefinition::new(JsonKind::Any);
    };
    let kind = match KnownDatatype::from_iri(iri) {
        Some(KnownDatatype::Boolean) => JsonKind::Boolean,
        Some(KnownDatatype::Date) => JsonKind::String { format: Some("date") },
        Some(KnownDatatype::Time) => JsonKind::String { format: Some("time") },
        Some(KnownDatatype::DateTime) => JsonKind::String { format: Some("date-time") },
        Some(KnownDatatype::Integer) => JsonKind::Integer,
        Some(KnownDatatype::Decimal) => JsonKind::Number,
        Some(KnownDatatype::Url) => JsonKind::String { format: Some("iri") },
        Some(KnownDatatype::Text) => JsonKind::LanguageMap,
        Some(KnownDatatype::String) | None => JsonKind::String { format: None },
    };
    JsonDefinition::new(kind)
}
