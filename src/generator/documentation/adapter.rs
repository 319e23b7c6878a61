//! Specification to document tree

use std::collections::BTreeMap;
use std::sync::Arc;

use super::anchor::AnchorBuilder;
use super::model::{Block, Document, Inline, Section};
use crate::conceptual::{ConceptualClass, ConceptualModel, ConceptualProperty, ConceptualRange};
use crate::datatype::KnownDatatype;
use crate::error::ModelResult;
use crate::resource::{Cardinality, LanguageString};
use crate::specification::{path_relative, ArtefactDescriptor, DataSpecification};
use crate::structural::{last_segment, PropertyRange, StructuralClass, StructuralModel, StructuralProperty};

const CONCEPTUAL: &str = "conceptual";

/// A schema artefact the documentation describes
pub struct DocumentedSchema<'a> {
    pub artefact: &'a ArtefactDescriptor,
    pub model: Arc<StructuralModel>,
}

pub struct DocumentationAdapter<'a> {
    specification: &'a DataSpecification,
    artefact: &'a ArtefactDescriptor,
    conceptual: Option<&'a ConceptualModel>,
    languages: &'a [String],
    anchors: AnchorBuilder,
    /// Conceptual class and property IRIs to their anchors
    conceptual_anchors: BTreeMap<String, String>,
}

impl<'a> DocumentationAdapter<'a> {
    pub fn new(
        specification: &'a DataSpecification,
        artefact: &'a ArtefactDescriptor,
        conceptual: Option<&'a ConceptualModel>,
        languages: &'a [String],
    ) -> ModelResult<Self> {
        let title = specification
            .label
            .select(languages)
            .unwrap_or_else(|| last_segment(&specification.iri));
        let mut adapter = Self {
            specification,
            artefact,
            conceptual,
            languages,
            anchors: AnchorBuilder::new(title)?,
            conceptual_anchors: BTreeMap::new(),
        };
        adapter.index_conceptual();
        Ok(adapter)
    }

    fn index_conceptual(&mut self) {
        let Some(conceptual) = self.conceptual else {
            return;
        };
        for class in conceptual.classes.values() {
            let class_label = self.class_label(class);
            let anchor = self.anchors.anchor(CONCEPTUAL, &class_label, &class.iri);
            self.conceptual_anchors.insert(class.iri.clone(), anchor);
            for property in &class.properties {
                let label = format!("{}-{}", class_label, self.conceptual_property_label(property));
                let anchor = self
                    .anchors
                    .anchor(CONCEPTUAL, &label, &format!("{} {}", class.iri, property.iri));
                self.conceptual_anchors.insert(property.iri.clone(), anchor);
            }
        }
    }

    fn select(&self, text: &'a LanguageString) -> Option<&'a str> {
        text.select(self.languages)
    }

    fn class_label(&self, class: &'a ConceptualClass) -> String {
        self.select(&class.human_label)
            .unwrap_or_else(|| last_segment(&class.iri))
            .to_string()
    }

    fn conceptual_property_label(&self, property: &'a ConceptualProperty) -> String {
        self.select(&property.human_label)
            .unwrap_or_else(|| last_segment(&property.iri))
            .to_string()
    }

    pub fn adapt(&self, schemas: &[DocumentedSchema<'_>]) -> ModelResult<Document> {
        let mut document = Document {
            title: self.anchors_title(),
            ..Default::default()
        };
        if let Some(description) = self.conceptual.and_then(|model| self.select(&model.human_description)) {
            document.blocks.push(Block::Paragraph(vec![Inline::text(description)]));
        }
        if let Some(conceptual) = self.conceptual {
            document.sections.push(self.conceptual_section(conceptual));
        }
        for schema in schemas {
            document.sections.push(self.structural_section(schema)?);
        }
        Ok(document)
    }

    fn anchors_title(&self) -> String {
        self.select(&self.specification.label)
            .unwrap_or_else(|| last_segment(&self.specification.iri))
            .to_string()
    }

    // =========================================================================
    // Conceptual model
    // =========================================================================

    fn conceptual_section(&self, conceptual: &'a ConceptualModel) -> Section {
        let mut section = Section::new("Conceptual model");
        for class in conceptual.classes.values() {
            section.sections.push(self.conceptual_class_section(conceptual, class));
        }
        section
    }

    fn conceptual_class_section(&self, conceptual: &'a ConceptualModel, class: &'a ConceptualClass) -> Section {
        let mut section = Section::new(self.class_label(class));
        if let Some(anchor) = self.conceptual_anchors.get(&class.iri) {
            section = section.with_anchor(anchor.clone());
        }
        if let Some(description) = self.select(&class.human_description) {
            section.blocks.push(Block::Paragraph(vec![Inline::text(description)]));
        }

        let mut facts = vec![vec![Inline::text("IRI: "), Inline::Code(class.iri.clone())]];
        if let Some(concept) = &class.concept_iri {
            facts.push(vec![Inline::text("Concept: "), Inline::link(concept.clone(), concept.clone())]);
        }
        if class.is_codelist {
            facts.push(vec![Inline::text("Codelist")]);
        }
        for parent in &class.extends {
            let label = conceptual
                .class(parent)
                .map(|parent| self.class_label(parent))
                .unwrap_or_else(|| last_segment(parent).to_string());
            facts.push(vec![Inline::text("Extends: "), self.conceptual_link(label, parent)]);
        }
        section.blocks.push(Block::List(facts));

        if !class.properties.is_empty() {
            let rows = class
                .properties
                .iter()
                .map(|property| {
                    let mut name = Vec::new();
                    if let Some(anchor) = self.conceptual_anchors.get(&property.iri) {
                        name.push(Inline::Anchor(anchor.clone()));
                    }
                    name.push(Inline::Strong(self.conceptual_property_label(property)));
                    let range = match &property.range {
                        ConceptualRange::Datatype(datatype) => vec![datatype_inline(datatype.as_deref())],
                        ConceptualRange::Class(target) => {
                            let label = conceptual
                                .class(target)
                                .map(|class| self.class_label(class))
                                .unwrap_or_else(|| last_segment(target).to_string());
                            vec![self.conceptual_link(label, target)]
                        }
                    };
                    vec![
                        name,
                        vec![Inline::text(self.select(&property.human_description).unwrap_or(""))],
                        vec![Inline::text(cardinality_text(property.cardinality))],
                        range,
                    ]
                })
                .collect();
            section.blocks.push(Block::Table {
                header: vec!["Property".into(), "Description".into(), "Cardinality".into(), "Range".into()],
                rows,
            });
        }
        section
    }

    fn conceptual_link(&self, label: String, iri: &str) -> Inline {
        match self.conceptual_anchors.get(iri) {
            Some(anchor) => Inline::local(label, anchor),
            None => Inline::text(label),
        }
    }

    // =========================================================================
    // Structural models
    // =========================================================================

    fn structural_section(&self, schema: &DocumentedSchema<'_>) -> ModelResult<Section> {
        let model = schema.model.as_ref();
        let format = schema.artefact.generator.as_str();
        let label = self
            .select(&model.human_label)
            .map(str::to_string)
            .or_else(|| model.technical_label.clone())
            .unwrap_or_else(|| last_segment(&model.iri).to_string());

        let mut section = Section::new(format!("{} ({})", label, format))
            .with_anchor(self.anchors.anchor(format, &label, &schema.artefact.iri));
        let href = path_relative(&self.artefact.output_path, &schema.artefact.output_path);
        section.blocks.push(Block::List(vec![vec![
            Inline::text("Artefact: "),
            Inline::link(last_segment(&schema.artefact.output_path), href),
        ]]));

        let mut roots = Vec::new();
        for root in model.root_classes()? {
            roots.push(vec![self.structural_link(format, root)]);
        }
        if !roots.is_empty() {
            section.blocks.push(Block::Paragraph(vec![Inline::text("Root classes:")]));
            section.blocks.push(Block::List(roots));
        }

        for class in model.classes.values().filter(|class| !model.is_foreign(class)) {
            section.sections.push(self.structural_class_section(format, model, class)?);
        }
        Ok(section)
    }

    fn structural_label(&self, class: &StructuralClass) -> String {
        self.select_owned(&class.human_label).unwrap_or_else(|| class.name().to_string())
    }

    fn select_owned(&self, text: &LanguageString) -> Option<String> {
        text.select(self.languages).map(str::to_string)
    }

    fn structural_anchor(&self, format: &str, class: &StructuralClass) -> String {
        self.anchors.anchor(format, &self.structural_label(class), &class.iri)
    }

    fn structural_link(&self, format: &str, class: &StructuralClass) -> Inline {
        Inline::local(self.structural_label(class), &self.structural_anchor(format, class))
    }

    fn structural_class_section(
        &self,
        format: &str,
        model: &StructuralModel,
        class: &StructuralClass,
    ) -> ModelResult<Section> {
        let mut section =
            Section::new(self.structural_label(class)).with_anchor(self.structural_anchor(format, class));
        if let Some(description) = self.select_owned(&class.human_description) {
            section.blocks.push(Block::Paragraph(vec![Inline::text(description)]));
        }

        let mut facts = vec![vec![Inline::text("Technical label: "), Inline::Code(class.name().to_string())]];
        if let Some(pim) = &class.pim_iri {
            let label = self
                .conceptual
                .and_then(|conceptual| conceptual.class(pim))
                .map(|conceptual_class| self.class_label(conceptual_class))
                .unwrap_or_else(|| last_segment(pim).to_string());
            facts.push(vec![Inline::text("Interpretation: "), self.conceptual_link(label, pim)]);
        }
        for parent in class.inherits_from.iter().filter_map(|parent| model.class(parent)) {
            facts.push(vec![Inline::text("Extends: "), self.structural_link(format, parent)]);
        }
        if class.is_codelist {
            facts.push(vec![Inline::text("Codelist")]);
        }
        section.blocks.push(Block::List(facts));

        if !class.properties.is_empty() {
            let mut rows = Vec::with_capacity(class.properties.len());
            for property in &class.properties {
                rows.push(self.structural_property_row(format, model, class, property)?);
            }
            section.blocks.push(Block::Table {
                header: vec![
                    "Property".into(),
                    "Technical label".into(),
                    "Cardinality".into(),
                    "Type".into(),
                    "Interpretation".into(),
                ],
                rows,
            });
        }
        Ok(section)
    }

    fn structural_property_row(
        &self,
        format: &str,
        model: &StructuralModel,
        class: &StructuralClass,
        property: &StructuralProperty,
    ) -> ModelResult<Vec<Vec<Inline>>> {
        let label = self
            .select_owned(&property.human_label)
            .unwrap_or_else(|| property.name().to_string());
        let anchor = self.anchors.anchor(
            format,
            &format!("{}-{}", self.structural_label(class), label),
            &format!("{} {}", class.iri, property.iri),
        );

        let mut types = Vec::new();
        match property.range()? {
            PropertyRange::Datatypes(datatypes) => {
                types.extend(datatypes.into_iter().map(datatype_inline));
            }
            PropertyRange::Classes(classes) => {
                for iri in classes {
                    let target = model.require_class(iri)?;
                    types.push(self.structural_link(format, target));
                }
            }
        }
        let types = intersperse(types);

        let mut interpretation = Vec::new();
        if let Some(pim) = &property.pim_iri {
            let label = self
                .conceptual
                .and_then(|conceptual| conceptual.property(pim))
                .map(|conceptual_property| self.conceptual_property_label(conceptual_property))
                .unwrap_or_else(|| last_segment(pim).to_string());
            interpretation.push(self.conceptual_link(label, pim));
        }
        if !property.path_to_origin.is_empty() {
            let path: Vec<&str> = property.path_to_origin.iter().map(|iri| last_segment(iri)).collect();
            interpretation.push(Inline::text(format!(" (through {})", path.join(" / "))));
        }

        Ok(vec![
            vec![Inline::Anchor(anchor), Inline::Strong(label)],
            vec![Inline::Code(property.name().to_string())],
            vec![Inline::text(cardinality_text(property.cardinality))],
            types,
            interpretation,
        ])
    }
}

fn intersperse(inlines: Vec<Inline>) -> Vec<Inline> {
    let mut joined = Vec::with_capacity(inlines.len() * 2);
    for (index, inline) in inlines.into_iter().enumerate() {
        if index > 0 {
            joined.push(Inline::text(", "));
        }
        joined.push(inline);
    }
    joined
}

fn datatype_inline(datatype: Option<&str>) -> Inline {
    match datatype {
        None => Inline::text("any"),
        Some(iri) => match KnownDatatype::from_iri(iri) {
            Some(known) => Inline::link(known.label(), iri),
            None => Inline::Code(iri.to_string()),
        },
    }
}

fn cardinality_text(cardinality: Option<Cardinality>) -> String {
    cardinality.map(|bounds| bounds.to_string()).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generator::documentation::writer::write_markdown;
    use crate::resource::LanguageString;
    use crate::transform::fixtures::*;

    fn specification() -> DataSpecification {
        DataSpecification {
            iri: "http://example.com/specification/tourism".into(),
            label: LanguageString::of("en", "Tourism"),
            ..Default::default()
        }
    }

    fn artefact(iri: &str, generator: &str, output_path: &str) -> ArtefactDescriptor {
        ArtefactDescriptor {
            iri: iri.into(),
            generator: generator.into(),
            output_path: output_path.into(),
            psm: Some("schema".into()),
            ..Default::default()
        }
    }

    #[test]
    fn test_structural_properties_link_to_conceptual_anchors() {
        let conceptual = conceptual(vec![conceptual_class(
            "pim/person",
            vec![conceptual_attribute("pim/name", Some(Cardinality::exactly_one()))],
        )]);

        let mut name = attribute("name");
        name.pim_iri = Some("pim/name".into());
        let mut person = structural_class("person", vec![name]);
        person.pim_iri = Some("pim/person".into());
        let model = Arc::new(model(vec![person], &["person"]));

        let specification = specification();
        let documentation = artefact("docs", "documentation", "tourism/index.md");
        let json = artefact("json", "json-schema", "tourism/person/schema.json");
        let languages = vec!["en".to_string()];
        let adapter = DocumentationAdapter::new(&specification, &documentation, Some(&conceptual), &languages).unwrap();
        let document = adapter
            .adapt(&[DocumentedSchema {
                artefact: &json,
                model,
            }])
            .unwrap();

        assert_eq!(document.title, "Tourism");
        assert_eq!(document.sections.len(), 2);
        let class_anchor = document.sections[0].sections[0].anchor.clone().unwrap();
        assert!(class_anchor.starts_with("conceptual-tourism-pim-person-"));

        let markdown = write_markdown(&document);
        assert!(markdown.contains("[schema.json](person/schema.json)"));
        assert!(markdown.contains(&format!("[pim/person](#{})", class_anchor)));
        assert!(markdown.contains("| 1..1 |"));
    }

    #[test]
    fn test_without_conceptual_model() {
        let specification = specification();
        let documentation = artefact("docs", "documentation", "index.md");
        let languages = vec!["cs".to_string()];
        let adapter = DocumentationAdapter::new(&specification, &documentation, None, &languages).unwrap();
        let document = adapter.adapt(&[]).unwrap();
        assert_eq!(document.title, "Tourism");
        assert!(document.sections.is_empty());
    }
}
