//! Data specifications and artefact descriptors
//!
//! A specification groups one conceptual schema with the structural schemas
//! published from it, and lists the artefacts generated for them.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::resource::{Iri, LanguageString};

/// Generator identifiers of the built-in generators
pub mod generators {
    pub const JSON_SCHEMA: &str = "json-schema";
    pub const XML_SCHEMA: &str = "xml-schema";
    pub const CSV_SCHEMA: &str = "csv-schema";
    pub const DOCUMENTATION: &str = "documentation";
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataSpecification {
    pub iri: Iri,
    #[serde(default)]
    pub label: LanguageString,
    #[serde(default)]
    pub conceptual_schema: Option<Iri>,
    #[serde(default)]
    pub structural_schemas: Vec<Iri>,
    /// Specifications whose classes this one may reference
    #[serde(default)]
    pub imported_specifications: Vec<Iri>,
    #[serde(default)]
    pub artefacts: Vec<ArtefactDescriptor>,
}

impl DataSpecification {
    pub fn artefact(&self, iri: &str) -> Option<&ArtefactDescriptor> {
        self.artefacts.iter().find(|artefact| artefact.iri == iri)
    }

    /// Artefact produced by `generator` for structural schema `psm`
    pub fn artefact_for(&self, psm: &str, generator: &str) -> Option<&ArtefactDescriptor> {
        self.artefacts
            .iter()
            .find(|artefact| artefact.generator == generator && artefact.psm.as_deref() == Some(psm))
    }

    pub fn owns_schema(&self, psm: &str) -> bool {
        self.structural_schemas.iter().any(|schema| schema == psm)
    }
}

/// One generated document
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArtefactDescriptor {
    pub iri: Iri,
    /// Identifier of the generator that renders it
    pub generator: String,
    /// Logical path handed to the output sink
    pub output_path: String,
    /// Where the artefact is published; used for cross-document references
    #[serde(default)]
    pub public_url: String,
    /// Structural schema rendered, for schema artefacts
    #[serde(default)]
    pub psm: Option<Iri>,
    /// Artefacts that must exist before this one
    #[serde(default)]
    pub depends_on: Vec<Iri>,
    /// Generator options, overriding configuration defaults
    #[serde(default)]
    pub configuration: serde_json::Value,
}

/// Resolved specifications keyed by IRI
pub type Specifications = BTreeMap<Iri, DataSpecification>;

pub fn index_specifications(specifications: Vec<DataSpecification>) -> Specifications {
    specifications
        .into_iter()
        .map(|specification| (specification.iri.clone(), specification))
        .collect()
}

// =============================================================================
// Artefact Configurator
// =============================================================================

/// Derives the default artefact set of a specification
#[derive(Debug, Clone)]
pub struct ArtefactConfigurator {
    base_url: String,
}

impl ArtefactConfigurator {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
        }
    }

    /// JSON, XML and CSV schemas for every structural schema, plus one
    /// documentation artefact that depends on all of them
    pub fn default_artefacts(&self, specification: &DataSpecification) -> Vec<ArtefactDescriptor> {
        let spec_dir = slug(crate::structural::last_segment(&specification.iri));
        let mut artefacts = Vec::new();

        for psm in &specification.structural_schemas {
            let schema_dir = format!("{}/{}", spec_dir, slug(crate::structural::last_segment(psm)));
            for (generator, file) in [
                (generators::JSON_SCHEMA, "schema.json"),
                (generators::XML_SCHEMA, "schema.xsd"),
                (generators::CSV_SCHEMA, "schema.csv-metadata.json"),
            ] {
                let output_path = format!("{}/{}", schema_dir, file);
                artefacts.push(ArtefactDescriptor {
                    iri: format!("{}#{}", psm, generator),
                    generator: generator.to_string(),
                    public_url: self.public_url(&output_path),
                    output_path,
                    psm: Some(psm.clone()),
                    depends_on: Vec::new(),
                    configuration: serde_json::Value::Null,
                });
            }
        }

        let output_path = format!("{}/index.md", spec_dir);
        let depends_on = artefacts.iter().map(|artefact| artefact.iri.clone()).collect();
        artefacts.push(ArtefactDescriptor {
            iri: format!("{}#{}", specification.iri, generators::DOCUMENTATION),
            generator: generators::DOCUMENTATION.to_string(),
            public_url: self.public_url(&output_path),
            output_path,
            psm: None,
            depends_on,
            configuration: serde_json::Value::Null,
        });
        artefacts
    }

    fn public_url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url.trim_end_matches('/'), path)
    }
}

fn slug(text: &str) -> String {
    text.chars()
        .map(|c| if c.is_alphanumeric() { c.to_ascii_lowercase() } else { '-' })
        .collect()
}

/// Path of `to` relative to the directory containing `from`.
/// Both are logical, `/`-separated paths.
pub fn path_relative(from: &str, to: &str) -> String {
    let from_dir: Vec<&str> = {
        let mut segments: Vec<&str> = from.split('/').filter(|s| !s.is_empty()).collect();
        segments.pop();
        segments
    };
    let target: Vec<&str> = to.split('/').filter(|s| !s.is_empty()).collect();
    let common = from_dir
        .iter()
        .zip(target.iter())
        .take_while(|(a, b)| a == b)
        .count();

    let mut relative: Vec<&str> = std::iter::repeat("..").take(from_dir.len() - common).collect();
    relative.extend(&target[common..]);
    relative.join("/")
}
