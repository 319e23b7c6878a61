//! Conceptual model
//!
//! Specification-independent classes and properties. Built read-only from
//! conceptual resources by [`build_conceptual_model`]; holds no state of its
//! own and is rebuilt whenever the resources change.

mod builder;

use std::collections::BTreeMap;

use crate::resource::{Cardinality, Iri, LanguageString};

pub use builder::build_conceptual_model;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConceptualModel {
    /// Conceptual schema the model was built from; `None` for the empty model
    pub iri: Option<Iri>,
    pub human_label: LanguageString,
    pub human_description: LanguageString,
    pub classes: BTreeMap<Iri, ConceptualClass>,
}

impl ConceptualModel {
    /// Model used when a specification has no conceptual schema
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn class(&self, iri: &str) -> Option<&ConceptualClass> {
        self.classes.get(iri)
    }

    pub fn property(&self, iri: &str) -> Option<&ConceptualProperty> {
        self.classes
            .values()
            .flat_map(|class| class.properties.iter())
            .find(|property| property.iri == iri)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ConceptualClass {
    pub iri: Iri,
    pub concept_iri: Option<Iri>,
    pub human_label: LanguageString,
    pub human_description: LanguageString,
    pub is_codelist: bool,
    /// Parents; several are allowed at this level
    pub extends: Vec<Iri>,
    pub properties: Vec<ConceptualProperty>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ConceptualProperty {
    pub iri: Iri,
    pub concept_iri: Option<Iri>,
    pub human_label: LanguageString,
    pub human_description: LanguageString,
    pub cardinality: Option<Cardinality>,
    pub range: ConceptualRange,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConceptualRange {
    /// Attribute, optionally typed with a datatype IRI
    Datatype(Option<Iri>),
    /// Association end pointing at a class
    Class(Iri),
}
