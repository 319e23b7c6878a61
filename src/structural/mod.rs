//! Structural model
//!
//! The concrete, per-schema shape that generators consume. Classes live in an
//! IRI-keyed map and properties refer to classes by IRI, so recursive and
//! cross-schema structures need no shared pointers. The model is rebuilt for
//! every generation run.

mod builder;

use std::collections::BTreeMap;

use crate::error::{ModelError, ModelResult};
use crate::resource::{Cardinality, Iri, LanguageString};

pub use builder::build_structural_model;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct StructuralModel {
    pub iri: Iri,
    pub human_label: LanguageString,
    pub human_description: LanguageString,
    pub technical_label: Option<String>,
    pub roots: Vec<Iri>,
    pub classes: BTreeMap<Iri, StructuralClass>,
    /// Specification that owns this schema, once linked
    pub specification: Option<Iri>,
    pub namespace: Option<String>,
    pub namespace_prefix: Option<String>,
}

impl StructuralModel {
    pub fn class(&self, iri: &str) -> Option<&StructuralClass> {
        self.classes.get(iri)
    }

    /// Class that must exist in this model
    pub fn require_class(&self, iri: &str) -> ModelResult<&StructuralClass> {
        self.class(iri)
            .ok_or_else(|| ModelError::MissingResource(iri.to_string()))
    }

    pub fn root_classes(&self) -> ModelResult<Vec<&StructuralClass>> {
        self.roots.iter().map(|iri| self.require_class(iri)).collect()
    }

    /// Class defined by another structural schema
    pub fn is_foreign(&self, class: &StructuralClass) -> bool {
        class.structure_schema != self.iri
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct StructuralClass {
    pub iri: Iri,
    /// Interpreted conceptual class; `None` means no interpretation
    pub pim_iri: Option<Iri>,
    pub cim_iri: Option<Iri>,
    pub human_label: LanguageString,
    pub human_description: LanguageString,
    pub technical_label: Option<String>,
    pub is_codelist: bool,
    pub extends: Vec<Iri>,
    /// Former parents, kept once inheritance is flattened into `properties`
    pub inherits_from: Vec<Iri>,
    pub properties: Vec<StructuralProperty>,
    /// Structural schema that defines the class
    pub structure_schema: Iri,
    pub specification: Option<Iri>,
    /// Pulled in through a class reference
    pub is_referenced: bool,
}

impl StructuralClass {
    /// Technical label, falling back to the last IRI segment
    pub fn name(&self) -> &str {
        self.technical_label
            .as_deref()
            .unwrap_or_else(|| last_segment(&self.iri))
    }

    /// Properties declared on this class rather than inherited
    pub fn own_properties<'a>(&'a self, model: &'a StructuralModel) -> impl Iterator<Item = &'a StructuralProperty> {
        self.properties.iter().filter(move |property| {
            !self
                .inherits_from
                .iter()
                .filter_map(|parent| model.class(parent))
                .any(|parent| parent.properties.iter().any(|inherited| inherited.iri == property.iri))
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct StructuralProperty {
    pub iri: Iri,
    pub pim_iri: Option<Iri>,
    pub cim_iri: Option<Iri>,
    pub human_label: LanguageString,
    pub human_description: LanguageString,
    pub technical_label: Option<String>,
    /// Explicit bounds; `None` until stated or propagated
    pub cardinality: Option<Cardinality>,
    pub data_types: Vec<PropertyType>,
    pub dematerialize: bool,
    /// Dematerialized properties this one was inlined through, outermost first
    pub path_to_origin: Vec<Iri>,
}

impl StructuralProperty {
    pub fn name(&self) -> &str {
        self.technical_label
            .as_deref()
            .unwrap_or_else(|| last_segment(&self.iri))
    }

    /// Stated bounds or `[0, *]`
    pub fn effective_cardinality(&self) -> Cardinality {
        self.cardinality.unwrap_or_default()
    }

    /// Classify the range, rejecting empty and mixed ranges
    pub fn range(&self) -> ModelResult<PropertyRange<'_>> {
        if self.data_types.is_empty() {
            return Err(ModelError::incomplete(&self.iri, "has no data type"));
        }
        let mut datatypes = Vec::new();
        let mut classes = Vec::new();
        for data_type in &self.data_types {
            match data_type {
                PropertyType::Attribute { datatype } => datatypes.push(datatype.as_deref()),
                PropertyType::Association { class } => classes.push(class.as_str()),
            }
        }
        match (datatypes.is_empty(), classes.is_empty()) {
            (false, false) => Err(ModelError::AmbiguousPropertyRange(self.iri.clone())),
            (true, _) => Ok(PropertyRange::Classes(classes)),
            (false, true) => Ok(PropertyRange::Datatypes(datatypes)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PropertyType {
    Attribute { datatype: Option<Iri> },
    Association { class: Iri },
}

/// Validated range of a property
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PropertyRange<'a> {
    /// Primitive datatype IRIs; `None` is an untyped attribute
    Datatypes(Vec<Option<&'a str>>),
    Classes(Vec<&'a str>),
}

pub(crate) fn last_segment(iri: &str) -> &str {
    iri.trim_end_matches('/')
        .rsplit(['/', '#'])
        .next()
        .unwrap_or(iri)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn property(data_types: Vec<PropertyType>) -> StructuralProperty {
        StructuralProperty {
            iri: "http://x/psm-attribute/1".into(),
            pim_iri: None,
            cim_iri: None,
            human_label: LanguageString::new(),
            human_description: LanguageString::new(),
            technical_label: None,
            cardinality: None,
            data_types,
            dematerialize: false,
            path_to_origin: Vec::new(),
        }
    }

    #[test]
    fn test_empty_range_is_incomplete() {
        assert!(matches!(property(vec![]).range(), Err(ModelError::IncompleteModel { .. })));
    }

    #[test]
    fn test_mixed_range_is_ambiguous() {
        let mixed = property(vec![
            PropertyType::Attribute { datatype: None },
            PropertyType::Association { class: "c".into() },
        ]);
        assert!(matches!(mixed.range(), Err(ModelError::AmbiguousPropertyRange(_))));
    }

    #[test]
    fn test_name_falls_back_to_iri() {
        let unnamed = property(vec![PropertyType::Attribute { datatype: None }]);
        assert_eq!(unnamed.name(), "1");
        assert_eq!(unnamed.effective_cardinality(), Cardinality::new(0, None));
    }
}
