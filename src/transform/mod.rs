//! Structural model transformation pipeline
//!
//! An ordered list of passes. Each pass takes the conceptual model and a
//! structural model by value and returns the transformed model; a failing
//! pass aborts the run. Later passes rely on the invariants of earlier ones,
//! so the default order is fixed:
//!
//! 1. codelist marking
//! 2. cardinality propagation
//! 3. codelist marking, again
//! 4. label propagation
//! 5. inheritance flattening
//! 6. dematerialization
//! 7. specification linking (only with a specification list)

mod cardinality;
mod codelist;
mod dematerialize;
mod inheritance;
mod label;
mod linking;

use std::sync::Arc;
use tracing::debug;

use crate::cancel::CancellationToken;
use crate::conceptual::ConceptualModel;
use crate::error::ModelResult;
use crate::specification::Specifications;
use crate::structural::StructuralModel;

pub use cardinality::CardinalityPropagation;
pub use codelist::CodelistMarking;
pub use dematerialize::Dematerialization;
pub use inheritance::InheritanceFlattening;
pub use label::LabelPropagation;
pub use linking::SpecificationLinking;

/// One pass over a structural model
pub trait StructuralTransform: Send + Sync {
    fn name(&self) -> &'static str;

    fn apply(&self, conceptual: &ConceptualModel, model: StructuralModel) -> ModelResult<StructuralModel>;
}

pub struct TransformationPipeline {
    passes: Vec<Box<dyn StructuralTransform>>,
}

impl TransformationPipeline {
    pub fn empty() -> Self {
        Self { passes: Vec::new() }
    }

    /// Append a pass
    pub fn then(mut self, pass: impl StructuralTransform + 'static) -> Self {
        self.passes.push(Box::new(pass));
        self
    }

    /// Default passes followed by cross-specification linking
    pub fn with_specifications(specifications: Arc<Specifications>) -> Self {
        Self::default().then(SpecificationLinking::new(specifications))
    }

    pub fn pass_names(&self) -> Vec<&'static str> {
        self.passes.iter().map(|pass| pass.name()).collect()
    }

    /// Run every pass in order, checking for cancellation before each
    pub fn run(
        &self,
        conceptual: &ConceptualModel,
        model: StructuralModel,
        cancel: &CancellationToken,
    ) -> ModelResult<StructuralModel> {
        let mut model = model;
        for pass in &self.passes {
            cancel.check()?;
            debug!(pass = pass.name(), schema = %model.iri, "Running transformation");
            model = pass.apply(conceptual, model)?;
        }
        Ok(model)
    }
}

impl Default for TransformationPipeline {
    fn default() -> Self {
        Self::empty()
            .then(CodelistMarking)
            .then(CardinalityPropagation)
            .then(CodelistMarking)
            .then(LabelPropagation)
            .then(InheritanceFlattening)
            .then(Dematerialization)
    }
}

impl std::fmt::Debug for TransformationPipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.pass_names()).finish()
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use std::collections::BTreeMap;

    use crate::conceptual::{ConceptualClass, ConceptualModel, ConceptualProperty, ConceptualRange};
    use crate::resource::{Cardinality, LanguageString};
    use crate::structural::{PropertyType, StructuralClass, StructuralModel, StructuralProperty};

    pub fn structural_class(iri: &str, properties: Vec<StructuralProperty>) -> StructuralClass {
        StructuralClass {
            iri: iri.into(),
            pim_iri: None,
            cim_iri: None,
            human_label: LanguageString::new(),
            human_description: LanguageString::new(),
            technical_label: Some(iri.into()),
            is_codelist: false,
            extends: Vec::new(),
            inherits_from: Vec::new(),
            properties,
            structure_schema: "schema".into(),
            specification: None,
            is_referenced: false,
        }
    }

    pub fn attribute(iri: &str) -> StructuralProperty {
        StructuralProperty {
            iri: iri.into(),
            pim_iri: None,
            cim_iri: None,
            human_label: LanguageString::new(),
            human_description: LanguageString::new(),
            technical_label: Some(iri.into()),
            cardinality: None,
            data_types: vec![PropertyType::Attribute { datatype: None }],
            dematerialize: false,
            path_to_origin: Vec::new(),
        }
    }

    pub fn association(iri: &str, class: &str) -> StructuralProperty {
        StructuralProperty {
            data_types: vec![PropertyType::Association { class: class.into() }],
            ..attribute(iri)
        }
    }

    pub fn model(classes: Vec<StructuralClass>, roots: &[&str]) -> StructuralModel {
        StructuralModel {
            iri: "schema".into(),
            roots: roots.iter().map(|root| root.to_string()).collect(),
            classes: classes.into_iter().map(|class| (class.iri.clone(), class)).collect(),
            ..Default::default()
        }
    }

    pub fn conceptual_class(iri: &str, properties: Vec<ConceptualProperty>) -> ConceptualClass {
        ConceptualClass {
            iri: iri.into(),
            concept_iri: Some(format!("{}/concept", iri)),
            human_label: LanguageString::of("en", iri),
            human_description: LanguageString::new(),
            is_codelist: false,
            extends: Vec::new(),
            properties,
        }
    }

    pub fn conceptual_attribute(iri: &str, cardinality: Option<Cardinality>) -> ConceptualProperty {
        ConceptualProperty {
            iri: iri.into(),
            concept_iri: None,
            human_label: LanguageString::of("en", iri),
            human_description: LanguageString::of("en", "described"),
            cardinality,
            range: ConceptualRange::Datatype(None),
        }
    }

    pub fn conceptual(classes: Vec<ConceptualClass>) -> ConceptualModel {
        ConceptualModel {
            iri: Some("pim".into()),
            classes: classes
                .into_iter()
                .map(|class| (class.iri.clone(), class))
                .collect::<BTreeMap<_, _>>(),
            ..Default::default()
        }
    }
}
