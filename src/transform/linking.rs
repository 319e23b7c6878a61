use std::sync::Arc;
use tracing::warn;

use super::StructuralTransform;
use crate::conceptual::ConceptualModel;
use crate::error::ModelResult;
use crate::resource::Iri;
use crate::specification::Specifications;
use crate::structural::StructuralModel;

/// Records, for the model and each of its classes, the specification that
/// publishes the defining structural schema. Generators use it to reference
/// classes of other specifications instead of inlining them.
#[derive(Debug, Clone)]
pub struct SpecificationLinking {
    specifications: Arc<Specifications>,
}

impl SpecificationLinking {
    pub fn new(specifications: Arc<Specifications>) -> Self {
        Self { specifications }
    }

    fn owner_of(&self, psm: &str) -> Option<Iri> {
        self.specifications
            .values()
            .find(|specification| specification.owns_schema(psm))
            .map(|specification| specification.iri.clone())
    }
}

impl StructuralTransform for SpecificationLinking {
    fn name(&self) -> &'static str {
        "specification-linking"
    }

    fn apply(&self, _conceptual: &ConceptualModel, mut model: StructuralModel) -> ModelResult<StructuralModel> {
        model.specification = self.owner_of(&model.iri);
        for class in model.classes.values_mut() {
            class.specification = self.owner_of(&class.structure_schema);
            if class.specification.is_none() && class.structure_schema != model.iri {
                warn!(
                    class = %class.iri,
                    schema = %class.structure_schema,
                    "Referenced schema belongs to no known specification"
                );
            }
        }
        Ok(model)
    }
}
