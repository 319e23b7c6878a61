use super::StructuralTransform;
use crate::conceptual::ConceptualModel;
use crate::error::ModelResult;
use crate::structural::StructuralModel;

/// Copies conceptual bounds onto structural properties that state none.
/// Explicit structural bounds always win.
#[derive(Debug, Clone, Copy, Default)]
pub struct CardinalityPropagation;

impl StructuralTransform for CardinalityPropagation {
    fn name(&self) -> &'static str {
        "cardinality-propagation"
    }

    fn apply(&self, conceptual: &ConceptualModel, mut model: StructuralModel) -> ModelResult<StructuralModel> {
        for property in model
            .classes
            .values_mut()
            .flat_map(|class| class.properties.iter_mut())
            .filter(|property| property.cardinality.is_none())
        {
            property.cardinality = property
                .pim_iri
                .as_deref()
                .and_then(|pim| conceptual.property(pim))
                .and_then(|pim_property| pim_property.cardinality);
        }
        Ok(model)
    }
}
