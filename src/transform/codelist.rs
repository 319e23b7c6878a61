use super::StructuralTransform;
use crate::conceptual::ConceptualModel;
use crate::error::ModelResult;
use crate::structural::StructuralModel;

/// Marks structural classes whose conceptual class is a codelist
#[derive(Debug, Clone, Copy, Default)]
pub struct CodelistMarking;

impl StructuralTransform for CodelistMarking {
    fn name(&self) -> &'static str {
        "codelist-marking"
    }

    fn apply(&self, conceptual: &ConceptualModel, mut model: StructuralModel) -> ModelResult<StructuralModel> {
        for class in model.classes.values_mut() {
            let is_codelist = class
                .pim_iri
                .as_deref()
                .and_then(|pim| conceptual.class(pim))
                .map_or(false, |pim_class| pim_class.is_codelist);
            class.is_codelist |= is_codelist;
        }
        Ok(model)
    }
}
