use super::StructuralTransform;
use crate::conceptual::ConceptualModel;
use crate::error::ModelResult;
use crate::resource::LanguageString;
use crate::structural::StructuralModel;

/// Fills missing labels, descriptions and concept IRIs from the conceptual
/// counterpart. Values set on the structural entity are kept.
#[derive(Debug, Clone, Copy, Default)]
pub struct LabelPropagation;

fn fill(target: &mut LanguageString, source: &LanguageString) {
    if target.is_empty() {
        *target = source.clone();
    }
}

impl StructuralTransform for LabelPropagation {
    fn name(&self) -> &'static str {
        "label-propagation"
    }

    fn apply(&self, conceptual: &ConceptualModel, mut model: StructuralModel) -> ModelResult<StructuralModel> {
        for class in model.classes.values_mut() {
            if let Some(pim_class) = class.pim_iri.as_deref().and_then(|pim| conceptual.class(pim)) {
                fill(&mut class.human_label, &pim_class.human_label);
                fill(&mut class.human_description, &pim_class.human_description);
                if class.cim_iri.is_none() {
                    class.cim_iri = pim_class.concept_iri.clone();
                }
            }
            for property in &mut class.properties {
                let Some(pim_property) = property.pim_iri.as_deref().and_then(|pim| conceptual.property(pim))
                else {
                    continue;
                };
                fill(&mut property.human_label, &pim_property.human_label);
                fill(&mut property.human_description, &pim_property.human_description);
                if property.cim_iri.is_none() {
                    property.cim_iri = pim_property.concept_iri.clone();
                }
            }
        }
        Ok(model)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transform::fixtures::*;

    #[test]
    fn test_keeps_explicit_labels() {
        let mut labelled = attribute("labelled");
        labelled.pim_iri = Some("pim-a".into());
        labelled.human_label = LanguageString::of("en", "Own label");
        let mut unlabelled = attribute("unlabelled");
        unlabelled.pim_iri = Some("pim-a".into());
        let mut class = structural_class("c", vec![labelled, unlabelled]);
        class.pim_iri = Some("pim-c".into());

        let conceptual = conceptual(vec![conceptual_class(
            "pim-c",
            vec![conceptual_attribute("pim-a", None)],
        )]);
        let result = LabelPropagation.apply(&conceptual, model(vec![class], &[])).unwrap();

        let class = &result.classes["c"];
        assert_eq!(class.human_label.get("en"), Some("pim-c"));
        assert_eq!(class.cim_iri.as_deref(), Some("pim-c/concept"));
        assert_eq!(class.properties[0].human_label.get("en"), Some("Own label"));
        assert_eq!(class.properties[0].human_description.get("en"), Some("described"));
        assert_eq!(class.properties[1].human_label.get("en"), Some("pim-a"));
    }
}
