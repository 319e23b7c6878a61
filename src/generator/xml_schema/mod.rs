//! XML Schema generator
//!
//! Root classes become top-level elements. A property whose range lists
//! several classes is typed by a hierarchy of `xs:extension`s under a
//! single root type; a range class with more than one parent is rejected.
//! Classes of other specifications are pulled in through `xs:import`.

pub mod adapter;
pub mod model;
pub mod writer;

use async_trait::async_trait;
use std::collections::BTreeMap;

use super::{required_psm, ArtefactGenerator, GeneratorContext};
use crate::error::ModelResult;
use crate::output::OutputSink;
use crate::specification::{generators, ArtefactDescriptor, DataSpecification};

pub use adapter::XmlSchemaAdapter;
pub use model::{QName, XmlSchema};
pub use writer::write_xml_schema;

#[derive(Debug, Clone, Copy, Default)]
pub struct XmlSchemaGenerator;

#[async_trait]
impl ArtefactGenerator for XmlSchemaGenerator {
    fn identifier(&self) -> &'static str {
        generators::XML_SCHEMA
    }

    async fn generate_to_stream(
        &self,
        context: &GeneratorContext,
        artefact: &ArtefactDescriptor,
        _specification: &DataSpecification,
        sink: &dyn OutputSink,
    ) -> ModelResult<()> {
        let model = context.structural_model(required_psm(artefact)?).await?;
        let config = context.config_for(artefact)?;

        // Namespaces of imported schemas come from their own models
        let mut imported = BTreeMap::new();
        for class in model.classes.values().filter(|class| model.is_foreign(class)) {
            if imported.contains_key(&class.structure_schema)
                || context.foreign_artefact(class, generators::XML_SCHEMA).is_none()
            {
                continue;
            }
            let foreign = context.structural_model(&class.structure_schema).await?;
            imported.insert(class.structure_schema.clone(), foreign);
        }

        let schema = XmlSchemaAdapter::new(context, &model, artefact, &config.xml_schema, &imported).adapt()?;
        sink.write_path(&artefact.output_path, write_xml_schema(&schema)).await
    }
}
