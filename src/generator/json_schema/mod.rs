//! JSON Schema generator
//!
//! Roots become the top-level schema (`anyOf` for several roots). Classes
//! are inlined, codelists become IRI strings, classes of other
//! specifications become `$ref`s to their published schema, and a class
//! reached again while being inlined moves to `$defs`.

pub mod adapter;
pub mod model;
pub mod writer;

use async_trait::async_trait;

use super::{required_psm, ArtefactGenerator, GeneratorContext};
use crate::error::ModelResult;
use crate::output::OutputSink;
use crate::specification::{generators, ArtefactDescriptor, DataSpecification};

pub use adapter::JsonSchemaAdapter;
pub use model::{JsonDefinition, JsonKind, JsonSchema};
pub use writer::write_json_schema;

#[derive(Debug, Clone, Copy, Default)]
pub struct JsonSchemaGenerator;

#[async_trait]
impl ArtefactGenerator for JsonSchemaGenerator {
    fn identifier(&self) -> &'static str {
        generators::JSON_SCHEMA
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
        let schema = JsonSchemaAdapter::new(context, &model, artefact, &config).adapt()?;
        let content = context.format().render(&write_json_schema(&schema))?;
        sink.write_path(&artefact.output_path, content).await
    }
}
