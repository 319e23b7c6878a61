//! CSV Schema generator
//!
//! Emits CSV on the Web table metadata for a structural schema with a
//! single root class, as one denormalized table or as one table per class
//! depending on the configured [`TableLayout`](crate::config::TableLayout).

pub mod adapter;
pub mod model;

use async_trait::async_trait;

use super::{required_psm, ArtefactGenerator, GeneratorContext};
use crate::error::ModelResult;
use crate::output::OutputSink;
use crate::specification::{generators, ArtefactDescriptor, DataSpecification};

pub use adapter::CsvSchemaAdapter;
pub use model::{Column, CsvSchema, Table};

#[derive(Debug, Clone, Copy, Default)]
pub struct CsvSchemaGenerator;

#[async_trait]
impl ArtefactGenerator for CsvSchemaGenerator {
    fn identifier(&self) -> &'static str {
        generators::CSV_SCHEMA
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
        let schema = CsvSchemaAdapter::new(&model, artefact, &config).adapt()?;
        let content = context.format().render(&serde_json::to_value(&schema)?)?;
        sink.write_path(&artefact.output_path, content).await
    }
}
