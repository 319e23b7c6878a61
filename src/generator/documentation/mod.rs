//! Documentation generator
//!
//! Renders a Markdown page for the whole specification: the conceptual
//! model first, then one section for every schema artefact the
//! documentation depends on. Classes and properties get stable anchors so
//! the sections can link into each other.

pub mod adapter;
pub mod anchor;
pub mod model;
pub mod writer;

use async_trait::async_trait;
use tracing::debug;

use super::{ArtefactGenerator, GeneratorContext};
use crate::error::{ModelError, ModelResult};
use crate::output::OutputSink;
use crate::specification::{generators, ArtefactDescriptor, DataSpecification};

pub use adapter::{DocumentationAdapter, DocumentedSchema};
pub use anchor::AnchorBuilder;
pub use model::{Block, Document, Inline, Section};
pub use writer::write_markdown;

#[derive(Debug, Clone, Copy, Default)]
pub struct DocumentationGenerator;

#[async_trait]
impl ArtefactGenerator for DocumentationGenerator {
    fn identifier(&self) -> &'static str {
        generators::DOCUMENTATION
    }

    async fn generate_to_stream(
        &self,
        context: &GeneratorContext,
        artefact: &ArtefactDescriptor,
        specification: &DataSpecification,
        sink: &dyn OutputSink,
    ) -> ModelResult<()> {
        let config = context.config_for(artefact)?;

        let mut schemas = Vec::new();
        for dependency in &artefact.depends_on {
            let documented = specification
                .artefact(dependency)
                .ok_or_else(|| ModelError::MissingArtefact(dependency.clone()))?;
            let Some(psm) = &documented.psm else {
                debug!(artefact = %dependency, "Dependency has no structural schema to document");
                continue;
            };
            schemas.push(DocumentedSchema {
                artefact: documented,
                model: context.structural_model(psm).await?,
            });
        }

        let document = DocumentationAdapter::new(
            specification,
            artefact,
            context.conceptual_model(&specification.iri),
            &config.documentation.languages,
        )?
        .adapt(&schemas)?;
        sink.write_path(&artefact.output_path, write_markdown(&document)).await
    }
}
