//! Artefact generation
//!
//! A [`Generator`] resolves the models of one run from a single store
//! snapshot, then hands each artefact to the [`ArtefactGenerator`] registered
//! for its generator identifier. Every format generator builds its own tree,
//! serializes it to a string and writes it once to the [`OutputSink`].

pub mod csv_schema;
pub mod documentation;
pub mod json_schema;
pub mod xml_schema;

use async_trait::async_trait;
use petgraph::algo::toposort;
use petgraph::graph::DiGraph;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::cancel::CancellationToken;
use crate::conceptual::{build_conceptual_model, ConceptualModel};
use crate::config::{GenerationConfig, OutputFormat};
use crate::error::{ModelError, ModelResult};
use crate::output::OutputSink;
use crate::resource::Iri;
use crate::specification::{ArtefactDescriptor, DataSpecification, Specifications};
use crate::store::{ReadOnlyMemoryStore, ResourceReader};
use crate::structural::{build_structural_model, StructuralClass, StructuralModel};
use crate::transform::TransformationPipeline;

pub use csv_schema::CsvSchemaGenerator;
pub use documentation::DocumentationGenerator;
pub use json_schema::JsonSchemaGenerator;
pub use xml_schema::XmlSchemaGenerator;

/// One output format
#[async_trait]
pub trait ArtefactGenerator: Send + Sync {
    /// Value of [`ArtefactDescriptor::generator`] this generator handles
    fn identifier(&self) -> &'static str;

    async fn generate_to_stream(
        &self,
        context: &GeneratorContext,
        artefact: &ArtefactDescriptor,
        specification: &DataSpecification,
        sink: &dyn OutputSink,
    ) -> ModelResult<()>;
}

// =============================================================================
// Generator Context
// =============================================================================

/// Everything a generation run reads. Built once per run from one snapshot.
pub struct GeneratorContext {
    reader: ReadOnlyMemoryStore,
    specifications: Arc<Specifications>,
    /// Keyed by specification IRI
    conceptual_models: BTreeMap<Iri, ConceptualModel>,
    /// Transformed structural models keyed by structural schema IRI
    structural_models: Mutex<BTreeMap<Iri, Arc<StructuralModel>>>,
    pipeline: TransformationPipeline,
    config: GenerationConfig,
    format: OutputFormat,
    cancel: CancellationToken,
}

impl GeneratorContext {
    /// Build the conceptual model of every specification that has one
    pub async fn prepare(
        reader: ReadOnlyMemoryStore,
        specifications: Arc<Specifications>,
        config: GenerationConfig,
        cancel: CancellationToken,
    ) -> ModelResult<Self> {
        let mut conceptual_models = BTreeMap::new();
        for specification in specifications.values() {
            cancel.check()?;
            if let Some(pim) = &specification.conceptual_schema {
                let model = build_conceptual_model(&reader, pim).await?;
                conceptual_models.insert(specification.iri.clone(), model);
            }
        }
        Ok(Self {
            reader,
            pipeline: TransformationPipeline::with_specifications(specifications.clone()),
            specifications,
            conceptual_models,
            structural_models: Mutex::new(BTreeMap::new()),
            config,
            format: OutputFormat::default(),
            cancel,
        })
    }

    pub fn with_format(mut self, format: OutputFormat) -> Self {
        self.format = format;
        self
    }

    pub fn specifications(&self) -> &Specifications {
        &self.specifications
    }

    pub fn specification(&self, iri: &str) -> ModelResult<&DataSpecification> {
        self.specifications
            .get(iri)
            .ok_or_else(|| ModelError::MissingSpecification(iri.to_string()))
    }

    pub fn conceptual_model(&self, specification: &str) -> Option<&ConceptualModel> {
        self.conceptual_models.get(specification)
    }

    pub fn cancel(&self) -> &CancellationToken {
        &self.cancel
    }

    pub fn format(&self) -> OutputFormat {
        self.format
    }

    /// Generation defaults overridden by the artefact's own configuration
    pub fn config_for(&self, artefact: &ArtefactDescriptor) -> ModelResult<GenerationConfig> {
        self.config.with_overrides(&artefact.configuration)
    }

    /// Transformed structural model of `psm`, built on first use
    pub async fn structural_model(&self, psm: &str) -> ModelResult<Arc<StructuralModel>> {
        let mut models = self.structural_models.lock().await;
        if let Some(model) = models.get(psm) {
            return Ok(model.clone());
        }

        self.cancel.check()?;
        let model = build_structural_model(&self.reader, psm).await?;
        let empty = ConceptualModel::empty();
        let conceptual = self
            .specifications
            .values()
            .find(|specification| specification.owns_schema(psm))
            .and_then(|specification| self.conceptual_models.get(&specification.iri))
            .unwrap_or(&empty);
        let model = Arc::new(self.pipeline.run(conceptual, model, &self.cancel)?);

        debug!(schema = %psm, classes = model.classes.len(), "Prepared structural model");
        models.insert(psm.to_string(), model.clone());
        Ok(model)
    }

    /// Artefact of `generator` that publishes a class of another schema
    pub fn foreign_artefact(&self, class: &StructuralClass, generator: &str) -> Option<&ArtefactDescriptor> {
        let specification = self.specifications.get(class.specification.as_deref()?)?;
        specification.artefact_for(&class.structure_schema, generator)
    }
}

/// The structural schema an artefact renders
pub(crate) fn required_psm(artefact: &ArtefactDescriptor) -> ModelResult<&str> {
    artefact.psm.as_deref().ok_or_else(|| {
        ModelError::UnsupportedModel(format!("artefact {} names no structural schema", artefact.iri))
    })
}

// =============================================================================
// Generator
// =============================================================================

/// Runs artefact generators against a resource reader
pub struct Generator {
    reader: Arc<dyn ResourceReader>,
    specifications: Arc<Specifications>,
    generators: HashMap<&'static str, Arc<dyn ArtefactGenerator>>,
    config: GenerationConfig,
    format: OutputFormat,
}

impl Generator {
    /// Generator with the four built-in formats registered
    pub fn new(reader: Arc<dyn ResourceReader>, specifications: Specifications) -> Self {
        Self {
            reader,
            specifications: Arc::new(specifications),
            generators: HashMap::new(),
            config: GenerationConfig::default(),
            format: OutputFormat::default(),
        }
        .register(JsonSchemaGenerator)
        .register(XmlSchemaGenerator)
        .register(CsvSchemaGenerator)
        .register(DocumentationGenerator)
    }

    pub fn with_config(mut self, config: GenerationConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_format(mut self, format: OutputFormat) -> Self {
        self.format = format;
        self
    }

    /// Add or replace the generator for its identifier
    pub fn register(mut self, generator: impl ArtefactGenerator + 'static) -> Self {
        self.generators.insert(generator.identifier(), Arc::new(generator));
        self
    }

    pub fn specifications(&self) -> &Specifications {
        &self.specifications
    }

    async fn context(&self, cancel: &CancellationToken) -> ModelResult<GeneratorContext> {
        cancel.check()?;
        let snapshot = ReadOnlyMemoryStore::snapshot(self.reader.as_ref()).await;
        let context = GeneratorContext::prepare(
            snapshot,
            self.specifications.clone(),
            self.config.clone(),
            cancel.clone(),
        )
        .await?;
        Ok(context.with_format(self.format))
    }

    /// Generate every artefact of a specification, dependencies first.
    /// Returns the generated artefact IRIs in generation order.
    pub async fn generate_specification(
        &self,
        specification_iri: &str,
        sink: &dyn OutputSink,
        cancel: &CancellationToken,
    ) -> ModelResult<Vec<Iri>> {
        let specification = self.require_specification(specification_iri)?;
        let order = generation_order(specification)?;
        let context = self.context(cancel).await?;

        for artefact in &order {
            self.run(&context, specification, artefact, sink).await?;
        }
        info!(
            specification = %specification_iri,
            artefacts = order.len(),
            "Generated specification"
        );
        Ok(order.into_iter().map(|artefact| artefact.iri.clone()).collect())
    }

    /// Generate one artefact of a specification
    pub async fn generate_artefact(
        &self,
        specification_iri: &str,
        artefact_iri: &str,
        sink: &dyn OutputSink,
        cancel: &CancellationToken,
    ) -> ModelResult<()> {
        let specification = self.require_specification(specification_iri)?;
        let artefact = specification
            .artefact(artefact_iri)
            .ok_or_else(|| ModelError::MissingArtefact(artefact_iri.to_string()))?;
        check_dependencies(specification, artefact)?;
        let context = self.context(cancel).await?;
        self.run(&context, specification, artefact, sink).await
    }

    fn require_specification(&self, iri: &str) -> ModelResult<&DataSpecification> {
        self.specifications
            .get(iri)
            .ok_or_else(|| ModelError::MissingSpecification(iri.to_string()))
    }

    async fn run(
        &self,
        context: &GeneratorContext,
        specification: &DataSpecification,
        artefact: &ArtefactDescriptor,
        sink: &dyn OutputSink,
    ) -> ModelResult<()> {
        context.cancel().check()?;
        let generator = self
            .generators
            .get(artefact.generator.as_str())
            .ok_or_else(|| ModelError::UnknownGenerator(artefact.generator.clone()))?;
        debug!(artefact = %artefact.iri, generator = generator.identifier(), "Generating artefact");
        generator
            .generate_to_stream(context, artefact, specification, sink)
            .await?;
        info!(artefact = %artefact.iri, path = %artefact.output_path, "Generated artefact");
        Ok(())
    }
}

fn check_dependencies(specification: &DataSpecification, artefact: &ArtefactDescriptor) -> ModelResult<()> {
    match artefact
        .depends_on
        .iter()
        .find(|dependency| specification.artefact(dependency).is_none())
    {
        Some(missing) => Err(ModelError::MissingArtefact(missing.clone())),
        None => Ok(()),
    }
}

/// Artefacts ordered so each follows everything it depends on
fn generation_order(specification: &DataSpecification) -> ModelResult<Vec<&ArtefactDescriptor>> {
    let mut graph = DiGraph::<&ArtefactDescriptor, ()>::new();
    let nodes: HashMap<&str, _> = specification
        .artefacts
        .iter()
        .map(|artefact| (artefact.iri.as_str(), graph.add_node(artefact)))
        .collect();

    for artefact in &specification.artefacts {
        check_dependencies(specification, artefact)?;
        for dependency in &artefact.depends_on {
            if let (Some(from), Some(to)) = (nodes.get(dependency.as_str()), nodes.get(artefact.iri.as_str())) {
                graph.update_edge(*from, *to, ());
            }
        }
    }

    let order = toposort(&graph, None).map_err(|cycle| {
        ModelError::UnsupportedModel(format!(
            "artefact {} depends on itself",
            graph[cycle.node_id()].iri
        ))
    })?;
    Ok(order.into_iter().map(|node| graph[node]).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::specification::generators;

    fn artefact(iri: &str, depends_on: &[&str]) -> ArtefactDescriptor {
        ArtefactDescriptor {
            iri: iri.into(),
            generator: generators::DOCUMENTATION.into(),
            output_path: format!("{}.md", iri),
            depends_on: depends_on.iter().map(|d| d.to_string()).collect(),
            ..Default::default()
        }
    }

    #[test]
    fn test_dependencies_come_first() {
        let specification = DataSpecification {
            iri: "spec".into(),
            artefacts: vec![artefact("docs", &["json", "xsd"]), artefact("json", &[]), artefact("xsd", &["json"])],
            ..Default::default()
        };
        let order: Vec<&str> = generation_order(&specification)
            .unwrap()
            .into_iter()
            .map(|artefact| artefact.iri.as_str())
            .collect();
        assert_eq!(order, ["json", "xsd", "docs"]);
    }

    #[test]
    fn test_missing_dependency() {
        let specification = DataSpecification {
            iri: "spec".into(),
            artefacts: vec![artefact("docs", &["gone"])],
            ..Default::default()
        };
        assert!(matches!(
            generation_order(&specification),
            Err(ModelError::MissingArtefact(iri)) if iri == "gone"
        ));
    }
}
