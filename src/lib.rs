//! specforge
//!
//! An operation-sourced store for conceptual and structural data models, and
//! a compiler that turns those models into published artefacts: JSON Schema,
//! XML Schema, CSV on the Web metadata and Markdown documentation.
//!
//! ## Architecture
//!
//! ```text
//! Operation ──▶ ExecutorRegistry ──▶ ResourceDiff ──▶ MemoryStore
//!                                                       │
//!                                        FederatedStore ┤ (several members)
//!                                                       ▼
//!                                            ReadOnlyMemoryStore snapshot
//!                                                       │
//!              conceptual + structural builders ◀───────┘
//!                                │
//!                      TransformationPipeline
//!                                │
//!        Generator ──▶ json-schema │ xml-schema │ csv-schema │ documentation
//!                                │
//!                            OutputSink
//! ```
//!
//! Stores only change through operations, and every generation run reads a
//! single snapshot, so artefacts always describe one consistent state.

pub mod cancel;
pub mod checksum;
pub mod conceptual;
pub mod config;
pub mod datatype;
pub mod error;
pub mod executor;
pub mod generator;
pub mod graph;
pub mod operation;
pub mod output;
pub mod resource;
pub mod specification;
pub mod store;
pub mod structural;
pub mod transform;

pub use cancel::CancellationToken;
pub use checksum::Checksum;
pub use config::{ForgeConfig, GenerationConfig, OutputFormat, TableLayout};
pub use error::{ModelError, ModelResult, StoreError, StoreResult};
pub use executor::{ExecutorRegistry, ResourceDiff};
pub use generator::{ArtefactGenerator, Generator, GeneratorContext};
pub use operation::{Operation, OperationTag};
pub use output::{DirectoryOutputSink, MemoryOutputSink, OutputSink};
pub use resource::{AttributeKey, AttributeValue, Cardinality, Iri, LanguageString, Resource, ResourceType};
pub use specification::{ArtefactConfigurator, ArtefactDescriptor, DataSpecification, Specifications};
pub use store::{FederatedStore, MemoryStore, ReadOnlyMemoryStore, ResourceReader};
pub use transform::{StructuralTransform, TransformationPipeline};
