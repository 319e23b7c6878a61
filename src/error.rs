//! Error types for stores, model building and artefact generation

use thiserror::Error;

/// Result type for store operations
pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Result type for model building and generation
pub type ModelResult<T> = std::result::Result<T, ModelError>;

/// Recoverable store errors. A failed apply never changes store state.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("No executor registered for operation: {0}")]
    UnknownOperation(String),

    #[error("Precondition failed: {0}")]
    PreconditionFailed(String),

    #[error("Invalid reference: {0}")]
    InvalidReference(String),

    #[error("Connector error: {0}")]
    Connector(String),
}

/// Failure of one step inside a federated complex operation
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Complex operation failed at step {step}: {source}")]
pub struct ComplexOperationError {
    /// Zero-based index of the failing operation
    pub step: usize,
    #[source]
    pub source: StoreError,
}

/// Fatal errors for a model build or generation run
#[derive(Error, Debug)]
pub enum ModelError {
    #[error("Missing resource: {0}")]
    MissingResource(String),

    #[error("Resource {iri} is not a {expected}")]
    UnexpectedResourceType { iri: String, expected: String },

    #[error("Class extension cycle detected at {0}")]
    CycleDetected(String),

    #[error("Incomplete model: property {property} {reason}")]
    IncompleteModel { property: String, reason: String },

    #[error("Ambiguous property range: {0} mixes association and attribute types")]
    AmbiguousPropertyRange(String),

    #[error("Unsupported model: {0}")]
    UnsupportedModel(String),

    #[error("Specification not found: {0}")]
    MissingSpecification(String),

    #[error("Artefact not found: {0}")]
    MissingArtefact(String),

    #[error("No generator registered for: {0}")]
    UnknownGenerator(String),

    #[error("Output already written: {0}")]
    DuplicateOutput(String),

    #[error("Invalid output path: {0}")]
    InvalidOutputPath(String),

    #[error("Generation cancelled")]
    Cancelled,

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Pattern error: {0}")]
    Pattern(#[from] regex::Error),
}

impl ModelError {
    pub(crate) fn incomplete(property: &str, reason: impl Into<String>) -> Self {
        Self::IncompleteModel {
            property: property.to_string(),
            reason: reason.into(),
        }
    }
}
