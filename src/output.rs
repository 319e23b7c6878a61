//! Output sinks for generated artefacts
//!
//! Generators render a whole document and hand it over once, so a failed
//! run never leaves a partial file behind.

use async_trait::async_trait;
use std::collections::BTreeMap;
use std::path::{Component, Path, PathBuf};
use tokio::sync::Mutex;
use tracing::debug;

use crate::checksum::Checksum;
use crate::error::{ModelError, ModelResult};

#[async_trait]
pub trait OutputSink: Send + Sync {
    /// Store `content` under the logical, `/`-separated `path`
    async fn write_path(&self, path: &str, content: String) -> ModelResult<()>;
}

/// Reject absolute paths and parent references
fn validate_path(path: &str) -> ModelResult<()> {
    let valid = !path.is_empty()
        && Path::new(path)
            .components()
            .all(|component| matches!(component, Component::Normal(_) | Component::CurDir));
    if valid {
        Ok(())
    } else {
        Err(ModelError::InvalidOutputPath(path.to_string()))
    }
}

/// Collects artefacts in memory
#[derive(Debug, Default)]
pub struct MemoryOutputSink {
    files: Mutex<BTreeMap<String, String>>,
}

impl MemoryOutputSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn get(&self, path: &str) -> Option<String> {
        self.files.lock().await.get(path).cloned()
    }

    pub async fn paths(&self) -> Vec<String> {
        self.files.lock().await.keys().cloned().collect()
    }

    /// Checksum of every written artefact, keyed by path
    pub async fn manifest(&self) -> BTreeMap<String, Checksum> {
        self.files
            .lock()
            .await
            .iter()
            .map(|(path, content)| (path.clone(), Checksum::of(content)))
            .collect()
    }
}

#[async_trait]
impl OutputSink for MemoryOutputSink {
    async fn write_path(&self, path: &str, content: String) -> ModelResult<()> {
        validate_path(path)?;
        let mut files = self.files.lock().await;
        if files.contains_key(path) {
            return Err(ModelError::DuplicateOutput(path.to_string()));
        }
        files.insert(path.to_string(), content);
        Ok(())
    }
}

/// Writes artefacts below a root directory, creating parent directories
#[derive(Debug, Clone)]
pub struct DirectoryOutputSink {
    root: PathBuf,
}

impl DirectoryOutputSink {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

#[async_trait]
impl OutputSink for DirectoryOutputSink {
    async fn write_path(&self, path: &str, content: String) -> ModelResult<()> {
        validate_path(path)?;
        let target = self.root.join(path);
        if let Some(parent) = target.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&target, content.as_bytes()).await?;
        debug!(path = %target.display(), bytes = content.len(), "Wrote artefact");
        Ok(())
    }
}
