//! Synchronization connectors
//!
//! The store does not know how a snapshot travels. A connector loads and
//! saves [`StoreSnapshot`] values; retries and transport are its business.

use async_trait::async_trait;
use std::path::PathBuf;
use tracing::debug;

use super::StoreSnapshot;
use crate::error::{StoreError, StoreResult};

#[async_trait]
pub trait StoreConnector: Send + Sync {
    /// `None` when the remote side holds no data yet
    async fn load(&self) -> StoreResult<Option<StoreSnapshot>>;

    async fn save(&self, snapshot: &StoreSnapshot) -> StoreResult<()>;
}

impl std::fmt::Debug for dyn StoreConnector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("StoreConnector")
    }
}

/// Keeps a snapshot in a local JSON file
#[derive(Debug, Clone)]
pub struct JsonFileConnector {
    path: PathBuf,
}

impl JsonFileConnector {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &std::path::Path {
        &self.path
    }
}

#[async_trait]
impl StoreConnector for JsonFileConnector {
    async fn load(&self) -> StoreResult<Option<StoreSnapshot>> {
        let content = match tokio::fs::read_to_string(&self.path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(StoreError::Connector(format!("{}: {}", self.path.display(), e))),
        };
        let snapshot: StoreSnapshot = serde_json::from_str(&content)
            .map_err(|e| StoreError::Connector(format!("{}: {}", self.path.display(), e)))?;
        debug!(path = %self.path.display(), resources = snapshot.resources.len(), "Loaded store snapshot");
        Ok(Some(snapshot))
    }

    async fn save(&self, snapshot: &StoreSnapshot) -> StoreResult<()> {
        let content = serde_json::to_string_pretty(snapshot)
            .map_err(|e| StoreError::Connector(e.to_string()))?;
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| StoreError::Connector(format!("{}: {}", parent.display(), e)))?;
        }
        tokio::fs::write(&self.path, content)
            .await
            .map_err(|e| StoreError::Connector(format!("{}: {}", self.path.display(), e)))?;
        debug!(path = %self.path.display(), "Saved store snapshot");
        Ok(())
    }
}
