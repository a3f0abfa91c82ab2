//! File-backed port implementations.
//!
//! Region definitions live in one JSON document:
//!
//! ```json
//! { "regions": [ { "id": "spawn", "priority": 10, "flags": [] } ] }
//! ```
//!
//! Artifacts are stored one file per artifact under a directory.

use std::io::ErrorKind;
use std::path::PathBuf;

use async_trait::async_trait;
use regionward_domain::{ArtifactId, RegionDefinition};
use serde::{Deserialize, Serialize};

use crate::infrastructure::ports::{ArtifactStore, RegionDefinitionSource, RepoError};

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct RegionDocument {
    #[serde(default)]
    pub regions: Vec<RegionDefinition>,
}

/// Reads region definitions from a JSON document on every load.
pub struct JsonFileDefinitionSource {
    path: PathBuf,
}

impl JsonFileDefinitionSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl RegionDefinitionSource for JsonFileDefinitionSource {
    async fn load_definitions(&self) -> Result<Vec<RegionDefinition>, RepoError> {
        let raw = match tokio::fs::read_to_string(&self.path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                tracing::warn!(path = %self.path.display(), "Region definition file missing, loading no regions");
                return Ok(Vec::new());
            }
            Err(e) => return Err(RepoError::storage("load_definitions", e)),
        };
        if raw.trim().is_empty() {
            return Ok(Vec::new());
        }
        let document: RegionDocument = serde_json::from_str(&raw)?;
        Ok(document.regions)
    }
}

/// Stores each artifact payload as `<dir>/<artifact>.json`.
pub struct JsonFileArtifactStore {
    dir: PathBuf,
}

impl JsonFileArtifactStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn file_for(&self, artifact: &ArtifactId) -> PathBuf {
        let name: String = artifact
            .as_str()
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                    c
                } else {
                    '_'
                }
            })
            .collect();
        self.dir.join(format!("{name}.json"))
    }
}

#[async_trait]
impl ArtifactStore for JsonFileArtifactStore {
    async fn read(&self, artifact: &ArtifactId) -> Result<Option<String>, RepoError> {
        match tokio::fs::read_to_string(self.file_for(artifact)).await {
            Ok(data) => Ok(Some(data)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(RepoError::storage("read_artifact", e)),
        }
    }

    async fn write(&self, artifact: &ArtifactId, data: String) -> Result<(), RepoError> {
        tokio::fs::create_dir_all(&self.dir)
            .await
            .map_err(|e| RepoError::storage("write_artifact", e))?;
        tokio::fs::write(self.file_for(artifact), data)
            .await
            .map_err(|e| RepoError::storage("write_artifact", e))
    }
}
