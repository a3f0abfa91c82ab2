//! In-memory port implementations for embedding and tests.

use std::sync::RwLock;

use async_trait::async_trait;
use dashmap::DashMap;
use regionward_domain::{ArtifactId, RegionDefinition};

use crate::infrastructure::ports::{ArtifactStore, RegionDefinitionSource, RepoError};

/// Definition source backed by a replaceable list.
#[derive(Default)]
pub struct InMemoryDefinitionSource {
    definitions: RwLock<Vec<RegionDefinition>>,
}

impl InMemoryDefinitionSource {
    pub fn new(definitions: Vec<RegionDefinition>) -> Self {
        Self {
            definitions: RwLock::new(definitions),
        }
    }

    /// Replaces the definitions returned by the next load.
    pub fn replace(&self, definitions: Vec<RegionDefinition>) {
        let mut guard = self
            .definitions
            .write()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        *guard = definitions;
    }

    pub fn upsert(&self, definition: RegionDefinition) {
        let mut guard = self
            .definitions
            .write()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        match guard.iter_mut().find(|existing| existing.id == definition.id) {
            Some(existing) => *existing = definition,
            None => guard.push(definition),
        }
    }
}

#[async_trait]
impl RegionDefinitionSource for InMemoryDefinitionSource {
    async fn load_definitions(&self) -> Result<Vec<RegionDefinition>, RepoError> {
        let guard = self
            .definitions
            .read()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        Ok(guard.clone())
    }
}

/// Artifact blobs held in a concurrent map.
#[derive(Default)]
pub struct InMemoryArtifactStore {
    blobs: DashMap<ArtifactId, String>,
}

impl InMemoryArtifactStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_blob(self, artifact: impl Into<ArtifactId>, data: impl Into<String>) -> Self {
        self.blobs.insert(artifact.into(), data.into());
        self
    }

    pub fn get(&self, artifact: &ArtifactId) -> Option<String> {
        self.blobs.get(artifact).map(|entry| entry.value().clone())
    }

    pub fn len(&self) -> usize {
        self.blobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blobs.is_empty()
    }
}

#[async_trait]
impl ArtifactStore for InMemoryArtifactStore {
    async fn read(&self, artifact: &ArtifactId) -> Result<Option<String>, RepoError> {
        Ok(self.get(artifact))
    }

    async fn write(&self, artifact: &ArtifactId, data: String) -> Result<(), RepoError> {
        self.blobs.insert(artifact.clone(), data);
        Ok(())
    }
}
