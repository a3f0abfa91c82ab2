//! Shape persistence on top of an [`ArtifactStore`].
//!
//! Reads never fail outward: unreadable or malformed payloads are logged and
//! treated as "nothing stored", so a single broken artifact cannot keep the
//! rest of the regions from loading.

use std::sync::Arc;

use regionward_domain::{Position, RegionArtifact, RegionShape, SelectionMode};
use regionward_shared::{
    global_matches_settings, parse_global_payload, parse_region_payload, GlobalRegionPayload,
    RegionPayload, StoredRegion,
};

use crate::infrastructure::ports::{ArtifactStore, RepoError};

pub struct RegionArtifactStorage {
    store: Arc<dyn ArtifactStore>,
}

impl RegionArtifactStorage {
    pub fn new(store: Arc<dyn ArtifactStore>) -> Self {
        Self { store }
    }

    /// Stored geometry for the artifact, if any could be decoded.
    pub async fn load(&self, artifact: &RegionArtifact) -> Option<StoredRegion> {
        let data = self.read_raw(artifact).await?;
        if data.trim().is_empty() {
            return None;
        }
        if let Some(settings) = &artifact.global {
            return Some(parse_global_payload(&data, settings));
        }
        match parse_region_payload(&data) {
            Ok(stored) => Some(stored),
            Err(e) => {
                tracing::warn!(
                    artifact_id = %artifact.id,
                    error = %e,
                    "Failed to parse region payload"
                );
                None
            }
        }
    }

    /// Persists the nodes for a regular artifact, or the configured bounds for a global one.
    pub async fn save(
        &self,
        artifact: &RegionArtifact,
        mode: SelectionMode,
        nodes: &[Position],
    ) -> Result<(), RepoError> {
        let data = match &artifact.global {
            Some(settings) => serde_json::to_string(&GlobalRegionPayload::from_settings(settings))?,
            None => serde_json::to_string(&RegionPayload::new(mode, nodes.to_vec()))?,
        };
        self.store.write(&artifact.id, data).await.inspect_err(|e| {
            tracing::error!(artifact_id = %artifact.id, error = %e, "Failed to save region payload");
        })
    }

    /// Writes a starting payload when the artifact is empty, and rewrites a
    /// global payload that drifted from the artifact settings.
    pub async fn initialize(&self, artifact: &RegionArtifact) {
        let data = self.read_raw(artifact).await.unwrap_or_default();
        let needs_write = match &artifact.global {
            None => data.trim().is_empty(),
            Some(settings) => {
                data.trim().is_empty()
                    || !global_matches_settings(&parse_global_payload(&data, settings).shape, settings)
            }
        };
        if !needs_write {
            return;
        }
        tracing::debug!(artifact_id = %artifact.id, "Initializing region artifact");
        // save already logged the failure
        let _ = self.save(artifact, SelectionMode::Cuboid, &[]).await;
    }

    /// Shape a region backed by `artifact` should start with.
    pub async fn resolve_shape(&self, artifact: Option<&RegionArtifact>) -> RegionShape {
        let Some(artifact) = artifact else {
            return RegionShape::default();
        };
        self.initialize(artifact).await;
        match (self.load(artifact).await, &artifact.global) {
            (Some(stored), _) => stored.shape,
            (None, Some(settings)) => settings.to_shape(),
            (None, None) => RegionShape::default(),
        }
    }

    async fn read_raw(&self, artifact: &RegionArtifact) -> Option<String> {
        match self.store.read(&artifact.id).await {
            Ok(data) => data,
            Err(e) => {
                tracing::warn!(artifact_id = %artifact.id, error = %e, "Failed to read region artifact");
                None
            }
        }
    }
}
