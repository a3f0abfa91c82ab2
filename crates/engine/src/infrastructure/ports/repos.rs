//! Storage port traits.

use async_trait::async_trait;
use regionward_domain::{ArtifactId, RegionDefinition};

use super::error::RepoError;

// =============================================================================
// Region Definitions
// =============================================================================

/// Supplies the raw, hand-authored region definitions.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RegionDefinitionSource: Send + Sync {
    async fn load_definitions(&self) -> Result<Vec<RegionDefinition>, RepoError>;
}

// =============================================================================
// Artifact Storage
// =============================================================================

/// String blob storage, one blob per artifact.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ArtifactStore: Send + Sync {
    /// `Ok(None)` when nothing was ever written for the artifact.
    async fn read(&self, artifact: &ArtifactId) -> Result<Option<String>, RepoError>;
    async fn write(&self, artifact: &ArtifactId, data: String) -> Result<(), RepoError>;
}
