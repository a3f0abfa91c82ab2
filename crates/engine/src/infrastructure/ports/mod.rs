//! Port traits for infrastructure boundaries.
//!
//! These are the ONLY abstractions in the engine. Everything else is concrete types.
//! Ports exist for:
//! - Region definitions (could swap JSON files -> a database)
//! - Artifact blobs holding persisted shapes
//! - Decision events (audit log, live inspection)
//! - Clock (for testing)

mod error;
mod external;
mod repos;
mod testing;
pub mod types;

pub use error::{EventPublishError, RepoError};
pub use external::DecisionEventSink;
pub use repos::{ArtifactStore, RegionDefinitionSource};
pub use testing::ClockPort;
pub use types::{DecisionKind, FlagDecisionEvent};

#[cfg(test)]
pub use external::MockDecisionEventSink;
#[cfg(test)]
pub use repos::{MockArtifactStore, MockRegionDefinitionSource};
#[cfg(test)]
pub use testing::MockClockPort;
