extern crate self as regionward_domain;

pub mod error;
pub mod flags;
pub mod geometry;
pub mod ids;
pub mod region;

pub use error::DomainError;

// Re-export flag types
pub use flags::{
    definition_of, flag_definitions, FlagBinding, FlagCompatibility, FlagEvaluationPriority,
    FlagInheritance, FlagValue, FlagValueKind, RegionFlagCategory, RegionFlagDefinition,
    RegionFlagKey,
};

// Re-export geometry types
pub use geometry::{
    CuboidShape, CylinderShape, FlatPolygonShape, GlobalShape, PolygonPrismShape, Position,
    RegionShape, SelectionDimension, SelectionError, SelectionMode,
};

// Re-export ID types
pub use ids::{ArtifactId, RegionId};

pub use region::{GlobalArtifactSettings, RegionArtifact, RegionDefinition, RegionModel};
