//! Positions, shapes and the selection modes that build them.

pub mod position;
pub mod selection;
pub mod shape;

pub use position::Position;
pub use selection::{vertical_range, SelectionError, SelectionMode};
pub use shape::{
    dedupe_worlds, CuboidShape, CylinderShape, FlatPolygonShape, GlobalShape, PolygonPrismShape,
    RegionShape, SelectionDimension, GLOBAL_DEFAULT_MAX_Y, GLOBAL_DEFAULT_MIN_Y, WORLD_BORDER,
};
