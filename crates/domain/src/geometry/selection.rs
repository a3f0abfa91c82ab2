//! Selection modes that turn a list of picked nodes into a shape.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::position::Position;
use super::shape::{CuboidShape, PolygonPrismShape, RegionShape};

/// Reasons a node list cannot become a shape.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum SelectionError {
    #[error("{mode} selection needs at least {required} points, got {actual}")]
    NotEnoughPoints {
        mode: SelectionMode,
        required: usize,
        actual: usize,
    },

    #[error("selection points span several worlds ({first} and {other})")]
    MixedWorlds { first: String, other: String },
}

/// How picked nodes are interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SelectionMode {
    #[default]
    Cuboid,
    Polygon,
}

impl SelectionMode {
    pub fn all() -> &'static [SelectionMode] {
        &[SelectionMode::Cuboid, SelectionMode::Polygon]
    }

    pub fn minimum_points(&self) -> usize {
        match self {
            SelectionMode::Cuboid => 2,
            SelectionMode::Polygon => 3,
        }
    }

    /// The mode after this one, wrapping around.
    pub fn next(&self) -> SelectionMode {
        let modes = Self::all();
        let index = modes.iter().position(|mode| mode == self).unwrap_or(0);
        modes[(index + 1) % modes.len()]
    }

    /// Mode able to edit an existing shape. Anything but a cuboid is edited as a polygon.
    pub fn from_shape(shape: &RegionShape) -> SelectionMode {
        match shape {
            RegionShape::Cuboid(_) => SelectionMode::Cuboid,
            RegionShape::PolygonPrism(_)
            | RegionShape::FlatPolygon(_)
            | RegionShape::Cylinder(_)
            | RegionShape::Global(_) => SelectionMode::Polygon,
        }
    }

    /// Builds the shape described by `nodes`.
    ///
    /// `range` overrides the vertical extent; without it the extent spans the
    /// lowest and highest node.
    pub fn compute_shape(
        &self,
        nodes: &[Position],
        range: Option<(f64, f64)>,
    ) -> Result<RegionShape, SelectionError> {
        let required = self.minimum_points();
        let first = match nodes.first() {
            Some(first) if nodes.len() >= required => first,
            _ => {
                return Err(SelectionError::NotEnoughPoints {
                    mode: *self,
                    required,
                    actual: nodes.len(),
                })
            }
        };
        if let Some(other) = nodes.iter().find(|node| !node.same_world(first)) {
            return Err(SelectionError::MixedWorlds {
                first: first.world.clone(),
                other: other.world.clone(),
            });
        }

        let world = first.world.as_str();
        let (min_y, max_y) = range.unwrap_or_else(|| vertical_range(nodes));
        let shape = match self {
            SelectionMode::Cuboid => {
                let (mut min_x, mut min_z) = (first.x, first.z);
                let (mut max_x, mut max_z) = (first.x, first.z);
                for node in nodes {
                    min_x = min_x.min(node.x);
                    min_z = min_z.min(node.z);
                    max_x = max_x.max(node.x);
                    max_z = max_z.max(node.z);
                }
                RegionShape::Cuboid(CuboidShape::new(
                    Position::new(world, min_x, min_y, min_z),
                    Position::new(world, max_x, max_y, max_z),
                ))
            }
            SelectionMode::Polygon => {
                let base = nodes
                    .iter()
                    .map(|node| Position::new(world, node.x, min_y, node.z))
                    .collect();
                RegionShape::PolygonPrism(PolygonPrismShape::new(min_y, max_y, base))
            }
        };
        Ok(shape)
    }
}

impl std::fmt::Display for SelectionMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SelectionMode::Cuboid => write!(f, "Cuboid"),
            SelectionMode::Polygon => write!(f, "Polygon"),
        }
    }
}

/// Lowest and highest Y among `nodes`, `(0, 0)` when empty.
pub fn vertical_range(nodes: &[Position]) -> (f64, f64) {
    let mut iter = nodes.iter();
    let Some(first) = iter.next() else {
        return (0.0, 0.0);
    };
    iter.fold((first.y, first.y), |(min, max), node| {
        (min.min(node.y), max.max(node.y))
    })
}
