use serde::{Deserialize, Serialize};

/// A point in a named world.
///
/// Shapes use `x`/`z` as the horizontal plane and `y` as altitude.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub world: String,
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Position {
    pub fn new(world: impl Into<String>, x: f64, y: f64, z: f64) -> Self {
        Self {
            world: world.into(),
            x,
            y,
            z,
        }
    }

    /// The safe empty bound returned by degenerate shapes.
    pub fn origin() -> Self {
        Self::new("", 0.0, 0.0, 0.0)
    }

    pub fn with_y(&self, y: f64) -> Self {
        Self::new(self.world.clone(), self.x, y, self.z)
    }

    /// Whether both positions live in the same world.
    pub fn same_world(&self, other: &Position) -> bool {
        self.world == other.world
    }
}

impl Default for Position {
    fn default() -> Self {
        Self::origin()
    }
}
