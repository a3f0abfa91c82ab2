//! Region shapes and their containment math.
//!
//! Every shape answers `contains`, `min` and `max`. The bounds are the
//! axis-aligned box around the shape: a contained point always lies inside
//! the box, the converse does not hold. Shapes are immutable; an edit builds
//! a new shape.

use std::collections::HashSet;

use super::position::Position;

/// Horizontal coordinate used as the bound of world-wide shapes.
pub const WORLD_BORDER: f64 = 30_000_000.0;

/// Default vertical extent of world-wide shapes.
pub const GLOBAL_DEFAULT_MIN_Y: f64 = -64.0;
pub const GLOBAL_DEFAULT_MAX_Y: f64 = 320.0;

/// Added to the edge slope denominator so horizontal edges never divide by zero.
const EDGE_EPSILON: f64 = 1e-7;

/// Geometric dimension of a selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionDimension {
    TwoD,
    ThreeD,
}

/// Closed set of region shapes.
#[derive(Debug, Clone, PartialEq)]
pub enum RegionShape {
    Cuboid(CuboidShape),
    PolygonPrism(PolygonPrismShape),
    FlatPolygon(FlatPolygonShape),
    Cylinder(CylinderShape),
    Global(GlobalShape),
}

impl RegionShape {
    pub fn contains(&self, position: &Position) -> bool {
        match self {
            Self::Cuboid(shape) => shape.contains(position),
            Self::PolygonPrism(shape) => shape.contains(position),
            Self::FlatPolygon(shape) => shape.contains(position),
            Self::Cylinder(shape) => shape.contains(position),
            Self::Global(shape) => shape.contains(position),
        }
    }

    pub fn min(&self) -> Position {
        match self {
            Self::Cuboid(shape) => shape.min(),
            Self::PolygonPrism(shape) => shape.min(),
            Self::FlatPolygon(shape) => shape.min(),
            Self::Cylinder(shape) => shape.min(),
            Self::Global(shape) => shape.min(),
        }
    }

    pub fn max(&self) -> Position {
        match self {
            Self::Cuboid(shape) => shape.max(),
            Self::PolygonPrism(shape) => shape.max(),
            Self::FlatPolygon(shape) => shape.max(),
            Self::Cylinder(shape) => shape.max(),
            Self::Global(shape) => shape.max(),
        }
    }

    pub fn bounds(&self) -> (Position, Position) {
        (self.min(), self.max())
    }

    pub fn dimension(&self) -> SelectionDimension {
        match self {
            Self::FlatPolygon(_) => SelectionDimension::TwoD,
            _ => SelectionDimension::ThreeD,
        }
    }

    /// Short lowercase name used in logs.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Self::Cuboid(_) => "cuboid",
            Self::PolygonPrism(_) => "polygon_prism",
            Self::FlatPolygon(_) => "flat_polygon",
            Self::Cylinder(_) => "cylinder",
            Self::Global(_) => "global",
        }
    }
}

impl Default for RegionShape {
    /// A zero-volume cuboid at the origin, used when a region has no geometry.
    fn default() -> Self {
        Self::Cuboid(CuboidShape::default())
    }
}

/// Axis-aligned box between two corners. All faces are inclusive.
#[derive(Debug, Clone, PartialEq)]
pub struct CuboidShape {
    corner1: Position,
    corner2: Position,
    min: [f64; 3],
    max: [f64; 3],
}

impl CuboidShape {
    pub fn new(corner1: Position, corner2: Position) -> Self {
        let min = [
            corner1.x.min(corner2.x),
            corner1.y.min(corner2.y),
            corner1.z.min(corner2.z),
        ];
        let max = [
            corner1.x.max(corner2.x),
            corner1.y.max(corner2.y),
            corner1.z.max(corner2.z),
        ];
        Self {
            corner1,
            corner2,
            min,
            max,
        }
    }

    pub fn corner1(&self) -> &Position {
        &self.corner1
    }

    pub fn corner2(&self) -> &Position {
        &self.corner2
    }

    pub fn contains(&self, position: &Position) -> bool {
        (self.min[0]..=self.max[0]).contains(&position.x)
            && (self.min[1]..=self.max[1]).contains(&position.y)
            && (self.min[2]..=self.max[2]).contains(&position.z)
    }

    pub fn min(&self) -> Position {
        Position::new(self.corner1.world.clone(), self.min[0], self.min[1], self.min[2])
    }

    pub fn max(&self) -> Position {
        Position::new(self.corner1.world.clone(), self.max[0], self.max[1], self.max[2])
    }
}

impl Default for CuboidShape {
    fn default() -> Self {
        Self::new(Position::origin(), Position::origin())
    }
}

/// Polygon ring extruded between two heights.
#[derive(Debug, Clone, PartialEq)]
pub struct PolygonPrismShape {
    pub min_y: f64,
    pub max_y: f64,
    pub vertices: Vec<Position>,
}

impl PolygonPrismShape {
    pub fn new(min_y: f64, max_y: f64, vertices: Vec<Position>) -> Self {
        Self {
            min_y,
            max_y,
            vertices,
        }
    }

    pub fn contains(&self, position: &Position) -> bool {
        if position.y < self.min_y || position.y > self.max_y {
            return false;
        }
        ring_contains(&self.vertices, position)
    }

    pub fn min(&self) -> Position {
        match horizontal_extent(&self.vertices) {
            Some((world, min_x, min_z, _, _)) => Position::new(world, min_x, self.min_y, min_z),
            None => Position::origin(),
        }
    }

    pub fn max(&self) -> Position {
        match horizontal_extent(&self.vertices) {
            Some((world, _, _, max_x, max_z)) => Position::new(world, max_x, self.max_y, max_z),
            None => Position::origin(),
        }
    }
}

impl Default for PolygonPrismShape {
    fn default() -> Self {
        Self::new(0.0, 255.0, Vec::new())
    }
}

/// Polygon ring evaluated at a single altitude.
#[derive(Debug, Clone, PartialEq)]
pub struct FlatPolygonShape {
    pub y: f64,
    pub vertices: Vec<Position>,
}

impl FlatPolygonShape {
    pub fn new(y: f64, vertices: Vec<Position>) -> Self {
        Self { y, vertices }
    }

    pub fn contains(&self, position: &Position) -> bool {
        position.y == self.y && ring_contains(&self.vertices, position)
    }

    pub fn min(&self) -> Position {
        match horizontal_extent(&self.vertices) {
            Some((world, min_x, min_z, _, _)) => Position::new(world, min_x, self.y, min_z),
            None => Position::origin(),
        }
    }

    pub fn max(&self) -> Position {
        match horizontal_extent(&self.vertices) {
            Some((world, _, _, max_x, max_z)) => Position::new(world, max_x, self.y, max_z),
            None => Position::origin(),
        }
    }
}

impl Default for FlatPolygonShape {
    fn default() -> Self {
        Self::new(64.0, Vec::new())
    }
}

/// Upright cylinder around a center column.
#[derive(Debug, Clone, PartialEq)]
pub struct CylinderShape {
    pub center: Position,
    pub radius: f64,
    pub min_y: f64,
    pub max_y: f64,
}

impl CylinderShape {
    pub fn new(center: Position, radius: f64, min_y: f64, max_y: f64) -> Self {
        Self {
            center,
            radius,
            min_y,
            max_y,
        }
    }

    pub fn contains(&self, position: &Position) -> bool {
        if position.y < self.min_y || position.y > self.max_y {
            return false;
        }
        let dx = position.x - self.center.x;
        let dz = position.z - self.center.z;
        dx * dx + dz * dz <= self.radius * self.radius
    }

    pub fn min(&self) -> Position {
        Position::new(
            self.center.world.clone(),
            self.center.x - self.radius,
            self.min_y,
            self.center.z - self.radius,
        )
    }

    pub fn max(&self) -> Position {
        Position::new(
            self.center.world.clone(),
            self.center.x + self.radius,
            self.max_y,
            self.center.z + self.radius,
        )
    }
}

impl Default for CylinderShape {
    fn default() -> Self {
        Self::new(Position::origin(), 5.0, 0.0, 255.0)
    }
}

/// Whole-world shape bounded only vertically.
#[derive(Debug, Clone, PartialEq)]
pub struct GlobalShape {
    worlds: Vec<String>,
    normalized_worlds: HashSet<String>,
    pub min_y: f64,
    pub max_y: f64,
}

impl GlobalShape {
    pub fn new(worlds: Vec<String>, min_y: f64, max_y: f64) -> Self {
        let normalized_worlds = worlds.iter().map(|world| world.to_lowercase()).collect();
        Self {
            worlds,
            normalized_worlds,
            min_y,
            max_y,
        }
    }

    pub fn worlds(&self) -> &[String] {
        &self.worlds
    }

    pub fn contains(&self, position: &Position) -> bool {
        if self.normalized_worlds.is_empty() {
            return false;
        }
        if !self.normalized_worlds.contains(&position.world.to_lowercase()) {
            return false;
        }
        (self.min_y..=self.max_y).contains(&position.y)
    }

    pub fn min(&self) -> Position {
        self.boundary(self.min_y, -WORLD_BORDER)
    }

    pub fn max(&self) -> Position {
        self.boundary(self.max_y, WORLD_BORDER)
    }

    fn boundary(&self, y: f64, coordinate: f64) -> Position {
        match self.worlds.first() {
            Some(world) => Position::new(world.clone(), coordinate, y, coordinate),
            None => Position::origin(),
        }
    }
}

impl Default for GlobalShape {
    fn default() -> Self {
        Self::new(Vec::new(), GLOBAL_DEFAULT_MIN_Y, GLOBAL_DEFAULT_MAX_Y)
    }
}

/// Trims world ids and drops case-insensitive duplicates, keeping the first spelling.
pub fn dedupe_worlds<S: AsRef<str>>(worlds: &[S]) -> Vec<String> {
    let mut seen = HashSet::new();
    worlds
        .iter()
        .map(|world| world.as_ref().trim())
        .filter(|world| !world.is_empty() && seen.insert(world.to_lowercase()))
        .map(str::to_string)
        .collect()
}

/// Even-odd ray cast on the x/z projection.
fn ring_contains(vertices: &[Position], position: &Position) -> bool {
    if vertices.len() < 3 {
        return false;
    }
    let mut inside = false;
    let mut j = vertices.len() - 1;
    for i in 0..vertices.len() {
        let vi = &vertices[i];
        let vj = &vertices[j];
        let straddles = (vi.z > position.z) != (vj.z > position.z);
        if straddles {
            let crossing_x =
                (vj.x - vi.x) * (position.z - vi.z) / (vj.z - vi.z + EDGE_EPSILON) + vi.x;
            if position.x < crossing_x {
                inside = !inside;
            }
        }
        j = i;
    }
    inside
}

/// `(world, min_x, min_z, max_x, max_z)` of a vertex ring, `None` when empty.
fn horizontal_extent(vertices: &[Position]) -> Option<(String, f64, f64, f64, f64)> {
    let first = vertices.first()?;
    let mut extent = (first.x, first.z, first.x, first.z);
    for vertex in &vertices[1..] {
        extent.0 = extent.0.min(vertex.x);
        extent.1 = extent.1.min(vertex.z);
        extent.2 = extent.2.max(vertex.x);
        extent.3 = extent.3.max(vertex.z);
    }
    Some((first.world.clone(), extent.0, extent.1, extent.2, extent.3))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pos(x: f64, y: f64, z: f64) -> Position {
        Position::new("world", x, y, z)
    }

    fn ring(points: &[(f64, f64)]) -> Vec<Position> {
        points.iter().map(|(x, z)| pos(*x, 0.0, *z)).collect()
    }

    #[test]
    fn cuboid_boundary_faces_are_contained() {
        let cuboid = CuboidShape::new(pos(10.0, 64.0, 10.0), pos(0.0, 0.0, 0.0));
        assert!(cuboid.contains(&pos(0.0, 0.0, 0.0)));
        assert!(cuboid.contains(&pos(10.0, 64.0, 10.0)));
        assert!(cuboid.contains(&pos(10.0, 32.0, 5.0)));
    }

    #[test]
    fn cuboid_rejects_points_one_unit_outside() {
        let cuboid = CuboidShape::new(pos(0.0, 0.0, 0.0), pos(10.0, 64.0, 10.0));
        assert!(!cuboid.contains(&pos(11.0, 32.0, 5.0)));
        assert!(!cuboid.contains(&pos(5.0, 65.0, 5.0)));
        assert!(!cuboid.contains(&pos(5.0, 32.0, -1.0)));
    }

    #[test]
    fn cuboid_bounds_are_normalized() {
        let cuboid = CuboidShape::new(pos(10.0, 5.0, -3.0), pos(-2.0, 40.0, 7.0));
        assert_eq!(cuboid.min(), pos(-2.0, 5.0, -3.0));
        assert_eq!(cuboid.max(), pos(10.0, 40.0, 7.0));
    }

    #[test]
    fn concave_polygon_excludes_notch() {
        // U shape opening towards +z: the notch spans x 4..6, z 4..10.
        let vertices = ring(&[
            (0.0, 0.0),
            (10.0, 0.0),
            (10.0, 10.0),
            (6.0, 10.0),
            (6.0, 4.0),
            (4.0, 4.0),
            (4.0, 10.0),
            (0.0, 10.0),
        ]);
        let prism = PolygonPrismShape::new(0.0, 64.0, vertices);

        let notch = pos(5.0, 10.0, 8.0);
        assert!(!prism.contains(&notch));
        let (min, max) = RegionShape::PolygonPrism(prism.clone()).bounds();
        assert!(notch.x >= min.x && notch.x <= max.x && notch.z >= min.z && notch.z <= max.z);

        assert!(prism.contains(&pos(2.0, 10.0, 8.0)));
        assert!(prism.contains(&pos(5.0, 10.0, 2.0)));
    }

    #[test]
    fn polygon_checks_vertical_interval() {
        let prism = PolygonPrismShape::new(10.0, 20.0, ring(&[(0.0, 0.0), (10.0, 0.0), (0.0, 10.0)]));
        assert!(prism.contains(&pos(2.0, 10.0, 2.0)));
        assert!(prism.contains(&pos(2.0, 20.0, 2.0)));
        assert!(!prism.contains(&pos(2.0, 20.5, 2.0)));
    }

    #[test]
    fn polygon_with_two_vertices_contains_nothing() {
        let prism = PolygonPrismShape::new(0.0, 64.0, ring(&[(0.0, 0.0), (10.0, 10.0)]));
        assert!(!prism.contains(&pos(5.0, 5.0, 5.0)));
    }

    #[test]
    fn empty_polygon_bounds_fall_back_to_origin() {
        let prism = PolygonPrismShape::default();
        assert_eq!(prism.min(), Position::origin());
        assert_eq!(prism.max(), Position::origin());
        let flat = FlatPolygonShape::default();
        assert_eq!(flat.min(), Position::origin());
    }

    #[test]
    fn flat_polygon_only_matches_its_altitude() {
        let flat = FlatPolygonShape::new(64.0, ring(&[(0.0, 0.0), (10.0, 0.0), (10.0, 10.0), (0.0, 10.0)]));
        assert!(flat.contains(&pos(5.0, 64.0, 5.0)));
        assert!(!flat.contains(&pos(5.0, 65.0, 5.0)));
        assert_eq!(flat.min().y, 64.0);
        assert_eq!(RegionShape::FlatPolygon(flat).dimension(), SelectionDimension::TwoD);
    }

    #[test]
    fn cylinder_uses_planar_distance() {
        let cylinder = CylinderShape::new(pos(0.0, 0.0, 0.0), 5.0, 0.0, 10.0);
        assert!(cylinder.contains(&pos(3.0, 5.0, 4.0)));
        assert!(cylinder.contains(&pos(5.0, 0.0, 0.0)));
        assert!(!cylinder.contains(&pos(4.0, 5.0, 4.0)));
        assert!(!cylinder.contains(&pos(0.0, 11.0, 0.0)));
        assert_eq!(cylinder.min(), pos(-5.0, 0.0, -5.0));
        assert_eq!(cylinder.max(), pos(5.0, 10.0, 5.0));
    }

    #[test]
    fn global_matches_world_case_insensitively() {
        let global = GlobalShape::new(vec!["World_Nether".to_string()], -64.0, 320.0);
        assert!(global.contains(&Position::new("world_nether", 1e6, 0.0, -1e6)));
        assert!(!global.contains(&Position::new("world", 0.0, 0.0, 0.0)));
        assert!(!global.contains(&Position::new("world_nether", 0.0, 321.0, 0.0)));
        assert_eq!(global.min().x, -WORLD_BORDER);
        assert_eq!(global.max().world, "World_Nether");
    }

    #[test]
    fn global_without_worlds_is_empty() {
        let global = GlobalShape::default();
        assert!(!global.contains(&Position::new("", 0.0, 0.0, 0.0)));
        assert_eq!(global.min(), Position::origin());
    }

    #[test]
    fn dedupe_worlds_keeps_first_spelling() {
        let worlds = dedupe_worlds(&[" World ", "world", "", "nether"]);
        assert_eq!(worlds, vec!["World".to_string(), "nether".to_string()]);
    }

    #[test]
    fn contained_points_lie_within_bounds() {
        let shapes = vec![
            RegionShape::Cuboid(CuboidShape::new(pos(0.0, 0.0, 0.0), pos(4.0, 4.0, 4.0))),
            RegionShape::PolygonPrism(PolygonPrismShape::new(
                0.0,
                4.0,
                ring(&[(0.0, 0.0), (4.0, 0.0), (2.0, 4.0)]),
            )),
            RegionShape::Cylinder(CylinderShape::new(pos(2.0, 0.0, 2.0), 2.0, 0.0, 4.0)),
        ];
        for shape in &shapes {
            let (min, max) = shape.bounds();
            for step in 0..=16 {
                let t = f64::from(step) * 0.25;
                let point = pos(t, 2.0, t);
                if shape.contains(&point) {
                    assert!(point.x >= min.x && point.x <= max.x, "{}", shape.kind_name());
                    assert!(point.z >= min.z && point.z <= max.z, "{}", shape.kind_name());
                }
            }
        }
    }
}
