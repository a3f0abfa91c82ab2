//! Persisted shape payloads.
//!
//! Editable regions store `{ version, mode, nodes }`; the shape is recomputed
//! from the nodes on load. World-wide regions store `{ worlds, minY, maxY }`.
//! Older artifacts carry a serialized shape instead of a mode and are still
//! readable.

use std::collections::HashSet;
use std::f64::consts::PI;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use regionward_domain::geometry::dedupe_worlds;
use regionward_domain::{
    CuboidShape, CylinderShape, FlatPolygonShape, GlobalArtifactSettings, GlobalShape,
    PolygonPrismShape, Position, RegionShape, SelectionMode,
};

/// Version written into new region payloads.
pub const PAYLOAD_VERSION: u32 = 2;

/// Rim points sampled when a cylinder is reduced to nodes.
pub const CYLINDER_NODE_SAMPLES: usize = 16;

#[derive(Debug, Error)]
pub enum PayloadError {
    #[error("payload is empty")]
    Empty,

    #[error("payload is neither a v{PAYLOAD_VERSION} nor a legacy region payload: {0}")]
    Unrecognized(String),

    #[error("malformed payload JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// Current payload for editable regions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegionPayload {
    #[serde(default = "current_version")]
    pub version: u32,
    pub mode: String,
    #[serde(default)]
    pub nodes: Vec<Position>,
}

fn current_version() -> u32 {
    PAYLOAD_VERSION
}

impl RegionPayload {
    pub fn new(mode: SelectionMode, nodes: Vec<Position>) -> Self {
        Self {
            version: PAYLOAD_VERSION,
            mode: mode_name(mode).to_string(),
            nodes,
        }
    }

    /// Stored mode, `Cuboid` when the name is unknown.
    pub fn selection_mode(&self) -> SelectionMode {
        SelectionMode::all()
            .iter()
            .copied()
            .find(|mode| mode_name(*mode).eq_ignore_ascii_case(self.mode.trim()))
            .unwrap_or(SelectionMode::Cuboid)
    }
}

fn mode_name(mode: SelectionMode) -> &'static str {
    match mode {
        SelectionMode::Cuboid => "CUBOID",
        SelectionMode::Polygon => "POLYGON",
    }
}

/// Pre-v2 payload carrying the shape itself.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LegacyRegionPayload {
    pub shape: SerializedShape,
    #[serde(default)]
    pub nodes: Option<Vec<Position>>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GlobalRegionPayload {
    #[serde(default)]
    pub worlds: Option<Vec<String>>,
    #[serde(default)]
    pub min_y: Option<f64>,
    #[serde(default)]
    pub max_y: Option<f64>,
}

impl GlobalRegionPayload {
    pub fn from_settings(settings: &GlobalArtifactSettings) -> Self {
        Self {
            worlds: Some(settings.resolved_worlds()),
            min_y: Some(settings.min_y),
            max_y: Some(settings.max_y),
        }
    }

    pub fn resolved_worlds(&self) -> Vec<String> {
        self.worlds.as_deref().map(dedupe_worlds).unwrap_or_default()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SerializedShapeType {
    #[default]
    Cuboid,
    PolygonPrism,
    Cylinder,
    FlatPolygon,
    Global,
}

/// Field bag describing any shape. Missing fields fall back to fixed defaults.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SerializedShape {
    #[serde(rename = "type", default)]
    pub shape_type: SerializedShapeType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub corner1: Option<Position>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub corner2: Option<Position>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_y: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_y: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vertices: Option<Vec<Position>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub center: Option<Position>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub radius: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub flat_y: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub worlds: Option<Vec<String>>,
}

impl SerializedShape {
    pub fn from_shape(shape: &RegionShape) -> Self {
        match shape {
            RegionShape::Cuboid(cuboid) => Self {
                shape_type: SerializedShapeType::Cuboid,
                corner1: Some(cuboid.corner1().clone()),
                corner2: Some(cuboid.corner2().clone()),
                ..Self::default()
            },
            RegionShape::PolygonPrism(prism) => Self {
                shape_type: SerializedShapeType::PolygonPrism,
                min_y: Some(prism.min_y),
                max_y: Some(prism.max_y),
                vertices: Some(prism.vertices.clone()),
                ..Self::default()
            },
            RegionShape::Cylinder(cylinder) => Self {
                shape_type: SerializedShapeType::Cylinder,
                center: Some(cylinder.center.clone()),
                radius: Some(cylinder.radius),
                min_y: Some(cylinder.min_y),
                max_y: Some(cylinder.max_y),
                ..Self::default()
            },
            RegionShape::FlatPolygon(flat) => Self {
                shape_type: SerializedShapeType::FlatPolygon,
                flat_y: Some(flat.y),
                vertices: Some(flat.vertices.clone()),
                ..Self::default()
            },
            RegionShape::Global(global) => Self {
                shape_type: SerializedShapeType::Global,
                min_y: Some(global.min_y),
                max_y: Some(global.max_y),
                worlds: Some(global.worlds().to_vec()),
                ..Self::default()
            },
        }
    }

    pub fn to_shape(&self) -> RegionShape {
        let origin = Position::origin;
        match self.shape_type {
            SerializedShapeType::Cuboid => RegionShape::Cuboid(CuboidShape::new(
                self.corner1.clone().unwrap_or_else(origin),
                self.corner2.clone().unwrap_or_else(origin),
            )),
            SerializedShapeType::PolygonPrism => {
                RegionShape::PolygonPrism(PolygonPrismShape::new(
                    self.min_y.unwrap_or(0.0),
                    self.max_y.unwrap_or(255.0),
                    self.vertices.clone().unwrap_or_default(),
                ))
            }
            SerializedShapeType::Cylinder => RegionShape::Cylinder(CylinderShape::new(
                self.center.clone().unwrap_or_else(origin),
                self.radius.unwrap_or(5.0),
                self.min_y.unwrap_or(0.0),
                self.max_y.unwrap_or(255.0),
            )),
            SerializedShapeType::FlatPolygon => RegionShape::FlatPolygon(FlatPolygonShape::new(
                self.flat_y.unwrap_or(64.0),
                self.vertices.clone().unwrap_or_default(),
            )),
            SerializedShapeType::Global => RegionShape::Global(GlobalShape::new(
                self.worlds.clone().unwrap_or_default(),
                self.min_y.unwrap_or(regionward_domain::geometry::GLOBAL_DEFAULT_MIN_Y),
                self.max_y.unwrap_or(regionward_domain::geometry::GLOBAL_DEFAULT_MAX_Y),
            )),
        }
    }
}

/// Geometry recovered from an artifact.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredRegion {
    pub mode: SelectionMode,
    pub nodes: Vec<Position>,
    pub shape: RegionShape,
}

/// Decodes an editable region payload, trying v2 first and then the legacy layout.
///
/// A v2 payload whose nodes no longer form a valid shape yields the default cuboid.
pub fn parse_region_payload(data: &str) -> Result<StoredRegion, PayloadError> {
    if data.trim().is_empty() {
        return Err(PayloadError::Empty);
    }
    let value: serde_json::Value = serde_json::from_str(data)?;

    if value.get("mode").is_some() {
        let payload: RegionPayload = serde_json::from_value(value)?;
        let mode = payload.selection_mode();
        let shape = mode
            .compute_shape(&payload.nodes, None)
            .unwrap_or_default();
        return Ok(StoredRegion {
            mode,
            nodes: payload.nodes,
            shape,
        });
    }

    if value.get("shape").is_some() {
        let legacy: LegacyRegionPayload = serde_json::from_value(value)?;
        let shape = legacy.shape.to_shape();
        let nodes = legacy.nodes.unwrap_or_else(|| derive_nodes(&shape));
        return Ok(StoredRegion {
            mode: SelectionMode::from_shape(&shape),
            nodes,
            shape,
        });
    }

    Err(PayloadError::Unrecognized(truncate(data)))
}

/// Decodes a world-wide payload. Missing or unreadable fields come from `fallback`.
pub fn parse_global_payload(data: &str, fallback: &GlobalArtifactSettings) -> StoredRegion {
    let payload: GlobalRegionPayload = serde_json::from_str(data).unwrap_or_default();
    let worlds = Some(payload.resolved_worlds())
        .filter(|worlds| !worlds.is_empty())
        .unwrap_or_else(|| fallback.resolved_worlds());
    let shape = GlobalShape::new(
        worlds,
        payload.min_y.unwrap_or(fallback.min_y),
        payload.max_y.unwrap_or(fallback.max_y),
    );
    StoredRegion {
        mode: SelectionMode::Polygon,
        nodes: Vec::new(),
        shape: RegionShape::Global(shape),
    }
}

/// Whether a stored world-wide shape still matches the artifact settings.
pub fn global_matches_settings(shape: &RegionShape, settings: &GlobalArtifactSettings) -> bool {
    let RegionShape::Global(global) = shape else {
        return false;
    };
    let lowercase = |worlds: &[String]| -> HashSet<String> {
        worlds.iter().map(|world| world.to_lowercase()).collect()
    };
    lowercase(global.worlds()) == lowercase(&settings.resolved_worlds())
        && global.min_y == settings.min_y
        && global.max_y == settings.max_y
}

/// Minimal node list from which the shape can be rebuilt.
///
/// Prism and cylinder nodes sit on the floor except the last one, which is
/// raised to the ceiling so the vertical range survives a rebuild. Cylinders
/// are reduced to sampled rim points; rebuilding those yields a polygon
/// approximation that is only meant for storage.
pub fn derive_nodes(shape: &RegionShape) -> Vec<Position> {
    match shape {
        RegionShape::Cuboid(cuboid) => vec![cuboid.min(), cuboid.max()],
        RegionShape::PolygonPrism(prism) => with_ceiling(
            prism
                .vertices
                .iter()
                .map(|vertex| vertex.with_y(prism.min_y))
                .collect(),
            prism.max_y,
        ),
        RegionShape::FlatPolygon(flat) => flat
            .vertices
            .iter()
            .map(|vertex| vertex.with_y(flat.y))
            .collect(),
        RegionShape::Cylinder(cylinder) => with_ceiling(
            (0..CYLINDER_NODE_SAMPLES)
                .map(|step| {
                    let angle = 2.0 * PI * step as f64 / CYLINDER_NODE_SAMPLES as f64;
                    Position::new(
                        cylinder.center.world.clone(),
                        cylinder.center.x + cylinder.radius * angle.cos(),
                        cylinder.min_y,
                        cylinder.center.z + cylinder.radius * angle.sin(),
                    )
                })
                .collect(),
            cylinder.max_y,
        ),
        RegionShape::Global(_) => Vec::new(),
    }
}

fn with_ceiling(mut nodes: Vec<Position>, max_y: f64) -> Vec<Position> {
    if let Some(last) = nodes.last_mut() {
        last.y = max_y;
    }
    nodes
}

fn truncate(data: &str) -> String {
    data.chars().take(80).collect()
}
