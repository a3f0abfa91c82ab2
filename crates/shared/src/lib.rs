//! regionward Shared - payload types exchanged with storage collaborators
//!
//! The engine writes these payloads into region artifacts and reads them back
//! on reload. Keep the format backwards compatible: older artifacts must stay
//! readable.

pub mod payload;

pub use payload::{
    derive_nodes, global_matches_settings, parse_global_payload, parse_region_payload,
    GlobalRegionPayload, LegacyRegionPayload, PayloadError, RegionPayload, SerializedShape,
    SerializedShapeType, StoredRegion, CYLINDER_NODE_SAMPLES, PAYLOAD_VERSION,
};
