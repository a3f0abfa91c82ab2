//! Repository modules - the authoritative in-memory region index.

pub mod region;

pub use region::{lineage_of, RegionLookup, RegionRepository};

#[cfg(test)]
pub use region::MockRegionLookup;
