//! Infrastructure implementations.
//!
//! Contains port trait implementations for storage, events and time.

pub mod artifact_storage;
pub mod clock;
pub mod config;
pub mod events;
pub mod json_source;
pub mod memory;
pub mod ports;
