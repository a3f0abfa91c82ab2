//! Engine configuration from environment variables.
//!
//! Supported environment variables:
//! - REGIONWARD_DEFINITIONS: path to the JSON region definition file
//! - REGIONWARD_ARTIFACT_DIR: directory holding one payload file per artifact
//! - REGIONWARD_EVENT_BUFFER: capacity of the broadcast channels (1-4096, default 64)
//! - RUST_LOG: tracing filter (default `regionward_engine=info`)

use std::path::PathBuf;

pub const DEFAULT_DEFINITIONS_PATH: &str = "regions.json";
pub const DEFAULT_ARTIFACT_DIR: &str = "artifacts";
pub const DEFAULT_EVENT_BUFFER: usize = 64;
pub const DEFAULT_LOG_FILTER: &str = "regionward_engine=info";

const MAX_EVENT_BUFFER: usize = 4096;

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum ConfigError {
    #[error("{name} is not a valid number: {value}")]
    NotANumber { name: &'static str, value: String },

    #[error("{name} out of range [{min}, {max}]: {value}")]
    OutOfRange {
        name: &'static str,
        value: usize,
        min: usize,
        max: usize,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct EngineConfig {
    pub definitions_path: PathBuf,
    pub artifact_dir: PathBuf,
    pub event_buffer: usize,
    pub log_filter: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            definitions_path: PathBuf::from(DEFAULT_DEFINITIONS_PATH),
            artifact_dir: PathBuf::from(DEFAULT_ARTIFACT_DIR),
            event_buffer: DEFAULT_EVENT_BUFFER,
            log_filter: DEFAULT_LOG_FILTER.to_string(),
        }
    }
}

impl EngineConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Builds the config from an arbitrary variable lookup. Invalid values fall back to defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        if let Some(path) = lookup("REGIONWARD_DEFINITIONS").filter(|path| !path.trim().is_empty()) {
            config.definitions_path = PathBuf::from(path.trim());
        }

        if let Some(dir) = lookup("REGIONWARD_ARTIFACT_DIR").filter(|dir| !dir.trim().is_empty()) {
            config.artifact_dir = PathBuf::from(dir.trim());
        }

        if let Some(value) = lookup("REGIONWARD_EVENT_BUFFER") {
            match parse_event_buffer(&value) {
                Ok(size) => config.event_buffer = size,
                Err(error) => tracing::warn!(
                    error = %error,
                    default = DEFAULT_EVENT_BUFFER,
                    "Ignoring REGIONWARD_EVENT_BUFFER"
                ),
            }
        }

        if let Some(filter) = lookup("RUST_LOG").filter(|filter| !filter.trim().is_empty()) {
            config.log_filter = filter;
        }

        config
    }
}

fn parse_event_buffer(value: &str) -> Result<usize, ConfigError> {
    let size = value
        .trim()
        .parse::<usize>()
        .map_err(|_| ConfigError::NotANumber {
            name: "REGIONWARD_EVENT_BUFFER",
            value: value.to_string(),
        })?;
    if !(1..=MAX_EVENT_BUFFER).contains(&size) {
        return Err(ConfigError::OutOfRange {
            name: "REGIONWARD_EVENT_BUFFER",
            value: size,
            min: 1,
            max: MAX_EVENT_BUFFER,
        });
    }
    Ok(size)
}
