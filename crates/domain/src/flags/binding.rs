use serde::{Deserialize, Serialize};

use super::definition::definition_of;
use super::key::RegionFlagKey;
use super::value::FlagValue;

/// A flag key paired with a value of the key's declared kind.
///
/// The pair can never disagree: changing the key resets the value to that
/// key's default, and a value of the wrong kind is replaced by the default.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "BindingRecord")]
pub struct FlagBinding {
    key: RegionFlagKey,
    value: FlagValue,
}

#[derive(Deserialize)]
struct BindingRecord {
    key: RegionFlagKey,
    #[serde(default)]
    value: Option<FlagValue>,
}

impl From<BindingRecord> for FlagBinding {
    fn from(record: BindingRecord) -> Self {
        match record.value {
            Some(value) => FlagBinding::new(record.key, value),
            None => FlagBinding::with_default(record.key),
        }
    }
}

impl FlagBinding {
    pub fn new(key: RegionFlagKey, value: FlagValue) -> Self {
        let value = coerce(key, value);
        Self { key, value }
    }

    pub fn with_default(key: RegionFlagKey) -> Self {
        Self {
            key,
            value: definition_of(key).default_flag_value(),
        }
    }

    pub fn key(&self) -> RegionFlagKey {
        self.key
    }

    pub fn value(&self) -> &FlagValue {
        &self.value
    }

    /// Switches the key. The value resets to the new key's default.
    pub fn set_key(&mut self, key: RegionFlagKey) {
        if self.key == key {
            return;
        }
        self.key = key;
        self.value = definition_of(key).default_flag_value();
    }

    pub fn set_value(&mut self, value: FlagValue) {
        self.value = coerce(self.key, value);
    }
}

impl Default for FlagBinding {
    fn default() -> Self {
        Self::with_default(RegionFlagKey::Build)
    }
}

fn coerce(key: RegionFlagKey, value: FlagValue) -> FlagValue {
    let definition = definition_of(key);
    if value.kind() == definition.value_kind {
        value
    } else {
        definition.default_flag_value()
    }
}
