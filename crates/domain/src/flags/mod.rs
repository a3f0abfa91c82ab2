//! Flag keys, values, definitions and bindings.

pub mod binding;
pub mod definition;
pub mod key;
pub mod value;

pub use binding::FlagBinding;
pub use definition::{
    definition_of, flag_definitions, FlagCompatibility, FlagEvaluationPriority, FlagInheritance,
    RegionFlagCategory, RegionFlagDefinition,
};
pub use key::RegionFlagKey;
pub use value::{format_number, FlagValue, FlagValueKind};
