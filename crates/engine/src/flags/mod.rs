//! Flag evaluation: context, handler registry, evaluation engine and diagnostics.

pub mod context;
pub mod evaluation;
pub mod inspection;
pub mod registry;

pub use context::{Actor, EntityRef, FlagAction, FlagContext};
pub use evaluation::{
    effective_source, BindingGraph, EvaluationError, FlagCacheInvalidator, FlagEvaluation,
    FlagEvaluationService, FlagUpdateEvent, ResolvedFlagBinding,
};
pub use inspection::{resolve_flag_resolutions, FlagResolution};
pub use registry::{HandlerEntry, HandlerError, RegionFlagRegistry};
