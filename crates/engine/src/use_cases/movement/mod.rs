//! Movement use cases.

mod enforce_transition;
mod presence;

pub use enforce_transition::{
    EnforceTransition, EnforceTransitionError, TransitionDecision, TransitionEffect,
    TransitionRequest,
};
pub use presence::{PresenceChange, RegionPresence};
