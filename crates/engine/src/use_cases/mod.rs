//! Use cases - runtime protocols built on the repository and the flag engine.

pub mod movement;

pub use movement::{EnforceTransition, RegionPresence, TransitionDecision, TransitionRequest};
