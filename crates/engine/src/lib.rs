//! regionward Engine library.
//!
//! Region repository, flag evaluation and movement enforcement.
//!
//! ## Structure
//!
//! - `repositories/` - The resolved region index and lineage lookups
//! - `flags/` - Flag context, handler registry, evaluation engine, diagnostics
//! - `use_cases/` - Runtime protocols (transition enforcement, presence)
//! - `infrastructure/` - Port traits and their implementations
//! - `api/` - JSON-line query handling for the binary
//! - `app` - Application composition

pub mod api;
pub mod app;
pub mod flags;
pub mod infrastructure;
pub mod repositories;
pub mod use_cases;

/// Shared builders for unit tests.
#[cfg(test)]
pub mod test_fixtures;

pub use app::App;
