//! Entry points for external callers.

pub mod query;

pub use query::{handle_line, Query};
