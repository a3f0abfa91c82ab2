//! Errors raised while building domain values from untrusted input.

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum DomainError {
    /// A value was well-formed but broke a domain rule.
    #[error("Validation failed: {0}")]
    Validation(String),

    /// A string did not name a known flag, action or format.
    #[error("Parse error: {0}")]
    Parse(String),
}

impl DomainError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn parse(msg: impl Into<String>) -> Self {
        Self::Parse(msg.into())
    }
}
