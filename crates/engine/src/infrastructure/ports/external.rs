//! Outbound notification ports.

use super::error::EventPublishError;
use super::types::FlagDecisionEvent;

/// Receives Allow and Deny decisions for audit and diagnostics.
///
/// Called inline from evaluation, so implementations must not block.
#[cfg_attr(test, mockall::automock)]
pub trait DecisionEventSink: Send + Sync {
    fn publish(&self, event: &FlagDecisionEvent) -> Result<(), EventPublishError>;
}
