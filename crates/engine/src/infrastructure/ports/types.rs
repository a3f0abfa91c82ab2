//! Helper types for port operations.

use chrono::{DateTime, Utc};
use regionward_domain::{FlagValue, RegionFlagKey, RegionId};
use serde::Serialize;
use uuid::Uuid;

/// Outcome carried by a decision event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DecisionKind {
    Allow,
    Deny,
}

/// Audit record for an Allow or Deny verdict.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FlagDecisionEvent {
    pub kind: DecisionKind,
    /// Region the evaluation was run against.
    pub region_id: RegionId,
    pub flag: RegionFlagKey,
    /// Region that supplied the winning binding.
    pub source_region_id: RegionId,
    pub value: FlagValue,
    pub priority: i32,
    pub action: String,
    pub actor_id: Option<Uuid>,
    pub reason: Option<String>,
    pub occurred_at: DateTime<Utc>,
}
