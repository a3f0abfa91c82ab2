//! Enforce transition use case.
//!
//! Decides whether an actor may move between two points. The dominant
//! region at the destination is checked before the dominant region at the
//! origin, so a restrictive region being entered vetoes the move before the
//! exit hooks of the region being left ever run.

use std::collections::BTreeMap;
use std::sync::Arc;

use regionward_domain::{Position, RegionFlagKey, RegionId, RegionModel};
use serde::Serialize;

use crate::flags::{
    Actor, EvaluationError, FlagAction, FlagContext, FlagEvaluation, FlagEvaluationService,
};
use crate::repositories::RegionRepository;

use super::presence::{PresenceChange, RegionPresence};

/// One side of a transition: the gate flag plus its follow-up flags.
struct Side {
    gate: RegionFlagKey,
    /// Exit flags are evaluated at the origin, entry flags at the destination.
    at_origin: bool,
    deny_message: RegionFlagKey,
    deny_action: RegionFlagKey,
    follow_ups: [RegionFlagKey; 3],
}

const ENTRY: Side = Side {
    gate: RegionFlagKey::Entry,
    at_origin: false,
    deny_message: RegionFlagKey::EntryDenyMessage,
    deny_action: RegionFlagKey::EntryAction,
    follow_ups: [
        RegionFlagKey::EntryAction,
        RegionFlagKey::MessageOnEntry,
        RegionFlagKey::TeleportOnEntry,
    ],
};

const EXIT: Side = Side {
    gate: RegionFlagKey::Exit,
    at_origin: true,
    deny_message: RegionFlagKey::ExitDenyMessage,
    deny_action: RegionFlagKey::ExitAction,
    follow_ups: [
        RegionFlagKey::ExitAction,
        RegionFlagKey::MessageOnExit,
        RegionFlagKey::TeleportOnExit,
    ],
};

#[derive(Debug, Clone)]
pub struct TransitionRequest {
    pub actor: Option<Actor>,
    pub from: Position,
    pub to: Position,
    pub action: FlagAction,
}

/// Metadata a flag handler asked the caller to act on.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TransitionEffect {
    pub region_id: RegionId,
    pub flag: RegionFlagKey,
    pub metadata: BTreeMap<String, serde_json::Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "decision", rename_all = "snake_case")]
pub enum TransitionDecision {
    Allowed {
        entered: Option<RegionId>,
        exited: Option<RegionId>,
        effects: Vec<TransitionEffect>,
        presence: PresenceChange,
    },
    Blocked {
        region: RegionId,
        flag: RegionFlagKey,
        reason: Option<String>,
        effects: Vec<TransitionEffect>,
    },
}

impl TransitionDecision {
    pub fn is_blocked(&self) -> bool {
        matches!(self, Self::Blocked { .. })
    }

    pub fn effects(&self) -> &[TransitionEffect] {
        match self {
            Self::Allowed { effects, .. } | Self::Blocked { effects, .. } => effects,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum EnforceTransitionError {
    #[error("Flag evaluation failed: {0}")]
    Evaluation(#[from] EvaluationError),
}

pub struct EnforceTransition {
    regions: Arc<RegionRepository>,
    flags: Arc<FlagEvaluationService>,
    presence: Arc<RegionPresence>,
}

impl EnforceTransition {
    pub fn new(
        regions: Arc<RegionRepository>,
        flags: Arc<FlagEvaluationService>,
        presence: Arc<RegionPresence>,
    ) -> Self {
        Self {
            regions,
            flags,
            presence,
        }
    }

    /// Execute the enforce transition use case.
    ///
    /// Owners and members bypass the entry and exit gates. Follow-up flags
    /// (actions, messages, teleports) run for everyone once a gate passes.
    pub fn execute(
        &self,
        request: &TransitionRequest,
    ) -> Result<TransitionDecision, EnforceTransitionError> {
        let previous = self.regions.dominant_at(&request.from);
        let next = self.regions.dominant_at(&request.to);

        let same_region = match (&previous, &next) {
            (Some(previous), Some(next)) => previous.id == next.id,
            (None, None) => true,
            _ => false,
        };
        if same_region {
            return Ok(self.allowed(request, None, None, Vec::new()));
        }

        let mut effects = Vec::new();
        if let Some(next) = &next {
            if let Some(blocked) = self.check_side(request, next, &ENTRY, &mut effects)? {
                return Ok(blocked);
            }
        }
        if let Some(previous) = &previous {
            if let Some(blocked) = self.check_side(request, previous, &EXIT, &mut effects)? {
                return Ok(blocked);
            }
        }

        Ok(self.allowed(
            request,
            next.map(|region| region.id.clone()),
            previous.map(|region| region.id.clone()),
            effects,
        ))
    }

    /// Evaluates the gate for `region`. Returns the blocked decision, or
    /// collects follow-up effects and returns `None`.
    fn check_side(
        &self,
        request: &TransitionRequest,
        region: &Arc<RegionModel>,
        side: &Side,
        effects: &mut Vec<TransitionEffect>,
    ) -> Result<Option<TransitionDecision>, EnforceTransitionError> {
        let context = self.context(request, region, side);

        let gate = if context.can_bypass() {
            tracing::debug!(region_id = %region.id, flag = %side.gate, "Actor bypasses region gate");
            FlagEvaluation::Allow
        } else {
            self.flags.evaluate(&context, side.gate)?
        };

        match gate {
            FlagEvaluation::Denied { reason } => {
                let mut denied_effects = Vec::new();
                for key in [side.deny_message, side.deny_action] {
                    self.collect(&context, key, &mut denied_effects)?;
                }
                tracing::info!(
                    region_id = %region.id,
                    flag = %side.gate,
                    actor = context.actor.as_ref().map(|actor| actor.name.as_str()).unwrap_or("-"),
                    "Transition blocked"
                );
                Ok(Some(TransitionDecision::Blocked {
                    region: region.id.clone(),
                    flag: side.gate,
                    reason,
                    effects: denied_effects,
                }))
            }
            FlagEvaluation::Modify { metadata } => {
                effects.push(TransitionEffect {
                    region_id: region.id.clone(),
                    flag: side.gate,
                    metadata,
                });
                self.collect_follow_ups(&context, side, effects)?;
                Ok(None)
            }
            FlagEvaluation::Allow | FlagEvaluation::Pass => {
                self.collect_follow_ups(&context, side, effects)?;
                Ok(None)
            }
        }
    }

    fn collect_follow_ups(
        &self,
        context: &FlagContext,
        side: &Side,
        effects: &mut Vec<TransitionEffect>,
    ) -> Result<(), EnforceTransitionError> {
        for key in side.follow_ups {
            self.collect(context, key, effects)?;
        }
        Ok(())
    }

    fn collect(
        &self,
        context: &FlagContext,
        key: RegionFlagKey,
        effects: &mut Vec<TransitionEffect>,
    ) -> Result<(), EnforceTransitionError> {
        if let FlagEvaluation::Modify { metadata } = self.flags.evaluate(context, key)? {
            effects.push(TransitionEffect {
                region_id: context.region.id.clone(),
                flag: key,
                metadata,
            });
        }
        Ok(())
    }

    fn context(&self, request: &TransitionRequest, region: &Arc<RegionModel>, side: &Side) -> FlagContext {
        let position = if side.at_origin { &request.from } else { &request.to };
        let context = FlagContext::new(Arc::clone(region), request.action.clone()).at(position.clone());
        match &request.actor {
            Some(actor) => context.with_actor(actor.clone()),
            None => context,
        }
    }

    fn allowed(
        &self,
        request: &TransitionRequest,
        entered: Option<RegionId>,
        exited: Option<RegionId>,
        effects: Vec<TransitionEffect>,
    ) -> TransitionDecision {
        let presence = match &request.actor {
            Some(actor) => self.presence.update(
                actor.id,
                self.regions
                    .regions_at(&request.to)
                    .into_iter()
                    .map(|region| region.id.clone()),
            ),
            None => PresenceChange::default(),
        };
        TransitionDecision::Allowed {
            entered,
            exited,
            effects,
            presence,
        }
    }
}
