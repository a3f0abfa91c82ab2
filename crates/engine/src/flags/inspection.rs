//! Per-key flag diagnostics for inspection tooling.

use regionward_domain::{RegionFlagKey, RegionId, RegionModel};

use crate::flags::evaluation::{effective_source, FlagEvaluationService, ResolvedFlagBinding};

/// How one flag resolves for a region.
#[derive(Debug, Clone, PartialEq)]
pub struct FlagResolution {
    pub key: RegionFlagKey,
    pub target: RegionId,
    /// Every binding for the key in lineage order, root first.
    pub history: Vec<ResolvedFlagBinding>,
    pub effective: Option<ResolvedFlagBinding>,
}

impl FlagResolution {
    pub fn is_local(&self) -> bool {
        self.effective
            .as_ref()
            .is_some_and(|effective| effective.region_id == self.target)
    }

    pub fn is_inherited(&self) -> bool {
        self.effective.is_some() && !self.is_local()
    }

    pub fn overrides_parent(&self) -> bool {
        self.is_local() && self.history.len() > 1
    }

    /// Ancestors define the key but the inheritance policy keeps them out.
    pub fn blocked_by_inheritance(&self) -> bool {
        self.effective.is_none() && !self.history.is_empty()
    }

    /// Binding just before the last one in the lineage.
    pub fn parent_source(&self) -> Option<&ResolvedFlagBinding> {
        self.history.iter().rev().nth(1)
    }

    /// One-line description, e.g. `build = false (inherited from town)`.
    pub fn summary(&self) -> String {
        match &self.effective {
            Some(effective) if self.is_local() => {
                format!("{} = {}", self.key, effective.binding.value())
            }
            Some(effective) => format!(
                "{} = {} (inherited from {})",
                self.key,
                effective.binding.value(),
                effective.region_id
            ),
            None => format!("{} = <not effective>", self.key),
        }
    }
}

/// Resolutions for every key bound anywhere in the region's lineage, sorted by key id.
pub fn resolve_flag_resolutions(
    service: &FlagEvaluationService,
    region: &RegionModel,
) -> Vec<FlagResolution> {
    let graph = service.bindings_for(region);
    let mut resolutions: Vec<FlagResolution> = graph
        .keys()
        .into_iter()
        .map(|key| {
            let history = graph.history(key).to_vec();
            let inheritance = service.registry().definition(key).inheritance;
            let effective = effective_source(inheritance, &history, &region.id).and_then(|source| {
                history
                    .iter()
                    .rev()
                    .find(|resolved| &resolved.region_id == source)
                    .cloned()
            });
            FlagResolution {
                key,
                target: region.id.clone(),
                history,
                effective,
            }
        })
        .collect();
    resolutions.sort_by(|a, b| a.key.id().cmp(b.key.id()));
    resolutions
}
