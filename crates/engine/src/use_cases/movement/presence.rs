//! Which regions each actor is currently inside.

use std::collections::BTreeSet;

use dashmap::DashMap;
use regionward_domain::RegionId;
use serde::Serialize;
use uuid::Uuid;

/// Regions an actor entered and left with one move.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PresenceChange {
    pub entered: Vec<RegionId>,
    pub exited: Vec<RegionId>,
}

impl PresenceChange {
    pub fn is_empty(&self) -> bool {
        self.entered.is_empty() && self.exited.is_empty()
    }
}

#[derive(Debug, Default)]
pub struct RegionPresence {
    members: DashMap<Uuid, BTreeSet<RegionId>>,
}

impl RegionPresence {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the actor's region set and reports the difference.
    pub fn update(&self, actor: Uuid, current: impl IntoIterator<Item = RegionId>) -> PresenceChange {
        let current: BTreeSet<RegionId> = current.into_iter().collect();
        let previous = if current.is_empty() {
            self.members.remove(&actor).map(|(_, regions)| regions)
        } else {
            self.members.insert(actor, current.clone())
        }
        .unwrap_or_default();

        PresenceChange {
            entered: current.difference(&previous).cloned().collect(),
            exited: previous.difference(&current).cloned().collect(),
        }
    }

    pub fn regions_of(&self, actor: &Uuid) -> BTreeSet<RegionId> {
        self.members
            .get(actor)
            .map(|regions| regions.value().clone())
            .unwrap_or_default()
    }

    /// Forgets the actor, e.g. on death or disconnect.
    pub fn clear(&self, actor: &Uuid) -> Option<BTreeSet<RegionId>> {
        self.members.remove(actor).map(|(_, regions)| regions)
    }

    pub fn tracked_actors(&self) -> usize {
        self.members.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(values: &[&str]) -> Vec<RegionId> {
        values.iter().map(|value| RegionId::new(*value)).collect()
    }

    #[test]
    fn reports_entered_and_exited_regions() {
        let presence = RegionPresence::new();
        let actor = Uuid::new_v4();

        let first = presence.update(actor, ids(&["town", "market"]));
        assert_eq!(first.entered, ids(&["market", "town"]));
        assert!(first.exited.is_empty());

        let second = presence.update(actor, ids(&["town", "docks"]));
        assert_eq!(second.entered, ids(&["docks"]));
        assert_eq!(second.exited, ids(&["market"]));

        assert!(presence.update(actor, ids(&["town", "docks"])).is_empty());
    }

    #[test]
    fn leaving_every_region_forgets_the_actor() {
        let presence = RegionPresence::new();
        let actor = Uuid::new_v4();
        presence.update(actor, ids(&["town"]));

        let change = presence.update(actor, Vec::new());

        assert_eq!(change.exited, ids(&["town"]));
        assert_eq!(presence.tracked_actors(), 0);
    }

    #[test]
    fn clear_drops_membership() {
        let presence = RegionPresence::new();
        let actor = Uuid::new_v4();
        presence.update(actor, ids(&["arena"]));

        assert_eq!(presence.clear(&actor).map(|regions| regions.len()), Some(1));
        assert!(presence.regions_of(&actor).is_empty());
    }
}
