//! Raw region definitions and the resolved runtime model.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::flags::{FlagBinding, RegionFlagKey};
use crate::geometry::{
    dedupe_worlds, GlobalShape, Position, RegionShape, GLOBAL_DEFAULT_MAX_Y, GLOBAL_DEFAULT_MIN_Y,
};
use crate::ids::{ArtifactId, RegionId};

/// A hand-authored region as loaded from the definition source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegionDefinition {
    pub id: RegionId,
    #[serde(default)]
    pub name: String,
    /// Artifact holding the persisted shape of this region.
    #[serde(default)]
    pub artifact: Option<RegionArtifact>,
    /// Higher wins when regions overlap. Zero means "inherit from parent".
    #[serde(default)]
    pub priority: i32,
    #[serde(default)]
    pub owners: Vec<String>,
    #[serde(default)]
    pub members: Vec<String>,
    #[serde(default)]
    pub group_ids: Vec<String>,
    #[serde(default)]
    pub parent: Option<RegionId>,
    #[serde(default)]
    pub flags: Vec<FlagBinding>,
}

impl RegionDefinition {
    pub fn new(id: impl Into<RegionId>) -> Self {
        Self {
            id: id.into(),
            name: String::new(),
            artifact: None,
            priority: 0,
            owners: Vec::new(),
            members: Vec::new(),
            group_ids: Vec::new(),
            parent: None,
            flags: Vec::new(),
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    pub fn with_parent(mut self, parent: impl Into<RegionId>) -> Self {
        self.parent = Some(parent.into());
        self
    }

    pub fn with_artifact(mut self, artifact: RegionArtifact) -> Self {
        self.artifact = Some(artifact);
        self
    }

    pub fn with_flag(mut self, binding: FlagBinding) -> Self {
        self.flags.push(binding);
        self
    }

    pub fn with_owner(mut self, owner: impl Into<String>) -> Self {
        self.owners.push(owner.into());
        self
    }

    pub fn with_member(mut self, member: impl Into<String>) -> Self {
        self.members.push(member.into());
        self
    }

    /// Last local binding for `key`.
    pub fn local_flag(&self, key: RegionFlagKey) -> Option<&FlagBinding> {
        self.flags.iter().rev().find(|binding| binding.key() == key)
    }
}

/// Storage slot for a region's persisted geometry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegionArtifact {
    pub id: ArtifactId,
    #[serde(default)]
    pub name: String,
    /// Present for world-wide regions.
    #[serde(default)]
    pub global: Option<GlobalArtifactSettings>,
}

impl RegionArtifact {
    pub fn new(id: impl Into<ArtifactId>) -> Self {
        Self {
            id: id.into(),
            name: String::new(),
            global: None,
        }
    }

    pub fn global(id: impl Into<ArtifactId>, settings: GlobalArtifactSettings) -> Self {
        Self {
            id: id.into(),
            name: String::new(),
            global: Some(settings),
        }
    }

    pub fn is_global(&self) -> bool {
        self.global.is_some()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GlobalArtifactSettings {
    #[serde(default)]
    pub worlds: Vec<String>,
    #[serde(default = "default_global_min_y")]
    pub min_y: f64,
    #[serde(default = "default_global_max_y")]
    pub max_y: f64,
}

fn default_global_min_y() -> f64 {
    GLOBAL_DEFAULT_MIN_Y
}

fn default_global_max_y() -> f64 {
    GLOBAL_DEFAULT_MAX_Y
}

impl GlobalArtifactSettings {
    pub fn new(worlds: Vec<String>, min_y: f64, max_y: f64) -> Self {
        Self {
            worlds,
            min_y,
            max_y,
        }
    }

    /// Configured worlds, trimmed and de-duplicated.
    pub fn resolved_worlds(&self) -> Vec<String> {
        dedupe_worlds(&self.worlds)
    }

    pub fn to_shape(&self) -> RegionShape {
        RegionShape::Global(GlobalShape::new(self.resolved_worlds(), self.min_y, self.max_y))
    }
}

impl Default for GlobalArtifactSettings {
    fn default() -> Self {
        Self::new(Vec::new(), GLOBAL_DEFAULT_MIN_Y, GLOBAL_DEFAULT_MAX_Y)
    }
}

/// A region with its hierarchy-derived fields resolved.
///
/// Owners, members, groups, priority and flags only change on a full reload.
/// Shape commits replace the shape and nothing else.
#[derive(Debug, Clone, PartialEq)]
pub struct RegionModel {
    pub id: RegionId,
    pub definition: RegionDefinition,
    pub artifact: Option<RegionArtifact>,
    pub shape: RegionShape,
    pub owners: BTreeSet<String>,
    pub members: BTreeSet<String>,
    pub groups: BTreeSet<String>,
    pub priority: i32,
    /// Parent bindings overridden by same-key local bindings.
    pub flags: Vec<FlagBinding>,
    pub parent_id: Option<RegionId>,
    pub children: BTreeSet<RegionId>,
}

impl RegionModel {
    /// Unresolved model built straight from a definition, with no parent data merged in.
    pub fn from_definition(definition: RegionDefinition, shape: RegionShape) -> Self {
        Self {
            id: definition.id.clone(),
            artifact: definition.artifact.clone(),
            shape,
            owners: definition.owners.iter().cloned().collect(),
            members: definition.members.iter().cloned().collect(),
            groups: non_blank(&definition.group_ids),
            priority: definition.priority,
            flags: definition.flags.clone(),
            parent_id: definition.parent.clone(),
            children: BTreeSet::new(),
            definition,
        }
    }

    /// Name shown to players, falling back to the id.
    pub fn display_name(&self) -> &str {
        if self.definition.name.trim().is_empty() {
            self.id.as_str()
        } else {
            &self.definition.name
        }
    }

    pub fn bounds(&self) -> (Position, Position) {
        self.shape.bounds()
    }

    pub fn contains(&self, position: &Position) -> bool {
        self.shape.contains(position)
    }

    pub fn flag(&self, key: RegionFlagKey) -> Option<&FlagBinding> {
        self.flags.iter().find(|binding| binding.key() == key)
    }

    pub fn with_shape(&self, shape: RegionShape) -> Self {
        Self {
            shape,
            ..self.clone()
        }
    }

    pub fn uses_artifact(&self, artifact: &RegionArtifact) -> bool {
        self.artifact
            .as_ref()
            .is_some_and(|own| own.id == artifact.id)
    }
}

/// Parent bindings first, then local ones; a local binding replaces the parent's binding for the same key.
pub fn merge_flags(parent: &[FlagBinding], local: &[FlagBinding]) -> Vec<FlagBinding> {
    let mut merged: Vec<FlagBinding> = Vec::with_capacity(parent.len() + local.len());
    for binding in parent.iter().chain(local) {
        match merged.iter_mut().find(|existing| existing.key() == binding.key()) {
            Some(existing) => *existing = binding.clone(),
            None => merged.push(binding.clone()),
        }
    }
    merged
}

pub fn non_blank(values: &[String]) -> BTreeSet<String> {
    values
        .iter()
        .filter(|value| !value.trim().is_empty())
        .cloned()
        .collect()
}
