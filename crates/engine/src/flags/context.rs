//! The snapshot a flag is evaluated against.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use regionward_domain::{DomainError, Position, RegionModel};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Namespaced action identifier, e.g. `protection:block-break`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct FlagAction(String);

impl FlagAction {
    pub fn new(id: impl Into<String>) -> Result<Self, DomainError> {
        let id = id.into();
        if id.trim().is_empty() {
            return Err(DomainError::validation("Flag action identifier must not be blank"));
        }
        if !id.contains(':') {
            return Err(DomainError::validation(format!(
                "Flag action identifier must contain a namespace (source:action): {id}"
            )));
        }
        Ok(Self(id))
    }

    pub fn unknown() -> Self {
        Self("internal:unknown".to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for FlagAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for FlagAction {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for FlagAction {
    type Error = DomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<FlagAction> for String {
    fn from(action: FlagAction) -> Self {
        action.0
    }
}

/// The player behind an action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    pub id: Uuid,
    pub name: String,
}

impl Actor {
    pub fn new(id: Uuid, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
        }
    }
}

/// Any non-player entity involved in an action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityRef {
    pub id: Uuid,
    pub kind: String,
}

#[derive(Debug, Clone)]
pub struct FlagContext {
    pub region: Arc<RegionModel>,
    pub action: FlagAction,
    pub location: Option<Position>,
    pub actor: Option<Actor>,
    pub source: Option<EntityRef>,
    pub target: Option<EntityRef>,
    /// Free-form values listeners attach for handlers.
    pub runtime_data: BTreeMap<String, serde_json::Value>,
}

impl FlagContext {
    pub fn new(region: Arc<RegionModel>, action: FlagAction) -> Self {
        Self {
            region,
            action,
            location: None,
            actor: None,
            source: None,
            target: None,
            runtime_data: BTreeMap::new(),
        }
    }

    pub fn at(mut self, location: Position) -> Self {
        self.location = Some(location);
        self
    }

    pub fn with_actor(mut self, actor: Actor) -> Self {
        self.actor = Some(actor);
        self
    }

    pub fn with_source(mut self, source: EntityRef) -> Self {
        self.source = Some(source);
        self
    }

    pub fn with_target(mut self, target: EntityRef) -> Self {
        self.target = Some(target);
        self
    }

    pub fn with_data(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.runtime_data.insert(key.into(), value);
        self
    }

    /// Same context pointed at another region.
    pub fn for_region(&self, region: Arc<RegionModel>) -> Self {
        Self {
            region,
            ..self.clone()
        }
    }

    /// Owners and members of the region skip flag checks. Matches by uuid or name.
    pub fn can_bypass(&self) -> bool {
        let Some(actor) = &self.actor else {
            return false;
        };
        let id = actor.id.to_string();
        let matches = |set: &std::collections::BTreeSet<String>| {
            set.contains(&id) || set.contains(&actor.name)
        };
        matches(&self.region.owners) || matches(&self.region.members)
    }
}
