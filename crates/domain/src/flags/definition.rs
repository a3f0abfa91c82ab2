//! Static per-flag metadata.
//!
//! The catalogue is built once per process and is read-only afterwards.
//! Keys without an explicit entry get a reserved text definition so every
//! key always resolves to some definition.

use std::collections::HashMap;
use std::sync::OnceLock;

use serde::{Deserialize, Serialize};

use super::key::RegionFlagKey;
use super::value::{FlagValue, FlagValueKind};

/// How a flag propagates down a region hierarchy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FlagInheritance {
    /// The nearest region in the lineage carrying the flag supplies the value.
    Always,
    /// Only the region's own binding counts; ancestors are informational.
    OverrideOnly,
    /// Must be set locally.
    Never,
}

impl FlagInheritance {
    /// Whether an ancestor binding may become effective for a descendant.
    pub fn inherits(&self) -> bool {
        matches!(self, FlagInheritance::Always)
    }
}

/// Informational ordering hint for evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FlagEvaluationPriority {
    Low,
    Default,
    High,
    Critical,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RegionFlagCategory {
    General,
    Blocks,
    Combat,
    Movement,
    Inventory,
    Chat,
    Audio,
    Misc,
}

/// Runtime support level of the handler behind a flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FlagCompatibility {
    PaperOnly,
    FoliaSafe,
    Experimental,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegionFlagDefinition {
    pub key: RegionFlagKey,
    pub description: String,
    pub value_kind: FlagValueKind,
    pub category: RegionFlagCategory,
    pub evaluation_priority: FlagEvaluationPriority,
    pub inheritance: FlagInheritance,
    pub compatibility: FlagCompatibility,
    /// Accepted tokens for enumerated text flags.
    pub allowed_values: Vec<String>,
    pub default_value: Option<String>,
}

impl RegionFlagDefinition {
    fn new(
        key: RegionFlagKey,
        description: &str,
        value_kind: FlagValueKind,
        category: RegionFlagCategory,
    ) -> Self {
        Self {
            key,
            description: description.to_string(),
            value_kind,
            category,
            evaluation_priority: FlagEvaluationPriority::Default,
            inheritance: FlagInheritance::Always,
            compatibility: FlagCompatibility::FoliaSafe,
            allowed_values: Vec::new(),
            default_value: None,
        }
    }

    fn boolean(key: RegionFlagKey, description: &str, category: RegionFlagCategory) -> Self {
        Self::new(key, description, FlagValueKind::Boolean, category)
    }

    fn text(key: RegionFlagKey, description: &str, category: RegionFlagCategory) -> Self {
        Self::new(key, description, FlagValueKind::Text, category)
    }

    fn actions(key: RegionFlagKey, description: &str, category: RegionFlagCategory) -> Self {
        Self::new(key, description, FlagValueKind::Actions, category)
    }

    fn list(key: RegionFlagKey, description: &str, category: RegionFlagCategory) -> Self {
        Self::new(key, description, FlagValueKind::List, category)
            .with_compatibility(FlagCompatibility::Experimental)
    }

    fn location(key: RegionFlagKey, description: &str, category: RegionFlagCategory) -> Self {
        Self::new(key, description, FlagValueKind::Location, category)
            .with_inheritance(FlagInheritance::OverrideOnly)
    }

    fn integer(key: RegionFlagKey, description: &str, category: RegionFlagCategory) -> Self {
        Self::new(key, description, FlagValueKind::Integer, category)
    }

    fn double(key: RegionFlagKey, description: &str, category: RegionFlagCategory) -> Self {
        Self::new(key, description, FlagValueKind::Double, category)
    }

    fn sound(key: RegionFlagKey, description: &str, category: RegionFlagCategory) -> Self {
        Self::new(key, description, FlagValueKind::Sound, category)
            .with_compatibility(FlagCompatibility::Experimental)
    }

    fn potion(key: RegionFlagKey, description: &str, category: RegionFlagCategory) -> Self {
        Self::new(key, description, FlagValueKind::Potion, category)
    }

    /// Placeholder for keys that have no behaviour yet.
    pub fn reserved(key: RegionFlagKey) -> Self {
        Self::text(
            key,
            "Reserved flag with no implementation yet",
            RegionFlagCategory::Misc,
        )
        .with_compatibility(FlagCompatibility::Experimental)
    }

    pub fn with_priority(mut self, priority: FlagEvaluationPriority) -> Self {
        self.evaluation_priority = priority;
        self
    }

    pub fn with_inheritance(mut self, inheritance: FlagInheritance) -> Self {
        self.inheritance = inheritance;
        self
    }

    pub fn with_compatibility(mut self, compatibility: FlagCompatibility) -> Self {
        self.compatibility = compatibility;
        self
    }

    pub fn with_allowed_values(mut self, values: &[&str]) -> Self {
        self.allowed_values = values.iter().map(|value| value.to_string()).collect();
        self
    }

    /// Type-correct default payload for this flag.
    pub fn default_flag_value(&self) -> FlagValue {
        match self.value_kind {
            FlagValueKind::Text => FlagValue::text(
                self.default_value
                    .clone()
                    .or_else(|| self.allowed_values.first().cloned())
                    .unwrap_or_default(),
            ),
            kind => FlagValue::default_for(kind),
        }
    }
}

/// The process-wide definition catalogue, in [`RegionFlagKey::all`] order.
pub fn flag_definitions() -> &'static [RegionFlagDefinition] {
    static DEFINITIONS: OnceLock<Vec<RegionFlagDefinition>> = OnceLock::new();
    DEFINITIONS.get_or_init(build_definitions)
}

/// Definition for `key`.
pub fn definition_of(key: RegionFlagKey) -> &'static RegionFlagDefinition {
    // One entry per key, indexed by declaration order.
    &flag_definitions()[key as usize]
}

fn build_definitions() -> Vec<RegionFlagDefinition> {
    use FlagEvaluationPriority::{Critical, High};
    use RegionFlagCategory::*;
    use RegionFlagDefinition as D;
    use RegionFlagKey as K;

    let explicit = vec![
        D::boolean(K::Build, "Allow players to build", General).with_priority(High),
        D::boolean(K::BlockBreak, "Controls block breaking", Blocks).with_priority(High),
        D::boolean(K::BlockPlace, "Controls block placement", Blocks).with_priority(High),
        D::boolean(K::Use, "Allow lever, button and container use", Misc),
        D::boolean(K::Interact, "Controls right click interactions", Misc),
        D::boolean(K::Pvp, "Allow player damage", Combat).with_priority(Critical),
        D::boolean(K::MobDamage, "Allow mob damage", Combat).with_priority(High),
        D::boolean(K::MobSpawning, "Allow creature spawning", Combat),
        D::boolean(K::CreeperExplosion, "Creeper explosions", Blocks),
        D::boolean(K::Tnt, "TNT explosions", Blocks),
        D::boolean(K::FireSpread, "Fire spread", Blocks),
        D::boolean(K::Lightning, "Lightning ignitions", Blocks),
        D::boolean(K::EndermanGrief, "Enderman block grief", Blocks),
        D::boolean(K::GhastFireball, "Ghast fireball explosions", Blocks),
        D::boolean(K::LavaFire, "Lava igniting blocks", Blocks),
        D::boolean(K::LavaFlow, "Lava fluid spread", Blocks),
        D::boolean(K::WaterFlow, "Water fluid spread", Blocks),
        D::boolean(K::IceMelt, "Prevent ice melting", Blocks),
        D::boolean(K::SnowMelt, "Prevent snow melting", Blocks),
        D::boolean(K::LeafDecay, "Leaf decay", Blocks),
        D::boolean(K::GrassGrowth, "Grass and mycelium spread", Blocks),
        D::boolean(K::VineGrowth, "Vine growth", Blocks),
        D::boolean(K::EntityPaintingDestroy, "Painting break protection", Blocks),
        D::boolean(K::VehiclePlace, "Vehicle placement", Misc),
        D::boolean(K::VehicleDestroy, "Vehicle destruction", Misc),
        D::boolean(K::EnderPearl, "Use of ender pearls", Movement),
        D::boolean(K::PotionSplash, "Area potion effects", Misc),
        D::boolean(K::ExpDrops, "Experience orb drops", Inventory),
        D::boolean(K::ItemPickup, "Allow item pickup", Inventory),
        D::boolean(K::ItemDrop, "Allow item drops", Inventory),
        D::boolean(K::Entry, "Allow entering region", Movement).with_priority(Critical),
        D::boolean(K::Exit, "Allow exiting region", Movement).with_priority(Critical),
        D::actions(K::EntryAction, "Actions run when entry is blocked", Movement),
        D::actions(K::ExitAction, "Actions run when exit is blocked", Movement),
        D::text(K::EntryDenyMessage, "Message shown when entry is denied", Chat),
        D::text(K::ExitDenyMessage, "Message shown when exit is denied", Chat),
        D::boolean(K::PassThrough, "Skip membership checks for child regions", General),
        D::boolean(K::Invincible, "Enable invincibility", Combat),
        D::boolean(K::FallDamage, "Control fall damage", Movement),
        D::boolean(K::Hunger, "Natural hunger drain", General),
        D::integer(K::HealAmount, "Amount of health restored per tick", General),
        D::integer(K::HealDelay, "Ticks between healing pulses", General),
        D::double(K::HealMinHealth, "Minimum health threshold for healing", General),
        D::double(K::HealMaxHealth, "Maximum health cap during healing", General),
        D::location(K::Teleport, "Teleport destination", Movement).with_priority(High),
        D::location(K::SpawnLocation, "Spawn point inside the region", Movement),
        D::location(K::RespawnLocation, "Respawn point after death", Movement),
        D::list(K::BlockedEffects, "Potion effect identifiers to remove", Misc),
        D::potion(K::GiveEffects, "Potion effect applied inside the region", Misc),
        D::boolean(K::Fly, "Allow flight", Movement),
        D::double(K::WalkSpeed, "Custom walk speed", Movement),
        D::double(K::FlySpeed, "Custom fly speed", Movement),
        D::boolean(K::KeepInventory, "Keep inventory on death", Inventory),
        D::boolean(K::KeepExp, "Keep experience on death", Inventory),
        D::text(K::ChatPrefix, "Chat prefix applied inside the region", Chat),
        D::text(K::ChatSuffix, "Chat suffix applied inside the region", Chat),
        D::boolean(K::Godmode, "Toggle god mode", Combat),
        D::boolean(K::Frostwalker, "Allow frost walker ice", Blocks),
        D::boolean(K::NetherPortals, "Allow portal creation", Blocks),
        D::text(K::Glide, "Force or block elytra gliding", Movement)
            .with_compatibility(FlagCompatibility::Experimental)
            .with_allowed_values(&["allow", "deny", "default"]),
        D::boolean(K::ChunkUnload, "Keep chunks loaded", Misc)
            .with_compatibility(FlagCompatibility::Experimental),
        D::boolean(K::ItemDurability, "Prevent durability loss", Inventory)
            .with_compatibility(FlagCompatibility::Experimental),
        D::location(K::JoinLocation, "Login spawn location", Movement),
        D::location(K::TeleportOnEntry, "Destination applied on entry", Movement),
        D::location(K::TeleportOnExit, "Destination applied on exit", Movement),
        D::sound(K::PlaySounds, "Sound played inside the region", Audio),
        D::text(K::EntryMinLevel, "Minimum level required to enter", Movement)
            .with_compatibility(FlagCompatibility::Experimental),
        D::text(K::EntryMaxLevel, "Maximum level allowed to enter", Movement)
            .with_compatibility(FlagCompatibility::Experimental),
        D::list(K::PermitCompletely, "Items fully permitted despite other restrictions", Misc),
        D::boolean(K::WorldEdit, "Allow WorldEdit", Misc)
            .with_inheritance(FlagInheritance::OverrideOnly),
        D::text(K::MessageOnEntry, "Message sent on entry", Chat),
        D::text(K::MessageOnExit, "Message sent on exit", Chat),
    ];

    let mut explicit: HashMap<RegionFlagKey, RegionFlagDefinition> = explicit
        .into_iter()
        .map(|definition| (definition.key, definition))
        .collect();
    RegionFlagKey::all()
        .iter()
        .map(|key| {
            explicit
                .remove(key)
                .unwrap_or_else(|| RegionFlagDefinition::reserved(*key))
        })
        .collect()
}
