//! Catalogue of flag keys with their stable string ids.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::DomainError;

macro_rules! flag_keys {
    ($($variant:ident => $id:literal),+ $(,)?) => {
        /// Every flag a region can carry.
        ///
        /// Keys are persisted by id, so an id never changes once published.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(try_from = "String", into = "String")]
        pub enum RegionFlagKey {
            $($variant),+
        }

        impl RegionFlagKey {
            pub fn all() -> &'static [RegionFlagKey] {
                &[$(RegionFlagKey::$variant),+]
            }

            /// Stable kebab-case identifier.
            pub fn id(&self) -> &'static str {
                match self {
                    $(RegionFlagKey::$variant => $id),+
                }
            }
        }

        impl FromStr for RegionFlagKey {
            type Err = DomainError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s.trim().to_ascii_lowercase().as_str() {
                    $($id => Ok(RegionFlagKey::$variant),)+
                    other => Err(DomainError::parse(format!("Unknown flag: {other}"))),
                }
            }
        }
    };
}

flag_keys! {
    Build => "build",
    BlockBreak => "block-break",
    BlockPlace => "block-place",
    Use => "use",
    Interact => "interact",
    Pvp => "pvp",
    MobDamage => "mob-damage",
    MobSpawning => "mob-spawning",
    CreeperExplosion => "creeper-explosion",
    Tnt => "tnt",
    FireSpread => "fire-spread",
    Lightning => "lightning",
    EndermanGrief => "enderman-grief",
    GhastFireball => "ghast-fireball",
    LavaFire => "lava-fire",
    LavaFlow => "lava-flow",
    WaterFlow => "water-flow",
    IceMelt => "ice-melt",
    SnowMelt => "snow-melt",
    LeafDecay => "leaf-decay",
    GrassGrowth => "grass-growth",
    VineGrowth => "vine-growth",
    EntityPaintingDestroy => "entity-painting-destroy",
    VehiclePlace => "vehicle-place",
    VehicleDestroy => "vehicle-destroy",
    EnderPearl => "ender-pearl",
    PotionSplash => "potion-splash",
    ExpDrops => "exp-drops",
    ItemPickup => "item-pickup",
    ItemDrop => "item-drop",
    Entry => "entry",
    Exit => "exit",
    EntryAction => "entry-action",
    ExitAction => "exit-action",
    EntryDenyMessage => "entry-deny-message",
    ExitDenyMessage => "exit-deny-message",
    PassThrough => "passthrough",
    Invincible => "invincible",
    FallDamage => "fall-damage",
    Hunger => "hunger",
    HealAmount => "heal-amount",
    HealDelay => "heal-delay",
    HealMinHealth => "heal-min-health",
    HealMaxHealth => "heal-max-health",
    Teleport => "teleport",
    SpawnLocation => "spawn-location",
    RespawnLocation => "respawn-location",
    BlockedEffects => "blocked-effects",
    GiveEffects => "give-effects",
    Fly => "fly",
    WalkSpeed => "walk-speed",
    FlySpeed => "fly-speed",
    KeepInventory => "keep-inventory",
    KeepExp => "keep-exp",
    ChatPrefix => "chat-prefix",
    ChatSuffix => "chat-suffix",
    Godmode => "godmode",
    Frostwalker => "frostwalker",
    NetherPortals => "nether-portals",
    Glide => "glide",
    ChunkUnload => "chunk-unload",
    ItemDurability => "item-durability",
    JoinLocation => "join-location",
    TeleportOnEntry => "teleport-on-entry",
    TeleportOnExit => "teleport-on-exit",
    CommandOnEntry => "command-on-entry",
    CommandOnExit => "command-on-exit",
    ConsoleCommandOnEntry => "console-command-on-entry",
    ConsoleCommandOnExit => "console-command-on-exit",
    PlaySounds => "play-sounds",
    BlockedItems => "blocked-items",
    GiveItems => "give-items",
    EntryMinLevel => "entry-min-level",
    EntryMaxLevel => "entry-max-level",
    PermitCompletely => "permit-completely",
    WorldEdit => "worldedit",
    MessageOnEntry => "message-on-entry",
    MessageOnExit => "message-on-exit",
    InventoryLoadout => "inventory-loadout",
    CommandBlacklist => "command-blacklist",
    CommandWhitelist => "command-whitelist",
    PlaceholderGate => "placeholder-gate",
}

impl fmt::Display for RegionFlagKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

impl TryFrom<String> for RegionFlagKey {
    type Error = DomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<RegionFlagKey> for String {
    fn from(key: RegionFlagKey) -> Self {
        key.id().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn ids_are_unique() {
        let ids: HashSet<&str> = RegionFlagKey::all().iter().map(RegionFlagKey::id).collect();
        assert_eq!(ids.len(), RegionFlagKey::all().len());
    }

    #[test]
    fn parses_ids_case_insensitively() {
        assert_eq!("BLOCK-BREAK".parse::<RegionFlagKey>(), Ok(RegionFlagKey::BlockBreak));
        assert_eq!(" worldedit ".parse::<RegionFlagKey>(), Ok(RegionFlagKey::WorldEdit));
        assert!("flying-pigs".parse::<RegionFlagKey>().is_err());
    }

    #[test]
    fn serializes_as_id() {
        let json = serde_json::to_string(&RegionFlagKey::MessageOnEntry).expect("serialize");
        assert_eq!(json, "\"message-on-entry\"");
        let key: RegionFlagKey = serde_json::from_str("\"pvp\"").expect("deserialize");
        assert_eq!(key, RegionFlagKey::Pvp);
    }
}
