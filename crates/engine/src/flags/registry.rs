//! Flag definitions and the handlers that turn bindings into verdicts.

use std::sync::Arc;

use dashmap::DashMap;
use regionward_domain::{
    definition_of, flag_definitions, FlagValue, FlagValueKind, RegionFlagDefinition, RegionFlagKey,
};

use crate::flags::context::FlagContext;
use crate::flags::evaluation::{FlagEvaluation, ResolvedFlagBinding};

/// Raised by a handler that could not reach a verdict.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("handler for {flag} failed: {message}")]
pub struct HandlerError {
    pub flag: RegionFlagKey,
    pub message: String,
}

impl HandlerError {
    pub fn new(flag: RegionFlagKey, message: impl Into<String>) -> Self {
        Self {
            flag,
            message: message.into(),
        }
    }
}

pub type FlagHandler =
    dyn Fn(&FlagContext, &ResolvedFlagBinding) -> Result<FlagEvaluation, HandlerError> + Send + Sync;

/// A handler tagged with the value kind it accepts.
#[derive(Clone)]
pub struct HandlerEntry {
    kind: FlagValueKind,
    handler: Arc<FlagHandler>,
}

impl HandlerEntry {
    pub fn new<F>(kind: FlagValueKind, handler: F) -> Self
    where
        F: Fn(&FlagContext, &ResolvedFlagBinding) -> Result<FlagEvaluation, HandlerError>
            + Send
            + Sync
            + 'static,
    {
        Self {
            kind,
            handler: Arc::new(handler),
        }
    }

    pub fn kind(&self) -> FlagValueKind {
        self.kind
    }

    /// `None` when the binding holds a different value kind than the handler accepts.
    pub fn evaluate(
        &self,
        context: &FlagContext,
        resolved: &ResolvedFlagBinding,
    ) -> Option<Result<FlagEvaluation, HandlerError>> {
        if resolved.binding.value().kind() != self.kind {
            return None;
        }
        Some((self.handler)(context, resolved))
    }
}

impl std::fmt::Debug for HandlerEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HandlerEntry").field("kind", &self.kind).finish()
    }
}

/// Keys handled by [`deny_when_false`] out of the box.
pub const DENY_WHEN_FALSE_FLAGS: &[RegionFlagKey] = &[
    RegionFlagKey::Build,
    RegionFlagKey::BlockBreak,
    RegionFlagKey::BlockPlace,
    RegionFlagKey::Use,
    RegionFlagKey::Interact,
    RegionFlagKey::ItemPickup,
    RegionFlagKey::ItemDrop,
    RegionFlagKey::Entry,
    RegionFlagKey::Exit,
    RegionFlagKey::MobDamage,
    RegionFlagKey::CreeperExplosion,
    RegionFlagKey::Tnt,
    RegionFlagKey::FireSpread,
    RegionFlagKey::WorldEdit,
    RegionFlagKey::Pvp,
];

/// Definitions plus the handler registered per key.
#[derive(Debug, Default)]
pub struct RegionFlagRegistry {
    handlers: DashMap<RegionFlagKey, HandlerEntry>,
}

impl RegionFlagRegistry {
    /// Registry without any handler; every evaluation passes until one is registered.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn with_default_handlers() -> Self {
        let registry = Self::empty();
        registry.register_defaults();
        registry
    }

    pub fn definition(&self, key: RegionFlagKey) -> &'static RegionFlagDefinition {
        definition_of(key)
    }

    pub fn definitions(&self) -> &'static [RegionFlagDefinition] {
        flag_definitions()
    }

    /// Registers `handler` for `key`, replacing any previous one.
    ///
    /// A kind that differs from the definition is logged; such a handler
    /// only ever sees bindings of its own kind.
    pub fn register_handler<F>(&self, key: RegionFlagKey, kind: FlagValueKind, handler: F)
    where
        F: Fn(&FlagContext, &ResolvedFlagBinding) -> Result<FlagEvaluation, HandlerError>
            + Send
            + Sync
            + 'static,
    {
        let expected = self.definition(key).value_kind;
        if expected != kind {
            tracing::warn!(
                flag = %key,
                handler_kind = %kind,
                expected = %expected,
                "Handler value kind is incompatible with flag definition"
            );
        }
        self.handlers.insert(key, HandlerEntry::new(kind, handler));
    }

    /// Registers by flag id. Unknown ids are logged and skipped.
    pub fn register_named<F>(&self, id: &str, kind: FlagValueKind, handler: F) -> bool
    where
        F: Fn(&FlagContext, &ResolvedFlagBinding) -> Result<FlagEvaluation, HandlerError>
            + Send
            + Sync
            + 'static,
    {
        match id.parse::<RegionFlagKey>() {
            Ok(key) => {
                self.register_handler(key, kind, handler);
                true
            }
            Err(e) => {
                tracing::warn!(flag = %id, error = %e, "Skipping handler for unknown flag");
                false
            }
        }
    }

    pub fn unregister_handler(&self, key: RegionFlagKey) -> bool {
        self.handlers.remove(&key).is_some()
    }

    pub fn handler_entry(&self, key: RegionFlagKey) -> Option<HandlerEntry> {
        self.handlers.get(&key).map(|entry| entry.value().clone())
    }

    pub fn has_handler(&self, key: RegionFlagKey) -> bool {
        self.handlers.contains_key(&key)
    }

    fn register_defaults(&self) {
        for key in DENY_WHEN_FALSE_FLAGS {
            self.register_handler(*key, FlagValueKind::Boolean, deny_when_false);
        }
        for key in [RegionFlagKey::EntryAction, RegionFlagKey::ExitAction] {
            self.register_handler(key, FlagValueKind::Actions, player_actions);
        }
        for key in [
            RegionFlagKey::MessageOnEntry,
            RegionFlagKey::MessageOnExit,
            RegionFlagKey::EntryDenyMessage,
            RegionFlagKey::ExitDenyMessage,
        ] {
            self.register_handler(key, FlagValueKind::Text, message);
        }
        for key in [RegionFlagKey::TeleportOnEntry, RegionFlagKey::TeleportOnExit] {
            self.register_handler(key, FlagValueKind::Location, teleport);
        }
    }
}

/// Denies with `<flag>.denied` when the boolean is off, otherwise passes.
pub fn deny_when_false(
    _context: &FlagContext,
    resolved: &ResolvedFlagBinding,
) -> Result<FlagEvaluation, HandlerError> {
    match resolved.binding.value() {
        FlagValue::Boolean { enabled: false } => Ok(FlagEvaluation::deny(format!(
            "{}.denied",
            resolved.binding.key().id()
        ))),
        _ => Ok(FlagEvaluation::Pass),
    }
}

/// Hands the non-blank actions to the caller under `actions.player.<region>`.
pub fn player_actions(
    _context: &FlagContext,
    resolved: &ResolvedFlagBinding,
) -> Result<FlagEvaluation, HandlerError> {
    let actions: Vec<serde_json::Value> = resolved
        .binding
        .value()
        .as_actions()
        .unwrap_or_default()
        .iter()
        .filter(|action| !action.trim().is_empty())
        .map(|action| serde_json::Value::String(action.clone()))
        .collect();
    if actions.is_empty() {
        return Ok(FlagEvaluation::Pass);
    }
    Ok(FlagEvaluation::modify(
        format!("actions.player.{}", resolved.region_id),
        serde_json::Value::Array(actions),
    ))
}

fn message(
    _context: &FlagContext,
    resolved: &ResolvedFlagBinding,
) -> Result<FlagEvaluation, HandlerError> {
    match resolved.binding.value().as_text() {
        Some(content) if !content.trim().is_empty() => Ok(FlagEvaluation::modify(
            "message",
            serde_json::Value::String(content.to_string()),
        )),
        _ => Ok(FlagEvaluation::Pass),
    }
}

fn teleport(
    _context: &FlagContext,
    resolved: &ResolvedFlagBinding,
) -> Result<FlagEvaluation, HandlerError> {
    let Some(position) = resolved.binding.value().as_location() else {
        return Ok(FlagEvaluation::Pass);
    };
    let value = serde_json::to_value(position)
        .map_err(|e| HandlerError::new(resolved.binding.key(), e.to_string()))?;
    Ok(FlagEvaluation::modify("teleport", value))
}

#[cfg(test)]
mod tests {
    use super::*;
    use regionward_domain::{FlagBinding, Position, RegionDefinition, RegionId, RegionModel, RegionShape};

    use crate::flags::context::FlagAction;

    fn context() -> FlagContext {
        let region = RegionModel::from_definition(RegionDefinition::new("spawn"), RegionShape::default());
        FlagContext::new(Arc::new(region), FlagAction::unknown())
    }

    fn resolved(key: RegionFlagKey, value: FlagValue) -> ResolvedFlagBinding {
        ResolvedFlagBinding {
            region_id: RegionId::new("spawn"),
            priority: 1,
            binding: FlagBinding::new(key, value),
        }
    }

    #[test]
    fn defaults_cover_protection_flags() {
        let registry = RegionFlagRegistry::with_default_handlers();
        for key in DENY_WHEN_FALSE_FLAGS {
            let entry = registry.handler_entry(*key).expect("handler");
            assert_eq!(entry.kind(), FlagValueKind::Boolean);
        }
        assert!(registry.has_handler(RegionFlagKey::EntryAction));
        assert!(registry.has_handler(RegionFlagKey::TeleportOnExit));
        assert!(!registry.has_handler(RegionFlagKey::PlaceholderGate));
        assert!(!RegionFlagRegistry::empty().has_handler(RegionFlagKey::Build));
    }

    #[test]
    fn deny_when_false_names_the_flag() {
        let denied = deny_when_false(&context(), &resolved(RegionFlagKey::Build, FlagValue::boolean(false)))
            .expect("verdict");
        assert_eq!(denied, FlagEvaluation::deny("build.denied"));

        let passed = deny_when_false(&context(), &resolved(RegionFlagKey::Build, FlagValue::boolean(true)))
            .expect("verdict");
        assert_eq!(passed, FlagEvaluation::Pass);
    }

    #[test]
    fn entry_rejects_mismatched_kinds() {
        let registry = RegionFlagRegistry::with_default_handlers();
        let entry = registry.handler_entry(RegionFlagKey::TeleportOnEntry).expect("handler");

        let location = resolved(
            RegionFlagKey::TeleportOnEntry,
            FlagValue::location(Position::new("world", 1.0, 64.0, 1.0)),
        );
        let verdict = entry.evaluate(&context(), &location).expect("compatible").expect("ok");
        assert!(verdict.metadata().is_some_and(|metadata| metadata.contains_key("teleport")));

        let mismatched = ResolvedFlagBinding {
            binding: FlagBinding::new(RegionFlagKey::Build, FlagValue::boolean(true)),
            ..location
        };
        assert!(entry.evaluate(&context(), &mismatched).is_none());
    }

    #[test]
    fn actions_are_keyed_by_source_region() {
        let verdict = player_actions(
            &context(),
            &resolved(RegionFlagKey::EntryAction, FlagValue::actions(["greet", " "])),
        )
        .expect("verdict");
        assert_eq!(
            verdict,
            FlagEvaluation::modify("actions.player.spawn", serde_json::json!(["greet"]))
        );

        let empty = player_actions(
            &context(),
            &resolved(RegionFlagKey::EntryAction, FlagValue::actions(Vec::<String>::new())),
        )
        .expect("verdict");
        assert_eq!(empty, FlagEvaluation::Pass);
    }

    #[test]
    fn unknown_named_flags_are_skipped() {
        let registry = RegionFlagRegistry::empty();
        assert!(!registry.register_named("no-such-flag", FlagValueKind::Boolean, deny_when_false));
        assert!(registry.register_named("PVP", FlagValueKind::Boolean, deny_when_false));
        assert!(registry.has_handler(RegionFlagKey::Pvp));
    }

    #[test]
    fn mismatched_registration_still_registers() {
        let registry = RegionFlagRegistry::empty();
        registry.register_handler(RegionFlagKey::Build, FlagValueKind::Text, |_, _| Ok(FlagEvaluation::Allow));
        assert_eq!(
            registry.handler_entry(RegionFlagKey::Build).map(|entry| entry.kind()),
            Some(FlagValueKind::Text)
        );
        assert!(registry.unregister_handler(RegionFlagKey::Build));
    }
}
