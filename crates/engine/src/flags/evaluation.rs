//! Flag evaluation engine.
//!
//! Resolves which bindings apply to a region, caches the resolution per
//! region, and dispatches the applicable bindings to the registered handler.
//!
//! Lineage proximity decides which region supplies a flag: under
//! [`FlagInheritance::Always`] the nearest lineage node carrying the key,
//! otherwise only the region itself. Priority orders dispatch among the
//! supplying bindings.

use std::collections::{BTreeMap, HashMap, HashSet, VecDeque};
use std::sync::Arc;

use dashmap::DashMap;
use regionward_domain::{FlagBinding, FlagInheritance, RegionFlagKey, RegionId, RegionModel};
use serde::Serialize;
use tokio::sync::broadcast;

use crate::flags::context::FlagContext;
use crate::flags::registry::{HandlerError, RegionFlagRegistry};
use crate::infrastructure::ports::{ClockPort, DecisionEventSink, DecisionKind, FlagDecisionEvent};
use crate::repositories::RegionLookup;

/// Outcome of evaluating one flag.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum FlagEvaluation {
    Allow,
    Pass,
    Denied { reason: Option<String> },
    Modify { metadata: BTreeMap<String, serde_json::Value> },
}

impl FlagEvaluation {
    pub fn deny(reason: impl Into<String>) -> Self {
        Self::Denied {
            reason: Some(reason.into()),
        }
    }

    pub fn modify(key: impl Into<String>, value: serde_json::Value) -> Self {
        Self::Modify {
            metadata: BTreeMap::from([(key.into(), value)]),
        }
    }

    pub fn is_denied(&self) -> bool {
        matches!(self, Self::Denied { .. })
    }

    pub fn metadata(&self) -> Option<&BTreeMap<String, serde_json::Value>> {
        match self {
            Self::Modify { metadata } => Some(metadata),
            _ => None,
        }
    }
}

/// A binding together with the region that supplied it.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedFlagBinding {
    pub region_id: RegionId,
    pub priority: i32,
    pub binding: FlagBinding,
}

#[derive(Debug, Default)]
struct KeyBindings {
    lineage: Vec<ResolvedFlagBinding>,
    dispatch: Vec<ResolvedFlagBinding>,
}

/// Every binding visible from one region, per key.
#[derive(Debug, Default)]
pub struct BindingGraph {
    by_key: HashMap<RegionFlagKey, KeyBindings>,
}

impl BindingGraph {
    /// Bindings in lineage order, root first.
    pub fn history(&self, key: RegionFlagKey) -> &[ResolvedFlagBinding] {
        self.by_key
            .get(&key)
            .map(|bindings| bindings.lineage.as_slice())
            .unwrap_or_default()
    }

    /// Bindings by descending region priority, then ascending region id.
    pub fn dispatch_order(&self, key: RegionFlagKey) -> &[ResolvedFlagBinding] {
        self.by_key
            .get(&key)
            .map(|bindings| bindings.dispatch.as_slice())
            .unwrap_or_default()
    }

    pub fn keys(&self) -> Vec<RegionFlagKey> {
        let mut keys: Vec<RegionFlagKey> = self.by_key.keys().copied().collect();
        keys.sort();
        keys
    }
}

/// Region whose bindings count for `target` under `inheritance`.
pub fn effective_source<'a>(
    inheritance: FlagInheritance,
    history: &'a [ResolvedFlagBinding],
    target: &RegionId,
) -> Option<&'a RegionId> {
    match inheritance {
        FlagInheritance::Always => history.last().map(|resolved| &resolved.region_id),
        FlagInheritance::OverrideOnly | FlagInheritance::Never => history
            .iter()
            .rev()
            .find(|resolved| &resolved.region_id == target)
            .map(|resolved| &resolved.region_id),
    }
}

/// Cache change notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FlagUpdateEvent {
    Region(RegionId),
    All,
}

/// Drops cached resolutions when regions change.
pub trait FlagCacheInvalidator: Send + Sync {
    fn invalidate(&self, region_id: &RegionId);
    fn invalidate_all(&self);
}

#[derive(Debug, thiserror::Error)]
pub enum EvaluationError {
    #[error(transparent)]
    Handler(#[from] HandlerError),
}

pub struct FlagEvaluationService {
    lookup: Arc<dyn RegionLookup>,
    registry: Arc<RegionFlagRegistry>,
    cache: DashMap<RegionId, Arc<BindingGraph>>,
    events: Arc<dyn DecisionEventSink>,
    clock: Arc<dyn ClockPort>,
    changes: broadcast::Sender<FlagUpdateEvent>,
}

impl FlagEvaluationService {
    pub fn new(
        lookup: Arc<dyn RegionLookup>,
        registry: Arc<RegionFlagRegistry>,
        events: Arc<dyn DecisionEventSink>,
        clock: Arc<dyn ClockPort>,
        change_buffer: usize,
    ) -> Self {
        let (changes, _) = broadcast::channel(change_buffer.max(1));
        Self {
            lookup,
            registry,
            cache: DashMap::new(),
            events,
            clock,
            changes,
        }
    }

    pub fn registry(&self) -> &Arc<RegionFlagRegistry> {
        &self.registry
    }

    /// Cache change notifications, one per invalidated region or one for a full clear.
    pub fn subscribe(&self) -> broadcast::Receiver<FlagUpdateEvent> {
        self.changes.subscribe()
    }

    pub fn is_cached(&self, region_id: &RegionId) -> bool {
        self.cache.contains_key(region_id)
    }

    /// Cached binding graph for `region`, computed on first use.
    pub fn bindings_for(&self, region: &RegionModel) -> Arc<BindingGraph> {
        let cached = self
            .cache
            .get(&region.id)
            .map(|entry| Arc::clone(entry.value()));
        if let Some(graph) = cached {
            return graph;
        }
        // Computed under the entry lock: a concurrent invalidation waits for
        // the insert and then drops it. `compute_bindings` must not touch the cache.
        let entry = self
            .cache
            .entry(region.id.clone())
            .or_insert_with(|| Arc::new(self.compute_bindings(region)));
        Arc::clone(entry.value())
    }

    /// Walks the lineage root to leaf and collects every local binding per key.
    pub fn compute_bindings(&self, region: &RegionModel) -> BindingGraph {
        let mut chain: Vec<Arc<RegionModel>> = Vec::new();
        let mut visited = HashSet::from([region.id.clone()]);
        let mut next = region.parent_id.clone();
        while let Some(parent_id) = next.take() {
            if !visited.insert(parent_id.clone()) {
                tracing::warn!(region_id = %region.id, parent_id = %parent_id, "Cycle in region lineage");
                break;
            }
            let Some(parent) = self.lookup.find_by_id(&parent_id) else {
                break;
            };
            next = parent.parent_id.clone();
            chain.push(parent);
        }

        let mut graph = BindingGraph::default();
        let nodes = chain
            .iter()
            .rev()
            .map(Arc::as_ref)
            .chain(std::iter::once(region));
        for node in nodes {
            for binding in &node.definition.flags {
                graph
                    .by_key
                    .entry(binding.key())
                    .or_default()
                    .lineage
                    .push(ResolvedFlagBinding {
                        region_id: node.id.clone(),
                        priority: node.priority,
                        binding: binding.clone(),
                    });
            }
        }
        for bindings in graph.by_key.values_mut() {
            let mut dispatch = bindings.lineage.clone();
            dispatch.sort_by(|a, b| {
                b.priority
                    .cmp(&a.priority)
                    .then_with(|| a.region_id.cmp(&b.region_id))
            });
            bindings.dispatch = dispatch;
        }
        graph
    }

    /// The binding that currently decides `key` for `region`, if any.
    pub fn resolve_effective(
        &self,
        region: &RegionModel,
        key: RegionFlagKey,
    ) -> Option<ResolvedFlagBinding> {
        let graph = self.bindings_for(region);
        let history = graph.history(key);
        let source = effective_source(self.registry.definition(key).inheritance, history, &region.id)?;
        history
            .iter()
            .rev()
            .find(|resolved| &resolved.region_id == source)
            .cloned()
    }

    /// Evaluates `key` for the context region.
    ///
    /// A Deny short-circuits. Otherwise merged Modify metadata wins over
    /// Allow, which wins over Pass. Handler errors propagate.
    pub fn evaluate(
        &self,
        context: &FlagContext,
        key: RegionFlagKey,
    ) -> Result<FlagEvaluation, EvaluationError> {
        let region = &context.region;
        let Some(entry) = self.registry.handler_entry(key) else {
            tracing::debug!(region_id = %region.id, flag = %key, "No handler registered");
            return Ok(FlagEvaluation::Pass);
        };

        let graph = self.bindings_for(region);
        let inheritance = self.registry.definition(key).inheritance;
        let Some(source) = effective_source(inheritance, graph.history(key), &region.id) else {
            tracing::debug!(region_id = %region.id, flag = %key, "No effective binding");
            return Ok(FlagEvaluation::Pass);
        };

        let mut metadata = BTreeMap::new();
        let mut allowed: Option<&ResolvedFlagBinding> = None;
        for resolved in graph
            .dispatch_order(key)
            .iter()
            .filter(|resolved| &resolved.region_id == source)
        {
            let Some(outcome) = entry.evaluate(context, resolved) else {
                tracing::debug!(
                    region_id = %region.id,
                    flag = %key,
                    expected = %entry.kind(),
                    actual = %resolved.binding.value().kind(),
                    "Skipping binding with incompatible value"
                );
                continue;
            };
            match outcome? {
                FlagEvaluation::Denied { reason } => {
                    self.publish(DecisionKind::Deny, context, resolved, reason.clone());
                    tracing::debug!(
                        region_id = %region.id,
                        source_region_id = %resolved.region_id,
                        flag = %key,
                        reason = reason.as_deref().unwrap_or("-"),
                        "Flag evaluated: denied"
                    );
                    return Ok(FlagEvaluation::Denied { reason });
                }
                FlagEvaluation::Modify { metadata: more } => metadata.extend(more),
                FlagEvaluation::Allow => allowed = Some(resolved),
                FlagEvaluation::Pass => {}
            }
        }

        let evaluation = if !metadata.is_empty() {
            FlagEvaluation::Modify { metadata }
        } else if let Some(resolved) = allowed {
            self.publish(DecisionKind::Allow, context, resolved, None);
            FlagEvaluation::Allow
        } else {
            FlagEvaluation::Pass
        };
        tracing::debug!(region_id = %region.id, flag = %key, result = ?evaluation, "Flag evaluated");
        Ok(evaluation)
    }

    fn publish(
        &self,
        kind: DecisionKind,
        context: &FlagContext,
        resolved: &ResolvedFlagBinding,
        reason: Option<String>,
    ) {
        let event = FlagDecisionEvent {
            kind,
            region_id: context.region.id.clone(),
            flag: resolved.binding.key(),
            source_region_id: resolved.region_id.clone(),
            value: resolved.binding.value().clone(),
            priority: resolved.priority,
            action: context.action.to_string(),
            actor_id: context.actor.as_ref().map(|actor| actor.id),
            reason,
            occurred_at: self.clock.now(),
        };
        if let Err(e) = self.events.publish(&event) {
            tracing::trace!(error = %e, "Decision event not delivered");
        }
    }

    fn notify(&self, event: FlagUpdateEvent) {
        // No receivers is the normal idle state.
        let _ = self.changes.send(event);
    }
}

impl FlagCacheInvalidator for FlagEvaluationService {
    /// Drops the region and every descendant. Ancestors keep their cache.
    fn invalidate(&self, region_id: &RegionId) {
        let mut queue = VecDeque::from([region_id.clone()]);
        let mut visited = HashSet::new();
        while let Some(id) = queue.pop_front() {
            if !visited.insert(id.clone()) {
                continue;
            }
            self.cache.remove(&id);
            if let Some(region) = self.lookup.find_by_id(&id) {
                queue.extend(region.children.iter().cloned());
            }
            tracing::trace!(region_id = %id, "Flag cache invalidated");
            self.notify(FlagUpdateEvent::Region(id));
        }
    }

    fn invalidate_all(&self) {
        self.cache.clear();
        tracing::debug!("Flag cache cleared");
        self.notify(FlagUpdateEvent::All);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{mpsc, Mutex, RwLock};
    use std::thread;
    use std::time::Duration;

    use regionward_domain::{FlagValue, FlagValueKind, RegionDefinition, RegionShape};

    use crate::flags::context::FlagAction;
    use crate::infrastructure::ports::{EventPublishError, MockDecisionEventSink};
    use crate::repositories::MockRegionLookup;
    use crate::test_fixtures::{boolean_flag, evaluator, evaluator_with, fixed_clock, StaticRegions};

    fn context(region: Arc<RegionModel>) -> FlagContext {
        FlagContext::new(region, FlagAction::new("protection:test").expect("action"))
    }

    fn town_and_shop(parent_flag: FlagBinding) -> Arc<StaticRegions> {
        Arc::new(StaticRegions::new(vec![
            RegionDefinition::new("town")
                .with_priority(10)
                .with_flag(parent_flag),
            RegionDefinition::new("shop").with_priority(20).with_parent("town"),
        ]))
    }

    #[test]
    fn always_inherits_the_ancestor_value() {
        let regions = town_and_shop(boolean_flag(RegionFlagKey::Build, false));
        let (service, sink) = evaluator(regions.clone());

        let verdict = service
            .evaluate(&context(regions.get("shop")), RegionFlagKey::Build)
            .expect("evaluate");

        assert_eq!(verdict, FlagEvaluation::deny("build.denied"));
        let events = sink.events();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].kind, DecisionKind::Deny);
        assert_eq!(events[0].region_id, RegionId::new("shop"));
        assert_eq!(events[0].source_region_id, RegionId::new("town"));
    }

    #[test]
    fn override_only_ignores_ancestor_bindings() {
        let regions = town_and_shop(boolean_flag(RegionFlagKey::WorldEdit, false));
        let (service, sink) = evaluator(regions.clone());
        let shop = regions.get("shop");

        let verdict = service
            .evaluate(&context(shop.clone()), RegionFlagKey::WorldEdit)
            .expect("evaluate");

        assert_eq!(verdict, FlagEvaluation::Pass);
        assert_eq!(service.bindings_for(&shop).history(RegionFlagKey::WorldEdit).len(), 1);
        assert!(service.resolve_effective(&shop, RegionFlagKey::WorldEdit).is_none());
        assert!(sink.events().is_empty());

        let town = regions.get("town");
        assert!(service
            .evaluate(&context(town), RegionFlagKey::WorldEdit)
            .expect("evaluate")
            .is_denied());
    }

    #[test]
    fn nearest_binding_wins_over_higher_priority_ancestor() {
        let regions = Arc::new(StaticRegions::new(vec![
            RegionDefinition::new("town")
                .with_priority(50)
                .with_flag(boolean_flag(RegionFlagKey::Build, false)),
            RegionDefinition::new("plot")
                .with_priority(5)
                .with_parent("town")
                .with_flag(boolean_flag(RegionFlagKey::Build, true)),
        ]));
        let (service, _) = evaluator(regions.clone());
        let plot = regions.get("plot");

        let verdict = service
            .evaluate(&context(plot.clone()), RegionFlagKey::Build)
            .expect("evaluate");

        assert_eq!(verdict, FlagEvaluation::Pass);
        let graph = service.bindings_for(&plot);
        let dispatch: Vec<&str> = graph
            .dispatch_order(RegionFlagKey::Build)
            .iter()
            .map(|resolved| resolved.region_id.as_str())
            .collect();
        let history: Vec<&str> = graph
            .history(RegionFlagKey::Build)
            .iter()
            .map(|resolved| resolved.region_id.as_str())
            .collect();
        assert_eq!(dispatch, vec!["town", "plot"]);
        assert_eq!(history, vec!["town", "plot"]);
        assert_eq!(
            service
                .resolve_effective(&plot, RegionFlagKey::Build)
                .map(|resolved| resolved.region_id),
            Some(RegionId::new("plot"))
        );
    }

    #[test]
    fn equal_priorities_dispatch_by_region_id() {
        let regions = Arc::new(StaticRegions::new(vec![
            RegionDefinition::new("zeta")
                .with_priority(3)
                .with_flag(boolean_flag(RegionFlagKey::Pvp, false)),
            RegionDefinition::new("alpha")
                .with_priority(3)
                .with_parent("zeta")
                .with_flag(boolean_flag(RegionFlagKey::Pvp, true)),
        ]));
        let (service, _) = evaluator(regions.clone());

        let graph = service.compute_bindings(&regions.get("alpha"));
        let dispatch: Vec<&str> = graph
            .dispatch_order(RegionFlagKey::Pvp)
            .iter()
            .map(|resolved| resolved.region_id.as_str())
            .collect();
        assert_eq!(dispatch, vec!["alpha", "zeta"]);
    }

    #[test]
    fn repeated_evaluation_reuses_cached_bindings() {
        let town = Arc::new(RegionModel::from_definition(
            RegionDefinition::new("town").with_flag(boolean_flag(RegionFlagKey::Build, false)),
            RegionShape::default(),
        ));
        let shop = Arc::new(RegionModel::from_definition(
            RegionDefinition::new("shop").with_parent("town"),
            RegionShape::default(),
        ));
        let mut lookup = MockRegionLookup::new();
        lookup
            .expect_find_by_id()
            .withf(|id| id.as_str() == "town")
            .times(1)
            .returning(move |_| Some(town.clone()));
        let (service, _) = evaluator(Arc::new(lookup));

        for _ in 0..2 {
            let verdict = service
                .evaluate(&context(shop.clone()), RegionFlagKey::Build)
                .expect("evaluate");
            assert!(verdict.is_denied());
        }
        assert!(service.is_cached(&RegionId::new("shop")));
    }

    #[test]
    fn invalidation_reaches_descendants_only() {
        let regions = Arc::new(StaticRegions::new(vec![
            RegionDefinition::new("world"),
            RegionDefinition::new("town").with_parent("world"),
            RegionDefinition::new("shop").with_parent("town"),
            RegionDefinition::new("cellar").with_parent("shop"),
        ]));
        let (service, _) = evaluator(regions.clone());
        for id in ["world", "town", "shop", "cellar"] {
            service.bindings_for(&regions.get(id));
        }
        let mut changes = service.subscribe();

        service.invalidate(&RegionId::new("town"));

        assert!(service.is_cached(&RegionId::new("world")));
        for id in ["town", "shop", "cellar"] {
            assert!(!service.is_cached(&RegionId::new(id)), "{id} should be dropped");
        }
        let mut notified = Vec::new();
        while let Ok(FlagUpdateEvent::Region(id)) = changes.try_recv() {
            notified.push(id.to_string());
        }
        assert_eq!(notified, vec!["town", "shop", "cellar"]);
    }

    #[test]
    fn invalidate_all_clears_and_broadcasts_once() {
        let regions = town_and_shop(boolean_flag(RegionFlagKey::Build, false));
        let (service, _) = evaluator(regions.clone());
        service.bindings_for(&regions.get("town"));
        service.bindings_for(&regions.get("shop"));
        let mut changes = service.subscribe();

        service.invalidate_all();

        assert!(!service.is_cached(&RegionId::new("town")));
        assert!(!service.is_cached(&RegionId::new("shop")));
        assert_eq!(changes.try_recv().ok(), Some(FlagUpdateEvent::All));
        assert!(changes.try_recv().is_err());
    }

    /// Lookup that parks the first `town` read until released, with the
    /// stale model already in hand.
    struct ParkedLookup {
        regions: RwLock<Arc<StaticRegions>>,
        gate: Mutex<Option<(mpsc::Sender<()>, mpsc::Receiver<()>)>>,
    }

    impl ParkedLookup {
        fn swap(&self, regions: Arc<StaticRegions>) {
            *self.regions.write().expect("regions lock") = regions;
        }
    }

    impl RegionLookup for ParkedLookup {
        fn find_by_id(&self, id: &RegionId) -> Option<Arc<RegionModel>> {
            let found = self.regions.read().expect("regions lock").find_by_id(id);
            if id.as_str() == "town" {
                let gate = self.gate.lock().expect("gate lock").take();
                if let Some((entered, release)) = gate {
                    entered.send(()).expect("signal entered");
                    release.recv().expect("wait for release");
                }
            }
            found
        }
    }

    #[test]
    fn invalidation_during_computation_is_not_lost() {
        let (entered_tx, entered_rx) = mpsc::channel();
        let (release_tx, release_rx) = mpsc::channel();
        let lookup = Arc::new(ParkedLookup {
            regions: RwLock::new(town_and_shop(boolean_flag(RegionFlagKey::Build, false))),
            gate: Mutex::new(Some((entered_tx, release_rx))),
        });
        let (service, _) = evaluator(lookup.clone());
        let shop = town_and_shop(boolean_flag(RegionFlagKey::Build, false)).get("shop");

        let computing = {
            let service = Arc::clone(&service);
            let shop = Arc::clone(&shop);
            thread::spawn(move || service.bindings_for(&shop))
        };
        entered_rx.recv().expect("computation started");

        lookup.swap(town_and_shop(boolean_flag(RegionFlagKey::Build, true)));
        let invalidating = {
            let service = Arc::clone(&service);
            thread::spawn(move || service.invalidate_all())
        };
        thread::sleep(Duration::from_millis(50));
        release_tx.send(()).expect("release");
        computing.join().expect("computing thread");
        invalidating.join().expect("invalidating thread");

        let verdict = service
            .evaluate(&context(shop), RegionFlagKey::Build)
            .expect("evaluate");
        assert_eq!(verdict, FlagEvaluation::Pass);
    }

    fn allow_or_modify() -> RegionFlagRegistry {
        let registry = RegionFlagRegistry::empty();
        registry.register_handler(
            RegionFlagKey::MessageOnEntry,
            FlagValueKind::Text,
            |_, resolved| match resolved.binding.value().as_text() {
                Some("allow") => Ok(FlagEvaluation::Allow),
                Some(content) => Ok(FlagEvaluation::modify(
                    "message",
                    serde_json::Value::String(content.to_string()),
                )),
                None => Ok(FlagEvaluation::Pass),
            },
        );
        registry
    }

    #[test]
    fn modify_takes_precedence_over_allow() {
        let regions = Arc::new(StaticRegions::new(vec![RegionDefinition::new("gate")
            .with_flag(FlagBinding::new(RegionFlagKey::MessageOnEntry, FlagValue::text("allow")))
            .with_flag(FlagBinding::new(RegionFlagKey::MessageOnEntry, FlagValue::text("Welcome")))]));
        let (service, sink) = evaluator_with(regions.clone(), allow_or_modify());

        let verdict = service
            .evaluate(&context(regions.get("gate")), RegionFlagKey::MessageOnEntry)
            .expect("evaluate");

        assert_eq!(verdict, FlagEvaluation::modify("message", serde_json::json!("Welcome")));
        assert!(sink.events().is_empty());
    }

    #[test]
    fn allow_publishes_an_allow_event() {
        let regions = Arc::new(StaticRegions::new(vec![RegionDefinition::new("gate")
            .with_flag(FlagBinding::new(RegionFlagKey::MessageOnEntry, FlagValue::text("allow")))]));
        let (service, sink) = evaluator_with(regions.clone(), allow_or_modify());

        let verdict = service
            .evaluate(&context(regions.get("gate")), RegionFlagKey::MessageOnEntry)
            .expect("evaluate");

        assert_eq!(verdict, FlagEvaluation::Allow);
        let events = sink.events();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].kind, DecisionKind::Allow);
        assert_eq!(events[0].action, "protection:test");
    }

    #[test]
    fn allow_event_names_the_last_allowing_binding() {
        let registry = RegionFlagRegistry::empty();
        registry.register_handler(RegionFlagKey::MessageOnEntry, FlagValueKind::Text, |_, _| {
            Ok(FlagEvaluation::Allow)
        });
        let regions = Arc::new(StaticRegions::new(vec![RegionDefinition::new("gate")
            .with_flag(FlagBinding::new(RegionFlagKey::MessageOnEntry, FlagValue::text("first")))
            .with_flag(FlagBinding::new(RegionFlagKey::MessageOnEntry, FlagValue::text("second")))]));
        let (service, sink) = evaluator_with(regions.clone(), registry);

        let verdict = service
            .evaluate(&context(regions.get("gate")), RegionFlagKey::MessageOnEntry)
            .expect("evaluate");

        assert_eq!(verdict, FlagEvaluation::Allow);
        let events = sink.events();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].value, FlagValue::text("second"));
    }

    #[test]
    fn incompatible_bindings_are_skipped() {
        let registry = RegionFlagRegistry::empty();
        registry.register_handler(RegionFlagKey::Build, FlagValueKind::Text, |_, _| {
            Ok(FlagEvaluation::deny("never"))
        });
        let regions = town_and_shop(boolean_flag(RegionFlagKey::Build, false));
        let (service, _) = evaluator_with(regions.clone(), registry);

        let verdict = service
            .evaluate(&context(regions.get("shop")), RegionFlagKey::Build)
            .expect("evaluate");

        assert_eq!(verdict, FlagEvaluation::Pass);
    }

    #[test]
    fn unhandled_flags_pass() {
        let regions = town_and_shop(boolean_flag(RegionFlagKey::Build, false));
        let (service, _) = evaluator_with(regions.clone(), RegionFlagRegistry::empty());

        let verdict = service
            .evaluate(&context(regions.get("shop")), RegionFlagKey::Build)
            .expect("evaluate");

        assert_eq!(verdict, FlagEvaluation::Pass);
    }

    #[test]
    fn handler_errors_propagate() {
        let registry = RegionFlagRegistry::empty();
        registry.register_handler(RegionFlagKey::Build, FlagValueKind::Boolean, |_, resolved| {
            Err(HandlerError::new(resolved.binding.key(), "backend offline"))
        });
        let regions = town_and_shop(boolean_flag(RegionFlagKey::Build, true));
        let (service, _) = evaluator_with(regions.clone(), registry);

        let error = service
            .evaluate(&context(regions.get("shop")), RegionFlagKey::Build)
            .expect_err("handler failure");

        let EvaluationError::Handler(error) = error;
        assert_eq!(error.message, "backend offline");
    }

    #[test]
    fn broken_event_sink_never_blocks_a_decision() {
        let regions = town_and_shop(boolean_flag(RegionFlagKey::Build, false));
        let mut sink = MockDecisionEventSink::new();
        sink.expect_publish()
            .times(1)
            .returning(|_| Err(EventPublishError::Sink("bus down".to_string())));
        let service = FlagEvaluationService::new(
            regions.clone(),
            Arc::new(RegionFlagRegistry::with_default_handlers()),
            Arc::new(sink),
            fixed_clock(),
            4,
        );

        let verdict = service
            .evaluate(&context(regions.get("shop")), RegionFlagKey::Build)
            .expect("evaluate");

        assert!(verdict.is_denied());
    }
}
