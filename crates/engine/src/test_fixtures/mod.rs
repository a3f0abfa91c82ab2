//! Shared builders for engine tests.
//!
//! ```rust,ignore
//! let world = RegionWorld::new()
//!     .cuboid(RegionDefinition::new("spawn").with_priority(10), [0.0, 0.0, 0.0], [10.0, 10.0, 10.0])
//!     .build()
//!     .await;
//! assert_eq!(world.repository.regions_at(&p(5.0, 5.0, 5.0)).len(), 1);
//! ```

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use chrono::{TimeZone, Utc};
use regionward_domain::{
    CuboidShape, FlagBinding, FlagValue, Position, RegionArtifact, RegionDefinition,
    RegionFlagKey, RegionId, RegionModel, RegionShape, SelectionMode,
};
use regionward_shared::RegionPayload;

use crate::flags::{FlagEvaluationService, RegionFlagRegistry};
use crate::infrastructure::artifact_storage::RegionArtifactStorage;
use crate::infrastructure::clock::FixedClock;
use crate::infrastructure::memory::{InMemoryArtifactStore, InMemoryDefinitionSource};
use crate::infrastructure::ports::{DecisionEventSink, EventPublishError, FlagDecisionEvent};
use crate::repositories::{RegionLookup, RegionRepository};

pub const WORLD: &str = "world";

/// Position in the default test world.
pub fn p(x: f64, y: f64, z: f64) -> Position {
    Position::new(WORLD, x, y, z)
}

pub fn cuboid(min: [f64; 3], max: [f64; 3]) -> RegionShape {
    RegionShape::Cuboid(CuboidShape::new(
        p(min[0], min[1], min[2]),
        p(max[0], max[1], max[2]),
    ))
}

pub fn boolean_flag(key: RegionFlagKey, enabled: bool) -> FlagBinding {
    FlagBinding::new(key, FlagValue::boolean(enabled))
}

pub fn fixed_clock() -> Arc<FixedClock> {
    Arc::new(FixedClock(
        Utc.with_ymd_and_hms(2026, 1, 1, 12, 0, 0)
            .single()
            .expect("valid time"),
    ))
}

// =============================================================================
// Repository-backed worlds
// =============================================================================

/// Builds a repository over in-memory definitions and artifacts.
#[derive(Default)]
pub struct RegionWorld {
    definitions: Vec<RegionDefinition>,
    store: InMemoryArtifactStore,
}

pub struct TestWorld {
    pub repository: Arc<RegionRepository>,
    pub storage: Arc<RegionArtifactStorage>,
    pub store: Arc<InMemoryArtifactStore>,
    pub source: Arc<InMemoryDefinitionSource>,
}

impl RegionWorld {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a region backed by an artifact holding a cuboid between `min` and `max`.
    pub fn cuboid(mut self, definition: RegionDefinition, min: [f64; 3], max: [f64; 3]) -> Self {
        let artifact = RegionArtifact::new(format!("{}_shape", definition.id));
        let payload = RegionPayload::new(
            SelectionMode::Cuboid,
            vec![p(min[0], min[1], min[2]), p(max[0], max[1], max[2])],
        );
        let data = serde_json::to_string(&payload).expect("payload json");
        self.store = self.store.with_blob(artifact.id.clone(), data);
        self.definitions.push(definition.with_artifact(artifact));
        self
    }

    /// Adds a definition as-is.
    pub fn region(mut self, definition: RegionDefinition) -> Self {
        self.definitions.push(definition);
        self
    }

    pub async fn build(self) -> TestWorld {
        let source = Arc::new(InMemoryDefinitionSource::new(self.definitions));
        let store = Arc::new(self.store);
        let storage = Arc::new(RegionArtifactStorage::new(store.clone()));
        let repository = Arc::new(RegionRepository::new(source.clone(), storage.clone()));
        repository.reload().await.expect("reload test world");
        TestWorld {
            repository,
            storage,
            store,
            source,
        }
    }
}

// =============================================================================
// Static lookups
// =============================================================================

/// Fixed region set for evaluator tests. Models are unresolved apart from children.
pub struct StaticRegions {
    regions: HashMap<RegionId, Arc<RegionModel>>,
}

impl StaticRegions {
    pub fn new(definitions: Vec<RegionDefinition>) -> Self {
        let mut models: HashMap<RegionId, RegionModel> = definitions
            .into_iter()
            .map(|definition| {
                let model = RegionModel::from_definition(definition, RegionShape::default());
                (model.id.clone(), model)
            })
            .collect();
        let links: Vec<(RegionId, RegionId)> = models
            .values()
            .filter_map(|model| Some((model.parent_id.clone()?, model.id.clone())))
            .collect();
        for (parent, child) in links {
            if let Some(parent) = models.get_mut(&parent) {
                parent.children.insert(child);
            }
        }
        Self {
            regions: models
                .into_iter()
                .map(|(id, model)| (id, Arc::new(model)))
                .collect(),
        }
    }

    pub fn get(&self, id: &str) -> Arc<RegionModel> {
        self.regions
            .get(id)
            .cloned()
            .unwrap_or_else(|| panic!("unknown test region {id}"))
    }
}

impl RegionLookup for StaticRegions {
    fn find_by_id(&self, id: &RegionId) -> Option<Arc<RegionModel>> {
        self.regions.get(id).cloned()
    }
}

// =============================================================================
// Decision sinks
// =============================================================================

#[derive(Default)]
pub struct RecordingSink {
    events: Mutex<Vec<FlagDecisionEvent>>,
}

impl RecordingSink {
    pub fn events(&self) -> Vec<FlagDecisionEvent> {
        self.events
            .lock()
            .map(|events| events.clone())
            .unwrap_or_default()
    }
}

impl DecisionEventSink for RecordingSink {
    fn publish(&self, event: &FlagDecisionEvent) -> Result<(), EventPublishError> {
        if let Ok(mut events) = self.events.lock() {
            events.push(event.clone());
        }
        Ok(())
    }
}

/// Evaluator over `lookup` with the default handlers, recording decisions.
pub fn evaluator(lookup: Arc<dyn RegionLookup>) -> (Arc<FlagEvaluationService>, Arc<RecordingSink>) {
    evaluator_with(lookup, RegionFlagRegistry::with_default_handlers())
}

pub fn evaluator_with(
    lookup: Arc<dyn RegionLookup>,
    registry: RegionFlagRegistry,
) -> (Arc<FlagEvaluationService>, Arc<RecordingSink>) {
    let sink = Arc::new(RecordingSink::default());
    let service = Arc::new(FlagEvaluationService::new(
        lookup,
        Arc::new(registry),
        sink.clone(),
        fixed_clock(),
        16,
    ));
    (service, sink)
}
