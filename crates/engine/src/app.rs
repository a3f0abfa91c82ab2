//! Application state and composition.

use std::sync::Arc;

use crate::flags::{FlagCacheInvalidator, FlagEvaluationService, RegionFlagRegistry};
use crate::infrastructure::{
    artifact_storage::RegionArtifactStorage,
    clock::SystemClock,
    config::EngineConfig,
    events::{BroadcastDecisionSink, FanoutDecisionSink, TracingDecisionSink},
    json_source::{JsonFileArtifactStore, JsonFileDefinitionSource},
    ports::{ArtifactStore, ClockPort, DecisionEventSink, RegionDefinitionSource, RepoError},
};
use crate::repositories::RegionRepository;
use crate::use_cases::movement::{EnforceTransition, RegionPresence};

/// Main application state.
///
/// The repository notifies the evaluator through a weak handle, so the
/// evaluator owns the only strong link between the two.
pub struct App {
    pub repositories: Repositories,
    pub flags: Flags,
    pub use_cases: UseCases,
}

pub struct Repositories {
    pub regions: Arc<RegionRepository>,
}

pub struct Flags {
    pub registry: Arc<RegionFlagRegistry>,
    pub evaluation: Arc<FlagEvaluationService>,
    /// Live decision feed for inspection tooling.
    pub decisions: Arc<BroadcastDecisionSink>,
}

pub struct UseCases {
    pub enforce_transition: Arc<EnforceTransition>,
    pub presence: Arc<RegionPresence>,
}

impl App {
    pub fn new(
        source: Arc<dyn RegionDefinitionSource>,
        artifacts: Arc<dyn ArtifactStore>,
        registry: RegionFlagRegistry,
        clock: Arc<dyn ClockPort>,
        event_buffer: usize,
    ) -> Self {
        let storage = Arc::new(RegionArtifactStorage::new(artifacts));
        let regions = Arc::new(RegionRepository::new(source, storage));

        let decisions = Arc::new(BroadcastDecisionSink::new(event_buffer));
        let sink: Arc<dyn DecisionEventSink> = Arc::new(FanoutDecisionSink::new(vec![
            decisions.clone() as Arc<dyn DecisionEventSink>,
            Arc::new(TracingDecisionSink) as Arc<dyn DecisionEventSink>,
        ]));

        let registry = Arc::new(registry);
        let evaluation = Arc::new(FlagEvaluationService::new(
            regions.clone(),
            registry.clone(),
            sink,
            clock,
            event_buffer,
        ));
        let invalidator: Arc<dyn FlagCacheInvalidator> = evaluation.clone();
        regions.attach_invalidator(Arc::downgrade(&invalidator));

        let presence = Arc::new(RegionPresence::new());
        let enforce_transition = Arc::new(EnforceTransition::new(
            regions.clone(),
            evaluation.clone(),
            presence.clone(),
        ));

        Self {
            repositories: Repositories { regions },
            flags: Flags {
                registry,
                evaluation,
                decisions,
            },
            use_cases: UseCases {
                enforce_transition,
                presence,
            },
        }
    }

    /// File-backed app with the default handlers and the system clock.
    pub fn from_config(config: &EngineConfig) -> Self {
        Self::new(
            Arc::new(JsonFileDefinitionSource::new(&config.definitions_path)),
            Arc::new(JsonFileArtifactStore::new(&config.artifact_dir)),
            RegionFlagRegistry::with_default_handlers(),
            Arc::new(SystemClock::new()),
            config.event_buffer,
        )
    }

    /// Reloads every region and drops all cached flag resolutions.
    pub async fn reload(&self) -> Result<usize, RepoError> {
        self.repositories.regions.reload().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use regionward_domain::{RegionDefinition, RegionFlagKey, RegionId};

    use crate::flags::{FlagAction, FlagContext, FlagUpdateEvent};
    use crate::infrastructure::memory::{InMemoryArtifactStore, InMemoryDefinitionSource};
    use crate::test_fixtures::{boolean_flag, fixed_clock};

    fn app(definitions: Vec<RegionDefinition>) -> App {
        App::new(
            Arc::new(InMemoryDefinitionSource::new(definitions)),
            Arc::new(InMemoryArtifactStore::new()),
            RegionFlagRegistry::with_default_handlers(),
            fixed_clock(),
            8,
        )
    }

    #[tokio::test]
    async fn reload_clears_evaluator_cache() {
        let app = app(vec![
            RegionDefinition::new("spawn").with_flag(boolean_flag(RegionFlagKey::Build, false))
        ]);
        app.reload().await.expect("reload");
        let spawn = app
            .repositories
            .regions
            .find_by_id(&RegionId::new("spawn"))
            .expect("spawn");
        app.flags.evaluation.bindings_for(&spawn);
        let mut changes = app.flags.evaluation.subscribe();

        app.reload().await.expect("reload");

        assert!(!app.flags.evaluation.is_cached(&RegionId::new("spawn")));
        assert_eq!(changes.try_recv().ok(), Some(FlagUpdateEvent::All));
    }

    #[tokio::test]
    async fn decisions_reach_the_live_feed() {
        let app = app(vec![
            RegionDefinition::new("spawn").with_flag(boolean_flag(RegionFlagKey::Build, false))
        ]);
        app.reload().await.expect("reload");
        let mut feed = app.flags.decisions.subscribe();
        let spawn = app
            .repositories
            .regions
            .find_by_id(&RegionId::new("spawn"))
            .expect("spawn");

        let verdict = app
            .flags
            .evaluation
            .evaluate(
                &FlagContext::new(spawn, FlagAction::new("protection:block-place").expect("action")),
                RegionFlagKey::Build,
            )
            .expect("evaluate");

        assert!(verdict.is_denied());
        let event = feed.recv().await.expect("decision");
        assert_eq!(event.action, "protection:block-place");
    }
}
