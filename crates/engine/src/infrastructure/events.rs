//! Decision event sinks.

use std::sync::Arc;

use tokio::sync::broadcast;

use crate::infrastructure::ports::{
    DecisionEventSink, DecisionKind, EventPublishError, FlagDecisionEvent,
};

/// Fans decisions out to any number of live subscribers.
///
/// Slow subscribers lag and lose the oldest events; publishing never waits.
pub struct BroadcastDecisionSink {
    sender: broadcast::Sender<FlagDecisionEvent>,
}

impl BroadcastDecisionSink {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<FlagDecisionEvent> {
        self.sender.subscribe()
    }
}

impl DecisionEventSink for BroadcastDecisionSink {
    fn publish(&self, event: &FlagDecisionEvent) -> Result<(), EventPublishError> {
        self.sender
            .send(event.clone())
            .map(|_| ())
            .map_err(|_| EventPublishError::NoSubscribers)
    }
}

/// Publishes to several sinks. Every sink is tried; the first failure is reported.
pub struct FanoutDecisionSink {
    sinks: Vec<Arc<dyn DecisionEventSink>>,
}

impl FanoutDecisionSink {
    pub fn new(sinks: Vec<Arc<dyn DecisionEventSink>>) -> Self {
        Self { sinks }
    }
}

impl DecisionEventSink for FanoutDecisionSink {
    fn publish(&self, event: &FlagDecisionEvent) -> Result<(), EventPublishError> {
        let mut first_error = None;
        for sink in &self.sinks {
            if let Err(e) = sink.publish(event) {
                first_error.get_or_insert(e);
            }
        }
        first_error.map_or(Ok(()), Err)
    }
}

/// Writes every decision to the log.
#[derive(Default)]
pub struct TracingDecisionSink;

impl DecisionEventSink for TracingDecisionSink {
    fn publish(&self, event: &FlagDecisionEvent) -> Result<(), EventPublishError> {
        match event.kind {
            DecisionKind::Allow => tracing::debug!(
                region_id = %event.region_id,
                source_region_id = %event.source_region_id,
                flag = %event.flag,
                action = %event.action,
                "Flag allowed"
            ),
            DecisionKind::Deny => tracing::debug!(
                region_id = %event.region_id,
                source_region_id = %event.source_region_id,
                flag = %event.flag,
                action = %event.action,
                reason = event.reason.as_deref().unwrap_or("-"),
                "Flag denied"
            ),
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use regionward_domain::{FlagValue, RegionFlagKey, RegionId};

    fn deny_event() -> FlagDecisionEvent {
        FlagDecisionEvent {
            kind: DecisionKind::Deny,
            region_id: RegionId::new("spawn"),
            flag: RegionFlagKey::Build,
            source_region_id: RegionId::new("world"),
            value: FlagValue::boolean(false),
            priority: 10,
            action: "block:break".to_string(),
            actor_id: None,
            reason: Some("build.denied".to_string()),
            occurred_at: Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).single().expect("time"),
        }
    }

    #[tokio::test]
    async fn broadcast_delivers_to_subscribers() {
        let sink = BroadcastDecisionSink::new(8);
        let mut rx = sink.subscribe();

        sink.publish(&deny_event()).expect("publish");

        let received = rx.recv().await.expect("event");
        assert_eq!(received, deny_event());
    }

    #[test]
    fn broadcast_without_subscribers_reports_it() {
        let sink = BroadcastDecisionSink::new(8);
        assert!(matches!(
            sink.publish(&deny_event()),
            Err(EventPublishError::NoSubscribers)
        ));
    }

    #[tokio::test]
    async fn fanout_reaches_every_sink_despite_failures() {
        let idle = Arc::new(BroadcastDecisionSink::new(4));
        let live = Arc::new(BroadcastDecisionSink::new(4));
        let mut rx = live.subscribe();
        let fanout = FanoutDecisionSink::new(vec![
            idle as Arc<dyn DecisionEventSink>,
            live as Arc<dyn DecisionEventSink>,
            Arc::new(TracingDecisionSink) as Arc<dyn DecisionEventSink>,
        ]);

        let result = fanout.publish(&deny_event());

        assert!(matches!(result, Err(EventPublishError::NoSubscribers)));
        assert_eq!(rx.recv().await.expect("event"), deny_event());
    }

    #[test]
    fn tracing_sink_never_fails() {
        assert!(TracingDecisionSink.publish(&deny_event()).is_ok());
    }
}
