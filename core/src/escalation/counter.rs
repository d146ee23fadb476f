//! Escalation counter.
//!
//! Deduplicates noisy per-node error observations into discrete lifecycle
//! signals. A node enters an error streak on its first `ERROR` sample; once
//! the streak reaches the configured threshold, an escalate event is
//! published for that sample *and every subsequent error sample*; downstream
//! consumers treat repeats as "still failing", not as fresh pages. The first
//! `OK` sample ends the streak; it publishes a single resolve event only if
//! the streak had escalated, so a resolve can never arrive without a prior
//! escalate for the same entity.
//!
//! State is process-local and in-memory: a restart forgets in-flight
//! streaks, and the next error starts a fresh count at 1.

use std::collections::HashMap;
use std::sync::Mutex;

use tracing::debug;

use crate::error::WardenResult;
use crate::events::bus::SharedLifecycleBus;
use crate::events::types::{HealthCondition, HealthSample, HealthStatus, LifecycleEvent};

/// An unresolved error streak for one entity
#[derive(Debug, Clone, Copy)]
struct Streak {
    /// Consecutive error observations so far (>= 1)
    count: u32,
    /// Condition reported by the most recent error observation
    conditions: HealthCondition,
}

/// Stateful deduplicator turning raw health samples into lifecycle events.
///
/// The streak map is the only shared mutable state in the engine. The lock
/// is held across both the state change and the bus publish, so the
/// increment-then-publish and delete-then-publish sequences for one entity
/// can never interleave.
pub struct EscalationCounter {
    threshold: u32,
    bus: SharedLifecycleBus,
    streaks: Mutex<HashMap<String, Streak>>,
}

impl EscalationCounter {
    /// Create a counter publishing onto `bus`.
    ///
    /// A threshold of 0 is clamped to 1; every error observation would
    /// otherwise be escalation-worthy before a streak even exists.
    pub fn new(threshold: u32, bus: SharedLifecycleBus) -> Self {
        Self {
            threshold: threshold.max(1),
            bus,
            streaks: Mutex::new(HashMap::new()),
        }
    }

    /// Feed one health sample for `entity_id`.
    ///
    /// `ERROR` samples grow the entity's streak and publish an escalate
    /// event whenever the running count has reached the threshold. `OK`
    /// samples end an active streak, publishing a resolve event carrying
    /// the streak's condition and final count if the streak had crossed
    /// the threshold; sub-threshold streaks are cleared silently and OK
    /// samples for entities with no streak are ignored. `WARNING` samples
    /// are not acted on.
    pub fn evaluate(&self, entity_id: &str, sample: &HealthSample) -> WardenResult<()> {
        match sample.status {
            HealthStatus::Error => self.on_error(entity_id, sample),
            HealthStatus::Ok => self.on_ok(entity_id, sample),
            HealthStatus::Warning => Ok(()),
        }
    }

    fn on_error(&self, entity_id: &str, sample: &HealthSample) -> WardenResult<()> {
        let mut streaks = self.streaks.lock().unwrap_or_else(|e| e.into_inner());

        let streak = streaks
            .entry(entity_id.to_string())
            .and_modify(|s| {
                s.count += 1;
                s.conditions = sample.conditions;
            })
            .or_insert(Streak {
                count: 1,
                conditions: sample.conditions,
            });
        let count = streak.count;

        if count >= self.threshold {
            let event = LifecycleEvent::from_sample(entity_id, sample, sample.conditions, count);
            self.bus.publish_escalate(&event)?;
        } else {
            debug!(entity = entity_id, count, threshold = self.threshold, "error below threshold");
        }
        Ok(())
    }

    fn on_ok(&self, entity_id: &str, sample: &HealthSample) -> WardenResult<()> {
        let mut streaks = self.streaks.lock().unwrap_or_else(|e| e.into_inner());

        if let Some(streak) = streaks.remove(entity_id) {
            if streak.count < self.threshold {
                // Nothing was ever escalated, so there is nothing to resolve.
                debug!(entity = entity_id, count = streak.count, "sub-threshold streak cleared");
                return Ok(());
            }
            // The resolve event snapshots the streak being closed: its
            // condition identifies which error is over, the fresh sample
            // supplies current sync/height context.
            let event =
                LifecycleEvent::from_sample(entity_id, sample, streak.conditions, streak.count);
            self.bus.publish_resolve(&event)?;
        }
        Ok(())
    }

    /// Current consecutive-error count for an entity, if it is escalating
    pub fn current_count(&self, entity_id: &str) -> Option<u32> {
        self.streaks
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .get(entity_id)
            .map(|s| s.count)
    }

    /// Number of entities currently in an unresolved error streak
    pub fn active_streaks(&self) -> usize {
        self.streaks
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::bus::{parse_payload, LifecycleBus};
    use tokio::sync::broadcast::Receiver;

    fn sample(status: HealthStatus, conditions: HealthCondition) -> HealthSample {
        HealthSample {
            name: "mainnet1/eth".to_string(),
            status,
            conditions,
            send_warning: false,
            details: None,
            eth_syncing: None,
            height: None,
        }
    }

    fn error_sample() -> HealthSample {
        sample(HealthStatus::Error, HealthCondition::NotSynchronized)
    }

    fn ok_sample() -> HealthSample {
        sample(HealthStatus::Ok, HealthCondition::Healthy)
    }

    fn drain(rx: &mut Receiver<String>) -> Vec<LifecycleEvent> {
        let mut events = Vec::new();
        while let Ok(payload) = rx.try_recv() {
            events.push(parse_payload(&payload).unwrap());
        }
        events
    }

    #[test]
    fn test_escalates_on_every_sample_at_or_past_threshold() {
        let bus = LifecycleBus::new().shared();
        let mut rx = bus.subscribe_escalate();
        let counter = EscalationCounter::new(2, bus);

        for _ in 0..3 {
            counter.evaluate("node-1", &error_sample()).unwrap();
        }

        let counts: Vec<u32> = drain(&mut rx).iter().map(|e| e.count).collect();
        assert_eq!(counts, vec![2, 3]);
    }

    #[test]
    fn test_ok_below_threshold_clears_state_silently() {
        // No escalate was ever published for this streak, so no resolve
        // may be published either; the streak is still forgotten.
        let bus = LifecycleBus::new().shared();
        let mut escalate_rx = bus.subscribe_escalate();
        let mut resolve_rx = bus.subscribe_resolve();
        let counter = EscalationCounter::new(3, bus);

        counter.evaluate("node-1", &error_sample()).unwrap();
        counter.evaluate("node-1", &error_sample()).unwrap();
        counter.evaluate("node-1", &ok_sample()).unwrap();

        assert!(drain(&mut escalate_rx).is_empty());
        assert!(drain(&mut resolve_rx).is_empty());
        assert_eq!(counter.active_streaks(), 0);
    }

    #[test]
    fn test_ok_without_streak_is_silent() {
        let bus = LifecycleBus::new().shared();
        let mut resolve_rx = bus.subscribe_resolve();
        let counter = EscalationCounter::new(2, bus);

        counter.evaluate("node-1", &ok_sample()).unwrap();
        assert!(drain(&mut resolve_rx).is_empty());
    }

    #[test]
    fn test_resolve_carries_streak_condition_and_count() {
        let bus = LifecycleBus::new().shared();
        let mut resolve_rx = bus.subscribe_resolve();
        let counter = EscalationCounter::new(2, bus);

        counter.evaluate("node-1", &error_sample()).unwrap();
        counter.evaluate("node-1", &error_sample()).unwrap();
        counter.evaluate("node-1", &ok_sample()).unwrap();

        let resolves = drain(&mut resolve_rx);
        assert_eq!(resolves.len(), 1);
        assert_eq!(resolves[0].status, HealthStatus::Ok);
        assert_eq!(resolves[0].conditions, HealthCondition::NotSynchronized);
        assert_eq!(resolves[0].count, 2);
    }

    #[test]
    fn test_count_resets_after_resolve() {
        let bus = LifecycleBus::new().shared();
        let mut escalate_rx = bus.subscribe_escalate();
        let counter = EscalationCounter::new(2, bus);

        counter.evaluate("node-1", &error_sample()).unwrap();
        counter.evaluate("node-1", &error_sample()).unwrap();
        counter.evaluate("node-1", &ok_sample()).unwrap();
        counter.evaluate("node-1", &error_sample()).unwrap();

        assert_eq!(counter.current_count("node-1"), Some(1));
        // The post-resolve error is below threshold again, so the only
        // escalate publication on the wire is the pre-resolve one.
        assert_eq!(drain(&mut escalate_rx).len(), 1);
    }

    #[test]
    fn test_entities_are_independent() {
        let bus = LifecycleBus::new().shared();
        let mut escalate_rx = bus.subscribe_escalate();
        let counter = EscalationCounter::new(2, bus);

        counter.evaluate("node-1", &error_sample()).unwrap();
        counter.evaluate("node-2", &error_sample()).unwrap();
        counter.evaluate("node-1", &error_sample()).unwrap();

        let events = drain(&mut escalate_rx);
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].id, "node-1");
        assert_eq!(counter.current_count("node-2"), Some(1));
    }

    #[test]
    fn test_warning_samples_are_ignored() {
        let bus = LifecycleBus::new().shared();
        let counter = EscalationCounter::new(2, bus);

        counter
            .evaluate(
                "node-1",
                &sample(HealthStatus::Warning, HealthCondition::NoPeers),
            )
            .unwrap();
        assert_eq!(counter.active_streaks(), 0);
    }

    #[test]
    fn test_latest_error_condition_wins() {
        let bus = LifecycleBus::new().shared();
        let mut escalate_rx = bus.subscribe_escalate();
        let counter = EscalationCounter::new(2, bus);

        counter
            .evaluate("node-1", &sample(HealthStatus::Error, HealthCondition::NoResponse))
            .unwrap();
        counter.evaluate("node-1", &error_sample()).unwrap();

        let events = drain(&mut escalate_rx);
        assert_eq!(events[0].conditions, HealthCondition::NotSynchronized);
    }

    #[test]
    fn test_zero_threshold_clamps_to_one() {
        let bus = LifecycleBus::new().shared();
        let mut escalate_rx = bus.subscribe_escalate();
        let counter = EscalationCounter::new(0, bus);

        counter.evaluate("node-1", &error_sample()).unwrap();
        assert_eq!(drain(&mut escalate_rx).len(), 1);
    }
}
