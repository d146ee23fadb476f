//! Per-entity ordered dispatch.
//!
//! Lifecycle events for one entity must be handled in emission order
//! (trigger, retrigger*, resolve); events for different entities are
//! independent. The router hashes the entity id onto one of N lanes, each
//! drained by a single worker task, so ordering is guaranteed per entity
//! while distinct entities proceed in parallel.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::debug;

use super::bus::LifecycleChannel;
use crate::error::{WardenError, WardenResult};

/// Handler for routed lifecycle payloads.
///
/// Implementations own their error handling; a failed message must be
/// logged, never propagated, so one bad event cannot stall a lane.
#[async_trait]
pub trait LifecycleConsumer: Send + Sync + 'static {
    async fn on_escalate(&self, payload: &str);
    async fn on_resolve(&self, payload: &str);
}

#[derive(Debug)]
struct RoutedEvent {
    channel: LifecycleChannel,
    payload: String,
}

/// Minimal projection of a payload, used only to pick a lane
#[derive(serde::Deserialize)]
struct EventKey {
    id: String,
}

/// Fans lifecycle payloads out to per-entity ordered lanes
pub struct EntityRouter {
    lanes: Vec<mpsc::UnboundedSender<RoutedEvent>>,
    workers: Vec<JoinHandle<()>>,
}

impl EntityRouter {
    /// Spawn `lanes` worker tasks draining into `consumer`.
    ///
    /// At least one lane is always created.
    pub fn new(consumer: Arc<dyn LifecycleConsumer>, lanes: usize) -> Self {
        let lanes = lanes.max(1);
        let mut senders = Vec::with_capacity(lanes);
        let mut workers = Vec::with_capacity(lanes);

        for lane in 0..lanes {
            let (tx, mut rx) = mpsc::unbounded_channel::<RoutedEvent>();
            let consumer = Arc::clone(&consumer);
            workers.push(tokio::spawn(async move {
                while let Some(event) = rx.recv().await {
                    match event.channel {
                        LifecycleChannel::Escalate => consumer.on_escalate(&event.payload).await,
                        LifecycleChannel::Resolve => consumer.on_resolve(&event.payload).await,
                    }
                }
                debug!(lane, "router lane drained, worker exiting");
            }));
            senders.push(tx);
        }

        Self {
            lanes: senders,
            workers,
        }
    }

    /// Route a payload to its entity's lane.
    ///
    /// Payloads that do not carry a parseable entity id are rejected as
    /// malformed; there is no lane they could be ordered on.
    pub fn dispatch(&self, channel: LifecycleChannel, payload: String) -> WardenResult<()> {
        let key: EventKey = serde_json::from_str(&payload)
            .map_err(|e| WardenError::malformed(format!("unroutable payload: {e}")))?;

        let lane = self.lane_for(&key.id);
        self.lanes[lane]
            .send(RoutedEvent { channel, payload })
            .map_err(|_| WardenError::bus(format!("lane {lane} closed")))
    }

    /// Lane index for an entity id; stable for the router's lifetime.
    pub fn lane_for(&self, entity_id: &str) -> usize {
        let mut hasher = DefaultHasher::new();
        entity_id.hash(&mut hasher);
        (hasher.finish() as usize) % self.lanes.len()
    }

    /// Number of lanes
    pub fn lane_count(&self) -> usize {
        self.lanes.len()
    }

    /// Close all lanes and wait for in-flight events to finish.
    pub async fn shutdown(mut self) {
        self.lanes.clear();
        for worker in self.workers.drain(..) {
            let _ = worker.await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tokio::sync::Mutex;

    struct Recorder {
        seen: Mutex<Vec<(LifecycleChannel, String)>>,
    }

    impl Recorder {
        fn new() -> Arc<Self> {
            Arc::new(Self {
                seen: Mutex::new(Vec::new()),
            })
        }

        async fn record(&self, channel: LifecycleChannel, payload: &str) {
            // Yield so unordered delivery would have a chance to surface.
            tokio::time::sleep(Duration::from_millis(1)).await;
            self.seen.lock().await.push((channel, payload.to_string()));
        }
    }

    #[async_trait]
    impl LifecycleConsumer for Recorder {
        async fn on_escalate(&self, payload: &str) {
            self.record(LifecycleChannel::Escalate, payload).await;
        }
        async fn on_resolve(&self, payload: &str) {
            self.record(LifecycleChannel::Resolve, payload).await;
        }
    }

    fn payload(id: &str, count: u32) -> String {
        format!(r#"{{"id":"{id}","name":"n","status":"ERROR","conditions":"OFFLINE","count":{count}}}"#)
    }

    #[tokio::test]
    async fn test_same_entity_is_ordered() {
        let recorder = Recorder::new();
        let router = EntityRouter::new(recorder.clone(), 8);

        for count in 1..=20 {
            router
                .dispatch(LifecycleChannel::Escalate, payload("node-1", count))
                .unwrap();
        }
        router
            .dispatch(LifecycleChannel::Resolve, payload("node-1", 20))
            .unwrap();
        router.shutdown().await;

        let seen = recorder.seen.lock().await;
        assert_eq!(seen.len(), 21);
        for (i, (channel, body)) in seen.iter().take(20).enumerate() {
            assert_eq!(*channel, LifecycleChannel::Escalate);
            assert!(body.contains(&format!("\"count\":{}", i + 1)));
        }
        assert_eq!(seen[20].0, LifecycleChannel::Resolve);
    }

    #[tokio::test]
    async fn test_lane_assignment_is_stable() {
        let router = EntityRouter::new(Recorder::new(), 4);
        let lane = router.lane_for("node-42");
        for _ in 0..10 {
            assert_eq!(router.lane_for("node-42"), lane);
        }
        assert_eq!(router.lane_count(), 4);
        router.shutdown().await;
    }

    #[tokio::test]
    async fn test_unroutable_payload_is_malformed() {
        let router = EntityRouter::new(Recorder::new(), 2);
        let err = router
            .dispatch(LifecycleChannel::Escalate, "{\"no\":\"id\"}".to_string())
            .unwrap_err();
        assert!(matches!(err, WardenError::MalformedEvent { .. }));
        router.shutdown().await;
    }

    #[tokio::test]
    async fn test_zero_lanes_clamps_to_one() {
        let router = EntityRouter::new(Recorder::new(), 0);
        assert_eq!(router.lane_count(), 1);
        router.shutdown().await;
    }
}
