//! End-to-end flow: health samples through the escalation counter, over
//! the lifecycle bus, and into an ordered per-entity consumer.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use warden_core::{
    parse_payload, EntityRouter, EscalationCounter, HealthCondition, HealthSample, HealthStatus,
    LifecycleBus, LifecycleChannel, LifecycleConsumer,
};

struct Recorder {
    seen: Mutex<Vec<(LifecycleChannel, u32)>>,
}

#[async_trait]
impl LifecycleConsumer for Recorder {
    async fn on_escalate(&self, payload: &str) {
        let event = parse_payload(payload).unwrap();
        self.seen
            .lock()
            .unwrap()
            .push((LifecycleChannel::Escalate, event.count));
    }

    async fn on_resolve(&self, payload: &str) {
        let event = parse_payload(payload).unwrap();
        self.seen
            .lock()
            .unwrap()
            .push((LifecycleChannel::Resolve, event.count));
    }
}

fn sample(status: HealthStatus) -> HealthSample {
    HealthSample {
        name: "mainnet1/eth".to_string(),
        status,
        conditions: if status == HealthStatus::Ok {
            HealthCondition::Healthy
        } else {
            HealthCondition::NotSynchronized
        },
        send_warning: false,
        details: None,
        eth_syncing: None,
        height: None,
    }
}

#[tokio::test]
async fn test_error_burst_then_recovery_reaches_consumer_in_order() {
    let bus = LifecycleBus::new().shared();
    let mut escalate_rx = bus.subscribe_escalate();
    let mut resolve_rx = bus.subscribe_resolve();

    let counter = EscalationCounter::new(2, bus);
    let recorder = Arc::new(Recorder {
        seen: Mutex::new(Vec::new()),
    });
    let router = EntityRouter::new(recorder.clone(), 4);

    // Three consecutive errors, then recovery.
    for _ in 0..3 {
        counter
            .evaluate("node-1", &sample(HealthStatus::Error))
            .unwrap();
    }
    counter
        .evaluate("node-1", &sample(HealthStatus::Ok))
        .unwrap();

    // Forward everything the bus saw into the router, escalates first;
    // per-entity lanes preserve this order downstream.
    while let Ok(payload) = escalate_rx.try_recv() {
        router
            .dispatch(LifecycleChannel::Escalate, payload)
            .unwrap();
    }
    while let Ok(payload) = resolve_rx.try_recv() {
        router.dispatch(LifecycleChannel::Resolve, payload).unwrap();
    }
    router.shutdown().await;

    let seen = recorder.seen.lock().unwrap();
    // No publication at count 1; escalates at 2 and 3; one resolve
    // carrying the final streak count.
    assert_eq!(
        seen.as_slice(),
        &[
            (LifecycleChannel::Escalate, 2),
            (LifecycleChannel::Escalate, 3),
            (LifecycleChannel::Resolve, 3),
        ]
    );

    // A fresh error after recovery starts a new streak at 1.
    counter
        .evaluate("node-1", &sample(HealthStatus::Error))
        .unwrap();
    assert_eq!(counter.current_count("node-1"), Some(1));
}

#[tokio::test]
async fn test_recovery_without_streak_publishes_nothing() {
    let bus = LifecycleBus::new().shared();
    let mut resolve_rx = bus.subscribe_resolve();
    let counter = EscalationCounter::new(2, bus);

    counter
        .evaluate("node-9", &sample(HealthStatus::Ok))
        .unwrap();

    tokio::time::sleep(Duration::from_millis(5)).await;
    assert!(resolve_rx.try_recv().is_err());
}
