//! Bus consumption: classification and dispatch into the event service.
//!
//! The escalation counter publishes an escalate event on every error sample
//! at or past the threshold, carrying the live streak count. That count is
//! the classification contract at the bus boundary: `count == threshold`
//! is the publication made at the moment the entity crossed the threshold
//! (a first escalation), `count > threshold` means the entity was already
//! escalating (a repeat). Resolve-channel payloads are always resolutions.

use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use tokio::sync::broadcast::error::RecvError;
use tracing::{error, warn};

use warden_core::{
    EntityRouter, EventService, LifecycleChannel, LifecycleConsumer, SharedLifecycleBus,
};

/// Escalation phase derived from the streak count
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EscalatePhase {
    First,
    Repeat,
}

/// Classify an escalate publication by its streak count.
pub fn classify(count: u32, threshold: u32) -> EscalatePhase {
    if count > threshold {
        EscalatePhase::Repeat
    } else {
        EscalatePhase::First
    }
}

/// Minimal projection of a payload, used only for classification
#[derive(Deserialize)]
struct CountKey {
    #[serde(default)]
    count: u32,
}

/// Routes classified lifecycle payloads into the event service.
///
/// Per-message failures are logged and swallowed here; one bad event must
/// never stall the router lane it arrived on.
pub struct EventConsumer {
    service: Arc<EventService>,
    threshold: u32,
}

impl EventConsumer {
    pub fn new(service: Arc<EventService>, threshold: u32) -> Self {
        Self { service, threshold }
    }
}

#[async_trait]
impl LifecycleConsumer for EventConsumer {
    async fn on_escalate(&self, payload: &str) {
        let count = match serde_json::from_str::<CountKey>(payload) {
            Ok(key) => key.count,
            Err(e) => {
                error!(error = %e, "dropping unparseable escalate event");
                return;
            }
        };

        let result = match classify(count, self.threshold) {
            EscalatePhase::First => self.service.process_triggered(payload).await,
            EscalatePhase::Repeat => self.service.process_retriggered(payload).await,
        };
        if let Err(e) = result {
            error!(count, error = %e, "escalate event dropped");
        }
    }

    async fn on_resolve(&self, payload: &str) {
        if let Err(e) = self.service.process_resolved(payload).await {
            error!(error = %e, "resolve event dropped");
        }
    }
}

/// Forward both bus channels into the per-entity router until the bus
/// closes.
pub async fn pump(bus: SharedLifecycleBus, router: Arc<EntityRouter>) {
    let mut escalate_rx = bus.subscribe_escalate();
    let mut resolve_rx = bus.subscribe_resolve();

    loop {
        let (channel, received) = tokio::select! {
            msg = escalate_rx.recv() => (LifecycleChannel::Escalate, msg),
            msg = resolve_rx.recv() => (LifecycleChannel::Resolve, msg),
        };

        match received {
            Ok(payload) => {
                if let Err(e) = router.dispatch(channel, payload) {
                    error!(%channel, error = %e, "dropping undispatchable event");
                }
            }
            Err(RecvError::Lagged(missed)) => {
                warn!(%channel, missed, "bus consumer lagged, events skipped");
            }
            Err(RecvError::Closed) => break,
        }
    }
}
