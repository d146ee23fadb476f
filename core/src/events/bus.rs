//! Lifecycle bus.
//!
//! Two logical channels, one for escalations and one for resolutions, each
//! carrying JSON-serialized [`LifecycleEvent`]s over Tokio broadcast
//! channels. Publishing with no subscribers is not an error; the consumer
//! runtime may not be attached yet.

use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::debug;

use super::types::LifecycleEvent;
use crate::error::{WardenError, WardenResult};

/// Channel capacity for each broadcast stream
const CHANNEL_CAPACITY: usize = 256;

/// Shared reference to a [`LifecycleBus`]
pub type SharedLifecycleBus = Arc<LifecycleBus>;

/// Which logical channel a payload was published on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleChannel {
    Escalate,
    Resolve,
}

impl std::fmt::Display for LifecycleChannel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Escalate => write!(f, "escalate"),
            Self::Resolve => write!(f, "resolve"),
        }
    }
}

/// Pub/sub bus carrying lifecycle events between the escalation counter
/// and the event handler runtime
pub struct LifecycleBus {
    escalate: broadcast::Sender<String>,
    resolve: broadcast::Sender<String>,
}

impl LifecycleBus {
    /// Create a new bus with no subscribers
    pub fn new() -> Self {
        let (escalate, _) = broadcast::channel(CHANNEL_CAPACITY);
        let (resolve, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self { escalate, resolve }
    }

    /// Create a shared reference to this bus
    pub fn shared(self) -> SharedLifecycleBus {
        Arc::new(self)
    }

    /// Publish an escalate event
    pub fn publish_escalate(&self, event: &LifecycleEvent) -> WardenResult<()> {
        self.publish(LifecycleChannel::Escalate, event)
    }

    /// Publish a resolve event
    pub fn publish_resolve(&self, event: &LifecycleEvent) -> WardenResult<()> {
        self.publish(LifecycleChannel::Resolve, event)
    }

    fn publish(&self, channel: LifecycleChannel, event: &LifecycleEvent) -> WardenResult<()> {
        let payload = serde_json::to_string(event)?;
        let sender = match channel {
            LifecycleChannel::Escalate => &self.escalate,
            LifecycleChannel::Resolve => &self.resolve,
        };

        match sender.send(payload) {
            Ok(receivers) => {
                debug!(%channel, entity = %event.id, count = event.count, receivers, "event published");
            }
            Err(_) => {
                // No receivers attached; the event is dropped, not an error.
                debug!(%channel, entity = %event.id, "event published (no receivers)");
            }
        }
        Ok(())
    }

    /// Subscribe to escalate events
    pub fn subscribe_escalate(&self) -> broadcast::Receiver<String> {
        self.escalate.subscribe()
    }

    /// Subscribe to resolve events
    pub fn subscribe_resolve(&self) -> broadcast::Receiver<String> {
        self.resolve.subscribe()
    }

    /// Number of subscribers on the escalate channel
    pub fn escalate_subscriber_count(&self) -> usize {
        self.escalate.receiver_count()
    }

    /// Number of subscribers on the resolve channel
    pub fn resolve_subscriber_count(&self) -> usize {
        self.resolve.receiver_count()
    }
}

impl Default for LifecycleBus {
    fn default() -> Self {
        Self::new()
    }
}

/// Parse a bus payload back into a [`LifecycleEvent`].
///
/// Failures map to [`WardenError::MalformedEvent`] so consumers can apply
/// the drop-with-loud-log policy uniformly.
pub fn parse_payload(payload: &str) -> WardenResult<LifecycleEvent> {
    serde_json::from_str(payload).map_err(|e| WardenError::malformed(e.to_string()))
}
