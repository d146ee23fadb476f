//! Lifecycle event types.
//!
//! These cross the lifecycle bus as JSON and mirror the payloads the health
//! monitors publish: camelCase field names, SCREAMING_SNAKE status and
//! condition values.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Health status reported by a monitor probe
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum HealthStatus {
    Ok,
    Warning,
    Error,
}

impl std::fmt::Display for HealthStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Ok => write!(f, "OK"),
            Self::Warning => write!(f, "WARNING"),
            Self::Error => write!(f, "ERROR"),
        }
    }
}

/// Health condition detail accompanying a status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum HealthCondition {
    Healthy,
    Offline,
    NoResponse,
    NotSynchronized,
    NoPeers,
    PeerNotSynchronized,
}

impl HealthCondition {
    /// Whether this condition makes a backend node a candidate for
    /// rotation control.
    pub fn is_not_synced(&self) -> bool {
        matches!(self, Self::NotSynchronized)
    }

    /// Whether this condition counts as healthy for fleet queries.
    pub fn is_healthy(&self) -> bool {
        matches!(self, Self::Healthy)
    }
}

impl std::fmt::Display for HealthCondition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Healthy => write!(f, "HEALTHY"),
            Self::Offline => write!(f, "OFFLINE"),
            Self::NoResponse => write!(f, "NO_RESPONSE"),
            Self::NotSynchronized => write!(f, "NOT_SYNCHRONIZED"),
            Self::NoPeers => write!(f, "NO_PEERS"),
            Self::PeerNotSynchronized => write!(f, "PEER_NOT_SYNCHRONIZED"),
        }
    }
}

/// Optional extra detail carried by a health event
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventDetails {
    /// External oracle endpoints that disagreed with the node
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bad_oracles: Option<Vec<String>>,
}

/// A raw health observation for one monitored node, as produced by a probe.
///
/// The escalation counter consumes these; only `OK` and `ERROR` statuses
/// drive state transitions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthSample {
    /// Node display name
    pub name: String,
    /// Probe status
    pub status: HealthStatus,
    /// Condition detail
    pub conditions: HealthCondition,
    /// Whether a secondary warning message should accompany resolution
    #[serde(default)]
    pub send_warning: bool,
    /// Extra detail (bad oracles, ...)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<EventDetails>,
    /// Chain sync-state payload, passed through verbatim
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub eth_syncing: Option<serde_json::Value>,
    /// Block-height payload, passed through verbatim
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<serde_json::Value>,
}

/// A lifecycle event published on the bus once the escalation counter has
/// decided a streak is escalation- or resolution-worthy.
///
/// Immutable once published; consumed exactly once by a handler.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LifecycleEvent {
    /// Monitored entity id, the key for escalation state
    pub id: String,
    /// Node display name
    pub name: String,
    /// Probe status at publish time
    pub status: HealthStatus,
    /// Condition being escalated or resolved
    pub conditions: HealthCondition,
    /// Consecutive error observations in the streak
    #[serde(default)]
    pub count: u32,
    /// Whether a secondary warning message should be sent on resolution
    #[serde(default)]
    pub send_warning: bool,
    /// Extra detail (bad oracles, ...)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<EventDetails>,
    /// Chain sync-state payload
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub eth_syncing: Option<serde_json::Value>,
    /// Block-height payload
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<serde_json::Value>,
    /// When the event was published
    #[serde(default = "Utc::now")]
    pub timestamp: DateTime<Utc>,
}

impl LifecycleEvent {
    /// Build an event from a raw sample, attaching the entity id, the
    /// streak count, and the condition the streak is tracking.
    pub fn from_sample(
        id: impl Into<String>,
        sample: &HealthSample,
        conditions: HealthCondition,
        count: u32,
    ) -> Self {
        Self {
            id: id.into(),
            name: sample.name.clone(),
            status: sample.status,
            conditions,
            count,
            send_warning: sample.send_warning,
            details: sample.details.clone(),
            eth_syncing: sample.eth_syncing.clone(),
            height: sample.height.clone(),
            timestamp: Utc::now(),
        }
    }

    /// Bad-oracle list, if the event carries one
    pub fn bad_oracles(&self) -> Option<&[String]> {
        self.details
            .as_ref()
            .and_then(|d| d.bad_oracles.as_deref())
    }
}
