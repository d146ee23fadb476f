//! Alerting: severities, the outbound channel contract, message
//! formatting, and the chat-ops webhook provider.

pub mod discord;
pub mod message;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::WardenResult;
use crate::events::types::HealthStatus;

pub use discord::DiscordWebhook;
pub use message::{
    alert_message, event_title, plural_suffix, pool_description, rotation_message, warning_message,
    AlertPhase, RotationOutcome,
};

/// Severity attached to every outbound alert
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AlertSeverity {
    Info,
    Success,
    Warning,
    Error,
}

impl AlertSeverity {
    /// Map a health status onto the severity its message is sent at.
    pub fn from_status(status: HealthStatus) -> Self {
        match status {
            HealthStatus::Ok => Self::Success,
            HealthStatus::Warning => Self::Warning,
            HealthStatus::Error => Self::Error,
        }
    }
}

impl std::fmt::Display for AlertSeverity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Info => write!(f, "INFO"),
            Self::Success => write!(f, "SUCCESS"),
            Self::Warning => write!(f, "WARNING"),
            Self::Error => write!(f, "ERROR"),
        }
    }
}

/// One outbound alert, constructed per send and discarded
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlertParams {
    pub title: String,
    pub message: String,
    /// Chain name, used by providers that route per chain
    pub chain: String,
    /// Whether the node is frontend-class; routes to the frontend channel
    pub frontend: bool,
}

/// Outbound alert channel collaborator.
///
/// Provider selection is deployment configuration; the engine only needs
/// one of these to exist.
#[async_trait]
pub trait AlertChannel: Send + Sync {
    async fn send(&self, severity: AlertSeverity, params: &AlertParams) -> WardenResult<()>;
}
