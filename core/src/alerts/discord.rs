//! Discord webhook alert provider.
//!
//! Sends each alert as a single severity-colored embed. Frontend-class
//! alerts route to a dedicated webhook when one is configured; otherwise
//! everything lands on the primary channel.

use async_trait::async_trait;
use tracing::debug;

use super::{AlertChannel, AlertParams, AlertSeverity};
use crate::error::{WardenError, WardenResult};

/// Discord embed colors per severity
const COLOR_INFO: u32 = 0x95a5a6;
const COLOR_SUCCESS: u32 = 0x2ecc71;
const COLOR_WARNING: u32 = 0xf1c40f;
const COLOR_ERROR: u32 = 0xe74c3c;

/// Alert channel backed by Discord webhooks
pub struct DiscordWebhook {
    client: reqwest::Client,
    url: String,
    frontend_url: Option<String>,
}

impl DiscordWebhook {
    /// Create a provider posting to `url`, with an optional dedicated
    /// webhook for frontend-class alerts.
    pub fn new(url: impl Into<String>, frontend_url: Option<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            url: url.into(),
            frontend_url,
        }
    }

    fn target_url(&self, frontend: bool) -> &str {
        match (&self.frontend_url, frontend) {
            (Some(url), true) => url,
            _ => &self.url,
        }
    }

    fn severity_color(severity: AlertSeverity) -> u32 {
        match severity {
            AlertSeverity::Info => COLOR_INFO,
            AlertSeverity::Success => COLOR_SUCCESS,
            AlertSeverity::Warning => COLOR_WARNING,
            AlertSeverity::Error => COLOR_ERROR,
        }
    }

    fn build_body(severity: AlertSeverity, params: &AlertParams) -> serde_json::Value {
        serde_json::json!({
            "embeds": [{
                "title": params.title,
                "description": params.message,
                "color": Self::severity_color(severity),
                "footer": { "text": params.chain },
            }]
        })
    }
}

#[async_trait]
impl AlertChannel for DiscordWebhook {
    async fn send(&self, severity: AlertSeverity, params: &AlertParams) -> WardenResult<()> {
        let body = Self::build_body(severity, params);
        self.client
            .post(self.target_url(params.frontend))
            .json(&body)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| WardenError::channel(e.to_string()))?;

        debug!(%severity, chain = %params.chain, frontend = params.frontend, "alert delivered");
        Ok(())
    }
}
