//! PagerDuty Events v2 paging provider.

use async_trait::async_trait;
use tracing::info;

use super::Pager;
use crate::error::{WardenError, WardenResult};

const EVENTS_URL: &str = "https://events.pagerduty.com/v2/enqueue";

/// Pager backed by the PagerDuty Events v2 API
pub struct PagerDuty {
    client: reqwest::Client,
    routing_key: String,
}

impl PagerDuty {
    pub fn new(routing_key: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            routing_key: routing_key.into(),
        }
    }

    fn build_payload(&self, title: &str, details: &str, dedup_key: &str) -> serde_json::Value {
        serde_json::json!({
            "routing_key": self.routing_key,
            "event_action": "trigger",
            "dedup_key": dedup_key,
            "payload": {
                "summary": title,
                "source": "node-warden",
                "severity": "critical",
                "custom_details": { "details": details },
            }
        })
    }
}

#[async_trait]
impl Pager for PagerDuty {
    async fn create_incident(&self, title: &str, details: &str) -> WardenResult<()> {
        let dedup_key = uuid::Uuid::new_v4().to_string();
        let payload = self.build_payload(title, details, &dedup_key);

        self.client
            .post(EVENTS_URL)
            .json(&payload)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| WardenError::paging(e.to_string()))?;

        info!(title, dedup_key = %dedup_key, "paging incident created");
        Ok(())
    }
}
