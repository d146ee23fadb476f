//! HTTP-backed node registry.
//!
//! Thin client for the fleet inventory API. The engine only needs three
//! endpoints: node resolution, status write-back, and the down-dispatcher
//! fleet query.

use async_trait::async_trait;
use reqwest::StatusCode;
use tracing::debug;

use super::{NodeContext, NodeRegistry};
use crate::error::{WardenError, WardenResult};
use crate::events::types::{HealthCondition, HealthStatus};

/// Node registry client over the inventory HTTP API
pub struct HttpRegistry {
    client: reqwest::Client,
    base_url: String,
}

impl HttpRegistry {
    /// Create a client for an API rooted at `base_url`
    /// (e.g. `http://inventory.internal:4000`).
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    fn node_url(&self, id: &str) -> String {
        format!("{}/nodes/{id}", self.base_url)
    }

    fn status_url(&self, id: &str) -> String {
        format!("{}/nodes/{id}/status", self.base_url)
    }

    fn down_dispatchers_url(&self, chain_id: &str) -> String {
        format!("{}/chains/{chain_id}/dispatchers/down", self.base_url)
    }
}

#[async_trait]
impl NodeRegistry for HttpRegistry {
    async fn get_node(&self, id: &str) -> WardenResult<NodeContext> {
        let response = self.client.get(self.node_url(id)).send().await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Err(WardenError::node_not_found(id));
        }
        let node = response.error_for_status()?.json::<NodeContext>().await?;
        debug!(entity = id, chain = %node.chain.name, "node resolved");
        Ok(node)
    }

    async fn update_status(
        &self,
        id: &str,
        status: HealthStatus,
        conditions: HealthCondition,
    ) -> WardenResult<()> {
        let body = serde_json::json!({ "status": status, "conditions": conditions });
        self.client
            .put(self.status_url(id))
            .json(&body)
            .send()
            .await?
            .error_for_status()
            .map_err(|e| WardenError::persistence(e.to_string()))?;
        Ok(())
    }

    async fn down_dispatchers(&self, chain_id: &str) -> WardenResult<Vec<NodeContext>> {
        let nodes = self
            .client
            .get(self.down_dispatchers_url(chain_id))
            .send()
            .await?
            .error_for_status()?
            .json::<Vec<NodeContext>>()
            .await?;
        Ok(nodes)
    }
}
