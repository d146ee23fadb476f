//! Fleet escalation: paging when a dispatcher fleet is collectively down.
//!
//! Single-node failures stay on the chat channel; this module covers the
//! case where enough dispatch-eligible nodes on one chain are unhealthy at
//! once that on-call needs to be woken up.

pub mod pagerduty;

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, info};

use crate::alerts::message::plural_suffix;
use crate::error::WardenResult;
use crate::registry::{NodeContext, NodeRegistry};

pub use pagerduty::PagerDuty;

/// Paging-system collaborator
#[async_trait]
pub trait Pager: Send + Sync {
    async fn create_incident(&self, title: &str, details: &str) -> WardenResult<()>;
}

/// Pager that records nothing; used when paging is not configured.
pub struct NoopPager;

#[async_trait]
impl Pager for NoopPager {
    async fn create_incident(&self, title: &str, _details: &str) -> WardenResult<()> {
        debug!(title, "paging not configured, incident dropped");
        Ok(())
    }
}

/// Threshold-based detection that a chain's dispatcher fleet is down
pub struct DispatchFleetMonitor {
    registry: Arc<dyn NodeRegistry>,
    pager: Arc<dyn Pager>,
    threshold: usize,
}

impl DispatchFleetMonitor {
    pub fn new(registry: Arc<dyn NodeRegistry>, pager: Arc<dyn Pager>, threshold: usize) -> Self {
        Self {
            registry,
            pager,
            threshold,
        }
    }

    /// Query the down dispatchers on `node`'s chain and raise an incident
    /// if the count has reached the threshold.
    pub async fn check(&self, node: &NodeContext) -> WardenResult<()> {
        let down = self.registry.down_dispatchers(&node.chain.id).await?;
        if down.len() < self.threshold {
            debug!(
                chain = %node.chain.id,
                down = down.len(),
                threshold = self.threshold,
                "dispatcher fleet below paging threshold"
            );
            return Ok(());
        }

        info!(chain = %node.chain.id, down = down.len(), "dispatcher fleet down, paging");
        self.pager
            .create_incident("ALERT - Dispatchers are down!", &incident_body(&down))
            .await
    }
}

/// Incident body enumerating the down fleet
pub fn incident_body(down: &[NodeContext]) -> String {
    let urls: Vec<&str> = down.iter().map(|n| n.url.as_str()).collect();
    format!(
        "{} dispatchers are down!\nDown Dispatcher{}:\n{}",
        down.len(),
        plural_suffix(down.len()),
        urls.join("\n")
    )
}
