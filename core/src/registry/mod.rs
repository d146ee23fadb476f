//! Node registry: resolved node context and the resolution/persistence
//! collaborator contract.
//!
//! The engine never owns node records; it resolves them per event and
//! writes status back as the terminal step of processing. The concrete
//! store lives behind [`NodeRegistry`].

pub mod http;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::WardenResult;
use crate::events::types::{HealthCondition, HealthStatus};

pub use http::HttpRegistry;

/// Chain family a node serves
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ChainKind {
    /// Dispatcher chains; collective outage of their dispatch nodes pages
    Dispatch,
    Validator,
    Data,
}

impl ChainKind {
    pub fn is_dispatch(&self) -> bool {
        matches!(self, Self::Dispatch)
    }
}

/// Chain a node belongs to
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chain {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: ChainKind,
}

/// Host a node (or load balancer) runs on
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Host {
    pub name: String,
}

/// Resolved context for one monitored node.
///
/// `backend` marks a node fronted by a load-balancer pool and eligible for
/// rotation control; `frontend` marks a node that is not. The two are
/// mutually exclusive in practice but the store, not this type, enforces it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeContext {
    pub id: String,
    pub chain: Chain,
    pub host: Host,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub backend: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub frontend: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub server: Option<String>,
    #[serde(default)]
    pub load_balancers: Vec<Host>,
    /// Whether this node is dispatch-eligible for fleet escalation
    #[serde(default)]
    pub dispatch: bool,
    /// Serving URL, used when enumerating a down fleet
    #[serde(default)]
    pub url: String,
}

impl NodeContext {
    /// Frontend-class nodes are never subject to rotation control.
    pub fn is_frontend(&self) -> bool {
        self.frontend.is_some()
    }

    /// Display name used in rotation messages: `host/chain`
    pub fn rotation_name(&self) -> String {
        format!("{}/{}", self.host.name, self.chain.name)
    }
}

/// Node resolution and status persistence collaborator.
///
/// `update_status` is best-effort: callers log failures and continue, so an
/// unavailable store never blocks alert delivery.
#[async_trait]
pub trait NodeRegistry: Send + Sync {
    /// Resolve a node by entity id. Fails with
    /// [`crate::error::WardenError::NodeNotFound`] for unknown entities.
    async fn get_node(&self, id: &str) -> WardenResult<NodeContext>;

    /// Persist the last known alerting state onto the node's record.
    async fn update_status(
        &self,
        id: &str,
        status: HealthStatus,
        conditions: HealthCondition,
    ) -> WardenResult<()>;

    /// All dispatch-eligible nodes on a chain whose status is not OK and
    /// whose conditions are not healthy.
    async fn down_dispatchers(&self, chain_id: &str) -> WardenResult<Vec<NodeContext>>;
}
