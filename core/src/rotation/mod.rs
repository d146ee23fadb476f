//! Load-balancer rotation: decision glue around the external control plane.
//!
//! The controller narrates every toggle (attempt, then success or error)
//! on the alert channel and swallows control-plane failures: a node that
//! cannot be pulled from or returned to rotation is reported to operators,
//! never retried automatically, and never aborts the lifecycle event that
//! asked for the toggle.

pub mod haproxy;

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tracing::warn;

use crate::alerts::message::{rotation_message, RotationOutcome};
use crate::alerts::{AlertChannel, AlertParams, AlertSeverity};
use crate::error::{WardenError, WardenResult};
use crate::registry::{Host, NodeContext};

pub use haproxy::HaproxyControl;

/// The pool a backend node serves in
#[derive(Debug, Clone, PartialEq)]
pub struct RotationPool {
    pub backend: String,
    pub server: String,
    pub load_balancers: Vec<Host>,
}

impl RotationPool {
    /// Extract the pool from a resolved node. `None` for nodes without a
    /// backend/server assignment (frontend-class nodes).
    pub fn for_node(node: &NodeContext) -> Option<Self> {
        Some(Self {
            backend: node.backend.clone()?,
            server: node.server.clone()?,
            load_balancers: node.load_balancers.clone(),
        })
    }
}

/// Rotation control-plane collaborator
#[async_trait]
pub trait RotationControl: Send + Sync {
    /// Return the server to its pool
    async fn enable(&self, pool: &RotationPool) -> WardenResult<()>;
    /// Pull the server from its pool
    async fn disable(&self, pool: &RotationPool) -> WardenResult<()>;
    /// Number of servers currently live in the pool
    async fn live_count(&self, pool: &RotationPool) -> WardenResult<u32>;
}

/// Decision glue between lifecycle handling and the control plane.
///
/// Toggles for the same node are mutually exclusive so two lifecycle
/// events processed concurrently cannot flap a server.
pub struct RotationController {
    control: Arc<dyn RotationControl>,
    alerts: Arc<dyn AlertChannel>,
    locks: Mutex<HashMap<String, Arc<tokio::sync::Mutex<()>>>>,
}

impl RotationController {
    pub fn new(control: Arc<dyn RotationControl>, alerts: Arc<dyn AlertChannel>) -> Self {
        Self {
            control,
            alerts,
            locks: Mutex::new(HashMap::new()),
        }
    }

    /// Add (`enable`) or remove the node's server from rotation, narrating
    /// the attempt and its outcome on the alert channel.
    pub async fn toggle(&self, node: &NodeContext, title: &str, enable: bool) {
        let Some(pool) = RotationPool::for_node(node) else {
            warn!(entity = %node.id, "toggle requested for node without a backend pool");
            return;
        };

        let lock = self.node_lock(&node.id);
        let _guard = lock.lock().await;

        self.notify(
            node,
            title,
            AlertSeverity::Info,
            rotation_message(node, enable, RotationOutcome::Attempt),
        )
        .await;

        let result = if enable {
            self.control.enable(&pool).await
        } else {
            self.control.disable(&pool).await
        };

        match result {
            Ok(()) => {
                self.notify(
                    node,
                    title,
                    AlertSeverity::Success,
                    rotation_message(node, enable, RotationOutcome::Success),
                )
                .await;
            }
            Err(e) => {
                warn!(entity = %node.id, enable, error = %e, "rotation toggle failed");
                self.notify(
                    node,
                    title,
                    AlertSeverity::Error,
                    rotation_message(node, enable, RotationOutcome::Error(&e.to_string())),
                )
                .await;
            }
        }
    }

    /// Live server count for the node's pool
    pub async fn live_server_count(&self, node: &NodeContext) -> WardenResult<u32> {
        let pool = RotationPool::for_node(node)
            .ok_or_else(|| WardenError::rotation(format!("node {} has no backend pool", node.id)))?;
        self.control.live_count(&pool).await
    }

    async fn notify(
        &self,
        node: &NodeContext,
        title: &str,
        severity: AlertSeverity,
        message: String,
    ) {
        let params = AlertParams {
            title: title.to_string(),
            message,
            chain: node.chain.name.clone(),
            frontend: false,
        };
        if let Err(e) = self.alerts.send(severity, &params).await {
            warn!(entity = %node.id, error = %e, "rotation alert send failed");
        }
    }

    fn node_lock(&self, node_id: &str) -> Arc<tokio::sync::Mutex<()>> {
        let mut locks = self.locks.lock().unwrap_or_else(|e| e.into_inner());
        Arc::clone(
            locks
                .entry(node_id.to_string())
                .or_insert_with(|| Arc::new(tokio::sync::Mutex::new(()))),
        )
    }
}
