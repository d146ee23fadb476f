//! Lifecycle event dispatcher.
//!
//! The orchestrator behind the three bus entry points: parse the event,
//! resolve the node, send the alert, drive rotation, maybe page the
//! dispatcher fleet, and persist the outcome. Only malformed input and a
//! failed node lookup abort a message; every downstream failure is logged
//! or reported and the remaining steps still run.
//!
//! Rotation policy is asymmetric: the first escalation always pulls an
//! unsynced backend node from rotation, while a repeat escalation only
//! pulls it when the pool still has at least two live servers. Removing
//! the last healthy replica would take the chain's serving capacity to
//! zero, so on a repeat the node is left in rotation and the alert
//! severity is raised to ERROR instead.

use std::sync::Arc;

use tracing::warn;

use crate::alerts::message::{alert_message, event_title, warning_message, AlertPhase};
use crate::alerts::{AlertChannel, AlertParams, AlertSeverity};
use crate::config::WardenConfig;
use crate::error::WardenResult;
use crate::events::bus::parse_payload;
use crate::events::types::{HealthStatus, LifecycleEvent};
use crate::paging::{DispatchFleetMonitor, Pager};
use crate::registry::{NodeContext, NodeRegistry};
use crate::rotation::{RotationControl, RotationController};

/// Minimum live servers required before a repeat escalation may pull a
/// node from rotation
const REDUNDANCY_FLOOR: u32 = 2;

/// A lifecycle event with its resolved node context and prebuilt messages
struct ParsedEvent {
    event: LifecycleEvent,
    node: NodeContext,
    title: String,
    message: String,
    warning: Option<String>,
    not_synced: bool,
}

/// Orchestrates lifecycle event handling across the alert channel, the
/// rotation control plane, the pager, and the node registry.
pub struct EventService {
    config: WardenConfig,
    registry: Arc<dyn NodeRegistry>,
    alerts: Arc<dyn AlertChannel>,
    rotation: RotationController,
    fleet: DispatchFleetMonitor,
}

impl EventService {
    pub fn new(
        config: WardenConfig,
        registry: Arc<dyn NodeRegistry>,
        alerts: Arc<dyn AlertChannel>,
        control: Arc<dyn RotationControl>,
        pager: Arc<dyn Pager>,
    ) -> Self {
        let rotation = RotationController::new(control, Arc::clone(&alerts));
        let fleet = DispatchFleetMonitor::new(
            Arc::clone(&registry),
            pager,
            config.fleet_paging_threshold,
        );
        Self {
            config,
            registry,
            alerts,
            rotation,
            fleet,
        }
    }

    /// Handle the first escalation of an error streak.
    ///
    /// An unsynced backend node is pulled from rotation unconditionally;
    /// first offense is always pulled, with no redundancy check.
    pub async fn process_triggered(&self, payload: &str) -> WardenResult<()> {
        let parsed = self.parse_event(payload, AlertPhase::Trigger).await?;

        self.send_status_message(&parsed, parsed.event.status).await;

        if !parsed.node.is_frontend() && parsed.not_synced {
            self.rotation.toggle(&parsed.node, &parsed.title, false).await;
        }

        self.maybe_page_fleet(&parsed.node).await;
        self.persist(&parsed).await;
        Ok(())
    }

    /// Handle a repeat escalation of an ongoing streak.
    ///
    /// For an unsynced backend node the live server count decides: with
    /// redundancy the alert is a WARNING and the node is pulled; without
    /// it the alert is an ERROR and the node stays in rotation.
    pub async fn process_retriggered(&self, payload: &str) -> WardenResult<()> {
        let parsed = self.parse_event(payload, AlertPhase::Retrigger).await?;

        if !parsed.node.is_frontend() && parsed.not_synced {
            let live = match self.rotation.live_server_count(&parsed.node).await {
                Ok(count) => count,
                Err(e) => {
                    // Unknown pool state reads as no redundancy: report at
                    // ERROR and leave the node serving.
                    warn!(entity = %parsed.event.id, error = %e, "live count unavailable");
                    0
                }
            };

            let status = if live >= REDUNDANCY_FLOOR {
                HealthStatus::Warning
            } else {
                HealthStatus::Error
            };
            self.send_status_message(&parsed, status).await;

            if live >= REDUNDANCY_FLOOR {
                self.rotation.toggle(&parsed.node, &parsed.title, false).await;
            }
        } else {
            self.send_status_message(&parsed, parsed.event.status).await;
        }

        self.maybe_page_fleet(&parsed.node).await;
        self.persist(&parsed).await;
        Ok(())
    }

    /// Handle the resolution of an error streak.
    ///
    /// Sends the success message, a secondary warning when the event
    /// carries one, and returns an unsynced backend node to rotation.
    pub async fn process_resolved(&self, payload: &str) -> WardenResult<()> {
        let parsed = self.parse_event(payload, AlertPhase::Resolved).await?;

        self.send_status_message(&parsed, parsed.event.status).await;

        if let Some(warning) = &parsed.warning {
            let params = self.alert_params(&parsed, warning.clone());
            if let Err(e) = self.alerts.send(AlertSeverity::Warning, &params).await {
                warn!(entity = %parsed.event.id, error = %e, "warning send failed");
            }
        }

        if !parsed.node.is_frontend() && parsed.not_synced {
            self.rotation.toggle(&parsed.node, &parsed.title, true).await;
        }

        self.persist(&parsed).await;
        Ok(())
    }

    async fn parse_event(&self, payload: &str, phase: AlertPhase) -> WardenResult<ParsedEvent> {
        let event = parse_payload(payload)?;
        let node = self.registry.get_node(&event.id).await?;

        let title = event_title(&event);
        let message = alert_message(&event, phase);
        let warning = event.send_warning.then(|| warning_message(&event));
        let not_synced = event.conditions.is_not_synced();

        Ok(ParsedEvent {
            event,
            node,
            title,
            message,
            warning,
            not_synced,
        })
    }

    async fn send_status_message(&self, parsed: &ParsedEvent, status: HealthStatus) {
        let params = self.alert_params(parsed, parsed.message.clone());
        let severity = AlertSeverity::from_status(status);
        if let Err(e) = self.alerts.send(severity, &params).await {
            warn!(entity = %parsed.event.id, %severity, error = %e, "alert send failed");
        }
    }

    fn alert_params(&self, parsed: &ParsedEvent, message: String) -> AlertParams {
        AlertParams {
            title: parsed.title.clone(),
            message,
            chain: parsed.node.chain.name.clone(),
            frontend: parsed.node.is_frontend(),
        }
    }

    async fn maybe_page_fleet(&self, node: &NodeContext) {
        if !self.config.fleet_paging || !node.dispatch || !node.chain.kind.is_dispatch() {
            return;
        }
        if let Err(e) = self.fleet.check(node).await {
            warn!(entity = %node.id, error = %e, "fleet escalation check failed");
        }
    }

    async fn persist(&self, parsed: &ParsedEvent) {
        if let Err(e) = self
            .registry
            .update_status(&parsed.event.id, parsed.event.status, parsed.event.conditions)
            .await
        {
            warn!(entity = %parsed.event.id, error = %e, "status persistence failed");
        }
    }
}
