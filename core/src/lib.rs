//! Escalation and alert routing for blockchain node fleets.
//!
//! This crate turns raw per-node health observations into escalating,
//! multi-channel alerts and availability-aware load-balancer rotation:
//!
//! - [`escalation::EscalationCounter`] deduplicates noisy error samples
//!   into discrete escalate/resolve lifecycle events
//! - [`events::LifecycleBus`] carries those events between publisher and
//!   consumer; [`events::EntityRouter`] keeps per-entity ordering
//! - [`service::EventService`] handles each event: alert sends, rotation
//!   toggles with a redundancy-aware policy, fleet paging, and status
//!   persistence
//!
//! Collaborators (node registry, alert channel, rotation control plane,
//! pager) are injected behind traits; concrete HTTP providers for Discord,
//! HAProxy, PagerDuty, and the inventory API ship alongside the contracts.

pub mod alerts;
pub mod config;
pub mod error;
pub mod escalation;
pub mod events;
pub mod paging;
pub mod registry;
pub mod rotation;
pub mod service;

// Re-export the engine surface
pub use config::WardenConfig;
pub use error::{WardenError, WardenResult};
pub use escalation::EscalationCounter;
pub use service::EventService;

// Re-export key event types
pub use events::{
    parse_payload, EntityRouter, HealthCondition, HealthSample, HealthStatus, LifecycleBus,
    LifecycleChannel, LifecycleConsumer, LifecycleEvent, SharedLifecycleBus,
};

// Re-export alerting types
pub use alerts::{AlertChannel, AlertParams, AlertPhase, AlertSeverity, DiscordWebhook};

// Re-export collaborator contracts and providers
pub use paging::{DispatchFleetMonitor, NoopPager, Pager, PagerDuty};
pub use registry::{Chain, ChainKind, Host, HttpRegistry, NodeContext, NodeRegistry};
pub use rotation::{HaproxyControl, RotationControl, RotationController, RotationPool};
