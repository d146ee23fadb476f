//! Lifecycle events: types, the pub/sub bus, and per-entity routing.

pub mod bus;
pub mod router;
pub mod types;

pub use bus::{parse_payload, LifecycleBus, LifecycleChannel, SharedLifecycleBus};
pub use router::{EntityRouter, LifecycleConsumer};
pub use types::{EventDetails, HealthCondition, HealthSample, HealthStatus, LifecycleEvent};
