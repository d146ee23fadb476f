//! Escalation state: the per-entity error-streak counter.

pub mod counter;

pub use counter::EscalationCounter;
