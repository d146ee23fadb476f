//! Alert message construction.
//!
//! Pure functions from event data to the human-readable titles and bodies
//! operators see. Optional lines (sync state, height, oracle lists) are
//! omitted rather than rendered empty.

use crate::events::types::LifecycleEvent;
use crate::registry::{Host, NodeContext};

/// Lifecycle phase a message is being built for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlertPhase {
    Trigger,
    Retrigger,
    Resolved,
}

impl AlertPhase {
    /// Leading line of the alert body
    pub fn label(&self) -> &'static str {
        match self {
            Self::Trigger => "First Alert",
            Self::Retrigger => "Continuous Alert",
            Self::Resolved => "Event Resolved",
        }
    }
}

/// Outcome of a rotation attempt, for message selection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RotationOutcome<'a> {
    Attempt,
    Success,
    Error(&'a str),
}

/// Pluralization suffix: empty for exactly one, "s" otherwise
pub fn plural_suffix(count: usize) -> &'static str {
    if count == 1 {
        ""
    } else {
        "s"
    }
}

/// Alert title: `<name> is <conditions>`
pub fn event_title(event: &LifecycleEvent) -> String {
    format!("{} is {}", event.name, event.conditions)
}

/// Alert body for a lifecycle event.
///
/// Lines: phase label, the condition sentence, the occurrence count with
/// singular/plural agreement, then any sync-state and height context the
/// event carried.
pub fn alert_message(event: &LifecycleEvent, phase: AlertPhase) -> String {
    let count_line = if event.count > 0 {
        format!(
            "This event has occurred {} time{} since first occurrence.",
            event.count,
            plural_suffix(event.count as usize)
        )
    } else {
        String::new()
    };
    let eth_syncing_line = event
        .eth_syncing
        .as_ref()
        .map(|v| format!("ETH Syncing: {v}"))
        .unwrap_or_default();
    let height_line = event
        .height
        .as_ref()
        .map(|v| format!("Height: {v}"))
        .unwrap_or_default();

    join_lines(vec![
        phase.label().to_string(),
        format!("{} is {}.", event.name, event.conditions),
        count_line,
        eth_syncing_line,
        height_line,
    ])
}

/// Secondary warning body sent alongside a resolution when the event
/// carries a warning payload.
pub fn warning_message(event: &LifecycleEvent) -> String {
    let oracle_line = event
        .bad_oracles()
        .map(|oracles| {
            format!(
                "Bad Oracle{}: {}",
                plural_suffix(oracles.len()),
                oracles.join(", ")
            )
        })
        .unwrap_or_default();

    join_lines(vec![
        format!("WARNING: {} is {}.", event.name, event.conditions),
        oracle_line,
    ])
}

/// Description of a backend's load-balancer pool
pub fn pool_description(backend: &str, load_balancers: &[Host]) -> String {
    let names: Vec<&str> = load_balancers.iter().map(|h| h.name.as_str()).collect();
    format!(
        "Backend: {backend} | Load Balancer{}: {}",
        plural_suffix(names.len()),
        names.join(", ")
    )
}

/// Rotation attempt/success/error body for adding or removing a node
/// from its pool.
pub fn rotation_message(node: &NodeContext, enable: bool, outcome: RotationOutcome<'_>) -> String {
    let name = node.rotation_name();
    let backend = node.backend.as_deref().unwrap_or_default();
    let pool = pool_description(backend, &node.load_balancers);

    let (verb, direction) = if enable {
        ("add", "to")
    } else {
        ("remove", "from")
    };

    match outcome {
        RotationOutcome::Attempt => {
            format!("Attempting to {verb} {name} {direction} rotation.\n{pool}")
        }
        RotationOutcome::Success => {
            let done = if enable { "added" } else { "removed" };
            format!("Successfully {done} {name} {direction} rotation.\n{pool}")
        }
        RotationOutcome::Error(detail) => {
            format!("Could not {verb} {name} {direction} rotation.\n{pool}\n{detail}")
        }
    }
}

/// Join lines, dropping empty ones
fn join_lines(lines: Vec<String>) -> String {
    lines
        .into_iter()
        .filter(|l| !l.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::types::{EventDetails, HealthCondition, HealthStatus};
    use crate::registry::{Chain, ChainKind};

    fn event(count: u32) -> LifecycleEvent {
        LifecycleEvent {
            id: "node-1".to_string(),
            name: "mainnet1/eth".to_string(),
            status: HealthStatus::Error,
            conditions: HealthCondition::NotSynchronized,
            count,
            send_warning: false,
            details: None,
            eth_syncing: None,
            height: None,
            timestamp: chrono::Utc::now(),
        }
    }

    fn backend_node() -> NodeContext {
        NodeContext {
            id: "node-1".to_string(),
            chain: Chain {
                id: "eth-main".to_string(),
                name: "eth".to_string(),
                kind: ChainKind::Data,
            },
            host: Host {
                name: "mainnet1".to_string(),
            },
            backend: Some("ethmainnet".to_string()),
            frontend: None,
            server: Some("2a".to_string()),
            load_balancers: vec![
                Host {
                    name: "lb1".to_string(),
                },
                Host {
                    name: "lb2".to_string(),
                },
            ],
            dispatch: false,
            url: String::new(),
        }
    }

    #[test]
    fn test_title() {
        assert_eq!(
            event_title(&event(3)),
            "mainnet1/eth is NOT_SYNCHRONIZED"
        );
    }

    #[test]
    fn test_alert_message_lines() {
        let mut e = event(3);
        e.height = Some(serde_json::json!(15000000));

        let body = alert_message(&e, AlertPhase::Retrigger);
        let lines: Vec<&str> = body.lines().collect();
        assert_eq!(
            lines,
            vec![
                "Continuous Alert",
                "mainnet1/eth is NOT_SYNCHRONIZED.",
                "This event has occurred 3 times since first occurrence.",
                "Height: 15000000",
            ]
        );
    }

    #[test]
    fn test_singular_occurrence() {
        let body = alert_message(&event(1), AlertPhase::Trigger);
        assert!(body.contains("has occurred 1 time since"));
        assert!(!body.contains("1 times"));
    }

    #[test]
    fn test_optional_lines_omitted() {
        let body = alert_message(&event(2), AlertPhase::Trigger);
        assert!(!body.contains("ETH Syncing"));
        assert!(!body.contains("Height"));
        assert!(!body.contains("\n\n"));
    }

    #[test]
    fn test_warning_message_with_oracles() {
        let mut e = event(2);
        e.details = Some(EventDetails {
            bad_oracles: Some(vec![
                "https://oracle-1.example".to_string(),
                "https://oracle-2.example".to_string(),
            ]),
        });

        let body = warning_message(&e);
        assert!(body.starts_with("WARNING: mainnet1/eth is NOT_SYNCHRONIZED."));
        assert!(body.contains("Bad Oracles: https://oracle-1.example, https://oracle-2.example"));
    }

    #[test]
    fn test_warning_message_without_oracles() {
        let body = warning_message(&event(2));
        assert_eq!(body, "WARNING: mainnet1/eth is NOT_SYNCHRONIZED.");
    }

    #[test]
    fn test_rotation_messages() {
        let node = backend_node();

        let attempt = rotation_message(&node, false, RotationOutcome::Attempt);
        assert!(attempt.starts_with("Attempting to remove mainnet1/eth from rotation."));
        assert!(attempt.contains("Backend: ethmainnet | Load Balancers: lb1, lb2"));

        let success = rotation_message(&node, true, RotationOutcome::Success);
        assert!(success.starts_with("Successfully added mainnet1/eth to rotation."));

        let error = rotation_message(&node, false, RotationOutcome::Error("503 from lb1"));
        assert!(error.starts_with("Could not remove mainnet1/eth from rotation."));
        assert!(error.ends_with("503 from lb1"));
    }

    #[test]
    fn test_pool_description_singular() {
        let pool = pool_description(
            "ethmainnet",
            &[Host {
                name: "lb1".to_string(),
            }],
        );
        assert_eq!(pool, "Backend: ethmainnet | Load Balancer: lb1");
    }
}
