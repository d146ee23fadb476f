//! Engine configuration.
//!
//! All knobs are env-var driven with conservative defaults, so a bare
//! deployment alerts on the second consecutive error and never pages.
//!
//! | Variable | Default | Description |
//! |---|---|---|
//! | `WARDEN_ESCALATION_THRESHOLD` | `2` | Consecutive errors before an escalate event is published |
//! | `WARDEN_FLEET_PAGING` | `false` | Enable paging when a dispatcher fleet is collectively down |
//! | `WARDEN_FLEET_PAGING_THRESHOLD` | `5` | Down-dispatcher count that raises an incident |

use serde::{Deserialize, Serialize};

/// Runtime configuration for the escalation and alert-routing engine
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WardenConfig {
    /// Consecutive error observations required before escalation.
    ///
    /// Env: `WARDEN_ESCALATION_THRESHOLD`
    pub escalation_threshold: u32,

    /// Whether fleet-wide dispatcher paging is enabled.
    ///
    /// Env: `WARDEN_FLEET_PAGING`
    pub fleet_paging: bool,

    /// Number of simultaneously unhealthy dispatcher nodes on one chain
    /// that warrants a paging incident.
    ///
    /// Env: `WARDEN_FLEET_PAGING_THRESHOLD`
    pub fleet_paging_threshold: usize,
}

impl Default for WardenConfig {
    fn default() -> Self {
        Self {
            escalation_threshold: 2,
            fleet_paging: false,
            fleet_paging_threshold: 5,
        }
    }
}

impl WardenConfig {
    /// Read configuration from environment variables, falling back to
    /// defaults for anything unset or unparseable.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            escalation_threshold: parse_env("WARDEN_ESCALATION_THRESHOLD")
                .unwrap_or(defaults.escalation_threshold),
            fleet_paging: parse_bool_env("WARDEN_FLEET_PAGING"),
            fleet_paging_threshold: parse_env("WARDEN_FLEET_PAGING_THRESHOLD")
                .unwrap_or(defaults.fleet_paging_threshold),
        }
    }

    /// Format as a human-readable summary line for startup logs.
    pub fn summary(&self) -> String {
        format!(
            "escalation_threshold={} fleet_paging={} fleet_paging_threshold={}",
            self.escalation_threshold, self.fleet_paging, self.fleet_paging_threshold
        )
    }
}

/// Parse a numeric environment variable, `None` if unset or invalid.
fn parse_env<T: std::str::FromStr>(var: &str) -> Option<T> {
    std::env::var(var).ok().and_then(|v| v.trim().parse().ok())
}

/// Parse a boolean environment variable.
/// Accepts "1", "true", or "yes" (case-insensitive); anything else is false.
fn parse_bool_env(var: &str) -> bool {
    std::env::var(var)
        .map(|v| parse_bool_value(&v))
        .unwrap_or(false)
}

fn parse_bool_value(value: &str) -> bool {
    let v = value.trim().to_lowercase();
    v == "1" || v == "true" || v == "yes"
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = WardenConfig::default();
        assert_eq!(config.escalation_threshold, 2);
        assert!(!config.fleet_paging);
        assert_eq!(config.fleet_paging_threshold, 5);
    }

    #[test]
    fn test_parse_bool_value() {
        assert!(parse_bool_value("1"));
        assert!(parse_bool_value("true"));
        assert!(parse_bool_value("TRUE"));
        assert!(parse_bool_value("Yes"));

        assert!(!parse_bool_value("0"));
        assert!(!parse_bool_value("false"));
        assert!(!parse_bool_value(""));
        assert!(!parse_bool_value("maybe"));
    }

    #[test]
    fn test_summary() {
        let config = WardenConfig::default();
        let summary = config.summary();
        assert!(summary.contains("escalation_threshold=2"));
        assert!(summary.contains("fleet_paging=false"));
    }
}
