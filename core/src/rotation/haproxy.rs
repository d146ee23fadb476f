//! HAProxy Data Plane API rotation provider.
//!
//! Enable/disable flips the server's admin state on every load balancer in
//! the pool; the live count reads runtime server state from the first load
//! balancer that answers.

use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;

use super::{RotationControl, RotationPool};
use crate::error::{WardenError, WardenResult};
use crate::registry::Host;

const STATE_READY: &str = "ready";
const STATE_MAINT: &str = "maint";

/// HAProxy Data Plane API client
pub struct HaproxyControl {
    client: reqwest::Client,
    port: u16,
    auth: Option<(String, String)>,
}

/// Runtime server entry as reported by the Data Plane API
#[derive(Debug, Deserialize)]
struct RuntimeServer {
    name: String,
    #[serde(default)]
    operational_state: String,
}

impl HaproxyControl {
    /// Create a client talking to the Data Plane API on `port` of each
    /// load-balancer host, with optional basic auth.
    pub fn new(port: u16, auth: Option<(String, String)>) -> Self {
        Self {
            client: reqwest::Client::new(),
            port,
            auth,
        }
    }

    fn server_url(&self, lb: &Host, pool: &RotationPool) -> String {
        format!(
            "http://{}:{}/v2/services/haproxy/runtime/servers/{}?backend={}",
            lb.name, self.port, pool.server, pool.backend
        )
    }

    fn servers_url(&self, lb: &Host, pool: &RotationPool) -> String {
        format!(
            "http://{}:{}/v2/services/haproxy/runtime/servers?backend={}",
            lb.name, self.port, pool.backend
        )
    }

    fn with_auth(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.auth {
            Some((user, pass)) => request.basic_auth(user, Some(pass)),
            None => request,
        }
    }

    async fn set_state(&self, pool: &RotationPool, state: &str) -> WardenResult<()> {
        if pool.load_balancers.is_empty() {
            return Err(WardenError::rotation(format!(
                "backend {} has no load balancers",
                pool.backend
            )));
        }

        let mut failures = Vec::new();
        for lb in &pool.load_balancers {
            let request = self
                .client
                .put(self.server_url(lb, pool))
                .json(&serde_json::json!({ "admin_state": state }));
            match self.with_auth(request).send().await.and_then(|r| r.error_for_status()) {
                Ok(_) => {
                    debug!(lb = %lb.name, backend = %pool.backend, server = %pool.server, state, "admin state set");
                }
                Err(e) => failures.push(format!("{}: {e}", lb.name)),
            }
        }

        if failures.is_empty() {
            Ok(())
        } else {
            Err(WardenError::rotation(failures.join("; ")))
        }
    }

    fn count_up(servers: &[RuntimeServer]) -> u32 {
        servers
            .iter()
            .filter(|s| s.operational_state.eq_ignore_ascii_case("up"))
            .count() as u32
    }
}

#[async_trait]
impl RotationControl for HaproxyControl {
    async fn enable(&self, pool: &RotationPool) -> WardenResult<()> {
        self.set_state(pool, STATE_READY).await
    }

    async fn disable(&self, pool: &RotationPool) -> WardenResult<()> {
        self.set_state(pool, STATE_MAINT).await
    }

    async fn live_count(&self, pool: &RotationPool) -> WardenResult<u32> {
        let mut failures = Vec::new();
        for lb in &pool.load_balancers {
            let request = self.client.get(self.servers_url(lb, pool));
            match self.with_auth(request).send().await {
                Ok(response) => match response.error_for_status() {
                    Ok(response) => {
                        let servers: Vec<RuntimeServer> = response
                            .json()
                            .await
                            .map_err(|e| WardenError::rotation(e.to_string()))?;
                        return Ok(Self::count_up(&servers));
                    }
                    Err(e) => failures.push(format!("{}: {e}", lb.name)),
                },
                Err(e) => failures.push(format!("{}: {e}", lb.name)),
            }
        }
        Err(WardenError::rotation(format!(
            "no load balancer answered for backend {}: {}",
            pool.backend,
            failures.join("; ")
        )))
    }
}
