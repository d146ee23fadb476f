//! Warden monitor: consumes health samples, publishes lifecycle events,
//! and routes them into alert handling.

mod consumer;
mod ingest;

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{error, info};

use warden_core::{
    AlertChannel, DiscordWebhook, EntityRouter, EscalationCounter, EventService, HaproxyControl,
    HttpRegistry, LifecycleBus, NodeRegistry, NoopPager, Pager, PagerDuty, RotationControl,
    WardenConfig,
};

use consumer::EventConsumer;

#[derive(Debug, Parser)]
#[command(name = "warden-monitor", about = "Node fleet escalation and alert routing")]
struct Args {
    /// Number of per-entity router lanes
    #[arg(long, default_value_t = 4)]
    lanes: usize,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let args = Args::parse();
    let config = WardenConfig::from_env();
    info!(config = %config.summary(), lanes = args.lanes, "warden monitor starting");

    let alerts: Arc<dyn AlertChannel> = Arc::new(DiscordWebhook::new(
        std::env::var("WARDEN_DISCORD_WEBHOOK").context("WARDEN_DISCORD_WEBHOOK is required")?,
        std::env::var("WARDEN_DISCORD_FRONTEND_WEBHOOK").ok(),
    ));

    let registry: Arc<dyn NodeRegistry> = Arc::new(HttpRegistry::new(
        std::env::var("WARDEN_API_URL").context("WARDEN_API_URL is required")?,
    ));

    let haproxy_port = std::env::var("WARDEN_HAPROXY_PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(5555);
    let haproxy_auth = match (
        std::env::var("WARDEN_HAPROXY_USER").ok(),
        std::env::var("WARDEN_HAPROXY_PASSWORD").ok(),
    ) {
        (Some(user), Some(password)) => Some((user, password)),
        _ => None,
    };
    let control: Arc<dyn RotationControl> =
        Arc::new(HaproxyControl::new(haproxy_port, haproxy_auth));

    let pager: Arc<dyn Pager> = match std::env::var("WARDEN_PAGERDUTY_ROUTING_KEY").ok() {
        Some(key) => Arc::new(PagerDuty::new(key)),
        None if config.fleet_paging => {
            anyhow::bail!("WARDEN_PAGERDUTY_ROUTING_KEY is required when fleet paging is enabled")
        }
        None => Arc::new(NoopPager),
    };

    let service = Arc::new(EventService::new(
        config.clone(),
        registry,
        alerts,
        control,
        pager,
    ));

    let bus = LifecycleBus::new().shared();
    let counter = Arc::new(EscalationCounter::new(config.escalation_threshold, bus.clone()));
    let event_consumer = Arc::new(EventConsumer::new(service, config.escalation_threshold));
    let router = Arc::new(EntityRouter::new(event_consumer, args.lanes));

    tokio::spawn(consumer::pump(bus.clone(), router));
    tokio::spawn(async move {
        if let Err(e) = ingest::run_stdin_ingest(counter).await {
            error!(error = %e, "sample ingest ended");
        }
    });

    tokio::signal::ctrl_c().await?;
    info!("shutting down");
    Ok(())
}
