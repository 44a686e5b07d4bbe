//! linman daemon entrypoint.
//!
//! Bootstrap order matters: logging first, then the process-wide tracer
//! (failure is logged and the process continues untraced), then the traced
//! API client handed to every reconciler. Teardown flushes telemetry under
//! a fixed deadline; a missed deadline is logged, never fatal.

use clap::Parser;
use linman_client::{ClientConfig, HttpClient};
use linman_trace::{ResourceMetadata, TracedClient, default_decorator};
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

mod config;
mod manager;
mod probe;

use config::Config;
use manager::Manager;
use probe::ApiProbe;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::parse();
    init_logging(&config);

    let telemetry = match linman_trace::setup(&resource_metadata()) {
        Ok(handle) => Some(handle.with_timeout(config.shutdown_timeout())),
        Err(err) => {
            warn!(%err, "tracing unavailable, continuing without telemetry");
            None
        }
    };

    let http = HttpClient::new(
        ClientConfig::new(config.token.clone()).with_api_url(config.api_url.clone()),
    )?;
    let client = Arc::new(TracedClient::new(http, Some(default_decorator())));

    let mut manager = Manager::new(config.reconcile_interval());
    manager.register(Box::new(ApiProbe::new(client.clone())));

    info!(api_url = %config.api_url, "manager starting");
    manager.run(shutdown_signal()).await;

    if let Some(telemetry) = telemetry {
        if let Err(err) = telemetry.shutdown().await {
            warn!(%err, "telemetry flush incomplete");
        }
    }

    Ok(())
}

fn init_logging(config: &Config) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let registry = tracing_subscriber::registry().with(filter);
    if config.log_json {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

fn resource_metadata() -> ResourceMetadata {
    ResourceMetadata {
        service_name: "linman".to_string(),
        service_version: env!("CARGO_PKG_VERSION").to_string(),
        node_name: std::env::var("NODE_NAME").ok(),
        pod_name: std::env::var("POD_NAME").ok(),
    }
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        warn!(%err, "failed to listen for shutdown signal");
    }
}
