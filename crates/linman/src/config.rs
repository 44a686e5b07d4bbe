//! Process configuration.

use clap::Parser;
use std::time::Duration;

#[derive(Debug, Parser)]
#[command(name = "linman", version, about = "Linode provisioning manager")]
pub struct Config {
    /// Linode API personal access token.
    #[arg(long, env = "LINODE_TOKEN", hide_env_values = true)]
    pub token: String,

    /// Base URL of the Linode API.
    #[arg(long, env = "LINODE_API_URL", default_value = linman_client::DEFAULT_API_URL)]
    pub api_url: String,

    /// Seconds between reconciliation passes.
    #[arg(long, default_value_t = 60, value_name = "SECONDS")]
    pub reconcile_interval: u64,

    /// Deadline for flushing telemetry at teardown.
    #[arg(long, default_value_t = 10, value_name = "SECONDS")]
    pub shutdown_timeout: u64,

    /// Emit logs as JSON.
    #[arg(long)]
    pub log_json: bool,
}

impl Config {
    pub fn reconcile_interval(&self) -> Duration {
        Duration::from_secs(self.reconcile_interval)
    }

    pub fn shutdown_timeout(&self) -> Duration {
        Duration::from_secs(self.shutdown_timeout)
    }
}
