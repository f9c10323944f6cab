//! hcp-autoscaler CLI
//!
//! Renders the cluster-autoscaler objects for a HostedControlPlane.

use clap::Parser;

use hcp_cli::{Cli, Result};
use hcp_common::telemetry::{init_tracing, TelemetryConfig};

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(TelemetryConfig {
        json: cli.log_json,
        ..Default::default()
    })?;
    cli.run()
}
