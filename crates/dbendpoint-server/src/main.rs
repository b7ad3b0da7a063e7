//! dbendpoint - lifecycle host for cluster custom endpoints

use std::net::SocketAddr;
use std::sync::Arc;

use clap::Parser;
use tracing::info;

use dbendpoint_common::telemetry::{init_telemetry, TelemetryConfig};
use dbendpoint_rds::{OsEnvConfig, RdsConfig, RdsControlPlane};
use dbendpoint_server::{router, AppState};

/// Serve the on-event and is-complete callbacks for custom endpoints
#[derive(Parser, Debug)]
#[command(name = "dbendpoint", version, about, long_about = None)]
struct Cli {
    /// Address to listen on
    #[arg(long, env = "DBENDPOINT_LISTEN", default_value = "0.0.0.0:8080")]
    listen: SocketAddr,

    /// AWS region (defaults to the SDK provider chain)
    #[arg(long)]
    region: Option<String>,

    /// Alternate RDS API endpoint
    #[arg(long)]
    rds_endpoint_url: Option<String>,

    /// Emit human-readable logs instead of JSON
    #[arg(long)]
    plain_logs: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    init_telemetry(TelemetryConfig {
        json: !cli.plain_logs,
        ..Default::default()
    })?;

    let rds_config =
        RdsConfig::from_env(&OsEnvConfig).with_overrides(cli.region, cli.rds_endpoint_url);
    let control_plane = RdsControlPlane::from_config(&rds_config).await;

    let app = router(Arc::new(AppState::new(Arc::new(control_plane))));

    let listener = tokio::net::TcpListener::bind(cli.listen).await?;
    info!(addr = %cli.listen, "dbendpoint listening");
    axum::serve(listener, app).await?;

    Ok(())
}
