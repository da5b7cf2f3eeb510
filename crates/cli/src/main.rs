use anyhow::Context;
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use reelboard_client::ClientConfig;

mod cli;
mod commands;
mod prompt;
mod render;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let args = cli::Cli::parse();

    // --- Tracing ---
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "reelboard=info,reelboard_sync=info,reelboard_realtime=warn".into());
    let registry = tracing_subscriber::registry().with(filter);
    if args.json_logs {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }

    // --- Configuration ---
    let config = ClientConfig::from_env().context("Invalid configuration")?;
    tracing::debug!(
        api_url = %config.api_url,
        baas_url = %config.baas_url,
        poll_interval_secs = config.poll_interval.as_secs(),
        "Loaded client configuration"
    );

    commands::run(args.command, &config).await
}
