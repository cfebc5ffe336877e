//! FaceRelis backend server entry point

use std::sync::Arc;

use clap::Parser;
use eyre::{Context, Result};
use tracing::{info, warn};

use facerelis::cli::Cli;
use facerelis::config::Config;
use facerelis::engine::{CommandEngine, EngineBridge};
use facerelis::server;
use facerelis::state::AppState;

fn setup_logging(verbose: bool) {
    let level = if verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()),
        )
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    setup_logging(cli.verbose);

    let mut config = Config::load(cli.config.as_ref()).context("Failed to load configuration")?;
    if let Some(host) = cli.host {
        config.server.host = host;
    }
    if let Some(port) = cli.port {
        config.server.port = port;
    }
    config.validate().context("Invalid configuration")?;

    let state = AppState::spawn();
    let engine = CommandEngine::from_config(&config.engine);
    let bridge = Arc::new(EngineBridge::new(engine, state.clone()));
    if !bridge.is_available() {
        warn!("no clustering engine configured; queued tasks will fail until engine.command is set");
    }

    info!(
        host = %config.server.host,
        port = config.server.port,
        "starting facerelis backend"
    );
    server::serve(config, state, bridge).await
}
