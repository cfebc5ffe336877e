//! HTTP server assembly

mod filters;
mod handlers;
mod reject;
mod schema;

pub use filters::create_filters;
pub use reject::{ApiError, handle_rejection};

use std::net::SocketAddr;
use std::sync::Arc;

use eyre::{Context, Result};
use tracing::info;
use warp::Filter;

use crate::config::Config;
use crate::engine::EngineBridge;
use crate::state::AppState;

/// Serve the API until ctrl-c
pub async fn serve(config: Config, state: AppState, bridge: Arc<EngineBridge>) -> Result<()> {
    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port)
        .parse()
        .context("Invalid server.host/server.port")?;

    let routes = create_filters(&config, state, bridge)
        .with(
            warp::cors()
                .allow_any_origin()
                .allow_header("content-type")
                .allow_methods(vec!["GET", "POST", "DELETE"]),
        )
        .recover(handle_rejection);

    let (bound, server) = warp::serve(routes).bind_with_graceful_shutdown(addr, async {
        let _ = tokio::signal::ctrl_c().await;
        info!("shutdown signal received");
    });

    info!("listening on {bound}");
    server.await;

    info!("server stopped");
    Ok(())
}
