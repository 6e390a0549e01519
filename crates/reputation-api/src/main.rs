//! Reputation API - Entry point.

use anyhow::{Context, Result};
use reputation_api::{
    api::{create_router_with_rate_limit, AppState, RateLimitState},
    config::{Config, LogConfig},
};
use std::net::{IpAddr, SocketAddr};
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::signal;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// How often idle rate limiter entries are pruned.
const RATE_LIMIT_CLEANUP_INTERVAL: Duration = Duration::from_secs(60);

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration
    let config = Config::load().context("Failed to load configuration")?;

    // Initialize logging
    init_logging(&config.log);

    info!("Starting Reputation API");

    match &config.chain.provider_url {
        Some(url) => info!(provider = %url, "Chain provider configured"),
        None => warn!("No chain provider configured"),
    }
    if let Some(contract) = &config.chain.contract_address {
        info!(%contract, "Default NFT contract configured");
    }

    // Open the record store
    let state = AppState::from_config(&config).await?;

    // Create rate limiter from config
    let rate_limit = RateLimitState::from_config(&config.rate_limit);
    rate_limit.spawn_cleanup(RATE_LIMIT_CLEANUP_INTERVAL);
    info!(
        max_requests = config.rate_limit.max_requests,
        window = ?config.rate_limit.window,
        "Rate limiting enabled"
    );

    let app = create_router_with_rate_limit(state, rate_limit);

    // Bind to address
    let addr = SocketAddr::new(
        config
            .server
            .listen_addr
            .parse::<IpAddr>()
            .with_context(|| format!("Invalid listen address {:?}", config.server.listen_addr))?,
        config.server.port,
    );

    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    info!("Listening on {}", addr);

    // Run server
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await
    .context("Server error")?;

    info!("Shutting down...");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = signal::ctrl_c().await {
        warn!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}

fn init_logging(config: &LogConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.level));

    let registry = tracing_subscriber::registry().with(filter);

    if config.json {
        registry
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}
