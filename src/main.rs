// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Pet Value Admin Guard Service
//!
//! Serves the admin login endpoint for the pet value catalog. Every login
//! attempt passes through an in-process rate limiter keyed by client
//! address before credentials are checked:
//!
//! - 1 attempt per client per 2 minutes (default)
//! - HTTP 429 with `Retry-After` once the client is throttled
//! - Expired records swept every 10 minutes
//!
//! ## Configuration
//!
//! Configuration is loaded from environment variables:
//!
//! - `BIND_ADDR`: Server bind address (default: 0.0.0.0:8080)
//! - `LOGIN_WINDOW_MS`: Rate limit window (default: 120000)
//! - `LOGIN_MAX_ATTEMPTS`: Attempts per window (default: 1)
//! - `SWEEP_INTERVAL_SECS`: Sweep period (default: 600)
//! - `ADMIN_USERNAME` / `ADMIN_PASSWORD_HASH`: Admin account (hash required)

use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{info, Level};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use pet_value_admin::{
    config::Config,
    credentials::Argon2Credentials,
    handlers::{router, AppState},
    limiter::RateLimiter,
    metrics::Metrics,
    sweeper::spawn_sweeper,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(fmt::layer().json())
        .with(
            EnvFilter::builder()
                .with_default_directive(Level::INFO.into())
                .from_env_lossy(),
        )
        .init();

    // Load configuration
    let config = Config::from_env()?;
    info!(
        bind_addr = %config.bind_addr,
        window_ms = config.login_limit.window_ms,
        max_attempts = config.login_limit.max_attempts,
        sweep_interval_secs = config.login_limit.sweep_interval_secs,
        "Starting pet value admin guard"
    );

    // Create application state
    let limiter = Arc::new(RateLimiter::new());
    let metrics = Arc::new(Metrics::new()?);
    let credentials = Arc::new(Argon2Credentials::from_config(&config.admin)?);

    let sweeper = spawn_sweeper(
        limiter.clone(),
        config.login_limit.sweep_interval(),
        Some(metrics.clone()),
    );

    let state = Arc::new(AppState {
        limiter,
        credentials,
        metrics,
        config: config.clone(),
    });

    let app = router(state);

    // Start server
    let addr: SocketAddr = config.bind_addr.parse()?;
    let listener = TcpListener::bind(addr).await?;
    info!(addr = %addr, "Server listening");

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    sweeper.shutdown().await;
    info!("Server stopped");

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
