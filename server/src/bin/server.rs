//! Eventbook HTTP server.
//!
//! Loads configuration, applies migrations, then serves the API until
//! SIGINT/SIGTERM.

use anyhow::Context;
use eventbook_core::environment::Clock;
use eventbook_server::{
    AppState, Config, build_router, connect, init_tracing, metrics,
    server::{cors_layer, shutdown_signal},
};
use std::future::IntoFuture;
use std::net::SocketAddr;
use std::time::Duration;
use tracing::{info, warn};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present
    dotenvy::dotenv().ok();
    init_tracing();

    info!("Starting Eventbook server...");
    let config = Config::from_env();
    info!(
        host = %config.server.host,
        port = config.server.port,
        metrics_enabled = config.server.metrics_enabled,
        "Configuration loaded"
    );

    let auth = config.auth_config();
    if auth.uses_dev_secret() {
        warn!("JWT_SECRET is not set; using the development secret");
    }
    if auth.admin_code.is_none() {
        info!("ADMIN_CODE is not set; admin self-registration is disabled");
    }

    if config.server.metrics_enabled {
        let addr = SocketAddr::from(([0, 0, 0, 0], config.server.metrics_port));
        metrics::install_exporter(addr).context("Failed to start metrics exporter")?;
    }

    let store = connect(&config).await?;
    info!("Running migrations...");
    store.migrate().await.context("Failed to run migrations")?;
    info!("Migrations complete");

    let state = AppState::new(store, auth).context("Invalid password hashing parameters")?;
    info!(started_at = %state.clock.now(), "Application state ready");

    let cors = cors_layer(config.server.cors_origin.as_deref()).context("Invalid CORS_ORIGIN")?;
    let app = build_router(state).layer(cors);

    let addr = config.bind_address();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    info!("Server listening on {}", addr);

    let shutdown_timeout = Duration::from_secs(config.server.shutdown_timeout);
    let server = axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .into_future();

    // Bound the drain of in-flight requests once a signal arrives
    tokio::select! {
        result = server => result.context("Server error")?,
        () = async {
            shutdown_signal().await;
            tokio::time::sleep(shutdown_timeout).await;
        } => {
            warn!(timeout_secs = shutdown_timeout.as_secs(), "Shutdown timeout elapsed, exiting");
        },
    }

    info!("Server stopped");
    Ok(())
}
