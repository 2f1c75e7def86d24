//! # Eventbook Server
//!
//! Event discovery and booking service: users browse events, register,
//! book seats; administrators manage users and events.
//!
//! # Architecture
//!
//! ```text
//!            HTTP (axum)
//!                 │
//!   ┌─────────────┴──────────────┐
//!   │  auth::middleware           │  SessionUser / RequireAdmin
//!   │  api::{auth, events,        │  thin handlers
//!   │        bookings, admin}     │
//!   └─────────────┬──────────────┘
//!                 │ Arc<dyn Repository>
//!   ┌─────────────┴──────────────┐
//!   │  PostgresStore              │  production
//!   │  InMemoryStore              │  tests
//!   └────────────────────────────┘
//! ```
//!
//! Booking admission runs in one transaction per attempt that locks the
//! event row, so capacity can never be exceeded by concurrent requests.
//!
//! # Binaries
//!
//! - `server`: runs migrations, then serves the API
//! - `migrate`: applies migrations and exits
//! - `seed-admin`: creates the configured admin account if absent

pub mod api;
pub mod auth;
pub mod config;
pub mod metrics;
pub mod seed;
pub mod server;

pub use config::Config;
pub use server::{AppState, build_router};

use eventbook_postgres::PostgresStore;
use sqlx::postgres::PgPoolOptions;
use std::time::Duration;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Install the `tracing` subscriber used by every binary.
///
/// `RUST_LOG` overrides the default filter.
pub fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,eventbook=debug,sqlx=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

/// Open the connection pool described by `config`.
///
/// # Errors
///
/// Returns an error if the database is unreachable.
pub async fn connect(config: &Config) -> anyhow::Result<PostgresStore> {
    tracing::info!(
        max_connections = config.postgres.max_connections,
        "Connecting to PostgreSQL..."
    );
    let options = PgPoolOptions::new()
        .max_connections(config.postgres.max_connections)
        .min_connections(config.postgres.min_connections)
        .acquire_timeout(Duration::from_secs(config.postgres.connect_timeout));
    let store = PostgresStore::connect(&config.postgres.url, options).await?;
    tracing::info!("PostgreSQL connected");
    Ok(store)
}
