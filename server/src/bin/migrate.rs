//! Apply database migrations and exit.

use anyhow::Context;
use eventbook_server::{Config, connect, init_tracing};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();

    let config = Config::from_env();
    let store = connect(&config).await?;

    tracing::info!("Running migrations...");
    store.migrate().await.context("Failed to run migrations")?;
    tracing::info!("Migrations complete");
    Ok(())
}
