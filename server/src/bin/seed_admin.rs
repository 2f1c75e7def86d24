//! Create the initial administrator account.
//!
//! Reads `SEED_ADMIN_EMAIL`, `SEED_ADMIN_PASSWORD` and `SEED_ADMIN_NAME`.
//! Safe to run repeatedly: an existing account with the email is left as is.

use anyhow::Context;
use eventbook_auth::Passwords;
use eventbook_core::environment::{Clock, SystemClock};
use eventbook_server::seed::{SeedOutcome, seed_admin};
use eventbook_server::{Config, connect, init_tracing};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();

    let config = Config::from_env();
    let store = connect(&config).await?;
    store.migrate().await.context("Failed to run migrations")?;

    let passwords = Passwords::new(&config.auth_config())?;
    match seed_admin(&store, &passwords, &config.seed_admin, SystemClock.now()).await? {
        SeedOutcome::Created(user) => {
            tracing::info!(email = %user.email, "Admin user created");
        },
        SeedOutcome::AlreadyExists(user) => {
            tracing::info!(email = %user.email, role = %user.role, "Admin user already exists, skipping");
        },
    }
    Ok(())
}
