//! `PostgreSQL` repositories for Eventbook.
//!
//! [`PostgresStore`] implements every repository trait from
//! `eventbook_core::repository` on one connection pool.
//!
//! # Schema
//!
//! Migrations are embedded from `postgres/migrations` and run with
//! [`PostgresStore::migrate`]:
//!
//! ```sql
//! users    (id, name, email UNIQUE, password_hash, role, created_at, updated_at)
//! events   (id, title, description, date, end_date, category, location,
//!           max_attendees, created_by → users, created_at, updated_at)
//! bookings (id, event_id → events ON DELETE CASCADE, user_id → users,
//!           created_at, updated_at, UNIQUE (event_id, user_id))
//! ```
//!
//! Attendee counts are never stored; every event read joins `bookings`.
//!
//! # Example
//!
//! ```no_run
//! use eventbook_postgres::PostgresStore;
//! use sqlx::postgres::PgPoolOptions;
//!
//! # async fn example() -> Result<(), eventbook_postgres::PostgresError> {
//! let store = PostgresStore::connect(
//!     "postgres://localhost/eventbook",
//!     PgPoolOptions::new().max_connections(10),
//! )
//! .await?;
//! store.migrate().await?;
//! # Ok(())
//! # }
//! ```

use async_trait::async_trait;
use eventbook_core::StoreError;
use eventbook_core::repository::HealthCheck;
use sqlx::PgPool;
use sqlx::migrate::{MigrateError, Migrator};
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

mod bookings;
mod events;
mod rows;
mod users;

/// Embedded schema migrations.
pub static MIGRATOR: Migrator = sqlx::migrate!("./migrations");

/// Connection and migration failures.
#[derive(Debug, Error)]
pub enum PostgresError {
    /// Could not open the pool.
    #[error("Failed to connect to database: {0}")]
    Connect(#[from] sqlx::Error),

    /// A migration failed to apply.
    #[error("Migration failed: {0}")]
    Migrate(#[from] MigrateError),
}

/// Repository backend over a `PostgreSQL` pool.
///
/// Cloning shares the pool.
#[derive(Clone, Debug)]
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    /// Open a pool with the given options.
    ///
    /// # Errors
    ///
    /// Returns [`PostgresError::Connect`] if the database is unreachable.
    pub async fn connect(url: &str, options: PgPoolOptions) -> Result<Self, PostgresError> {
        let pool = options.connect(url).await?;
        tracing::info!("Connected to PostgreSQL");
        Ok(Self { pool })
    }

    /// Wrap an existing pool.
    #[must_use]
    pub const fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    /// The underlying pool.
    #[must_use]
    pub const fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Apply pending migrations.
    ///
    /// # Errors
    ///
    /// Returns [`PostgresError::Migrate`] if a migration fails.
    pub async fn migrate(&self) -> Result<(), PostgresError> {
        MIGRATOR.run(&self.pool).await?;
        tracing::info!("Database migrations applied");
        Ok(())
    }
}

#[async_trait]
impl HealthCheck for PostgresStore {
    async fn ping(&self) -> eventbook_core::Result<()> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(db_error)?;
        Ok(())
    }
}

/// Wrap a driver error. The message is logged server-side only.
pub(crate) fn db_error(error: sqlx::Error) -> StoreError {
    StoreError::Database(error.to_string())
}

/// Whether `error` is a violation of a unique constraint.
pub(crate) fn is_unique_violation(error: &sqlx::Error) -> bool {
    matches!(error, sqlx::Error::Database(db) if db.is_unique_violation())
}

/// Whether `error` is a violation of a foreign key.
pub(crate) fn is_foreign_key_violation(error: &sqlx::Error) -> bool {
    matches!(error, sqlx::Error::Database(db) if db.is_foreign_key_violation())
}
