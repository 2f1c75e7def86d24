//! Initial administrator account.

use crate::config::SeedAdminConfig;
use anyhow::Context;
use chrono::{DateTime, Utc};
use eventbook_auth::{Passwords, validate_password};
use eventbook_core::repository::UserRepository;
use eventbook_core::{NewUser, Role, User};

/// Result of [`seed_admin`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SeedOutcome {
    /// The account was created.
    Created(User),
    /// An account with the email already exists; nothing changed.
    AlreadyExists(User),
}

/// Create the configured admin unless the email is already registered.
///
/// An existing account is left untouched, including its role and password.
///
/// # Errors
///
/// Returns an error if the configured account is invalid, hashing fails or
/// storage fails.
pub async fn seed_admin(
    users: &dyn UserRepository,
    passwords: &Passwords,
    config: &SeedAdminConfig,
    now: DateTime<Utc>,
) -> anyhow::Result<SeedOutcome> {
    if let Some(existing) = users
        .find_by_email(&config.email)
        .await
        .context("Failed to look up admin email")?
    {
        tracing::info!(email = %config.email, role = %existing.role, "Admin account already exists");
        return Ok(SeedOutcome::AlreadyExists(existing));
    }

    validate_password(&config.password).context("SEED_ADMIN_PASSWORD is too short")?;
    let new_user = NewUser {
        name: config.name.clone(),
        email: config.email.clone(),
        password_hash: passwords
            .hash(&config.password)
            .context("Failed to hash admin password")?,
        role: Role::Admin,
    };
    new_user.validate().context("Invalid admin account")?;

    let user = users
        .create(new_user, now)
        .await
        .context("Failed to create admin account")?;
    tracing::info!(user_id = %user.id, email = %user.email, "Admin account created");
    Ok(SeedOutcome::Created(user))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use eventbook_auth::AuthConfig;
    use eventbook_testing::{InMemoryStore, fixtures, test_clock};
    use eventbook_core::environment::Clock;

    fn config() -> SeedAdminConfig {
        SeedAdminConfig {
            email: "root@example.com".to_string(),
            password: "admin123".to_string(),
            name: "Root".to_string(),
        }
    }

    fn passwords() -> Passwords {
        Passwords::new(&AuthConfig::default().with_argon2_cost(1024, 1)).unwrap()
    }

    #[tokio::test]
    async fn test_seed_creates_admin_once() {
        let store = InMemoryStore::new();
        let now = test_clock().now();

        let first = seed_admin(&store, &passwords(), &config(), now).await.unwrap();
        let SeedOutcome::Created(admin) = first else {
            unreachable!("first seed must create the account");
        };
        assert_eq!(admin.role, Role::Admin);
        assert!(passwords().verify("admin123", &admin.password_hash).unwrap());

        let second = seed_admin(&store, &passwords(), &config(), now).await.unwrap();
        assert_eq!(second, SeedOutcome::AlreadyExists(admin));
        assert_eq!(UserRepository::list(&store).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_seed_leaves_existing_user_alone() {
        let store = InMemoryStore::new();
        let existing = fixtures::seed_user(&store, "root@example.com", Role::User).await;

        let outcome = seed_admin(&store, &passwords(), &config(), test_clock().now())
            .await
            .unwrap();
        assert_eq!(outcome, SeedOutcome::AlreadyExists(existing));
    }

    #[tokio::test]
    async fn test_seed_rejects_short_password() {
        let store = InMemoryStore::new();
        let mut config = config();
        config.password = "123".to_string();
        assert!(seed_admin(&store, &passwords(), &config, test_clock().now())
            .await
            .is_err());
    }
}
