//! `users` table.

use crate::rows::{USER_COLUMNS, UserRow};
use crate::{PostgresStore, db_error, is_unique_violation};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use eventbook_core::repository::UserRepository;
use eventbook_core::{NewUser, Result, Role, StoreError, User, UserId};

#[async_trait]
impl UserRepository for PostgresStore {
    async fn create(&self, user: NewUser, now: DateTime<Utc>) -> Result<User> {
        user.validate()?;
        let row: UserRow = sqlx::query_as(&format!(
            "INSERT INTO users (id, name, email, password_hash, role, created_at, updated_at)
             VALUES ($1, $2, $3, $4, $5, $6, $6)
             RETURNING {USER_COLUMNS}"
        ))
        .bind(UserId::new().0)
        .bind(&user.name)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(user.role.as_str())
        .bind(now)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                StoreError::EmailTaken
            } else {
                db_error(e)
            }
        })?;

        let created = User::try_from(row)?;
        tracing::debug!(user_id = %created.id, role = %created.role, "User created");
        Ok(created)
    }

    async fn get(&self, id: UserId) -> Result<Option<User>> {
        let row: Option<UserRow> =
            sqlx::query_as(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1"))
                .bind(id.0)
                .fetch_optional(&self.pool)
                .await
                .map_err(db_error)?;
        row.map(User::try_from).transpose()
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>> {
        let row: Option<UserRow> =
            sqlx::query_as(&format!("SELECT {USER_COLUMNS} FROM users WHERE email = $1"))
                .bind(email)
                .fetch_optional(&self.pool)
                .await
                .map_err(db_error)?;
        row.map(User::try_from).transpose()
    }

    async fn list(&self) -> Result<Vec<User>> {
        let rows: Vec<UserRow> = sqlx::query_as(&format!(
            "SELECT {USER_COLUMNS} FROM users ORDER BY created_at DESC"
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(db_error)?;
        rows.into_iter().map(User::try_from).collect()
    }

    async fn set_role(&self, id: UserId, role: Role, now: DateTime<Utc>) -> Result<User> {
        // Re-applying the current role leaves updated_at untouched.
        let row: Option<UserRow> = sqlx::query_as(&format!(
            "UPDATE users
             SET role = $2,
                 updated_at = CASE WHEN role = $2 THEN updated_at ELSE $3 END
             WHERE id = $1
             RETURNING {USER_COLUMNS}"
        ))
        .bind(id.0)
        .bind(role.as_str())
        .bind(now)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error)?;

        row.map(User::try_from)
            .transpose()?
            .ok_or_else(|| StoreError::not_found("User"))
    }
}
