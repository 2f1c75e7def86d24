//! Admin API endpoints. Every handler requires [`RequireAdmin`].
//!
//! - GET /api/admin/users
//! - POST /api/admin/users/:id/promote
//! - POST /api/admin/users/:id/demote
//! - GET /api/admin/events
//! - DELETE /api/admin/events/:id (see [`super::events::delete_event`])
//! - GET /api/admin/stats

use crate::auth::middleware::RequireAdmin;
use crate::server::state::AppState;
use axum::{Json, extract::State};
use eventbook_core::{EventWithCreator, Role, Stats, User, UserId};
use eventbook_web::{error::AppError, extractors::ApiPath};

/// All users, newest first.
pub async fn list_users(
    State(state): State<AppState>,
    _admin: RequireAdmin,
) -> Result<Json<Vec<User>>, AppError> {
    Ok(Json(state.users.list().await?))
}

/// Grant the admin role. Promoting an admin is a no-op.
pub async fn promote_user(
    State(state): State<AppState>,
    admin: RequireAdmin,
    ApiPath(user_id): ApiPath<UserId>,
) -> Result<Json<User>, AppError> {
    let user = state
        .users
        .set_role(user_id, Role::Admin, state.clock.now())
        .await?;
    tracing::info!(user_id = %user_id, admin_id = %admin.user_id(), "User promoted");
    Ok(Json(user))
}

/// Revoke the admin role. Admins cannot demote themselves.
pub async fn demote_user(
    State(state): State<AppState>,
    admin: RequireAdmin,
    ApiPath(user_id): ApiPath<UserId>,
) -> Result<Json<User>, AppError> {
    if user_id == admin.user_id() {
        return Err(AppError::bad_request("Cannot demote yourself"));
    }

    let user = state
        .users
        .set_role(user_id, Role::User, state.clock.now())
        .await?;
    tracing::info!(user_id = %user_id, admin_id = %admin.user_id(), "User demoted");
    Ok(Json(user))
}

/// Every event with its attendee count and creator.
pub async fn list_events(
    State(state): State<AppState>,
    _admin: RequireAdmin,
) -> Result<Json<Vec<EventWithCreator>>, AppError> {
    Ok(Json(state.events.list_with_creators().await?))
}

/// Dashboard counters.
pub async fn stats(
    State(state): State<AppState>,
    _admin: RequireAdmin,
) -> Result<Json<Stats>, AppError> {
    Ok(Json(state.events.stats(state.clock.now()).await?))
}
