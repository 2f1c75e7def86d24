//! Account endpoints.
//!
//! - POST /api/auth/register - Create an account and start a session
//! - POST /api/auth/login - Start a session
//! - POST /api/auth/logout - Clear the session cookie
//! - GET|POST /api/auth/me - Current user

use super::MessageResponse;
use crate::auth::middleware::SessionUser;
use crate::metrics;
use crate::server::state::AppState;
use axum::{
    Json,
    extract::State,
    http::{HeaderValue, StatusCode, header::SET_COOKIE},
    response::{IntoResponse, Response},
};
use eventbook_auth::{AuthError, cookie, validate_password};
use eventbook_core::{NewUser, Role, User};
use eventbook_web::{
    error::AppError,
    extractors::{ApiJson, ClientIp, CorrelationId},
};
use serde::Deserialize;

// ============================================================================
// Request Types
// ============================================================================

/// Registration body.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    /// Display name
    pub name: String,
    /// Login email
    pub email: String,
    /// Plain-text password (at least 6 characters)
    pub password: String,
    /// Optional code granting the admin role
    #[serde(default)]
    pub admin_code: Option<String>,
}

/// Login body.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    /// Login email
    pub email: String,
    /// Plain-text password
    pub password: String,
}

// ============================================================================
// Helpers
// ============================================================================

fn cookie_header(set_cookie: &str) -> Result<HeaderValue, AppError> {
    HeaderValue::from_str(set_cookie)
        .map_err(|e| AppError::internal("Invalid session cookie").with_source(e.into()))
}

fn with_cookie(
    status: StatusCode,
    body: impl IntoResponse,
    set_cookie: &str,
) -> Result<Response, AppError> {
    Ok((status, [(SET_COOKIE, cookie_header(set_cookie)?)], body).into_response())
}

fn start_session(state: &AppState, status: StatusCode, user: User) -> Result<Response, AppError> {
    let token = state.signer.issue(&user, state.clock.now())?;
    let set_cookie = cookie::session_cookie(&token, &state.auth);
    with_cookie(status, Json(user), &set_cookie)
}

/// Run Argon2 off the async executor.
async fn blocking<T, F>(work: F) -> Result<T, AppError>
where
    F: FnOnce() -> eventbook_auth::Result<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(work)
        .await
        .map_err(|e| AppError::internal("Password task failed").with_source(e.into()))?
        .map_err(AppError::from)
}

// ============================================================================
// Handlers
// ============================================================================

/// Register a new account.
///
/// A matching `adminCode` grants the admin role; any other code is ignored.
///
/// # Example
///
/// ```bash
/// curl -X POST http://localhost:8080/api/auth/register \
///   -H "Content-Type: application/json" \
///   -d '{"name": "Ada", "email": "ada@example.com", "password": "secret123"}'
/// ```
pub async fn register(
    State(state): State<AppState>,
    correlation_id: CorrelationId,
    ApiJson(request): ApiJson<RegisterRequest>,
) -> Result<Response, AppError> {
    validate_password(&request.password)?;

    let role = match request.admin_code.as_deref() {
        Some(code) if state.auth.is_admin_code(code) => Role::Admin,
        _ => Role::User,
    };

    let mut new_user = NewUser {
        name: request.name.trim().to_string(),
        email: request.email.trim().to_string(),
        password_hash: String::new(),
        role,
    };
    new_user.validate()?;

    let passwords = state.passwords.clone();
    let password = request.password;
    new_user.password_hash = blocking(move || passwords.hash(&password)).await?;

    let user = state.users.create(new_user, state.clock.now()).await?;

    tracing::info!(
        correlation_id = %correlation_id.0,
        user_id = %user.id,
        role = %user.role,
        "User registered"
    );
    metrics::record_registration(user.role.as_str());

    start_session(&state, StatusCode::CREATED, user)
}

/// Sign in with email and password.
///
/// Unknown emails and wrong passwords are indistinguishable (401).
pub async fn login(
    State(state): State<AppState>,
    correlation_id: CorrelationId,
    client_ip: ClientIp,
    ApiJson(request): ApiJson<LoginRequest>,
) -> Result<Response, AppError> {
    let user = state.users.find_by_email(request.email.trim()).await?;

    let verified = match &user {
        Some(user) => {
            let passwords = state.passwords.clone();
            let password = request.password;
            let hash = user.password_hash.clone();
            blocking(move || passwords.verify(&password, &hash)).await?
        },
        None => false,
    };
    metrics::record_login(verified);

    let Some(user) = user.filter(|_| verified) else {
        tracing::warn!(
            correlation_id = %correlation_id.0,
            client_ip = %client_ip.0,
            "Login failed"
        );
        return Err(AuthError::InvalidCredentials.into());
    };

    tracing::info!(
        correlation_id = %correlation_id.0,
        client_ip = %client_ip.0,
        user_id = %user.id,
        "Login succeeded"
    );

    start_session(&state, StatusCode::OK, user)
}

/// Clear the session cookie. Succeeds with or without a session.
#[allow(clippy::unused_async)]
pub async fn logout(State(state): State<AppState>) -> Result<Response, AppError> {
    with_cookie(
        StatusCode::OK,
        Json(MessageResponse::new("Logged out successfully")),
        &cookie::clear_session_cookie(&state.auth),
    )
}

/// Current user, re-read from storage.
///
/// A valid token for a user that no longer exists gets 404 and a cleared
/// cookie.
pub async fn me(State(state): State<AppState>, session: SessionUser) -> Result<Response, AppError> {
    match state.users.get(session.user_id()).await? {
        Some(user) => Ok(Json(user).into_response()),
        None => {
            let mut response = AppError::not_found("User").into_response();
            response.headers_mut().insert(
                SET_COOKIE,
                cookie_header(&cookie::clear_session_cookie(&state.auth))?,
            );
            Ok(response)
        },
    }
}
