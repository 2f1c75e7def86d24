//! Authentication extractors for the Eventbook API.
//!
//! Provides Axum extractors for:
//! - Session validation (cookie or `Authorization: Bearer` token)
//! - Role-based access control (admin checks)
//!
//! # Usage
//!
//! ```rust,ignore
//! use eventbook_server::auth::middleware::{RequireAdmin, SessionUser};
//!
//! // Require authentication
//! async fn my_bookings(session: SessionUser) -> Result<Json<Vec<BookingWithEvent>>, AppError> {
//!     // session.user_id() comes from a verified token
//! }
//!
//! // Require admin role
//! async fn stats(admin: RequireAdmin) -> Result<Json<Stats>, AppError> {
//!     // admin.0 carries the admin's claims
//! }
//! ```

use crate::server::state::AppState;
use axum::{async_trait, extract::FromRequestParts, http::request::Parts};
use eventbook_auth::{AuthError, Claims, cookie};
use eventbook_core::{Role, UserId};
use eventbook_web::error::AppError;

/// Authenticated caller.
///
/// Identity and role come from the signed session token only, never from
/// the request body.
#[derive(Debug, Clone)]
pub struct SessionUser(pub Claims);

impl SessionUser {
    /// The authenticated user ID.
    #[must_use]
    pub const fn user_id(&self) -> UserId {
        self.0.sub
    }

    /// Role carried by the token.
    #[must_use]
    pub const fn role(&self) -> Role {
        self.0.role
    }

    /// Whether the caller is an admin.
    #[must_use]
    pub const fn is_admin(&self) -> bool {
        self.0.is_admin()
    }

    /// Whether the caller may act on a resource owned by `owner`.
    #[must_use]
    pub fn can_manage(&self, owner: UserId) -> bool {
        self.is_admin() || self.user_id() == owner
    }
}

#[async_trait]
impl FromRequestParts<AppState> for SessionUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let now = state.clock.now();
        let mut rejected = None;
        for token in cookie::extract_tokens(&parts.headers) {
            match state.signer.verify(&token, now) {
                Ok(claims) => return Ok(Self(claims)),
                Err(e) => {
                    tracing::debug!(error = %e, "Session token rejected");
                    // Report the first failure: the cookie when both are sent
                    rejected.get_or_insert(e);
                },
            }
        }

        Err(rejected.unwrap_or(AuthError::MissingToken).into())
    }
}

/// Authenticated admin.
///
/// Rejects with 401 without a valid session and 403 for non-admins.
#[derive(Debug, Clone)]
pub struct RequireAdmin(pub SessionUser);

impl RequireAdmin {
    /// The admin's user ID.
    #[must_use]
    pub const fn user_id(&self) -> UserId {
        self.0.user_id()
    }
}

#[async_trait]
impl FromRequestParts<AppState> for RequireAdmin {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let session = SessionUser::from_request_parts(parts, state).await?;

        if !session.is_admin() {
            tracing::warn!(
                user_id = %session.user_id(),
                path = %parts.uri.path(),
                "Admin route denied"
            );
            return Err(AuthError::forbidden("admin").into());
        }

        Ok(Self(session))
    }
}
