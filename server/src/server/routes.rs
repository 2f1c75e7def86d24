//! Router configuration for Eventbook.
//!
//! Builds the complete Axum router with all endpoints.

use super::state::AppState;
use crate::api::{admin, auth, bookings, events};
use axum::{
    Router,
    extract::State,
    http::{
        HeaderValue, Method,
        header::{AUTHORIZATION, CONTENT_TYPE, InvalidHeaderValue},
    },
    routing::{delete, get, post},
};
use eventbook_web::{correlation_id_layer, handlers::health};
use std::time::Duration;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

/// Build the complete Axum router.
///
/// Configures:
/// - Health checks (`/health`, `/ready`)
/// - Account endpoints under `/api/auth`
/// - Event and booking endpoints under `/api`
/// - Admin endpoints under `/api/admin`
///
/// Every request passes through the correlation-ID layer and `TraceLayer`.
/// CORS is added by the caller, see [`cors_layer`].
pub fn build_router(state: AppState) -> Router {
    let auth_routes = Router::new()
        .route("/register", post(auth::register))
        .route("/login", post(auth::login))
        .route("/logout", post(auth::logout))
        .route("/me", get(auth::me).post(auth::me));

    let admin_routes = Router::new()
        .route("/users", get(admin::list_users))
        .route("/users/:id/promote", post(admin::promote_user))
        .route("/users/:id/demote", post(admin::demote_user))
        .route("/events", get(admin::list_events))
        .route("/events/:id", delete(events::delete_event))
        .route("/stats", get(admin::stats));

    let api_routes = Router::new()
        .nest("/auth", auth_routes)
        .nest("/admin", admin_routes)
        // Events
        .route("/events", get(events::list_events).post(events::create_event))
        .route("/events/popular", get(events::popular_events))
        .route(
            "/events/:id",
            get(events::get_event)
                .patch(events::update_event)
                .delete(events::delete_event),
        )
        // Bookings
        .route(
            "/bookings",
            get(bookings::list_bookings).post(bookings::create_booking),
        )
        .route("/bookings/:id", delete(bookings::cancel_booking));

    Router::new()
        // Health checks (no authentication)
        .route("/health", get(health::health_check))
        .route("/ready", get(ready))
        .nest("/api", api_routes)
        .layer(TraceLayer::new_for_http())
        .layer(correlation_id_layer())
        .with_state(state)
}

async fn ready(State(state): State<AppState>) -> impl axum::response::IntoResponse {
    health::readiness(state.health.as_ref()).await
}

/// CORS policy.
///
/// With an origin, only that origin may call the API with credentials
/// (the session cookie). Without one, any origin is allowed but cookies are
/// not shared.
///
/// # Errors
///
/// Returns an error if `origin` is not a valid header value.
pub fn cors_layer(origin: Option<&str>) -> Result<CorsLayer, InvalidHeaderValue> {
    let cors = CorsLayer::new()
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([CONTENT_TYPE, AUTHORIZATION])
        .max_age(Duration::from_secs(60 * 60));

    Ok(match origin {
        Some(origin) => cors
            .allow_origin(HeaderValue::from_str(origin)?)
            .allow_credentials(true),
        None => cors.allow_origin(tower_http::cors::Any),
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_cors_layer() {
        assert!(cors_layer(None).is_ok());
        assert!(cors_layer(Some("http://localhost:5173")).is_ok());
        assert!(cors_layer(Some("bad\norigin")).is_err());
    }
}
