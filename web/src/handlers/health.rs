//! Health check endpoints.
//!
//! These endpoints are used by load balancers and monitoring systems
//! to verify service health.

use axum::{Json, http::StatusCode};
use chrono::{DateTime, Utc};
use eventbook_core::repository::HealthCheck;
use serde::Serialize;

/// Simple health check endpoint (for basic liveness).
///
/// Returns 200 OK to indicate the service is running.
/// This endpoint does NOT check dependencies (database, etc.).
///
/// # Endpoint
///
/// ```text
/// GET /health
/// ```
#[allow(clippy::unused_async)]
pub async fn health_check() -> (StatusCode, &'static str) {
    (StatusCode::OK, "ok")
}

/// Readiness report body.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ReadinessReport {
    /// `ready` or `unavailable`
    pub status: &'static str,
    /// Failure reason when unavailable
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// When the check ran
    pub timestamp: DateTime<Utc>,
}

/// Readiness check against the backing store.
///
/// # Status Codes
///
/// - 200 OK: the store answered
/// - 503 Service Unavailable: the store did not
///
/// # Endpoint
///
/// ```text
/// GET /ready
/// ```
pub async fn readiness(store: &dyn HealthCheck) -> (StatusCode, Json<ReadinessReport>) {
    match store.ping().await {
        Ok(()) => (
            StatusCode::OK,
            Json(ReadinessReport {
                status: "ready",
                message: None,
                timestamp: Utc::now(),
            }),
        ),
        Err(error) => {
            tracing::warn!(error = %error, "Readiness check failed");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(ReadinessReport {
                    status: "unavailable",
                    message: Some(error.to_string()),
                    timestamp: Utc::now(),
                }),
            )
        },
    }
}
