//! Axum web framework integration for Eventbook.
//!
//! Shared HTTP plumbing: the error type every handler returns, extractors
//! that render rejections in the same shape, correlation-ID middleware and
//! health endpoints.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │         Imperative Shell (Axum)         │  ← HTTP, JSON, cookies
//! │  - Request parsing                      │  ← CORS, tracing
//! │  - Response serialization               │  ← Logging, metrics
//! ├─────────────────────────────────────────┤
//! │         Functional Core                 │
//! │  - Validation and admission rules       │  ← Testable at memory speed
//! │  - Repository traits                    │  ← Storage behind `dyn` seams
//! └─────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```ignore
//! use eventbook_web::{ApiJson, AppError};
//! use axum::{Router, routing::post, Json};
//!
//! async fn create_event(
//!     State(state): State<AppState>,
//!     admin: RequireAdmin,
//!     ApiJson(request): ApiJson<NewEvent>,
//! ) -> Result<(StatusCode, Json<EventSummary>), AppError> {
//!     request.validate()?;
//!     let event = state.events.create(request, admin.user_id(), state.clock.now()).await?;
//!     Ok((StatusCode::CREATED, Json(event)))
//! }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod error;
pub mod extractors;
pub mod handlers;
pub mod middleware;

// Re-export key types for convenience
pub use error::AppError;
pub use extractors::{ApiJson, ApiPath, ApiQuery, ClientIp, CorrelationId};
pub use middleware::{CORRELATION_ID_HEADER, CorrelationIdExt, correlation_id_layer};

/// Result type alias for web handlers.
pub type WebResult<T> = Result<T, AppError>;
