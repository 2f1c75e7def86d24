//! HTTP API handlers.
//!
//! Handlers are thin: they extract identity from the session token, call a
//! repository and let [`AppError`](eventbook_web::AppError) map failures to
//! statuses.

pub mod admin;
pub mod auth;
pub mod bookings;
pub mod events;

use serde::Serialize;

/// `{"message": ...}` body for operations without a resource to return.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct MessageResponse {
    /// Human-readable outcome
    pub message: String,
}

impl MessageResponse {
    /// Create a message body.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}
