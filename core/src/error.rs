//! Error types for storage and domain operations.

use thiserror::Error;

/// Result type alias for repository operations.
pub type Result<T> = std::result::Result<T, StoreError>;

/// Failures surfaced by repositories and domain validation.
///
/// Each variant maps to one HTTP status in the web layer.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// Requested row does not exist.
    #[error("{entity} not found")]
    NotFound {
        /// Kind of row, e.g. "Event"
        entity: &'static str,
    },

    /// The user already holds a booking for this event.
    #[error("Already booked for this event")]
    AlreadyBooked,

    /// The event has reached its capacity.
    #[error("Event is fully booked")]
    EventFull,

    /// Registration with an email that is already taken.
    #[error("Email already registered")]
    EmailTaken,

    /// Input violates a field-level invariant.
    #[error("{0}")]
    Validation(String),

    /// Underlying database failure.
    #[error("Database error: {0}")]
    Database(String),
}

impl StoreError {
    /// Shorthand for [`StoreError::NotFound`].
    #[must_use]
    pub const fn not_found(entity: &'static str) -> Self {
        Self::NotFound { entity }
    }
}
