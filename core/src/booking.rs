//! Booking admission rules.
//!
//! Admission is decided from two facts read inside the same critical section
//! as the insert (a row lock in PostgreSQL, a mutex in memory):
//!
//! ```text
//! 1. duplicate?           → Conflict   (409)
//! 2. current >= capacity  → EventFull  (400)
//! 3. otherwise            → Admitted   (insert)
//! ```
//!
//! The ordering matters: a user re-booking a full event they already hold a
//! seat for gets the conflict, not the capacity error.

use crate::error::StoreError;

/// Outcome of an admission check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    /// Insert the booking.
    Admitted,
    /// The (user, event) pair is already booked.
    Duplicate,
    /// No seats left.
    EventFull,
}

impl Admission {
    /// Convert a rejection into the matching error.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::AlreadyBooked`] or [`StoreError::EventFull`] for
    /// rejected admissions.
    pub const fn into_result(self) -> Result<(), StoreError> {
        match self {
            Self::Admitted => Ok(()),
            Self::Duplicate => Err(StoreError::AlreadyBooked),
            Self::EventFull => Err(StoreError::EventFull),
        }
    }

    /// Label used for metrics and logs.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Admitted => "admitted",
            Self::Duplicate => "duplicate",
            Self::EventFull => "full",
        }
    }
}

/// Decide whether a booking may be inserted.
///
/// `already_booked` is whether the acting user holds a booking for the event,
/// `current` the number of existing bookings and `capacity` the event's
/// `max_attendees`.
#[must_use]
pub const fn admit(already_booked: bool, current: u64, capacity: u32) -> Admission {
    if already_booked {
        Admission::Duplicate
    } else if current >= capacity as u64 {
        Admission::EventFull
    } else {
        Admission::Admitted
    }
}
