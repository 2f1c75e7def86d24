//! Storage abstractions.
//!
//! HTTP handlers depend on these traits only. Two backends implement them:
//! PostgreSQL (`eventbook-postgres`) and the in-memory maps in
//! `eventbook-testing`.
//!
//! # Pattern: Dependency Injection via Traits
//!
//! 1. Core defines the query and mutation traits
//! 2. Backends implement them
//! 3. The server state holds `Arc<dyn ...>` trait objects

use crate::error::Result;
use crate::filter::EventFilter;
use crate::types::{
    Booking, BookingId, BookingWithEvent, EventId, EventPatch, EventSummary, EventWithCreator,
    NewEvent, NewUser, Role, Stats, User, UserId,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};

// ============================================================================
// Users
// ============================================================================

/// Account storage.
#[async_trait]
pub trait UserRepository: Send + Sync + 'static {
    /// Insert a new user.
    ///
    /// # Errors
    ///
    /// [`StoreError::EmailTaken`](crate::StoreError::EmailTaken) if the email
    /// is already registered.
    async fn create(&self, user: NewUser, now: DateTime<Utc>) -> Result<User>;

    /// Look up a user by ID.
    ///
    /// # Errors
    ///
    /// Backend failures only; a missing user is `Ok(None)`.
    async fn get(&self, id: UserId) -> Result<Option<User>>;

    /// Look up a user by login email.
    ///
    /// # Errors
    ///
    /// Backend failures only; a missing user is `Ok(None)`.
    async fn find_by_email(&self, email: &str) -> Result<Option<User>>;

    /// All users, newest first.
    ///
    /// # Errors
    ///
    /// Backend failures.
    async fn list(&self) -> Result<Vec<User>>;

    /// Set a user's role. Setting the current role is a no-op that still
    /// succeeds.
    ///
    /// # Errors
    ///
    /// [`StoreError::NotFound`](crate::StoreError::NotFound) for unknown users.
    async fn set_role(&self, id: UserId, role: Role, now: DateTime<Utc>) -> Result<User>;
}

// ============================================================================
// Events
// ============================================================================

/// Event storage and queries. Attendee counts are always derived from the
/// booking table.
#[async_trait]
pub trait EventRepository: Send + Sync + 'static {
    /// Insert a validated event.
    ///
    /// # Errors
    ///
    /// Backend failures.
    async fn create(
        &self,
        event: NewEvent,
        created_by: UserId,
        now: DateTime<Utc>,
    ) -> Result<EventSummary>;

    /// Fetch one event with its attendee count.
    ///
    /// # Errors
    ///
    /// Backend failures only; a missing event is `Ok(None)`.
    async fn get(&self, id: EventId) -> Result<Option<EventSummary>>;

    /// Events matching the filter, ordered by start time.
    ///
    /// # Errors
    ///
    /// Backend failures.
    async fn list(&self, filter: &EventFilter) -> Result<Vec<EventSummary>>;

    /// Events ordered by attendee count descending, then start time.
    ///
    /// # Errors
    ///
    /// Backend failures.
    async fn popular(&self, limit: u32) -> Result<Vec<EventSummary>>;

    /// Apply a partial update.
    ///
    /// # Errors
    ///
    /// - [`StoreError::NotFound`](crate::StoreError::NotFound) for unknown events
    /// - [`StoreError::Validation`](crate::StoreError::Validation) if the result
    ///   is invalid or the new capacity is below the current booking count
    async fn update(
        &self,
        id: EventId,
        patch: EventPatch,
        now: DateTime<Utc>,
    ) -> Result<EventSummary>;

    /// Delete an event and all of its bookings.
    ///
    /// # Errors
    ///
    /// [`StoreError::NotFound`](crate::StoreError::NotFound) for unknown events.
    async fn delete(&self, id: EventId) -> Result<()>;

    /// Admin listing: every event with its creator, ordered by start time.
    ///
    /// # Errors
    ///
    /// Backend failures.
    async fn list_with_creators(&self) -> Result<Vec<EventWithCreator>>;

    /// Dashboard counters. `now` decides which events are upcoming.
    ///
    /// # Errors
    ///
    /// Backend failures.
    async fn stats(&self, now: DateTime<Utc>) -> Result<Stats>;
}

// ============================================================================
// Bookings
// ============================================================================

/// Booking storage.
#[async_trait]
pub trait BookingRepository: Send + Sync + 'static {
    /// Admit a booking atomically.
    ///
    /// The existence check, duplicate check, capacity check and insert form
    /// one critical section per event; see [`crate::booking::admit`].
    ///
    /// # Errors
    ///
    /// - [`StoreError::NotFound`](crate::StoreError::NotFound) for unknown events
    /// - [`StoreError::AlreadyBooked`](crate::StoreError::AlreadyBooked)
    /// - [`StoreError::EventFull`](crate::StoreError::EventFull)
    async fn book(&self, event_id: EventId, user_id: UserId, now: DateTime<Utc>)
    -> Result<Booking>;

    /// Fetch one booking.
    ///
    /// # Errors
    ///
    /// Backend failures only; a missing booking is `Ok(None)`.
    async fn get(&self, id: BookingId) -> Result<Option<Booking>>;

    /// Delete one booking.
    ///
    /// # Errors
    ///
    /// [`StoreError::NotFound`](crate::StoreError::NotFound) for unknown bookings.
    async fn delete(&self, id: BookingId) -> Result<()>;

    /// A user's bookings joined with their events, ordered by event start.
    ///
    /// # Errors
    ///
    /// Backend failures.
    async fn list_for_user(&self, user_id: UserId) -> Result<Vec<BookingWithEvent>>;
}

/// Readiness check for the backing store.
#[async_trait]
pub trait HealthCheck: Send + Sync + 'static {
    /// Succeeds when the store can serve queries.
    ///
    /// # Errors
    ///
    /// [`StoreError::Database`](crate::StoreError::Database) when unreachable.
    async fn ping(&self) -> Result<()>;
}
