//! Row types and their conversion into domain types.

use chrono::{DateTime, Utc};
use eventbook_core::{
    Booking, BookingId, BookingWithEvent, Creator, Event, EventId, EventSummary, EventWithCreator,
    Result, StoreError, User, UserId,
};
use sqlx::FromRow;
use uuid::Uuid;

/// Column list for `users`.
pub(crate) const USER_COLUMNS: &str = "id, name, email, password_hash, role, created_at, updated_at";

/// Column list for `events` aliased as `e`.
pub(crate) const EVENT_COLUMNS: &str = "e.id, e.title, e.description, e.date, e.end_date, \
     e.category, e.location, e.max_attendees, e.created_by, e.created_at, e.updated_at";

/// Column list for `bookings`.
pub(crate) const BOOKING_COLUMNS: &str = "id, event_id, user_id, created_at, updated_at";

#[derive(Debug, FromRow)]
pub(crate) struct UserRow {
    id: Uuid,
    name: String,
    email: String,
    password_hash: String,
    role: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<UserRow> for User {
    type Error = StoreError;

    fn try_from(row: UserRow) -> Result<Self> {
        let role = row
            .role
            .parse()
            .map_err(|_| StoreError::Database(format!("invalid role in users row: {}", row.role)))?;
        Ok(Self {
            id: UserId(row.id),
            name: row.name,
            email: row.email,
            password_hash: row.password_hash,
            role,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(Debug, FromRow)]
pub(crate) struct EventColumns {
    id: Uuid,
    title: String,
    description: String,
    date: DateTime<Utc>,
    end_date: Option<DateTime<Utc>>,
    category: String,
    location: String,
    max_attendees: i32,
    created_by: Uuid,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<EventColumns> for Event {
    type Error = StoreError;

    fn try_from(row: EventColumns) -> Result<Self> {
        let max_attendees = u32::try_from(row.max_attendees).map_err(|_| {
            StoreError::Database(format!("negative max_attendees for event {}", row.id))
        })?;
        Ok(Self {
            id: EventId(row.id),
            title: row.title,
            description: row.description,
            date: row.date,
            end_date: row.end_date,
            category: row.category,
            location: row.location,
            max_attendees,
            created_by: UserId(row.created_by),
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

/// Event columns plus `current_attendees` from the bookings join.
#[derive(Debug, FromRow)]
pub(crate) struct EventRow {
    #[sqlx(flatten)]
    event: EventColumns,
    current_attendees: i64,
}

impl TryFrom<EventRow> for EventSummary {
    type Error = StoreError;

    fn try_from(row: EventRow) -> Result<Self> {
        let current_attendees = u32::try_from(row.current_attendees)
            .map_err(|_| StoreError::Database("attendee count out of range".to_string()))?;
        Ok(Self {
            event: row.event.try_into()?,
            current_attendees,
        })
    }
}

/// Admin listing row; creator columns are null when the join misses.
#[derive(Debug, FromRow)]
pub(crate) struct EventCreatorRow {
    #[sqlx(flatten)]
    event: EventRow,
    creator_id: Option<Uuid>,
    creator_name: Option<String>,
    creator_email: Option<String>,
}

impl TryFrom<EventCreatorRow> for EventWithCreator {
    type Error = StoreError;

    fn try_from(row: EventCreatorRow) -> Result<Self> {
        let creator = match (row.creator_id, row.creator_name, row.creator_email) {
            (Some(id), Some(name), Some(email)) => Some(Creator {
                id: UserId(id),
                name,
                email,
            }),
            _ => None,
        };
        Ok(Self {
            summary: row.event.try_into()?,
            creator,
        })
    }
}

#[derive(Debug, FromRow)]
pub(crate) struct BookingRow {
    id: Uuid,
    event_id: Uuid,
    user_id: Uuid,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<BookingRow> for Booking {
    fn from(row: BookingRow) -> Self {
        Self {
            id: BookingId(row.id),
            event_id: EventId(row.event_id),
            user_id: UserId(row.user_id),
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

/// Booking joined with its event. Booking columns carry a `booking_` prefix.
#[derive(Debug, FromRow)]
pub(crate) struct BookingEventRow {
    booking_id: Uuid,
    booking_user_id: Uuid,
    booking_created_at: DateTime<Utc>,
    booking_updated_at: DateTime<Utc>,
    #[sqlx(flatten)]
    event: EventColumns,
}

impl TryFrom<BookingEventRow> for BookingWithEvent {
    type Error = StoreError;

    fn try_from(row: BookingEventRow) -> Result<Self> {
        let event: Event = row.event.try_into()?;
        Ok(Self {
            booking: Booking {
                id: BookingId(row.booking_id),
                event_id: event.id,
                user_id: UserId(row.booking_user_id),
                created_at: row.booking_created_at,
                updated_at: row.booking_updated_at,
            },
            event,
        })
    }
}

/// Capacity as stored: `INTEGER`.
pub(crate) fn capacity_column(max_attendees: u32) -> Result<i32> {
    i32::try_from(max_attendees)
        .map_err(|_| StoreError::Validation("maxAttendees is too large".to_string()))
}
