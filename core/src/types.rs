//! Domain types for Eventbook.
//!
//! Identifiers, entities and the request payloads that create or modify them.
//! Wire representation is camelCase JSON.

use crate::error::{Result, StoreError};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

// ============================================================================
// Identifiers
// ============================================================================

macro_rules! uuid_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub Uuid);

        impl $name {
            #[doc = concat!("Creates a new random `", stringify!($name), "`")]
            #[must_use]
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }

            #[doc = concat!("Create a `", stringify!($name), "` from a `Uuid`")]
            #[must_use]
            pub const fn from_uuid(uuid: Uuid) -> Self {
                Self(uuid)
            }

            /// Get the inner UUID
            #[must_use]
            pub const fn as_uuid(&self) -> &Uuid {
                &self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<Uuid> for $name {
            fn from(uuid: Uuid) -> Self {
                Self(uuid)
            }
        }
    };
}

uuid_id!(
    /// Unique identifier for a user
    UserId
);
uuid_id!(
    /// Unique identifier for an event
    EventId
);
uuid_id!(
    /// Unique identifier for a booking
    BookingId
);

// ============================================================================
// Users
// ============================================================================

/// Authorization level.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Regular user: browse and book.
    #[default]
    User,
    /// Administrator: manage users and events.
    Admin,
}

impl Role {
    /// Database / token representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Admin => "admin",
        }
    }

    /// Whether this role may perform admin-only operations.
    #[must_use]
    pub const fn is_admin(self) -> bool {
        matches!(self, Self::Admin)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "user" => Ok(Self::User),
            "admin" => Ok(Self::Admin),
            other => Err(StoreError::Validation(format!("unknown role: {other}"))),
        }
    }
}

/// A registered account.
///
/// The password hash is never serialized.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    /// User ID
    pub id: UserId,
    /// Display name
    pub name: String,
    /// Login email (unique)
    pub email: String,
    /// Argon2 PHC string
    #[serde(skip_serializing, default)]
    pub password_hash: String,
    /// Authorization level
    pub role: Role,
    /// Created timestamp
    pub created_at: DateTime<Utc>,
    /// Last modification timestamp
    pub updated_at: DateTime<Utc>,
}

/// Data needed to create a user.
#[derive(Clone, Debug)]
pub struct NewUser {
    /// Display name
    pub name: String,
    /// Login email
    pub email: String,
    /// Already-hashed password
    pub password_hash: String,
    /// Initial role
    pub role: Role,
}

impl NewUser {
    /// Check the registration invariants that do not need storage.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Validation`] if the name is blank or the email
    /// is not plausibly an address.
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(StoreError::Validation("Name is required".to_string()));
        }
        validate_email(&self.email)
    }
}

/// Minimal email sanity check: non-empty local part and domain around one `@`.
///
/// # Errors
///
/// Returns [`StoreError::Validation`] for malformed addresses.
pub fn validate_email(email: &str) -> Result<()> {
    match email.split_once('@') {
        Some((local, domain)) if !local.is_empty() && !domain.is_empty() && !domain.contains('@') => {
            Ok(())
        },
        _ => Err(StoreError::Validation("A valid email is required".to_string())),
    }
}

// ============================================================================
// Events
// ============================================================================

/// A bookable occurrence with a time window and attendee capacity.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    /// Event ID
    pub id: EventId,
    /// Event title
    pub title: String,
    /// Event description
    pub description: String,
    /// Start time
    pub date: DateTime<Utc>,
    /// End time
    pub end_date: Option<DateTime<Utc>>,
    /// Category, e.g. "Music"
    pub category: String,
    /// Location name
    pub location: String,
    /// Capacity
    pub max_attendees: u32,
    /// Creating user
    pub created_by: UserId,
    /// Created timestamp
    pub created_at: DateTime<Utc>,
    /// Last modification timestamp
    pub updated_at: DateTime<Utc>,
}

/// An event annotated with its derived booking count.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventSummary {
    /// The event row
    #[serde(flatten)]
    pub event: Event,
    /// Number of bookings for the event
    pub current_attendees: u32,
}

impl EventSummary {
    /// Seats still available.
    #[must_use]
    pub const fn remaining(&self) -> u32 {
        self.event.max_attendees.saturating_sub(self.current_attendees)
    }

    /// Whether no more bookings can be admitted.
    #[must_use]
    pub const fn is_full(&self) -> bool {
        self.current_attendees >= self.event.max_attendees
    }
}

/// Public view of an event's creator.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Creator {
    /// User ID
    pub id: UserId,
    /// Display name
    pub name: String,
    /// Email
    pub email: String,
}

/// Admin listing row: event, count and creator.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventWithCreator {
    /// Event and attendee count
    #[serde(flatten)]
    pub summary: EventSummary,
    /// Creator, if the account still exists
    pub creator: Option<Creator>,
}

/// Request body for creating an event.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewEvent {
    /// Event title
    pub title: String,
    /// Event description
    #[serde(default)]
    pub description: String,
    /// Start time
    pub date: DateTime<Utc>,
    /// End time
    #[serde(default)]
    pub end_date: Option<DateTime<Utc>>,
    /// Category
    pub category: String,
    /// Location
    pub location: String,
    /// Capacity
    pub max_attendees: u32,
}

impl NewEvent {
    /// Validate field-level invariants.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Validation`] describing the first invalid field.
    pub fn validate(&self) -> Result<()> {
        validate_event_fields(
            &self.title,
            &self.category,
            &self.location,
            self.max_attendees,
            self.date,
            self.end_date,
        )
    }
}

/// Partial update of an event. Absent fields are left unchanged.
///
/// `endDate: null` clears the end date; an absent `endDate` keeps it.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventPatch {
    /// New title
    pub title: Option<String>,
    /// New description
    pub description: Option<String>,
    /// New start time
    pub date: Option<DateTime<Utc>>,
    /// New end time
    #[serde(default, with = "double_option", skip_serializing_if = "Option::is_none")]
    pub end_date: Option<Option<DateTime<Utc>>>,
    /// New category
    pub category: Option<String>,
    /// New location
    pub location: Option<String>,
    /// New capacity
    pub max_attendees: Option<u32>,
}

impl EventPatch {
    /// Apply the patch to an event, bumping `updated_at`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Validation`] if the patched event violates a
    /// field invariant. The event is left untouched in that case.
    pub fn apply(&self, event: &Event, now: DateTime<Utc>) -> Result<Event> {
        let mut patched = event.clone();
        if let Some(title) = &self.title {
            patched.title.clone_from(title);
        }
        if let Some(description) = &self.description {
            patched.description.clone_from(description);
        }
        if let Some(date) = self.date {
            patched.date = date;
        }
        if let Some(end_date) = self.end_date {
            patched.end_date = end_date;
        }
        if let Some(category) = &self.category {
            patched.category.clone_from(category);
        }
        if let Some(location) = &self.location {
            patched.location.clone_from(location);
        }
        if let Some(max_attendees) = self.max_attendees {
            patched.max_attendees = max_attendees;
        }
        validate_event_fields(
            &patched.title,
            &patched.category,
            &patched.location,
            patched.max_attendees,
            patched.date,
            patched.end_date,
        )?;
        patched.updated_at = now;
        Ok(patched)
    }

    /// Whether the patch changes nothing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }
}

fn validate_event_fields(
    title: &str,
    category: &str,
    location: &str,
    max_attendees: u32,
    date: DateTime<Utc>,
    end_date: Option<DateTime<Utc>>,
) -> Result<()> {
    if title.trim().is_empty() {
        return Err(StoreError::Validation("Title is required".to_string()));
    }
    if category.trim().is_empty() {
        return Err(StoreError::Validation("Category is required".to_string()));
    }
    if location.trim().is_empty() {
        return Err(StoreError::Validation("Location is required".to_string()));
    }
    if max_attendees == 0 {
        return Err(StoreError::Validation(
            "maxAttendees must be at least 1".to_string(),
        ));
    }
    if end_date.is_some_and(|end| end < date) {
        return Err(StoreError::Validation(
            "endDate must not be before date".to_string(),
        ));
    }
    Ok(())
}

/// Distinguishes an absent field from an explicit `null`.
mod double_option {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    pub fn serialize<T, S>(value: &Option<Option<T>>, serializer: S) -> Result<S::Ok, S::Error>
    where
        T: Serialize,
        S: Serializer,
    {
        match value {
            Some(inner) => inner.serialize(serializer),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
    where
        T: Deserialize<'de>,
        D: Deserializer<'de>,
    {
        Option::<T>::deserialize(deserializer).map(Some)
    }
}

// ============================================================================
// Bookings
// ============================================================================

/// A reservation linking one user to one event.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Booking {
    /// Booking ID
    pub id: BookingId,
    /// Booked event
    pub event_id: EventId,
    /// Booking user
    pub user_id: UserId,
    /// Created timestamp
    pub created_at: DateTime<Utc>,
    /// Last modification timestamp
    pub updated_at: DateTime<Utc>,
}

/// A booking joined with the event it refers to.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingWithEvent {
    /// The booking row
    #[serde(flatten)]
    pub booking: Booking,
    /// The booked event
    pub event: Event,
}

// ============================================================================
// Admin
// ============================================================================

/// Dashboard counters.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Stats {
    /// Registered users
    pub total_users: u64,
    /// Stored events
    pub total_events: u64,
    /// Stored bookings
    pub total_bookings: u64,
    /// Events starting at or after now
    pub upcoming_events: u64,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn sample_event() -> Event {
        let date = Utc.with_ymd_and_hms(2025, 6, 1, 18, 0, 0).unwrap();
        Event {
            id: EventId::new(),
            title: "Jazz Night".to_string(),
            description: "Live quartet".to_string(),
            date,
            end_date: None,
            category: "Music".to_string(),
            location: "Berlin".to_string(),
            max_attendees: 50,
            created_by: UserId::new(),
            created_at: date,
            updated_at: date,
        }
    }

    #[test]
    fn test_role_round_trips_through_str() {
        assert_eq!("admin".parse::<Role>().unwrap(), Role::Admin);
        assert_eq!(Role::User.as_str(), "user");
        assert!("root".parse::<Role>().is_err());
    }

    #[test]
    fn test_user_serialization_hides_password_hash() {
        let user = User {
            id: UserId::new(),
            name: "Ada".to_string(),
            email: "ada@example.com".to_string(),
            password_hash: "$argon2id$secret".to_string(),
            role: Role::User,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        let json = serde_json::to_value(&user).unwrap();
        assert!(json.get("passwordHash").is_none());
        assert_eq!(json["role"], "user");
        assert!(json.get("createdAt").is_some());
    }

    #[test]
    fn test_event_summary_flattens_and_counts() {
        let summary = EventSummary {
            event: sample_event(),
            current_attendees: 50,
        };
        let json = serde_json::to_value(&summary).unwrap();
        assert_eq!(json["maxAttendees"], 50);
        assert_eq!(json["currentAttendees"], 50);
        assert_eq!(json["title"], "Jazz Night");
        assert!(summary.is_full());
        assert_eq!(summary.remaining(), 0);
    }

    #[test]
    fn test_new_event_validation() {
        let event = sample_event();
        let mut new_event = NewEvent {
            title: event.title,
            description: event.description,
            date: event.date,
            end_date: Some(event.date - chrono::Duration::hours(1)),
            category: event.category,
            location: event.location,
            max_attendees: 10,
        };
        assert!(matches!(new_event.validate(), Err(StoreError::Validation(_))));

        new_event.end_date = None;
        assert!(new_event.validate().is_ok());

        new_event.max_attendees = 0;
        assert!(new_event.validate().is_err());
    }

    #[test]
    fn test_patch_distinguishes_null_from_absent() {
        let absent: EventPatch = serde_json::from_str(r#"{"title":"New"}"#).unwrap();
        assert_eq!(absent.end_date, None);

        let cleared: EventPatch = serde_json::from_str(r#"{"endDate":null}"#).unwrap();
        assert_eq!(cleared.end_date, Some(None));
    }

    #[test]
    fn test_patch_apply_updates_fields_and_timestamp() {
        let mut event = sample_event();
        event.end_date = Some(event.date + chrono::Duration::hours(2));
        let now = event.date + chrono::Duration::days(1);

        let patch = EventPatch {
            title: Some("Late Jazz".to_string()),
            end_date: Some(None),
            ..EventPatch::default()
        };
        let patched = patch.apply(&event, now).unwrap();

        assert_eq!(patched.title, "Late Jazz");
        assert_eq!(patched.end_date, None);
        assert_eq!(patched.location, event.location);
        assert_eq!(patched.updated_at, now);
    }

    #[test]
    fn test_patch_apply_rejects_invalid_result() {
        let event = sample_event();
        let patch = EventPatch {
            title: Some("   ".to_string()),
            ..EventPatch::default()
        };
        assert!(patch.apply(&event, Utc::now()).is_err());
        assert!(EventPatch::default().is_empty());
    }

    #[test]
    fn test_validate_email() {
        assert!(validate_email("a@b.c").is_ok());
        assert!(validate_email("nobody").is_err());
        assert!(validate_email("@example.com").is_err());
        assert!(validate_email("a@b@c").is_err());
    }
}
