//! # Eventbook Testing
//!
//! Testing utilities and helpers for Eventbook.
//!
//! This crate provides:
//! - [`InMemoryStore`]: mutex-guarded tables implementing every repository trait
//! - [`FixedClock`]: deterministic time
//! - [`ReducerTest`]: Given-When-Then harness for reducers
//! - Fixture builders for users and events
//!
//! ## Example
//!
//! ```ignore
//! use eventbook_testing::{InMemoryStore, fixtures, test_clock};
//! use eventbook_core::repository::BookingRepository;
//!
//! #[tokio::test]
//! async fn test_booking() {
//!     let store = InMemoryStore::new();
//!     let event = fixtures::seed_event(&store, 2).await;
//!
//!     store.book(event.id, UserId::new(), test_clock().now()).await.unwrap();
//!     assert_eq!(store.booking_count(event.id), 1);
//! }
//! ```

use chrono::{DateTime, Utc};
use eventbook_core::environment::Clock;

/// In-memory repository backend
pub mod memory;


/// Mock implementations of Environment traits
pub mod mocks {
    use super::{Clock, DateTime, Utc};

    /// Fixed clock for deterministic tests
    ///
    /// Always returns the same time, making tests reproducible.
    ///
    /// # Example
    ///
    /// ```
    /// use eventbook_testing::mocks::FixedClock;
    /// use eventbook_core::environment::Clock;
    /// use chrono::Utc;
    ///
    /// let clock = FixedClock::new(Utc::now());
    /// let time1 = clock.now();
    /// let time2 = clock.now();
    /// assert_eq!(time1, time2); // Always the same!
    /// ```
    #[derive(Debug, Clone)]
    pub struct FixedClock {
        time: DateTime<Utc>,
    }

    impl FixedClock {
        /// Create a new fixed clock with the given time
        #[must_use]
        pub const fn new(time: DateTime<Utc>) -> Self {
            Self { time }
        }
    }

    impl Clock for FixedClock {
        fn now(&self) -> DateTime<Utc> {
            self.time
        }
    }

    /// Create a default fixed clock for tests (2025-01-01 00:00:00 UTC)
    ///
    /// # Panics
    ///
    /// This function will panic if the hardcoded timestamp fails to parse,
    /// which should never happen in practice.
    #[must_use]
    #[allow(clippy::expect_used)]
    pub fn test_clock() -> FixedClock {
        FixedClock::new(
            DateTime::parse_from_rfc3339("2025-01-01T00:00:00Z")
                .expect("hardcoded timestamp should always parse")
                .with_timezone(&Utc),
        )
    }
}

/// Builders for common test data
pub mod fixtures {
    use super::{Clock, mocks::test_clock};
    use crate::memory::InMemoryStore;
    use chrono::Duration;
    use eventbook_core::repository::{EventRepository, UserRepository};
    use eventbook_core::{Event, NewEvent, NewUser, Role, User};

    /// A valid user registration with a placeholder hash.
    #[must_use]
    pub fn new_user(email: &str, role: Role) -> NewUser {
        NewUser {
            name: email.split('@').next().unwrap_or(email).to_string(),
            email: email.to_string(),
            password_hash: "not-a-real-hash".to_string(),
            role,
        }
    }

    /// A valid event one month after [`test_clock`].
    #[must_use]
    pub fn new_event(title: &str, category: &str, location: &str) -> NewEvent {
        NewEvent {
            title: title.to_string(),
            description: format!("{title} description"),
            date: test_clock().now() + Duration::days(30),
            end_date: None,
            category: category.to_string(),
            location: location.to_string(),
            max_attendees: 10,
        }
    }

    /// Insert a user into the store.
    ///
    /// # Panics
    ///
    /// Panics if the email is already registered.
    #[allow(clippy::expect_used)]
    pub async fn seed_user(store: &InMemoryStore, email: &str, role: Role) -> User {
        UserRepository::create(store, new_user(email, role), test_clock().now())
            .await
            .expect("seed user should insert")
    }

    /// Insert an event with the given capacity, created by a fresh admin.
    ///
    /// # Panics
    ///
    /// Panics if the insert fails.
    #[allow(clippy::expect_used)]
    pub async fn seed_event(store: &InMemoryStore, capacity: u32) -> Event {
        let creator = seed_user(store, &format!("{}@example.com", uuid::Uuid::new_v4()), Role::Admin).await;
        let mut event = new_event("Seeded Event", "Music", "Berlin");
        event.max_attendees = capacity;
        EventRepository::create(store, event, creator.id, test_clock().now())
            .await
            .expect("seed event should insert")
            .event
    }
}

// Re-export commonly used items
pub use memory::InMemoryStore;
pub use mocks::{FixedClock, test_clock};
pub use reducer_test::{ReducerTest, assertions};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixed_clock() {
        let clock = test_clock();
        let time1 = clock.now();
        let time2 = clock.now();
        assert_eq!(time1, time2);
    }

    #[test]
    fn test_new_event_fixture_is_valid() {
        assert!(fixtures::new_event("A", "B", "C").validate().is_ok());
        assert!(fixtures::new_user("ada@example.com", eventbook_core::Role::User)
            .validate()
            .is_ok());
    }
}
