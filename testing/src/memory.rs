//! In-memory repository backend
//!
//! Provides fast, deterministic storage for handler and client tests:
//! - [`InMemoryStore`]: one mutex-guarded set of tables implementing
//!   every repository trait
//!
//! All three tables sit behind a single lock so booking admission (check
//! then insert) is one critical section, mirroring the row lock taken by the
//! PostgreSQL backend.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use eventbook_core::booking::admit;
use eventbook_core::repository::{
    BookingRepository, EventRepository, HealthCheck, UserRepository,
};
use eventbook_core::{
    Booking, BookingId, BookingWithEvent, Creator, Event, EventFilter, EventId, EventPatch,
    EventSummary, EventWithCreator, NewEvent, NewUser, Result, Role, Stats, StoreError, User,
    UserId,
};
use std::cmp::Reverse;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

#[derive(Debug, Default)]
struct Tables {
    users: HashMap<UserId, User>,
    events: HashMap<EventId, Event>,
    bookings: HashMap<BookingId, Booking>,
}

impl Tables {
    fn attendees(&self, event_id: EventId) -> u32 {
        let count = self
            .bookings
            .values()
            .filter(|b| b.event_id == event_id)
            .count();
        u32::try_from(count).unwrap_or(u32::MAX)
    }

    fn summary(&self, event: &Event) -> EventSummary {
        EventSummary {
            event: event.clone(),
            current_attendees: self.attendees(event.id),
        }
    }

    fn summaries(&self) -> Vec<EventSummary> {
        self.events.values().map(|e| self.summary(e)).collect()
    }
}

/// In-memory storage for fast, deterministic testing.
///
/// Cloning shares the underlying tables.
///
/// # Example
///
/// ```
/// use eventbook_testing::InMemoryStore;
/// use eventbook_core::repository::UserRepository;
///
/// # async fn example() -> eventbook_core::Result<()> {
/// let store = InMemoryStore::new();
/// assert!(store.list().await?.is_empty());
/// # Ok(())
/// # }
/// ```
#[derive(Clone, Debug, Default)]
pub struct InMemoryStore {
    tables: Arc<Mutex<Tables>>,
}

impl InMemoryStore {
    /// Create a new empty store
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Tables> {
        self.tables.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Number of stored bookings for an event
    ///
    /// Useful for capacity assertions in tests.
    #[must_use]
    pub fn booking_count(&self, event_id: EventId) -> u32 {
        self.lock().attendees(event_id)
    }

    /// Clear all tables (for test isolation)
    pub fn clear(&self) {
        *self.lock() = Tables::default();
    }
}

#[async_trait]
impl UserRepository for InMemoryStore {
    async fn create(&self, user: NewUser, now: DateTime<Utc>) -> Result<User> {
        user.validate()?;
        let mut tables = self.lock();
        if tables.users.values().any(|u| u.email == user.email) {
            return Err(StoreError::EmailTaken);
        }
        let created = User {
            id: UserId::new(),
            name: user.name,
            email: user.email,
            password_hash: user.password_hash,
            role: user.role,
            created_at: now,
            updated_at: now,
        };
        tables.users.insert(created.id, created.clone());
        Ok(created)
    }

    async fn get(&self, id: UserId) -> Result<Option<User>> {
        Ok(self.lock().users.get(&id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>> {
        Ok(self
            .lock()
            .users
            .values()
            .find(|u| u.email == email)
            .cloned())
    }

    async fn list(&self) -> Result<Vec<User>> {
        let mut users: Vec<User> = self.lock().users.values().cloned().collect();
        users.sort_by_key(|u| Reverse(u.created_at));
        Ok(users)
    }

    async fn set_role(&self, id: UserId, role: Role, now: DateTime<Utc>) -> Result<User> {
        let mut tables = self.lock();
        let user = tables
            .users
            .get_mut(&id)
            .ok_or(StoreError::not_found("User"))?;
        if user.role != role {
            user.role = role;
            user.updated_at = now;
        }
        Ok(user.clone())
    }
}

#[async_trait]
impl EventRepository for InMemoryStore {
    async fn create(
        &self,
        event: NewEvent,
        created_by: UserId,
        now: DateTime<Utc>,
    ) -> Result<EventSummary> {
        event.validate()?;
        let created = Event {
            id: EventId::new(),
            title: event.title,
            description: event.description,
            date: event.date,
            end_date: event.end_date,
            category: event.category,
            location: event.location,
            max_attendees: event.max_attendees,
            created_by,
            created_at: now,
            updated_at: now,
        };
        self.lock().events.insert(created.id, created.clone());
        Ok(EventSummary {
            event: created,
            current_attendees: 0,
        })
    }

    async fn get(&self, id: EventId) -> Result<Option<EventSummary>> {
        let tables = self.lock();
        Ok(tables.events.get(&id).map(|e| tables.summary(e)))
    }

    async fn list(&self, filter: &EventFilter) -> Result<Vec<EventSummary>> {
        let tables = self.lock();
        Ok(filter.apply(tables.summaries()))
    }

    async fn popular(&self, limit: u32) -> Result<Vec<EventSummary>> {
        let mut events = self.lock().summaries();
        events.sort_by_key(|s| (Reverse(s.current_attendees), s.event.date));
        events.truncate(limit as usize);
        Ok(events)
    }

    async fn update(
        &self,
        id: EventId,
        patch: EventPatch,
        now: DateTime<Utc>,
    ) -> Result<EventSummary> {
        let mut tables = self.lock();
        let current = tables
            .events
            .get(&id)
            .ok_or(StoreError::not_found("Event"))?;
        let patched = patch.apply(current, now)?;
        let attendees = tables.attendees(id);
        if patched.max_attendees < attendees {
            return Err(StoreError::Validation(format!(
                "maxAttendees cannot be below the current booking count ({attendees})"
            )));
        }
        tables.events.insert(id, patched.clone());
        Ok(EventSummary {
            event: patched,
            current_attendees: attendees,
        })
    }

    async fn delete(&self, id: EventId) -> Result<()> {
        let mut tables = self.lock();
        if tables.events.remove(&id).is_none() {
            return Err(StoreError::not_found("Event"));
        }
        tables.bookings.retain(|_, b| b.event_id != id);
        Ok(())
    }

    async fn list_with_creators(&self) -> Result<Vec<EventWithCreator>> {
        let tables = self.lock();
        let mut events: Vec<EventWithCreator> = tables
            .summaries()
            .into_iter()
            .map(|summary| {
                let creator = tables.users.get(&summary.event.created_by).map(|u| Creator {
                    id: u.id,
                    name: u.name.clone(),
                    email: u.email.clone(),
                });
                EventWithCreator { summary, creator }
            })
            .collect();
        events.sort_by_key(|e| e.summary.event.date);
        Ok(events)
    }

    async fn stats(&self, now: DateTime<Utc>) -> Result<Stats> {
        let tables = self.lock();
        Ok(Stats {
            total_users: tables.users.len() as u64,
            total_events: tables.events.len() as u64,
            total_bookings: tables.bookings.len() as u64,
            upcoming_events: tables.events.values().filter(|e| e.date >= now).count() as u64,
        })
    }
}

#[async_trait]
impl BookingRepository for InMemoryStore {
    async fn book(
        &self,
        event_id: EventId,
        user_id: UserId,
        now: DateTime<Utc>,
    ) -> Result<Booking> {
        let mut tables = self.lock();
        let capacity = tables
            .events
            .get(&event_id)
            .ok_or(StoreError::not_found("Event"))?
            .max_attendees;
        let already_booked = tables
            .bookings
            .values()
            .any(|b| b.event_id == event_id && b.user_id == user_id);
        let current = u64::from(tables.attendees(event_id));

        admit(already_booked, current, capacity).into_result()?;

        let booking = Booking {
            id: BookingId::new(),
            event_id,
            user_id,
            created_at: now,
            updated_at: now,
        };
        tables.bookings.insert(booking.id, booking.clone());
        Ok(booking)
    }

    async fn get(&self, id: BookingId) -> Result<Option<Booking>> {
        Ok(self.lock().bookings.get(&id).cloned())
    }

    async fn delete(&self, id: BookingId) -> Result<()> {
        self.lock()
            .bookings
            .remove(&id)
            .map(|_| ())
            .ok_or(StoreError::not_found("Booking"))
    }

    async fn list_for_user(&self, user_id: UserId) -> Result<Vec<BookingWithEvent>> {
        let tables = self.lock();
        let mut bookings: Vec<BookingWithEvent> = tables
            .bookings
            .values()
            .filter(|b| b.user_id == user_id)
            .filter_map(|b| {
                tables.events.get(&b.event_id).map(|e| BookingWithEvent {
                    booking: b.clone(),
                    event: e.clone(),
                })
            })
            .collect();
        bookings.sort_by_key(|b| b.event.date);
        Ok(bookings)
    }
}

#[async_trait]
impl HealthCheck for InMemoryStore {
    async fn ping(&self) -> Result<()> {
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::fixtures::{new_event, new_user};
    use crate::test_clock;
    use eventbook_core::environment::Clock;

    async fn seeded(capacity: u32) -> (InMemoryStore, EventId, UserId) {
        let store = InMemoryStore::new();
        let now = test_clock().now();
        let admin = UserRepository::create(&store, new_user("admin@example.com", Role::Admin), now)
            .await
            .unwrap();
        let mut event = new_event("Jazz Night", "Music", "Berlin");
        event.max_attendees = capacity;
        let event = EventRepository::create(&store, event, admin.id, now)
            .await
            .unwrap();
        (store, event.event.id, admin.id)
    }

    #[tokio::test]
    async fn test_duplicate_email_is_rejected() {
        let store = InMemoryStore::new();
        let now = test_clock().now();
        UserRepository::create(&store, new_user("a@example.com", Role::User), now)
            .await
            .unwrap();
        let err = UserRepository::create(&store, new_user("a@example.com", Role::User), now)
            .await
            .unwrap_err();
        assert_eq!(err, StoreError::EmailTaken);
    }

    #[tokio::test]
    async fn test_booking_admission_order() {
        let (store, event_id, user) = seeded(1).await;
        let now = test_clock().now();

        store.book(event_id, user, now).await.unwrap();
        assert_eq!(
            store.book(event_id, user, now).await.unwrap_err(),
            StoreError::AlreadyBooked
        );
        assert_eq!(
            store.book(event_id, UserId::new(), now).await.unwrap_err(),
            StoreError::EventFull
        );
        assert_eq!(
            store.book(EventId::new(), user, now).await.unwrap_err(),
            StoreError::not_found("Event")
        );
    }

    #[tokio::test]
    async fn test_concurrent_bookings_never_exceed_capacity() {
        let (store, event_id, _) = seeded(5).await;
        let now = test_clock().now();

        let mut tasks = Vec::new();
        for _ in 0..50 {
            let store = store.clone();
            tasks.push(tokio::spawn(async move {
                store.book(event_id, UserId::new(), now).await
            }));
        }
        let mut admitted = 0;
        for task in tasks {
            if task.await.unwrap().is_ok() {
                admitted += 1;
            }
        }
        assert_eq!(admitted, 5);
        assert_eq!(store.booking_count(event_id), 5);
    }

    #[tokio::test]
    async fn test_delete_event_cascades_to_bookings() {
        let (store, event_id, user) = seeded(3).await;
        let booking = store.book(event_id, user, test_clock().now()).await.unwrap();

        EventRepository::delete(&store, event_id).await.unwrap();
        assert!(BookingRepository::get(&store, booking.id).await.unwrap().is_none());
        assert_eq!(
            EventRepository::delete(&store, event_id).await.unwrap_err(),
            StoreError::not_found("Event")
        );
    }

    #[tokio::test]
    async fn test_update_rejects_capacity_below_bookings() {
        let (store, event_id, user) = seeded(3).await;
        let now = test_clock().now();
        store.book(event_id, user, now).await.unwrap();
        store.book(event_id, UserId::new(), now).await.unwrap();

        let patch = EventPatch {
            max_attendees: Some(1),
            ..EventPatch::default()
        };
        assert!(matches!(
            store.update(event_id, patch, now).await,
            Err(StoreError::Validation(_))
        ));

        let patch = EventPatch {
            max_attendees: Some(2),
            ..EventPatch::default()
        };
        let updated = store.update(event_id, patch, now).await.unwrap();
        assert!(updated.is_full());
    }

    #[tokio::test]
    async fn test_popular_orders_by_attendance() {
        let (store, quiet, admin) = seeded(10).await;
        let now = test_clock().now();
        let busy = EventRepository::create(&store, new_event("Rock", "Music", "Paris"), admin, now)
            .await
            .unwrap()
            .event
            .id;
        store.book(busy, UserId::new(), now).await.unwrap();

        let popular = store.popular(10).await.unwrap();
        assert_eq!(popular[0].event.id, busy);
        assert_eq!(popular[1].event.id, quiet);
        assert_eq!(store.popular(1).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_set_role_is_idempotent() {
        let store = InMemoryStore::new();
        let now = test_clock().now();
        let user = UserRepository::create(&store, new_user("u@example.com", Role::User), now)
            .await
            .unwrap();

        let once = store.set_role(user.id, Role::Admin, now).await.unwrap();
        let twice = store.set_role(user.id, Role::Admin, now).await.unwrap();
        assert_eq!(once, twice);
        assert_eq!(twice.role, Role::Admin);
    }
}
