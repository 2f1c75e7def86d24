//! Optimistic client cache.
//!
//! The cache holds the event list and the signed-in user's bookings. It keeps
//! the last state the server confirmed plus an ordered log of mutations still
//! waiting for an answer; the visible lists are the confirmed state with the
//! log replayed on top. Every mutation goes through the same steps:
//!
//! 1. **Speculate**: the change is appended to the log and shows up at once
//! 2. **Call**: an effect performs the API request
//! 3. **Settle**: on success the server's entity is folded into the confirmed
//!    state, on failure the change is simply dropped from the log; either way
//!    the view is rebuilt and a refresh effect re-fetches both lists
//!
//! Dropping one failed change leaves every other pending change in place,
//! so overlapping mutations can settle in any order.
//!
//! Refreshes are tagged with a generation that moves on every speculation and
//! settlement. Only a refresh issued in the current generation, arriving while
//! nothing is pending, replaces the confirmed state.

use crate::api::EventbookApi;
use chrono::{DateTime, Utc};
use eventbook_core::async_effect;
use eventbook_core::effect::Effect;
use eventbook_core::environment::Clock;
use eventbook_core::reducer::Reducer;
use eventbook_core::{
    Booking, BookingId, BookingWithEvent, Event, EventFilter, EventId, EventPatch, EventSummary,
    NewEvent, UserId,
};
use std::fmt;
use std::sync::Arc;

/// Identifies one in-flight mutation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct MutationId(pub u64);

impl fmt::Display for MutationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "m{}", self.0)
    }
}

/// A change to the cached lists, speculative or confirmed.
#[derive(Clone, Debug, PartialEq, Eq)]
enum Change {
    Book(Booking),
    Cancel(BookingId),
    Create(EventSummary),
    Patch {
        event_id: EventId,
        patch: EventPatch,
        at: DateTime<Utc>,
    },
    Replace(EventSummary),
    Delete(EventId),
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
struct Lists {
    events: Vec<EventSummary>,
    bookings: Vec<BookingWithEvent>,
}

impl Lists {
    fn event_mut(&mut self, id: EventId) -> Option<&mut EventSummary> {
        self.events.iter_mut().find(|e| e.event.id == id)
    }

    fn sync_booked_event(&mut self, event: &Event) {
        for booking in self.bookings.iter_mut().filter(|b| b.event.id == event.id) {
            booking.event = event.clone();
        }
    }

    /// Applying a change twice has the same effect as applying it once.
    fn apply(&mut self, change: &Change) {
        match change {
            Change::Book(booking) => {
                if self.bookings.iter().any(|b| b.booking.id == booking.id) {
                    return;
                }
                // An unknown event has no row to count against; refresh fills it in.
                let Some(summary) = self.event_mut(booking.event_id) else {
                    return;
                };
                summary.current_attendees = summary.current_attendees.saturating_add(1);
                let event = summary.event.clone();
                self.bookings.push(BookingWithEvent {
                    booking: booking.clone(),
                    event,
                });
            },
            Change::Cancel(booking_id) => {
                let removed = self
                    .bookings
                    .iter()
                    .position(|b| b.booking.id == *booking_id)
                    .map(|index| self.bookings.remove(index));
                if let Some(summary) = removed.and_then(|b| self.event_mut(b.booking.event_id)) {
                    summary.current_attendees = summary.current_attendees.saturating_sub(1);
                }
            },
            Change::Create(created) => {
                if self.event_mut(created.event.id).is_none() {
                    self.events.push(created.clone());
                }
            },
            Change::Patch {
                event_id,
                patch,
                at,
            } => {
                // An invalid patch is left for the server to reject.
                let patched = self
                    .event_mut(*event_id)
                    .and_then(|summary| patch.apply(&summary.event, *at).ok());
                if let Some(event) = patched {
                    self.sync_booked_event(&event);
                    if let Some(summary) = self.event_mut(*event_id) {
                        summary.event = event;
                    }
                }
            },
            Change::Replace(updated) => {
                self.sync_booked_event(&updated.event);
                if let Some(summary) = self.event_mut(updated.event.id) {
                    *summary = updated.clone();
                }
            },
            Change::Delete(event_id) => {
                self.events.retain(|e| e.event.id != *event_id);
                self.bookings.retain(|b| b.booking.event_id != *event_id);
            },
        }
        self.events.sort_by_key(|e| e.event.date);
        self.bookings.sort_by_key(|b| b.event.date);
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
struct Pending {
    id: MutationId,
    change: Change,
}

/// Cached server state.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CacheState {
    /// Events, ordered by start time
    pub events: Vec<EventSummary>,
    /// The user's bookings, ordered by event start time
    pub bookings: Vec<BookingWithEvent>,
    /// Message of the most recent failure
    pub last_error: Option<String>,
    confirmed: Lists,
    pending: Vec<Pending>,
    next_mutation: u64,
    generation: u64,
}

impl CacheState {
    /// Cache seeded with server data.
    #[must_use]
    pub fn new(events: Vec<EventSummary>, bookings: Vec<BookingWithEvent>) -> Self {
        let confirmed = Lists { events, bookings };
        Self {
            events: confirmed.events.clone(),
            bookings: confirmed.bookings.clone(),
            confirmed,
            ..Self::default()
        }
    }

    /// Number of mutations awaiting a server answer.
    #[must_use]
    pub fn pending_mutations(&self) -> usize {
        self.pending.len()
    }

    /// Cached event by ID.
    #[must_use]
    pub fn event(&self, id: EventId) -> Option<&EventSummary> {
        self.events.iter().find(|e| e.event.id == id)
    }

    /// The user's booking for an event, if any.
    #[must_use]
    pub fn booking_for(&self, event_id: EventId) -> Option<&BookingWithEvent> {
        self.bookings.iter().find(|b| b.booking.event_id == event_id)
    }

    fn view(&self) -> Lists {
        Lists {
            events: self.events.clone(),
            bookings: self.bookings.clone(),
        }
    }

    fn show(&mut self, lists: Lists) {
        self.events = lists.events;
        self.bookings = lists.bookings;
    }

    fn rebuild(&mut self) {
        let mut lists = self.confirmed.clone();
        for pending in &self.pending {
            lists.apply(&pending.change);
        }
        self.show(lists);
    }

    /// Log a speculative change and show it.
    fn begin(&mut self, change: Change) -> MutationId {
        let id = MutationId(self.next_mutation);
        self.next_mutation += 1;
        self.generation += 1;

        let mut lists = self.view();
        lists.apply(&change);
        self.show(lists);
        self.pending.push(Pending { id, change });
        id
    }

    fn take(&mut self, id: MutationId) -> Option<Change> {
        let index = self.pending.iter().position(|p| p.id == id)?;
        self.generation += 1;
        Some(self.pending.remove(index).change)
    }

    /// Fold the server's answer into the confirmed state. `None` confirms the
    /// speculative change as it was.
    fn settle(&mut self, id: MutationId, confirmed: Option<Change>) {
        let Some(speculative) = self.take(id) else {
            return;
        };
        self.confirmed.apply(&confirmed.unwrap_or(speculative));
        self.rebuild();
    }

    fn rollback(&mut self, id: MutationId) -> bool {
        if self.take(id).is_none() {
            return false;
        }
        self.rebuild();
        true
    }

    fn replace_confirmed(&mut self, events: Vec<EventSummary>, bookings: Vec<BookingWithEvent>) {
        self.confirmed = Lists { events, bookings };
        self.rebuild();
    }
}

/// Cache actions: mutation commands and the results their effects feed back.
#[derive(Clone, Debug)]
pub enum CacheAction {
    // Commands
    /// Book a seat for the signed-in user
    BookEvent {
        /// Event to book
        event_id: EventId,
    },
    /// Cancel one of the user's bookings
    CancelBooking {
        /// Booking to cancel
        booking_id: BookingId,
    },
    /// Create an event (admin)
    CreateEvent {
        /// Event data
        event: NewEvent,
    },
    /// Patch an event
    UpdateEvent {
        /// Event to change
        event_id: EventId,
        /// Fields to change
        patch: EventPatch,
    },
    /// Delete an event (admin)
    DeleteEvent {
        /// Event to delete
        event_id: EventId,
    },
    /// Re-fetch events and bookings
    Refresh,

    // Results
    /// The server admitted the booking
    BookingConfirmed {
        /// Mutation that requested it
        mutation: MutationId,
        /// Booking as stored
        booking: Booking,
    },
    /// The server cancelled the booking
    BookingCancelled {
        /// Mutation that requested it
        mutation: MutationId,
    },
    /// The server created the event
    EventCreated {
        /// Mutation that requested it
        mutation: MutationId,
        /// Event as stored
        event: EventSummary,
    },
    /// The server applied the patch
    EventUpdated {
        /// Mutation that requested it
        mutation: MutationId,
        /// Event as stored
        event: EventSummary,
    },
    /// The server deleted the event
    EventDeleted {
        /// Mutation that requested it
        mutation: MutationId,
    },
    /// The server rejected a mutation or could not be reached
    MutationFailed {
        /// Mutation to roll back
        mutation: MutationId,
        /// Error message
        error: String,
    },
    /// Fresh server data
    Refreshed {
        /// Cache generation the refresh was issued in
        generation: u64,
        /// Events
        events: Vec<EventSummary>,
        /// Bookings
        bookings: Vec<BookingWithEvent>,
    },
    /// The refresh failed; cached data is kept
    RefreshFailed {
        /// Error message
        error: String,
    },
}

/// Dependencies of [`CacheReducer`].
#[derive(Clone)]
pub struct CacheEnvironment {
    /// Server API
    pub api: Arc<dyn EventbookApi>,
    /// Clock for speculative timestamps
    pub clock: Arc<dyn Clock>,
    /// Signed-in user, owner of speculative bookings
    pub user_id: UserId,
    /// Query the event list is refreshed with
    pub filter: EventFilter,
}

impl CacheEnvironment {
    /// Environment with an unfiltered event list.
    #[must_use]
    pub fn new(api: Arc<dyn EventbookApi>, clock: Arc<dyn Clock>, user_id: UserId) -> Self {
        Self {
            api,
            clock,
            user_id,
            filter: EventFilter::default(),
        }
    }

    /// Refresh with the given filter.
    #[must_use]
    pub fn with_filter(mut self, filter: EventFilter) -> Self {
        self.filter = filter;
        self
    }
}

impl fmt::Debug for CacheEnvironment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CacheEnvironment")
            .field("user_id", &self.user_id)
            .field("filter", &self.filter)
            .finish_non_exhaustive()
    }
}

/// Reducer for the optimistic cache.
#[derive(Clone, Copy, Debug, Default)]
pub struct CacheReducer;

impl CacheReducer {
    fn refresh(state: &CacheState, env: &CacheEnvironment) -> Effect<CacheAction> {
        let api = Arc::clone(&env.api);
        let filter = env.filter.clone();
        let generation = state.generation;
        async_effect! {
            let events = api.list_events(&filter).await;
            let bookings = api.list_bookings().await;
            match (events, bookings) {
                (Ok(events), Ok(bookings)) => Some(CacheAction::Refreshed {
                    generation,
                    events,
                    bookings,
                }),
                (Err(error), _) | (_, Err(error)) => Some(CacheAction::RefreshFailed {
                    error: error.to_string(),
                }),
            }
        }
    }

    fn failed(mutation: MutationId, error: &impl fmt::Display) -> Option<CacheAction> {
        Some(CacheAction::MutationFailed {
            mutation,
            error: error.to_string(),
        })
    }
}

impl Reducer for CacheReducer {
    type State = CacheState;
    type Action = CacheAction;
    type Environment = CacheEnvironment;

    #[allow(clippy::too_many_lines)] // one arm per action
    fn reduce(
        &self,
        state: &mut CacheState,
        action: CacheAction,
        env: &CacheEnvironment,
    ) -> Vec<Effect<CacheAction>> {
        match action {
            // ========== Commands ==========
            CacheAction::BookEvent { event_id } => {
                let now = env.clock.now();
                let mutation = state.begin(Change::Book(Booking {
                    id: BookingId::new(),
                    event_id,
                    user_id: env.user_id,
                    created_at: now,
                    updated_at: now,
                }));

                let api = Arc::clone(&env.api);
                vec![async_effect! {
                    match api.book_event(event_id).await {
                        Ok(booking) => Some(CacheAction::BookingConfirmed { mutation, booking }),
                        Err(error) => Self::failed(mutation, &error),
                    }
                }]
            },

            CacheAction::CancelBooking { booking_id } => {
                let mutation = state.begin(Change::Cancel(booking_id));

                let api = Arc::clone(&env.api);
                vec![async_effect! {
                    match api.cancel_booking(booking_id).await {
                        Ok(()) => Some(CacheAction::BookingCancelled { mutation }),
                        Err(error) => Self::failed(mutation, &error),
                    }
                }]
            },

            CacheAction::CreateEvent { event } => {
                let now = env.clock.now();
                let mutation = state.begin(Change::Create(EventSummary {
                    event: Event {
                        id: EventId::new(),
                        title: event.title.clone(),
                        description: event.description.clone(),
                        date: event.date,
                        end_date: event.end_date,
                        category: event.category.clone(),
                        location: event.location.clone(),
                        max_attendees: event.max_attendees,
                        created_by: env.user_id,
                        created_at: now,
                        updated_at: now,
                    },
                    current_attendees: 0,
                }));

                let api = Arc::clone(&env.api);
                vec![async_effect! {
                    match api.create_event(&event).await {
                        Ok(created) => Some(CacheAction::EventCreated {
                            mutation,
                            event: created,
                        }),
                        Err(error) => Self::failed(mutation, &error),
                    }
                }]
            },

            CacheAction::UpdateEvent { event_id, patch } => {
                let mutation = state.begin(Change::Patch {
                    event_id,
                    patch: patch.clone(),
                    at: env.clock.now(),
                });

                let api = Arc::clone(&env.api);
                vec![async_effect! {
                    match api.update_event(event_id, &patch).await {
                        Ok(event) => Some(CacheAction::EventUpdated { mutation, event }),
                        Err(error) => Self::failed(mutation, &error),
                    }
                }]
            },

            CacheAction::DeleteEvent { event_id } => {
                let mutation = state.begin(Change::Delete(event_id));

                let api = Arc::clone(&env.api);
                vec![async_effect! {
                    match api.delete_event(event_id).await {
                        Ok(()) => Some(CacheAction::EventDeleted { mutation }),
                        Err(error) => Self::failed(mutation, &error),
                    }
                }]
            },

            CacheAction::Refresh => vec![Self::refresh(state, env)],

            // ========== Results ==========
            CacheAction::BookingConfirmed { mutation, booking } => {
                state.settle(mutation, Some(Change::Book(booking)));
                vec![Self::refresh(state, env)]
            },

            CacheAction::EventCreated { mutation, event } => {
                state.settle(mutation, Some(Change::Create(event)));
                vec![Self::refresh(state, env)]
            },

            CacheAction::EventUpdated { mutation, event } => {
                state.settle(mutation, Some(Change::Replace(event)));
                vec![Self::refresh(state, env)]
            },

            CacheAction::BookingCancelled { mutation } | CacheAction::EventDeleted { mutation } => {
                state.settle(mutation, None);
                vec![Self::refresh(state, env)]
            },

            CacheAction::MutationFailed { mutation, error } => {
                if state.rollback(mutation) {
                    tracing::warn!(%mutation, error = %error, "Mutation failed, rolled back");
                }
                state.last_error = Some(error);
                vec![Self::refresh(state, env)]
            },

            CacheAction::Refreshed {
                generation,
                events,
                bookings,
            } => {
                if generation == state.generation && state.pending.is_empty() {
                    state.replace_confirmed(events, bookings);
                } else {
                    tracing::debug!(
                        generation,
                        current = state.generation,
                        pending = state.pending.len(),
                        "Dropping stale refresh"
                    );
                }
                vec![Effect::None]
            },

            CacheAction::RefreshFailed { error } => {
                tracing::warn!(error = %error, "Cache refresh failed");
                state.last_error = Some(error);
                vec![Effect::None]
            },
        }
    }
}
