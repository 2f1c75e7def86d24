//! # Eventbook Core
//!
//! Domain types, business rules and repository traits for the Eventbook
//! event discovery and booking service.
//!
//! ## Core Concepts
//!
//! - **Event**: a bookable occurrence with a time window and attendee capacity
//! - **Booking**: a reservation linking one user to one event
//! - **Role**: authorization level, `user` or `admin`
//! - **Reducer**: Pure function `(State, Action, Environment) → (State, Effects)`,
//!   used by the client-side optimistic cache
//! - **Effect**: Side effect descriptions (not execution)
//!
//! ## Architecture Principles
//!
//! - Functional Core, Imperative Shell
//! - Storage behind traits ([`repository`]) so HTTP handlers never see SQL
//! - Admission rules ([`booking::admit`]) shared by every storage backend
//!
//! ## Example
//!
//! ```
//! use eventbook_core::booking::{admit, Admission};
//!
//! // Third booking for a two-seat event
//! assert_eq!(admit(false, 2, 2), Admission::EventFull);
//! assert_eq!(admit(false, 1, 2), Admission::Admitted);
//! ```

// Re-export commonly used types
pub use chrono::{DateTime, Utc};
pub use serde::{Deserialize, Serialize};

pub mod booking;
pub mod effect_macros;
pub mod error;
pub mod filter;
pub mod repository;
pub mod types;

pub use error::{Result, StoreError};
pub use filter::EventFilter;
pub use types::*;

/// Reducer module - The core trait for client-side state logic
///
/// Reducers are pure functions: `(State, Action, Environment) → (State, Effects)`
///
/// They contain all state transition logic and are deterministic and testable.
pub mod reducer {
    use super::effect::Effect;

    /// The Reducer trait - core abstraction for state transitions
    ///
    /// # Type Parameters
    ///
    /// - `State`: The state this reducer operates on
    /// - `Action`: The action type this reducer processes
    /// - `Environment`: The injected dependencies this reducer needs
    ///
    /// # Example
    ///
    /// ```ignore
    /// impl Reducer for CacheReducer {
    ///     type State = CacheState;
    ///     type Action = CacheAction;
    ///     type Environment = CacheEnvironment;
    ///
    ///     fn reduce(
    ///         &self,
    ///         state: &mut CacheState,
    ///         action: CacheAction,
    ///         env: &CacheEnvironment,
    ///     ) -> Vec<Effect<CacheAction>> {
    ///         match action {
    ///             CacheAction::Refreshed { events, bookings } => {
    ///                 state.events = events;
    ///                 state.bookings = bookings;
    ///                 vec![Effect::None]
    ///             }
    ///             _ => vec![Effect::None],
    ///         }
    ///     }
    /// }
    /// ```
    pub trait Reducer {
        /// The state type this reducer operates on
        type State;

        /// The action type this reducer processes
        type Action;

        /// The environment type with injected dependencies
        type Environment;

        /// Reduce an action into state changes and effects
        ///
        /// This is a pure function that:
        /// 1. Validates the action
        /// 2. Updates state in place
        /// 3. Returns effect descriptions to be executed
        fn reduce(
            &self,
            state: &mut Self::State,
            action: Self::Action,
            env: &Self::Environment,
        ) -> Vec<Effect<Self::Action>>;
    }
}

/// Effect module - Side effect descriptions
///
/// Effects describe side effects to be performed by the runtime.
/// They are values, not execution.
pub mod effect {
    use std::future::Future;
    use std::pin::Pin;

    /// Effect type - describes a side effect to be executed
    ///
    /// Effects are NOT executed immediately. They are descriptions of what should happen,
    /// returned from reducers and executed by the Store runtime.
    pub enum Effect<Action> {
        /// No-op effect
        None,

        /// Arbitrary async computation
        ///
        /// Returns `Option<Action>` - if Some, the action is fed back into the reducer
        Future(Pin<Box<dyn Future<Output = Option<Action>> + Send>>),
    }

    impl<Action> std::fmt::Debug for Effect<Action> {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            match self {
                Effect::None => write!(f, "Effect::None"),
                Effect::Future(_) => write!(f, "Effect::Future(<future>)"),
            }
        }
    }

    impl<Action> Effect<Action> {
        /// Whether this effect does nothing.
        #[must_use]
        pub const fn is_none(&self) -> bool {
            matches!(self, Effect::None)
        }
    }
}

/// Environment module - Dependency injection traits
pub mod environment {
    use chrono::{DateTime, Utc};

    /// Clock trait - abstracts time operations for testability
    ///
    /// # Examples
    ///
    /// ```
    /// use eventbook_core::environment::{Clock, SystemClock};
    ///
    /// let clock = SystemClock;
    /// let _now = clock.now();
    /// ```
    pub trait Clock: Send + Sync {
        /// Get the current time
        fn now(&self) -> DateTime<Utc>;
    }

    /// Wall-clock time.
    #[derive(Debug, Clone, Copy, Default)]
    pub struct SystemClock;

    impl Clock for SystemClock {
        fn now(&self) -> DateTime<Utc> {
            Utc::now()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::effect::Effect;

    #[test]
    fn test_effect_is_none() {
        assert!(Effect::<()>::None.is_none());
        let future: Effect<()> = Effect::Future(Box::pin(async { None }));
        assert!(!future.is_none());
    }
}
