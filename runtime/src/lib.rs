//! # Eventbook Runtime
//!
//! Store runtime that coordinates reducer execution and effect handling.
//!
//! ## Core Components
//!
//! - **Store**: owns the state, runs the reducer and executes effects
//! - **Effect Executor**: executes effect descriptions and feeds produced
//!   actions back into the reducer
//! - **`EffectHandle`**: lets callers wait until the whole effect cascade of
//!   one action has settled
//!
//! ## Example
//!
//! ```ignore
//! use eventbook_runtime::Store;
//!
//! let store = Store::new(CacheState::default(), CacheReducer, environment);
//!
//! // Send an action and wait for its effects (API call, refresh, ...)
//! let mut handle = store.send(CacheAction::BookEvent { event_id }).await;
//! handle.wait().await;
//!
//! // Read state
//! let bookings = store.state(|s| s.bookings.len()).await;
//! ```

use eventbook_core::{effect::Effect, reducer::Reducer};
use futures::future::{BoxFuture, join_all};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;

/// Error types for the Store runtime
pub mod error {
    use thiserror::Error;

    /// Errors that can occur while waiting on a Store
    #[derive(Error, Debug, Clone, PartialEq, Eq)]
    pub enum StoreError {
        /// Timed out waiting for an effect cascade
        #[error("Timeout waiting for effects")]
        Timeout,
    }
}

pub use error::StoreError;

// ============================================================================
// Effect handle
// ============================================================================

/// Handle to the effect cascade started by one `send`.
///
/// Dropping the handle does not cancel the effects.
#[derive(Debug)]
pub struct EffectHandle {
    task: Option<JoinHandle<()>>,
}

impl EffectHandle {
    /// Handle for an action whose effects were all `Effect::None`.
    #[must_use]
    pub const fn completed() -> Self {
        Self { task: None }
    }

    /// Whether there is nothing left to wait for.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.task.as_ref().is_none_or(JoinHandle::is_finished)
    }

    /// Wait until every effect, and every action they fed back, has settled.
    pub async fn wait(&mut self) {
        if let Some(task) = self.task.take() {
            if let Err(error) = task.await {
                tracing::error!(error = %error, "Effect task failed");
                metrics::counter!("store.effects.panicked").increment(1);
            }
        }
    }

    /// Like [`EffectHandle::wait`] with an upper bound.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Timeout`] if the cascade is still running after
    /// `timeout`. The effects keep running.
    pub async fn wait_with_timeout(&mut self, timeout: Duration) -> Result<(), StoreError> {
        tokio::time::timeout(timeout, self.wait())
            .await
            .map_err(|_| StoreError::Timeout)
    }
}

// ============================================================================
// Store
// ============================================================================

/// Store module - The runtime for reducers
pub mod store {
    use super::{Arc, BoxFuture, Effect, EffectHandle, Reducer, RwLock, join_all};

    /// The Store - runtime coordinator for a reducer
    ///
    /// The Store manages:
    /// 1. State (behind `RwLock` for concurrent access)
    /// 2. Reducer (business logic)
    /// 3. Environment (injected dependencies)
    /// 4. Effect execution (with feedback loop)
    ///
    /// # Type Parameters
    ///
    /// - `S`: State type
    /// - `A`: Action type
    /// - `E`: Environment type
    /// - `R`: Reducer implementation
    pub struct Store<S, A, E, R>
    where
        R: Reducer<State = S, Action = A, Environment = E>,
    {
        state: Arc<RwLock<S>>,
        reducer: Arc<R>,
        environment: Arc<E>,
    }

    impl<S, A, E, R> Clone for Store<S, A, E, R>
    where
        R: Reducer<State = S, Action = A, Environment = E>,
    {
        fn clone(&self) -> Self {
            Self {
                state: Arc::clone(&self.state),
                reducer: Arc::clone(&self.reducer),
                environment: Arc::clone(&self.environment),
            }
        }
    }

    impl<S, A, E, R> Store<S, A, E, R>
    where
        R: Reducer<State = S, Action = A, Environment = E> + Send + Sync + 'static,
        A: Send + 'static,
        S: Send + Sync + 'static,
        E: Send + Sync + 'static,
    {
        /// Create a new store with initial state, reducer, and environment
        #[must_use]
        pub fn new(initial_state: S, reducer: R, environment: E) -> Self {
            Self {
                state: Arc::new(RwLock::new(initial_state)),
                reducer: Arc::new(reducer),
                environment: Arc::new(environment),
            }
        }

        /// Send an action to the store
        ///
        /// 1. Acquires a write lock on state
        /// 2. Calls reducer with (state, action, environment)
        /// 3. Spawns execution of the returned effects
        /// 4. Actions produced by effects are reduced in turn (feedback loop)
        ///
        /// `send()` returns once the reducer has run. The state change made by
        /// the reducer is visible immediately; use the returned handle to wait
        /// for the effects.
        #[tracing::instrument(skip(self, action), name = "store_send")]
        pub async fn send(&self, action: A) -> EffectHandle {
            let effects = self.reduce(action).await;
            if effects.iter().all(Effect::is_none) {
                metrics::counter!("store.effects.executed", "type" => "none")
                    .increment(effects.len() as u64);
                return EffectHandle::completed();
            }

            let store = self.clone();
            let task = tokio::spawn(async move { store.execute_all(effects).await });
            EffectHandle { task: Some(task) }
        }

        /// Read current state via a closure
        pub async fn state<F, T>(&self, f: F) -> T
        where
            F: FnOnce(&S) -> T,
        {
            let state = self.state.read().await;
            f(&*state)
        }

        async fn reduce(&self, action: A) -> Vec<Effect<A>> {
            let mut state = self.state.write().await;
            metrics::counter!("store.actions.processed").increment(1);
            self.reducer.reduce(&mut state, action, &self.environment)
        }

        /// Execute effects concurrently, feeding produced actions back into
        /// the reducer.
        fn execute_all(&self, effects: Vec<Effect<A>>) -> BoxFuture<'static, ()> {
            let store = self.clone();
            Box::pin(async move {
                join_all(effects.into_iter().map(|effect| store.execute_effect(effect))).await;
            })
        }

        async fn execute_effect(&self, effect: Effect<A>) {
            match effect {
                Effect::None => {
                    metrics::counter!("store.effects.executed", "type" => "none").increment(1);
                },
                Effect::Future(fut) => {
                    metrics::counter!("store.effects.executed", "type" => "future").increment(1);
                    if let Some(action) = fut.await {
                        tracing::trace!("Effect::Future produced an action");
                        let effects = self.reduce(action).await;
                        self.execute_all(effects).await;
                    }
                },
            }
        }
    }
}

pub use store::Store;
