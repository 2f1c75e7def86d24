//! # Eventbook Client
//!
//! HTTP client for the Eventbook API and an optimistic cache built on the
//! reducer/store runtime.
//!
//! - [`api`]: the [`EventbookApi`] trait and its `reqwest` implementation
//! - [`cache`]: speculate, call, then confirm or roll back
//!
//! ## Example
//!
//! ```ignore
//! use eventbook_client::{CacheAction, HttpApi, cache_store};
//!
//! let mut api = HttpApi::new("http://localhost:8080");
//! let user = api.login("ada@example.com", "secret123").await?;
//! let store = cache_store(Arc::new(api), user.id);
//!
//! store.send(CacheAction::Refresh).await.wait().await;
//! let mut handle = store.send(CacheAction::BookEvent { event_id }).await;
//! // The seat is already counted here, before the server answers
//! handle.wait().await;
//! ```

pub mod api;
pub mod cache;
pub mod error;

pub use api::{EventbookApi, HttpApi};
pub use cache::{CacheAction, CacheEnvironment, CacheReducer, CacheState, MutationId};
pub use error::ApiError;

use eventbook_core::UserId;
use eventbook_core::environment::SystemClock;
use eventbook_runtime::Store;
use std::sync::Arc;

/// Store running the optimistic cache.
pub type CacheStore = Store<CacheState, CacheAction, CacheEnvironment, CacheReducer>;

/// Empty cache for `user_id` using wall-clock time.
#[must_use]
pub fn cache_store(api: Arc<dyn EventbookApi>, user_id: UserId) -> CacheStore {
    Store::new(
        CacheState::default(),
        CacheReducer,
        CacheEnvironment::new(api, Arc::new(SystemClock), user_id),
    )
}
