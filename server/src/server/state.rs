//! Application state for the Eventbook HTTP server.
//!
//! Contains all shared resources needed by HTTP handlers:
//! - Repositories (users, events, bookings) behind trait objects
//! - Session token signer and password hasher
//! - Clock for timestamps and token expiry

use axum::extract::FromRef;
use eventbook_auth::{AuthConfig, Passwords, TokenSigner};
use eventbook_core::environment::{Clock, SystemClock};
use eventbook_core::repository::{
    BookingRepository, EventRepository, HealthCheck, UserRepository,
};
use std::sync::Arc;

/// Application state shared across all HTTP handlers.
///
/// Cloned (cheaply via `Arc`) for each request. Handlers never see the
/// concrete backend: production wires `PostgresStore`, tests wire the
/// in-memory store.
#[derive(Clone)]
pub struct AppState {
    /// Account storage
    pub users: Arc<dyn UserRepository>,
    /// Event storage and queries
    pub events: Arc<dyn EventRepository>,
    /// Booking storage and admission
    pub bookings: Arc<dyn BookingRepository>,
    /// Readiness check
    pub health: Arc<dyn HealthCheck>,
    /// Session and cookie settings
    pub auth: Arc<AuthConfig>,
    /// Session token signer
    pub signer: TokenSigner,
    /// Argon2 hasher
    pub passwords: Passwords,
    /// Time source
    pub clock: Arc<dyn Clock>,
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState").finish_non_exhaustive()
    }
}

impl AppState {
    /// Build state from one backend implementing every repository trait.
    ///
    /// # Errors
    ///
    /// Returns an error if the Argon2 cost in `auth` is invalid.
    pub fn new<B>(backend: B, auth: AuthConfig) -> eventbook_auth::Result<Self>
    where
        B: UserRepository + EventRepository + BookingRepository + HealthCheck + Clone,
    {
        let passwords = Passwords::new(&auth)?;
        let signer = TokenSigner::new(&auth.jwt_secret, auth.session_ttl);
        Ok(Self {
            users: Arc::new(backend.clone()),
            events: Arc::new(backend.clone()),
            bookings: Arc::new(backend.clone()),
            health: Arc::new(backend),
            auth: Arc::new(auth),
            signer,
            passwords,
            clock: Arc::new(SystemClock),
        })
    }

    /// Replace the clock (tests use a fixed one).
    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }
}

impl FromRef<AppState> for Arc<AuthConfig> {
    fn from_ref(app_state: &AppState) -> Self {
        Arc::clone(&app_state.auth)
    }
}
