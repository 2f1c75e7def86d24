//! Authentication configuration.
//!
//! Configuration values are provided by the application, not hardcoded.

use chrono::Duration;

/// Default JWT secret. Only suitable for local development.
pub const DEV_JWT_SECRET: &str = "dev-secret-change-in-production";

/// Session and password settings.
#[derive(Debug, Clone)]
pub struct AuthConfig {
    /// HMAC key for session tokens.
    pub jwt_secret: String,

    /// Session lifetime (token `exp` and cookie `Max-Age`).
    ///
    /// Default: 7 days
    pub session_ttl: Duration,

    /// Add the `Secure` attribute to the session cookie.
    pub cookie_secure: bool,

    /// Registration code that grants the admin role. `None` disables admin
    /// self-registration.
    pub admin_code: Option<String>,

    /// Argon2 memory cost in KiB.
    pub argon2_memory_kib: u32,

    /// Argon2 iteration count.
    pub argon2_iterations: u32,
}

impl AuthConfig {
    /// Create configuration with the given secret and defaults elsewhere.
    #[must_use]
    pub fn new(jwt_secret: impl Into<String>) -> Self {
        Self {
            jwt_secret: jwt_secret.into(),
            ..Self::default()
        }
    }

    /// Set session lifetime.
    #[must_use]
    pub const fn with_session_ttl(mut self, ttl: Duration) -> Self {
        self.session_ttl = ttl;
        self
    }

    /// Set the cookie `Secure` flag.
    #[must_use]
    pub const fn with_cookie_secure(mut self, secure: bool) -> Self {
        self.cookie_secure = secure;
        self
    }

    /// Set the admin registration code.
    #[must_use]
    pub fn with_admin_code(mut self, code: Option<String>) -> Self {
        self.admin_code = code.filter(|c| !c.is_empty());
        self
    }

    /// Set Argon2 cost parameters.
    ///
    /// Tests use small values to keep hashing fast.
    #[must_use]
    pub const fn with_argon2_cost(mut self, memory_kib: u32, iterations: u32) -> Self {
        self.argon2_memory_kib = memory_kib;
        self.argon2_iterations = iterations;
        self
    }

    /// Whether the secret is still the development default.
    #[must_use]
    pub fn uses_dev_secret(&self) -> bool {
        self.jwt_secret == DEV_JWT_SECRET
    }

    /// Whether `code` matches the configured admin code.
    #[must_use]
    pub fn is_admin_code(&self, code: &str) -> bool {
        self.admin_code
            .as_deref()
            .is_some_and(|expected| constant_time_eq::constant_time_eq(expected.as_bytes(), code.as_bytes()))
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret: DEV_JWT_SECRET.to_string(),
            session_ttl: Duration::days(7),
            cookie_secure: false,
            admin_code: None,
            argon2_memory_kib: argon2::Params::DEFAULT_M_COST,
            argon2_iterations: argon2::Params::DEFAULT_T_COST,
        }
    }
}
