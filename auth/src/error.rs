//! Error types for authentication and authorization operations.

use thiserror::Error;

/// Result type alias for authentication operations.
pub type Result<T> = std::result::Result<T, AuthError>;

/// Error taxonomy for sessions, tokens and passwords.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthError {
    // ═══════════════════════════════════════════════════════════
    // Authentication Errors
    // ═══════════════════════════════════════════════════════════

    /// Email/password pair does not match an account.
    #[error("Invalid credentials")]
    InvalidCredentials,

    /// No session token on the request.
    #[error("Not authenticated")]
    MissingToken,

    /// Token is malformed or its signature does not verify.
    #[error("Invalid session token")]
    InvalidToken,

    /// Token signature is valid but `exp` has passed.
    #[error("Session has expired")]
    TokenExpired,

    // ═══════════════════════════════════════════════════════════
    // Authorization Errors
    // ═══════════════════════════════════════════════════════════

    /// Caller lacks the required role or ownership.
    #[error("Insufficient permissions: {required}")]
    InsufficientPermissions {
        /// Required permission that was missing
        required: String,
    },

    // ═══════════════════════════════════════════════════════════
    // Registration
    // ═══════════════════════════════════════════════════════════

    /// Password does not meet the length policy.
    #[error("Password must be at least {min} characters")]
    WeakPassword {
        /// Minimum accepted length
        min: usize,
    },

    // ═══════════════════════════════════════════════════════════
    // System Errors
    // ═══════════════════════════════════════════════════════════

    /// Hashing or parsing a password hash failed.
    #[error("Password hashing failed: {0}")]
    PasswordHash(String),

    /// Signing a token failed.
    #[error("Token signing failed: {0}")]
    Signing(String),
}

impl AuthError {
    /// Returns `true` if the caller should be treated as unauthenticated (401).
    ///
    /// # Examples
    ///
    /// ```
    /// # use eventbook_auth::AuthError;
    /// assert!(AuthError::TokenExpired.is_unauthenticated());
    /// assert!(!AuthError::WeakPassword { min: 6 }.is_unauthenticated());
    /// ```
    #[must_use]
    pub const fn is_unauthenticated(&self) -> bool {
        matches!(
            self,
            Self::InvalidCredentials | Self::MissingToken | Self::InvalidToken | Self::TokenExpired
        )
    }

    /// Returns `true` if this error is due to invalid user input.
    #[must_use]
    pub const fn is_user_error(&self) -> bool {
        matches!(
            self,
            Self::InvalidCredentials | Self::WeakPassword { .. } | Self::InsufficientPermissions { .. }
        )
    }

    /// Shorthand for [`AuthError::InsufficientPermissions`].
    #[must_use]
    pub fn forbidden(required: impl Into<String>) -> Self {
        Self::InsufficientPermissions {
            required: required.into(),
        }
    }
}
