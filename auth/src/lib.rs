//! # Eventbook Authentication & Authorization
//!
//! Session and credential primitives for Eventbook.
//!
//! ## Features
//!
//! - **Session tokens**: HS256-signed, carrying user ID, email and role
//! - **Cookies**: `HttpOnly`, `SameSite=Strict` session cookie with a
//!   Bearer-header fallback
//! - **Passwords**: Argon2id hashing with per-hash random salts
//!
//! ## Example
//!
//! ```rust,ignore
//! use eventbook_auth::{AuthConfig, TokenSigner, cookie};
//!
//! let config = AuthConfig::new(secret);
//! let signer = TokenSigner::new(&config.jwt_secret, config.session_ttl);
//!
//! // Login
//! let token = signer.issue(&user, clock.now())?;
//! let set_cookie = cookie::session_cookie(&token, &config);
//!
//! // Later request
//! let token = cookie::extract_tokens(&headers).into_iter().next()?;
//! let claims = signer.verify(&token, clock.now())?;
//! assert!(claims.is_admin());
//! ```

#![deny(missing_docs)]
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]
#![deny(clippy::todo)]
#![deny(clippy::unimplemented)]

// Public modules
pub mod config;
pub mod cookie;
pub mod error;
pub mod password;
pub mod token;

// Re-export main types for convenience
pub use config::AuthConfig;
pub use error::{AuthError, Result};
pub use password::{Passwords, validate_password};
pub use token::{Claims, TokenSigner};
