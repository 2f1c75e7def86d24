//! Request authentication.

pub mod middleware;

pub use middleware::{RequireAdmin, SessionUser};
