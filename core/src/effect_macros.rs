//! Declarative macros for ergonomic effect construction
//!
//! These macros reduce boilerplate when creating `Effect` variants that
//! wrap async API calls.

/// Create an `Effect::Future` from an async body
///
/// The body is moved into an `async move` block and must evaluate to
/// `Option<Action>`.
///
/// # Example
///
/// ```rust,ignore
/// use eventbook_core::async_effect;
///
/// let api = Arc::clone(&env.api);
/// async_effect! {
///     match api.book_event(event_id).await {
///         Ok(booking) => Some(CacheAction::BookingConfirmed { mutation, booking }),
///         Err(error) => Some(CacheAction::MutationFailed { mutation, error: error.to_string() }),
///     }
/// }
/// ```
#[macro_export]
macro_rules! async_effect {
    ($($body:tt)*) => {
        $crate::effect::Effect::Future(::std::boxed::Box::pin(async move { $($body)* }))
    };
}
