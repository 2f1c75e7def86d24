//! Booking API endpoints.
//!
//! - GET /api/bookings - The caller's bookings with their events
//! - POST /api/bookings - Book a seat
//! - DELETE /api/bookings/:id - Cancel (owner or admin)

use super::MessageResponse;
use crate::auth::middleware::SessionUser;
use crate::metrics;
use crate::server::state::AppState;
use axum::{Json, extract::State, http::StatusCode};
use eventbook_core::{Booking, BookingId, BookingWithEvent, EventId, UserId};
use eventbook_web::{
    error::AppError,
    extractors::{ApiJson, ApiPath, ApiQuery, CorrelationId},
};
use serde::Deserialize;

/// Query parameters for listing bookings.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListBookingsQuery {
    /// Another user's bookings (admins only)
    pub user_id: Option<UserId>,
}

/// Booking request body.
///
/// The booking user is always the session's user.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookRequest {
    /// Event to book
    pub event_id: EventId,
}

/// List bookings joined with their events, ordered by event start.
pub async fn list_bookings(
    State(state): State<AppState>,
    session: SessionUser,
    ApiQuery(query): ApiQuery<ListBookingsQuery>,
) -> Result<Json<Vec<BookingWithEvent>>, AppError> {
    let user_id = query.user_id.unwrap_or_else(|| session.user_id());
    if !session.can_manage(user_id) {
        return Err(AppError::forbidden("Cannot view another user's bookings"));
    }

    Ok(Json(state.bookings.list_for_user(user_id).await?))
}

/// Book a seat for the session's user.
///
/// # Status Codes
///
/// - 201 Created: booking admitted
/// - 400 Bad Request: the event is fully booked
/// - 404 Not Found: unknown event
/// - 409 Conflict: already booked
///
/// # Example
///
/// ```bash
/// curl -X POST http://localhost:8080/api/bookings \
///   -H "Authorization: Bearer <session_token>" \
///   -H "Content-Type: application/json" \
///   -d '{"eventId": "550e8400-e29b-41d4-a716-446655440000"}'
/// ```
pub async fn create_booking(
    State(state): State<AppState>,
    session: SessionUser,
    correlation_id: CorrelationId,
    ApiJson(request): ApiJson<BookRequest>,
) -> Result<(StatusCode, Json<Booking>), AppError> {
    let result = state
        .bookings
        .book(request.event_id, session.user_id(), state.clock.now())
        .await;

    metrics::record_booking_attempt(metrics::booking_outcome(
        result.as_ref().map(|_| ()),
    ));

    match result {
        Ok(booking) => {
            tracing::info!(
                correlation_id = %correlation_id.0,
                booking_id = %booking.id,
                event_id = %booking.event_id,
                user_id = %booking.user_id,
                "Booking admitted"
            );
            Ok((StatusCode::CREATED, Json(booking)))
        },
        Err(e) => {
            tracing::info!(
                correlation_id = %correlation_id.0,
                event_id = %request.event_id,
                user_id = %session.user_id(),
                reason = %e,
                "Booking rejected"
            );
            Err(e.into())
        },
    }
}

/// Cancel a booking.
pub async fn cancel_booking(
    State(state): State<AppState>,
    session: SessionUser,
    ApiPath(booking_id): ApiPath<BookingId>,
) -> Result<Json<MessageResponse>, AppError> {
    let booking = state
        .bookings
        .get(booking_id)
        .await?
        .ok_or_else(|| AppError::not_found("Booking"))?;

    if !session.can_manage(booking.user_id) {
        return Err(AppError::forbidden("Cannot cancel another user's booking"));
    }

    state.bookings.delete(booking_id).await?;

    tracing::info!(
        booking_id = %booking_id,
        event_id = %booking.event_id,
        user_id = %session.user_id(),
        "Booking cancelled"
    );
    metrics::record_booking_cancelled();

    Ok(Json(MessageResponse::new("Booking cancelled successfully")))
}
