//! Event API endpoints.
//!
//! - GET /api/events - Filtered list (requires session)
//! - POST /api/events - Create (admin)
//! - GET /api/events/popular - Most booked events
//! - GET /api/events/:id - One event with its attendee count
//! - PATCH /api/events/:id - Partial update (admin or creator)
//! - DELETE /api/events/:id - Delete with its bookings (admin)

use super::MessageResponse;
use crate::auth::middleware::{RequireAdmin, SessionUser};
use crate::metrics;
use crate::server::state::AppState;
use axum::{Json, extract::State, http::StatusCode};
use chrono::{DateTime, Utc};
use eventbook_core::{EventFilter, EventId, EventPatch, EventSummary, NewEvent, UserId};
use eventbook_web::{
    error::AppError,
    extractors::{ApiJson, ApiPath, ApiQuery},
};
use serde::Deserialize;

/// Default and maximum size of the popular list.
const POPULAR_DEFAULT_LIMIT: u32 = 10;
const POPULAR_MAX_LIMIT: u32 = 100;

// ============================================================================
// Query Types
// ============================================================================

/// Query parameters for listing events.
///
/// `category` and `location` are comma-separated lists.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListEventsQuery {
    /// Allowed categories
    pub category: Option<String>,
    /// Allowed locations
    pub location: Option<String>,
    /// Earliest start time (inclusive)
    pub start_date: Option<DateTime<Utc>>,
    /// Latest start time (inclusive)
    pub end_date: Option<DateTime<Utc>>,
    /// Substring of title or description
    pub search: Option<String>,
    /// Creator's user ID
    pub created_by: Option<UserId>,
    /// Maximum number of results
    pub limit: Option<u32>,
}

impl From<ListEventsQuery> for EventFilter {
    fn from(query: ListEventsQuery) -> Self {
        let mut filter = Self {
            start: query.start_date,
            end: query.end_date,
            created_by: query.created_by,
            limit: query.limit,
            ..Self::default()
        };
        if let Some(categories) = query.category {
            filter = filter.with_categories(Self::split_list(&categories));
        }
        if let Some(locations) = query.location {
            filter = filter.with_locations(Self::split_list(&locations));
        }
        if let Some(search) = query.search {
            filter = filter.with_search(search);
        }
        filter
    }
}

/// Query parameters for the popular list.
#[derive(Debug, Default, Deserialize)]
pub struct PopularQuery {
    /// Number of events (default 10, clamped to 1..=100)
    pub limit: Option<u32>,
}

// ============================================================================
// Handlers
// ============================================================================

/// List events matching the query, ordered by start time.
///
/// # Example
///
/// ```bash
/// curl "http://localhost:8080/api/events?category=Music,Art&search=Jazz" \
///   -H "Authorization: Bearer <session_token>"
/// ```
pub async fn list_events(
    State(state): State<AppState>,
    _session: SessionUser,
    ApiQuery(query): ApiQuery<ListEventsQuery>,
) -> Result<Json<Vec<EventSummary>>, AppError> {
    let filter = EventFilter::from(query);
    let events = state.events.list(&filter).await?;
    tracing::debug!(count = events.len(), "Listed events");
    Ok(Json(events))
}

/// Create an event. The admin becomes its creator.
///
/// # Example
///
/// ```bash
/// curl -X POST http://localhost:8080/api/events \
///   -H "Authorization: Bearer <session_token>" \
///   -H "Content-Type: application/json" \
///   -d '{
///     "title": "Jazz Night",
///     "description": "Live quartet",
///     "date": "2025-06-01T19:00:00Z",
///     "category": "Music",
///     "location": "Berlin",
///     "maxAttendees": 50
///   }'
/// ```
pub async fn create_event(
    State(state): State<AppState>,
    admin: RequireAdmin,
    ApiJson(request): ApiJson<NewEvent>,
) -> Result<(StatusCode, Json<EventSummary>), AppError> {
    request.validate()?;

    let event = state
        .events
        .create(request, admin.user_id(), state.clock.now())
        .await?;

    tracing::info!(event_id = %event.event.id, created_by = %admin.user_id(), "Event created");
    metrics::record_event_created();

    Ok((StatusCode::CREATED, Json(event)))
}

/// Most booked events first. Public.
pub async fn popular_events(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<PopularQuery>,
) -> Result<Json<Vec<EventSummary>>, AppError> {
    let limit = query
        .limit
        .unwrap_or(POPULAR_DEFAULT_LIMIT)
        .clamp(1, POPULAR_MAX_LIMIT);
    Ok(Json(state.events.popular(limit).await?))
}

/// Get one event. Public.
pub async fn get_event(
    State(state): State<AppState>,
    ApiPath(event_id): ApiPath<EventId>,
) -> Result<Json<EventSummary>, AppError> {
    state
        .events
        .get(event_id)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::not_found("Event"))
}

/// Partially update an event.
///
/// Admins may edit any event; other users only events they created.
pub async fn update_event(
    State(state): State<AppState>,
    session: SessionUser,
    ApiPath(event_id): ApiPath<EventId>,
    ApiJson(patch): ApiJson<EventPatch>,
) -> Result<Json<EventSummary>, AppError> {
    let current = state
        .events
        .get(event_id)
        .await?
        .ok_or_else(|| AppError::not_found("Event"))?;

    if !session.can_manage(current.event.created_by) {
        tracing::warn!(
            user_id = %session.user_id(),
            event_id = %event_id,
            "Event edit denied"
        );
        return Err(AppError::forbidden("Only admins or the event's creator can edit it"));
    }

    let updated = state
        .events
        .update(event_id, patch, state.clock.now())
        .await?;
    tracing::info!(event_id = %event_id, user_id = %session.user_id(), "Event updated");
    Ok(Json(updated))
}

/// Delete an event and its bookings.
pub async fn delete_event(
    State(state): State<AppState>,
    admin: RequireAdmin,
    ApiPath(event_id): ApiPath<EventId>,
) -> Result<Json<MessageResponse>, AppError> {
    state.events.delete(event_id).await?;

    tracing::info!(event_id = %event_id, admin_id = %admin.user_id(), "Event deleted");
    metrics::record_event_deleted();

    Ok(Json(MessageResponse::new("Event deleted successfully")))
}
