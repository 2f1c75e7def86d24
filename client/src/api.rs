//! Eventbook API client.
//!
//! [`EventbookApi`] is the seam the optimistic cache talks to. [`HttpApi`]
//! implements it over `reqwest`; tests substitute an in-process fake.

use crate::error::ApiError;
use async_trait::async_trait;
use eventbook_auth::cookie::token_from_cookie_header;
use eventbook_core::{
    Booking, BookingId, BookingWithEvent, EventFilter, EventId, EventPatch, EventSummary,
    NewEvent, User,
};
use reqwest::header::SET_COOKIE;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

/// Operations the client cache performs against the server.
#[async_trait]
pub trait EventbookApi: Send + Sync {
    /// `GET /api/events`
    async fn list_events(&self, filter: &EventFilter) -> Result<Vec<EventSummary>, ApiError>;

    /// `GET /api/bookings` for the signed-in user
    async fn list_bookings(&self) -> Result<Vec<BookingWithEvent>, ApiError>;

    /// `POST /api/bookings`
    async fn book_event(&self, event_id: EventId) -> Result<Booking, ApiError>;

    /// `DELETE /api/bookings/{id}`
    async fn cancel_booking(&self, booking_id: BookingId) -> Result<(), ApiError>;

    /// `POST /api/events`
    async fn create_event(&self, event: &NewEvent) -> Result<EventSummary, ApiError>;

    /// `PATCH /api/events/{id}`
    async fn update_event(
        &self,
        event_id: EventId,
        patch: &EventPatch,
    ) -> Result<EventSummary, ApiError>;

    /// `DELETE /api/events/{id}`
    async fn delete_event(&self, event_id: EventId) -> Result<(), ApiError>;
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct BookRequest {
    event_id: EventId,
}

#[derive(Serialize)]
struct LoginRequest<'a> {
    email: &'a str,
    password: &'a str,
}

#[derive(Deserialize)]
struct ErrorBody {
    error: String,
}

/// Query-string pairs for an event filter, in the server's parameter names.
#[must_use]
pub fn filter_query(filter: &EventFilter) -> Vec<(&'static str, String)> {
    let mut query = Vec::new();
    if !filter.categories.is_empty() {
        query.push(("category", filter.categories.join(",")));
    }
    if !filter.locations.is_empty() {
        query.push(("location", filter.locations.join(",")));
    }
    if let Some(start) = filter.start {
        query.push(("startDate", start.to_rfc3339()));
    }
    if let Some(end) = filter.end {
        query.push(("endDate", end.to_rfc3339()));
    }
    if let Some(search) = &filter.search {
        query.push(("search", search.clone()));
    }
    if let Some(created_by) = filter.created_by {
        query.push(("createdBy", created_by.to_string()));
    }
    if let Some(limit) = filter.limit {
        query.push(("limit", limit.to_string()));
    }
    query
}

/// HTTP implementation of [`EventbookApi`].
///
/// Authenticates with `Authorization: Bearer <token>`.
#[derive(Clone)]
pub struct HttpApi {
    client: Client,
    base_url: String,
    token: Option<String>,
}

impl std::fmt::Debug for HttpApi {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpApi")
            .field("base_url", &self.base_url)
            .field("authenticated", &self.token.is_some())
            .finish_non_exhaustive()
    }
}

impl HttpApi {
    /// Create an unauthenticated client for a server, e.g. `http://localhost:8080`.
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token: None,
        }
    }

    /// Use an existing session token.
    #[must_use]
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    /// Current session token, if signed in.
    #[must_use]
    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    /// Sign in and keep the session token from the `Set-Cookie` header.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Unauthorized`] for bad credentials and
    /// [`ApiError::MissingToken`] if the server sets no session cookie.
    pub async fn login(&mut self, email: &str, password: &str) -> Result<User, ApiError> {
        let response = self
            .client
            .post(self.url("/api/auth/login"))
            .json(&LoginRequest { email, password })
            .send()
            .await
            .map_err(|e| ApiError::RequestFailed(e.to_string()))?;

        let token = response
            .headers()
            .get_all(SET_COOKIE)
            .iter()
            .filter_map(|value| value.to_str().ok())
            .find_map(token_from_cookie_header)
            .map(str::to_string);

        let user: User = decode(response).await?;
        self.token = Some(token.ok_or(ApiError::MissingToken)?);
        tracing::debug!(user_id = %user.id, "Signed in");
        Ok(user)
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, ApiError> {
        let response = self
            .authorized(request)
            .send()
            .await
            .map_err(|e| ApiError::RequestFailed(e.to_string()))?;
        decode(response).await
    }

    async fn send_empty(&self, request: RequestBuilder) -> Result<(), ApiError> {
        let response = self
            .authorized(request)
            .send()
            .await
            .map_err(|e| ApiError::RequestFailed(e.to_string()))?;
        check(response).await.map(drop)
    }
}

/// Map non-success statuses to [`ApiError`], reading the `{"error": ...}` body.
async fn check(response: Response) -> Result<Response, ApiError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<ErrorBody>(&body)
        .map(|b| b.error)
        .unwrap_or(body);
    match status {
        StatusCode::UNAUTHORIZED => Err(ApiError::Unauthorized(message)),
        status => Err(ApiError::ApiError {
            status: status.as_u16(),
            message,
        }),
    }
}

async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, ApiError> {
    check(response)
        .await?
        .json::<T>()
        .await
        .map_err(|e| ApiError::ResponseParseFailed(e.to_string()))
}

#[async_trait]
impl EventbookApi for HttpApi {
    async fn list_events(&self, filter: &EventFilter) -> Result<Vec<EventSummary>, ApiError> {
        self.send(
            self.client
                .get(self.url("/api/events"))
                .query(&filter_query(filter)),
        )
        .await
    }

    async fn list_bookings(&self) -> Result<Vec<BookingWithEvent>, ApiError> {
        self.send(self.client.get(self.url("/api/bookings"))).await
    }

    async fn book_event(&self, event_id: EventId) -> Result<Booking, ApiError> {
        self.send(
            self.client
                .post(self.url("/api/bookings"))
                .json(&BookRequest { event_id }),
        )
        .await
    }

    async fn cancel_booking(&self, booking_id: BookingId) -> Result<(), ApiError> {
        self.send_empty(
            self.client
                .delete(self.url(&format!("/api/bookings/{booking_id}"))),
        )
        .await
    }

    async fn create_event(&self, event: &NewEvent) -> Result<EventSummary, ApiError> {
        self.send(self.client.post(self.url("/api/events")).json(event))
            .await
    }

    async fn update_event(
        &self,
        event_id: EventId,
        patch: &EventPatch,
    ) -> Result<EventSummary, ApiError> {
        self.send(
            self.client
                .patch(self.url(&format!("/api/events/{event_id}")))
                .json(patch),
        )
        .await
    }

    async fn delete_event(&self, event_id: EventId) -> Result<(), ApiError> {
        self.send_empty(
            self.client
                .delete(self.url(&format!("/api/events/{event_id}"))),
        )
        .await
    }
}
