//! HTTP API integration tests.
//!
//! Drive the real router over in-memory repositories with
//! `tower::ServiceExt::oneshot`. No network or database needed.

#![allow(clippy::unwrap_used, clippy::expect_used)] // Integration tests can use expect for setup
#![allow(clippy::too_many_lines)]

use axum::{
    Router,
    body::Body,
    http::{HeaderMap, Request, StatusCode, header},
};
use eventbook_auth::AuthConfig;
use eventbook_core::environment::Clock;
use eventbook_core::repository::{EventRepository, UserRepository};
use eventbook_core::{Role, User};
use eventbook_server::{AppState, build_router};
use eventbook_testing::{InMemoryStore, fixtures, test_clock};
use serde_json::{Value, json};
use std::sync::Arc;
use tower::ServiceExt;

const ADMIN_CODE: &str = "letmein";

struct TestApp {
    router: Router,
    state: AppState,
    store: InMemoryStore,
}

impl TestApp {
    fn new() -> Self {
        let store = InMemoryStore::new();
        let auth = AuthConfig::new("test-secret")
            .with_admin_code(Some(ADMIN_CODE.to_string()))
            .with_argon2_cost(1024, 1);
        let state = AppState::new(store.clone(), auth)
            .expect("valid auth config")
            .with_clock(Arc::new(test_clock()));
        Self {
            router: build_router(state.clone()),
            state,
            store,
        }
    }

    /// Session token for a user, as if they had logged in.
    fn token(&self, user: &User) -> String {
        self.state.signer.issue(user, test_clock().now()).unwrap()
    }

    async fn user(&self, email: &str, role: Role) -> (User, String) {
        let user = fixtures::seed_user(&self.store, email, role).await;
        let token = self.token(&user);
        (user, token)
    }

    async fn send(
        &self,
        method: &str,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, HeaderMap, Value) {
        let mut request = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            request = request.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        let body = match body {
            Some(body) => {
                request = request.header(header::CONTENT_TYPE, "application/json");
                Body::from(body.to_string())
            },
            None => Body::empty(),
        };
        self.raw(request.body(body).unwrap()).await
    }

    async fn raw(&self, request: Request<Body>) -> (StatusCode, HeaderMap, Value) {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let headers = response.headers().clone();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, headers, body)
    }

    async fn create_event(&self, token: &str, title: &str, category: &str, capacity: u32) -> Value {
        let mut event = serde_json::to_value(fixtures::new_event(title, category, "Berlin")).unwrap();
        event["maxAttendees"] = json!(capacity);
        let (status, _, body) = self.send("POST", "/api/events", Some(token), Some(event)).await;
        assert_eq!(status, StatusCode::CREATED, "{body}");
        body
    }
}

fn set_cookie(headers: &HeaderMap) -> String {
    headers
        .get(header::SET_COOKIE)
        .expect("Set-Cookie header")
        .to_str()
        .unwrap()
        .to_string()
}

// ============================================================================
// Health
// ============================================================================

#[tokio::test]
async fn test_health_and_readiness() {
    let app = TestApp::new();

    let (status, _, _) = app.send("GET", "/health", None, None).await;
    assert_eq!(status, StatusCode::OK);

    let (status, headers, body) = app.send("GET", "/ready", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ready");
    assert!(headers.contains_key("x-correlation-id"));
}

// ============================================================================
// Accounts
// ============================================================================

#[tokio::test]
async fn test_register_sets_session_cookie() {
    let app = TestApp::new();

    let (status, headers, body) = app
        .send(
            "POST",
            "/api/auth/register",
            None,
            Some(json!({ "name": "Ada", "email": "ada@example.com", "password": "secret123" })),
        )
        .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["email"], "ada@example.com");
    assert_eq!(body["role"], "user");
    assert!(body.get("passwordHash").is_none());

    let cookie = set_cookie(&headers);
    assert!(cookie.starts_with("token="));
    assert!(cookie.contains("HttpOnly"));
    assert!(cookie.contains("SameSite=Strict"));

    // The cookie alone authenticates
    let session = cookie.split(';').next().unwrap().to_string();
    let request = Request::builder()
        .uri("/api/auth/me")
        .header(header::COOKIE, session)
        .body(Body::empty())
        .unwrap();
    let (status, _, me) = app.raw(request).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(me["id"], body["id"]);
}

#[tokio::test]
async fn test_register_with_admin_code() {
    let app = TestApp::new();

    let (_, _, admin) = app
        .send(
            "POST",
            "/api/auth/register",
            None,
            Some(json!({
                "name": "Root",
                "email": "root@example.com",
                "password": "secret123",
                "adminCode": ADMIN_CODE
            })),
        )
        .await;
    assert_eq!(admin["role"], "admin");

    let (_, _, guess) = app
        .send(
            "POST",
            "/api/auth/register",
            None,
            Some(json!({
                "name": "Mallory",
                "email": "mallory@example.com",
                "password": "secret123",
                "adminCode": "guess"
            })),
        )
        .await;
    assert_eq!(guess["role"], "user");
}

#[tokio::test]
async fn test_register_validation() {
    let app = TestApp::new();
    let cases = [
        (json!({ "name": "Ada", "email": "ada@example.com", "password": "12345" }), StatusCode::BAD_REQUEST),
        (json!({ "name": "Ada", "email": "not-an-email", "password": "secret123" }), StatusCode::BAD_REQUEST),
        (json!({ "name": " ", "email": "ada@example.com", "password": "secret123" }), StatusCode::BAD_REQUEST),
        (json!({ "name": "Ada" }), StatusCode::BAD_REQUEST),
    ];
    for (body, expected) in cases {
        let (status, _, response) = app.send("POST", "/api/auth/register", None, Some(body)).await;
        assert_eq!(status, expected);
        assert!(response["error"].is_string());
    }

    let valid = json!({ "name": "Ada", "email": "ada@example.com", "password": "secret123" });
    let (status, _, _) = app.send("POST", "/api/auth/register", None, Some(valid.clone())).await;
    assert_eq!(status, StatusCode::CREATED);
    let (status, _, body) = app.send("POST", "/api/auth/register", None, Some(valid)).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "Email already registered");
}

#[tokio::test]
async fn test_malformed_json_is_bad_request() {
    let app = TestApp::new();
    let request = Request::builder()
        .method("POST")
        .uri("/api/auth/login")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{not json"))
        .unwrap();

    let (status, _, body) = app.raw(request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn test_login_and_logout() {
    let app = TestApp::new();
    app.send(
        "POST",
        "/api/auth/register",
        None,
        Some(json!({ "name": "Ada", "email": "ada@example.com", "password": "secret123" })),
    )
    .await;

    let (status, _, body) = app
        .send(
            "POST",
            "/api/auth/login",
            None,
            Some(json!({ "email": "ada@example.com", "password": "wrong-password" })),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "Invalid credentials");

    let (status, _, _) = app
        .send(
            "POST",
            "/api/auth/login",
            None,
            Some(json!({ "email": "nobody@example.com", "password": "secret123" })),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, headers, body) = app
        .send(
            "POST",
            "/api/auth/login",
            None,
            Some(json!({ "email": "ada@example.com", "password": "secret123" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["name"], "Ada");
    assert!(set_cookie(&headers).contains("Max-Age=604800"));

    let (status, headers, _) = app.send("POST", "/api/auth/logout", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(set_cookie(&headers).contains("Max-Age=0"));
}

#[tokio::test]
async fn test_me_requires_valid_session() {
    let app = TestApp::new();

    let (status, _, _) = app.send("GET", "/api/auth/me", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _, _) = app.send("GET", "/api/auth/me", Some("garbage"), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (user, token) = app.user("ada@example.com", Role::User).await;
    let (status, _, body) = app.send("POST", "/api/auth/me", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["email"], user.email);
}

#[tokio::test]
async fn test_stale_cookie_falls_back_to_bearer() {
    let app = TestApp::new();
    let (user, token) = app.user("ada@example.com", Role::User).await;

    let request = |bearer: Option<&str>| {
        let mut request = Request::builder()
            .uri("/api/auth/me")
            .header(header::COOKIE, "token=stale.session.value");
        if let Some(bearer) = bearer {
            request = request.header(header::AUTHORIZATION, format!("Bearer {bearer}"));
        }
        request.body(Body::empty()).unwrap()
    };

    let (status, _, body) = app.raw(request(Some(&token))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["email"], user.email);

    let (status, _, _) = app.raw(request(None)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _, _) = app.raw(request(Some("also-garbage"))).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_me_for_missing_user_clears_cookie() {
    let app = TestApp::new();
    let (user, token) = app.user("ghost@example.com", Role::User).await;
    app.store.clear();

    let (status, headers, body) = app.send("GET", "/api/auth/me", Some(&token), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "User not found");
    assert!(set_cookie(&headers).contains("Max-Age=0"));
    assert!(UserRepository::get(&app.store, user.id).await.unwrap().is_none());
}

// ============================================================================
// Events
// ============================================================================

#[tokio::test]
async fn test_event_list_requires_session_and_filters() {
    let app = TestApp::new();
    let (_, admin) = app.user("admin@example.com", Role::Admin).await;
    let (_, user) = app.user("ada@example.com", Role::User).await;

    app.create_event(&admin, "Jazz Night", "Music", 10).await;
    app.create_event(&admin, "Rust Meetup", "Tech", 10).await;
    app.create_event(&admin, "Gallery Walk", "Art", 10).await;

    let (status, _, _) = app.send("GET", "/api/events", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _, all) = app.send("GET", "/api/events", Some(&user), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(all.as_array().unwrap().len(), 3);
    assert_eq!(all[0]["currentAttendees"], 0);

    let (_, _, music_art) = app
        .send("GET", "/api/events?category=Music,Art", Some(&user), None)
        .await;
    let titles: Vec<&str> = music_art
        .as_array()
        .unwrap()
        .iter()
        .map(|e| e["title"].as_str().unwrap())
        .collect();
    assert_eq!(titles.len(), 2);
    assert!(!titles.contains(&"Rust Meetup"));

    // Entries are trimmed
    let (_, _, spaced) = app
        .send("GET", "/api/events?category=Music,%20Art,", Some(&user), None)
        .await;
    assert_eq!(spaced, music_art);

    // Conjunction with search
    let (_, _, jazz) = app
        .send("GET", "/api/events?category=Music,Art&search=Jazz", Some(&user), None)
        .await;
    assert_eq!(jazz.as_array().unwrap().len(), 1);

    let (_, _, limited) = app.send("GET", "/api/events?limit=1", Some(&user), None).await;
    assert_eq!(limited.as_array().unwrap().len(), 1);

    let (status, _, _) = app
        .send("GET", "/api/events?startDate=yesterday", Some(&user), None)
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_create_event_requires_admin() {
    let app = TestApp::new();
    let (admin, admin_token) = app.user("admin@example.com", Role::Admin).await;
    let (_, user_token) = app.user("ada@example.com", Role::User).await;
    let event = serde_json::to_value(fixtures::new_event("Jazz", "Music", "Berlin")).unwrap();

    let (status, _, _) = app.send("POST", "/api/events", None, Some(event.clone())).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _, _) = app
        .send("POST", "/api/events", Some(&user_token), Some(event.clone()))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _, body) = app
        .send("POST", "/api/events", Some(&admin_token), Some(event.clone()))
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["createdBy"], admin.id.to_string());
    assert_eq!(body["currentAttendees"], 0);

    let mut invalid = event.clone();
    invalid["maxAttendees"] = json!(0);
    let (status, _, _) = app.send("POST", "/api/events", Some(&admin_token), Some(invalid)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let mut backwards = event;
    backwards["endDate"] = json!("2000-01-01T00:00:00Z");
    let (status, _, body) = app
        .send("POST", "/api/events", Some(&admin_token), Some(backwards))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "endDate must not be before date");
}

#[tokio::test]
async fn test_get_event_is_public() {
    let app = TestApp::new();
    let event = fixtures::seed_event(&app.store, 5).await;

    let (status, _, body) = app
        .send("GET", &format!("/api/events/{}", event.id), None, None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["title"], "Seeded Event");
    assert_eq!(body["maxAttendees"], 5);

    let (status, _, body) = app
        .send("GET", &format!("/api/events/{}", uuid::Uuid::new_v4()), None, None)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Event not found");

    let (status, _, _) = app.send("GET", "/api/events/42", None, None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_update_event_admin_or_creator() {
    let app = TestApp::new();
    let (creator, creator_token) = app.user("creator@example.com", Role::Admin).await;
    let (_, other_token) = app.user("other@example.com", Role::User).await;
    let (_, admin_token) = app.user("admin@example.com", Role::Admin).await;

    let created = app.create_event(&creator_token, "Jazz Night", "Music", 2).await;
    let uri = format!("/api/events/{}", created["id"].as_str().unwrap());

    let (status, _, _) = app
        .send("PATCH", &uri, Some(&other_token), Some(json!({ "title": "Hijacked" })))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _, body) = app
        .send("PATCH", &uri, Some(&admin_token), Some(json!({ "title": "Late Jazz" })))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["title"], "Late Jazz");
    assert_eq!(body["category"], "Music");

    // A demoted creator keeps edit rights on their own event
    let demoted = app
        .store
        .set_role(creator.id, Role::User, test_clock().now())
        .await
        .unwrap();
    let demoted_token = app.token(&demoted);
    let (status, _, body) = app
        .send("PATCH", &uri, Some(&demoted_token), Some(json!({ "location": "Paris" })))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["location"], "Paris");

    let (status, _, _) = app
        .send(
            "PATCH",
            &format!("/api/events/{}", uuid::Uuid::new_v4()),
            Some(&admin_token),
            Some(json!({ "title": "Nothing" })),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_capacity_cannot_drop_below_bookings() {
    let app = TestApp::new();
    let (_, admin) = app.user("admin@example.com", Role::Admin).await;
    let (_, first) = app.user("first@example.com", Role::User).await;
    let (_, second) = app.user("second@example.com", Role::User).await;

    let event = app.create_event(&admin, "Jazz", "Music", 3).await;
    let event_id = event["id"].as_str().unwrap();
    for token in [&first, &second] {
        let (status, _, _) = app
            .send("POST", "/api/bookings", Some(token), Some(json!({ "eventId": event_id })))
            .await;
        assert_eq!(status, StatusCode::CREATED);
    }

    let uri = format!("/api/events/{event_id}");
    let (status, _, _) = app
        .send("PATCH", &uri, Some(&admin), Some(json!({ "maxAttendees": 1 })))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _, body) = app
        .send("PATCH", &uri, Some(&admin), Some(json!({ "maxAttendees": 2 })))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["currentAttendees"], 2);
}

#[tokio::test]
async fn test_delete_event_removes_bookings() {
    let app = TestApp::new();
    let (_, admin) = app.user("admin@example.com", Role::Admin).await;
    let (_, user) = app.user("ada@example.com", Role::User).await;
    let event = app.create_event(&admin, "Jazz", "Music", 3).await;
    let event_id = event["id"].as_str().unwrap();
    app.send("POST", "/api/bookings", Some(&user), Some(json!({ "eventId": event_id })))
        .await;

    let uri = format!("/api/events/{event_id}");
    let (status, _, _) = app.send("DELETE", &uri, Some(&user), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _, body) = app.send("DELETE", &uri, Some(&admin), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Event deleted successfully");

    let (status, _, _) = app.send("GET", &uri, None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (_, _, bookings) = app.send("GET", "/api/bookings", Some(&user), None).await;
    assert!(bookings.as_array().unwrap().is_empty());

    let (status, _, _) = app.send("DELETE", &uri, Some(&admin), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_popular_events() {
    let app = TestApp::new();
    let (_, admin) = app.user("admin@example.com", Role::Admin).await;
    let quiet = app.create_event(&admin, "Quiet", "Art", 10).await;
    let busy = app.create_event(&admin, "Busy", "Music", 10).await;

    for i in 0..3 {
        let (_, token) = app.user(&format!("fan{i}@example.com"), Role::User).await;
        app.send("POST", "/api/bookings", Some(&token), Some(json!({ "eventId": busy["id"] })))
            .await;
    }

    let (status, _, body) = app.send("GET", "/api/events/popular", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body[0]["id"], busy["id"]);
    assert_eq!(body[0]["currentAttendees"], 3);
    assert_eq!(body[1]["id"], quiet["id"]);

    let (_, _, clamped) = app.send("GET", "/api/events/popular?limit=0", None, None).await;
    assert_eq!(clamped.as_array().unwrap().len(), 1);
}

// ============================================================================
// Bookings
// ============================================================================

#[tokio::test]
async fn test_booking_admission_outcomes() {
    let app = TestApp::new();
    let (_, admin) = app.user("admin@example.com", Role::Admin).await;
    let (ada, ada_token) = app.user("ada@example.com", Role::User).await;
    let (_, bob_token) = app.user("bob@example.com", Role::User).await;

    let event = app.create_event(&admin, "Tiny", "Music", 1).await;
    let book = json!({ "eventId": event["id"] });

    let (status, _, booking) = app
        .send("POST", "/api/bookings", Some(&ada_token), Some(book.clone()))
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(booking["userId"], ada.id.to_string());
    assert_eq!(booking["eventId"], event["id"]);

    let (status, _, body) = app
        .send("POST", "/api/bookings", Some(&ada_token), Some(book.clone()))
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "Already booked for this event");

    let (status, _, body) = app
        .send("POST", "/api/bookings", Some(&bob_token), Some(book))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Event is fully booked");

    let (status, _, _) = app
        .send(
            "POST",
            "/api/bookings",
            Some(&bob_token),
            Some(json!({ "eventId": uuid::Uuid::new_v4() })),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _, _) = app
        .send("POST", "/api/bookings", None, Some(json!({ "eventId": event["id"] })))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_booking_identity_comes_from_session() {
    let app = TestApp::new();
    let event = fixtures::seed_event(&app.store, 5).await;
    let (ada, ada_token) = app.user("ada@example.com", Role::User).await;
    let (bob, _) = app.user("bob@example.com", Role::User).await;

    // A userId in the body is ignored
    let (status, _, booking) = app
        .send(
            "POST",
            "/api/bookings",
            Some(&ada_token),
            Some(json!({ "eventId": event.id, "userId": bob.id })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(booking["userId"], ada.id.to_string());
}

#[tokio::test]
async fn test_list_and_cancel_bookings() {
    let app = TestApp::new();
    let (_, admin) = app.user("admin@example.com", Role::Admin).await;
    let (ada, ada_token) = app.user("ada@example.com", Role::User).await;
    let (_, bob_token) = app.user("bob@example.com", Role::User).await;

    let event = app.create_event(&admin, "Jazz", "Music", 5).await;
    let (_, _, booking) = app
        .send("POST", "/api/bookings", Some(&ada_token), Some(json!({ "eventId": event["id"] })))
        .await;

    let (status, _, mine) = app.send("GET", "/api/bookings", Some(&ada_token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(mine[0]["id"], booking["id"]);
    assert_eq!(mine[0]["event"]["title"], "Jazz");

    let others = format!("/api/bookings?userId={}", ada.id);
    let (status, _, _) = app.send("GET", &others, Some(&bob_token), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    let (status, _, body) = app.send("GET", &others, Some(&admin), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 1);

    let uri = format!("/api/bookings/{}", booking["id"].as_str().unwrap());
    let (status, _, _) = app.send("DELETE", &uri, Some(&bob_token), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _, _) = app.send("DELETE", &uri, Some(&ada_token), None).await;
    assert_eq!(status, StatusCode::OK);

    let (status, _, body) = app.send("DELETE", &uri, Some(&ada_token), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Booking not found");

    let (_, _, event) = app
        .send("GET", &format!("/api/events/{}", event["id"].as_str().unwrap()), None, None)
        .await;
    assert_eq!(event["currentAttendees"], 0);
}

#[tokio::test]
async fn test_concurrent_bookings_respect_capacity() {
    let app = Arc::new(TestApp::new());
    let event = fixtures::seed_event(&app.store, 3).await;

    let mut handles = Vec::new();
    for i in 0..12 {
        let (_, token) = app.user(&format!("user{i}@example.com"), Role::User).await;
        let app = Arc::clone(&app);
        handles.push(tokio::spawn(async move {
            app.send("POST", "/api/bookings", Some(&token), Some(json!({ "eventId": event.id })))
                .await
                .0
        }));
    }

    let mut created = 0;
    for handle in handles {
        match handle.await.unwrap() {
            StatusCode::CREATED => created += 1,
            status => assert_eq!(status, StatusCode::BAD_REQUEST),
        }
    }
    assert_eq!(created, 3);
    assert_eq!(app.store.booking_count(event.id), 3);
}

// ============================================================================
// Admin
// ============================================================================

#[tokio::test]
async fn test_admin_routes_require_admin() {
    let app = TestApp::new();
    let (ada, user) = app.user("ada@example.com", Role::User).await;
    let (admin, _) = app.user("admin@example.com", Role::Admin).await;
    let event = fixtures::seed_event(&app.store, 5).await;

    let promote = format!("/api/admin/users/{}/promote", ada.id);
    let demote = format!("/api/admin/users/{}/demote", admin.id);
    let delete = format!("/api/admin/events/{}", event.id);
    for (method, uri) in [
        ("GET", "/api/admin/users"),
        ("GET", "/api/admin/events"),
        ("GET", "/api/admin/stats"),
        ("POST", promote.as_str()),
        ("POST", demote.as_str()),
        ("DELETE", delete.as_str()),
    ] {
        let (status, _, _) = app.send(method, uri, None, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED, "{method} {uri}");
        let (status, _, body) = app.send(method, uri, Some(&user), None).await;
        assert_eq!(status, StatusCode::FORBIDDEN, "{method} {uri}");
        assert!(body["error"].is_string());
    }

    // Nothing changed
    let stored = UserRepository::get(&app.store, ada.id).await.unwrap().unwrap();
    assert_eq!(stored.role, Role::User);
    let stored = UserRepository::get(&app.store, admin.id).await.unwrap().unwrap();
    assert_eq!(stored.role, Role::Admin);
    assert!(EventRepository::get(&app.store, event.id).await.unwrap().is_some());
}

#[tokio::test]
async fn test_promote_and_demote() {
    let app = TestApp::new();
    let (admin, admin_token) = app.user("admin@example.com", Role::Admin).await;
    let (ada, _) = app.user("ada@example.com", Role::User).await;

    let promote = format!("/api/admin/users/{}/promote", ada.id);
    let (status, _, body) = app.send("POST", &promote, Some(&admin_token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["role"], "admin");

    // Idempotent
    let (status, _, again) = app.send("POST", &promote, Some(&admin_token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(again["role"], "admin");

    let demote = format!("/api/admin/users/{}/demote", ada.id);
    let (status, _, body) = app.send("POST", &demote, Some(&admin_token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["role"], "user");

    // Idempotent
    let (status, _, again) = app.send("POST", &demote, Some(&admin_token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(again["role"], "user");

    let self_demote = format!("/api/admin/users/{}/demote", admin.id);
    let (status, _, body) = app.send("POST", &self_demote, Some(&admin_token), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Cannot demote yourself");

    let unknown = format!("/api/admin/users/{}/promote", uuid::Uuid::new_v4());
    let (status, _, _) = app.send("POST", &unknown, Some(&admin_token), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (_, _, users) = app.send("GET", "/api/admin/users", Some(&admin_token), None).await;
    assert_eq!(users.as_array().unwrap().len(), 2);
    assert!(users[0].get("passwordHash").is_none());
}

#[tokio::test]
async fn test_admin_events_and_stats() {
    let app = TestApp::new();
    let (admin, admin_token) = app.user("admin@example.com", Role::Admin).await;
    let (_, user) = app.user("ada@example.com", Role::User).await;

    let event = app.create_event(&admin_token, "Jazz", "Music", 5).await;
    app.send("POST", "/api/bookings", Some(&user), Some(json!({ "eventId": event["id"] })))
        .await;

    let (status, _, events) = app.send("GET", "/api/admin/events", Some(&admin_token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(events[0]["creator"]["id"], admin.id.to_string());
    assert_eq!(events[0]["creator"]["email"], "admin@example.com");
    assert_eq!(events[0]["currentAttendees"], 1);

    let (status, _, stats) = app.send("GET", "/api/admin/stats", Some(&admin_token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        stats,
        json!({ "totalUsers": 2, "totalEvents": 1, "totalBookings": 1, "upcomingEvents": 1 })
    );

    let uri = format!("/api/admin/events/{}", event["id"].as_str().unwrap());
    let (status, _, _) = app.send("DELETE", &uri, Some(&admin_token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(
        EventRepository::list(&app.store, &eventbook_core::EventFilter::default())
            .await
            .unwrap()
            .is_empty()
    );
}

#[tokio::test]
async fn test_correlation_id_is_echoed() {
    let app = TestApp::new();
    let id = uuid::Uuid::new_v4().to_string();
    let request = Request::builder()
        .uri("/health")
        .header("X-Correlation-ID", &id)
        .body(Body::empty())
        .unwrap();

    let (_, headers, _) = app.raw(request).await;
    assert_eq!(headers.get("x-correlation-id").unwrap(), id.as_str());
}
