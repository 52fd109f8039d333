//! Integration tests for the reviews service.
//!
//! # Running Tests
//!
//! ```bash
//! # In-process router tests (no database needed)
//! cargo test -p reviews-integration-tests
//!
//! # Live tests against a running server and database
//! cargo run -p reviews-cli -- migrate
//! cargo run -p reviews-api &
//! cargo test -p reviews-integration-tests -- --ignored
//! ```
//!
//! # Test Categories
//!
//! - `reviews_router` - Full router driven with `tower::ServiceExt::oneshot`
//!   over the in-memory store and session store
//! - `reviews_live` - HTTP requests against a running `reviews-api`

use std::collections::HashMap;
use std::sync::Arc;

use axum::{
    Router,
    body::{Body, to_bytes},
    http::{HeaderMap, Method, Request, StatusCode, header},
};
use serde_json::Value;
use tower::ServiceExt;
use tower_sessions::{
    MemoryStore, SessionStore,
    cookie::time::{Duration, OffsetDateTime},
    session::{Id, Record},
};
use tower_sessions_sqlx_store::PostgresStore;

use reviews_api::config::ApiConfig;
use reviews_api::db::{self, MemoryReviewStore, PgReviewStore};
use reviews_api::middleware::{create_session_layer, session::SESSION_COOKIE_NAME};
use reviews_api::models::{CurrentUser, session_keys};
use reviews_api::state::AppState;

/// Write a session holding `user` straight into `store`, the way the login
/// service would, and return the matching `Cookie` header value.
///
/// # Panics
///
/// Panics if the store rejects the record.
pub async fn session_cookie<S: SessionStore>(store: &S, user: &CurrentUser) -> String {
    let mut record = Record {
        id: Id::default(),
        data: HashMap::from([(
            session_keys::CURRENT_USER.to_string(),
            serde_json::to_value(user).expect("CurrentUser serializes"),
        )]),
        expiry_date: OffsetDateTime::now_utc() + Duration::hours(1),
    };
    store
        .create(&mut record)
        .await
        .expect("Failed to create session");

    format!("{SESSION_COOKIE_NAME}={}", record.id)
}

// =============================================================================
// In-process router
// =============================================================================

/// Response captured from the in-process router.
#[derive(Debug)]
pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    /// JSON body, or the raw text as a JSON string if it isn't JSON.
    pub body: Value,
}

/// The full application router over in-memory stores.
pub struct TestApp {
    pub store: MemoryReviewStore,
    sessions: MemoryStore,
    router: Router,
}

impl Default for TestApp {
    fn default() -> Self {
        Self::new()
    }
}

impl TestApp {
    #[must_use]
    pub fn new() -> Self {
        let store = MemoryReviewStore::new();
        let sessions = MemoryStore::default();
        let router = reviews_api::app(
            AppState::new(Arc::new(store.clone())),
            create_session_layer(sessions.clone(), false),
        );

        Self {
            store,
            sessions,
            router,
        }
    }

    /// Cookie header value for a logged-in `user`.
    pub async fn login(&self, user: CurrentUser) -> String {
        session_cookie(&self.sessions, &user).await
    }

    /// Send one request through the router.
    ///
    /// # Panics
    ///
    /// Panics if the request cannot be built or the body cannot be read.
    pub async fn send(
        &self,
        method: Method,
        uri: &str,
        cookie: Option<&str>,
        json: Option<&str>,
    ) -> TestResponse {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(cookie) = cookie {
            builder = builder.header(header::COOKIE, cookie);
        }
        let body = match json {
            Some(json) => {
                builder = builder.header(header::CONTENT_TYPE, "application/json");
                Body::from(json.to_owned())
            }
            None => Body::empty(),
        };
        let request = builder.body(body).expect("Failed to build request");
        self.request(request).await
    }

    /// Send a fully built request through the router.
    ///
    /// # Panics
    ///
    /// Panics if the response body cannot be read.
    pub async fn request(&self, request: Request<Body>) -> TestResponse {
        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("Router is infallible");

        let status = response.status();
        let headers = response.headers().clone();
        let bytes = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("Failed to read body");
        let body = serde_json::from_slice(&bytes)
            .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()));

        TestResponse {
            status,
            headers,
            body,
        }
    }
}

// =============================================================================
// Live server
// =============================================================================

/// Base URL for the running reviews API (configurable via environment).
#[must_use]
pub fn api_base_url() -> String {
    std::env::var("REVIEWS_TEST_BASE_URL").unwrap_or_else(|_| "http://localhost:3000".to_string())
}

/// Handles for talking to a running server and its database.
pub struct LiveContext {
    pub client: reqwest::Client,
    pub base_url: String,
    pub store: PgReviewStore,
    sessions: PostgresStore,
}

impl LiveContext {
    /// Connect to the database named by `REVIEWS_DATABASE_URL`.
    ///
    /// # Panics
    ///
    /// Panics if the configuration is missing or the database is unreachable.
    pub async fn new() -> Self {
        let config = ApiConfig::from_env().expect("Failed to load configuration");
        let pool = db::create_pool(&config.database_url, 2)
            .await
            .expect("Failed to connect to database");

        Self {
            client: reqwest::Client::new(),
            base_url: api_base_url(),
            store: PgReviewStore::new(pool.clone()),
            sessions: PostgresStore::new(pool),
        }
    }

    #[must_use]
    pub fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    /// Cookie header value for a logged-in `user`.
    pub async fn login(&self, user: CurrentUser) -> String {
        session_cookie(&self.sessions, &user).await
    }
}
