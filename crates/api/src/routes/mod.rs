//! HTTP route handlers for the reviews service.
//!
//! # Route Structure
//!
//! ```text
//! GET    /health                - Liveness check
//! GET    /health/ready          - Readiness check (store reachable)
//!
//! # Reviews
//! GET    /reviews/{reviewId}    - Fetch a review with author and product
//! PUT    /reviews/{reviewId}    - Update rating and/or comment (author or admin)
//! DELETE /reviews/{reviewId}    - Delete a review (author or admin)
//!
//! # Users
//! GET    /users/{userId}        - Placeholder, echoes the id
//! ```
//!
//! Anything else gets the `not_found` error envelope.

pub mod health;
pub mod reviews;
pub mod users;

use axum::{Router, routing::get};

use crate::error::AppError;
use crate::state::AppState;

/// Create the review routes router.
pub fn review_routes() -> Router<AppState> {
    Router::new().route(
        "/{review_id}",
        get(reviews::show)
            .put(reviews::update)
            .delete(reviews::delete),
    )
}

/// Create the user routes router.
pub fn user_routes() -> Router<AppState> {
    Router::new().route("/{user_id}", get(users::show))
}

/// Create all routes for the service.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health::health))
        .route("/health/ready", get(health::readiness))
        .nest("/reviews", review_routes())
        .nest("/users", user_routes())
        .fallback(not_found)
}

async fn not_found() -> AppError {
    AppError::NotFound("Route not found".to_string())
}
