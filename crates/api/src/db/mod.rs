//! Database operations for the reviews service.
//!
//! # Database: `reviews`
//!
//! ## Tables
//!
//! - `reviews.user` - Review authors (name, email, role)
//! - `reviews.product` - Products with their derived `average_rating` / `review_count`
//! - `reviews.review` - Reviews referencing a user and a product
//! - `tower_sessions.session` - Session storage shared with the login service
//!
//! # Migrations
//!
//! Migrations are stored in `crates/api/migrations/` and run via:
//! ```bash
//! cargo run -p reviews-cli -- migrate
//! ```
//!
//! # Stores
//!
//! Request handling only talks to the [`ReviewStore`] trait.
//! [`PgReviewStore`] is the production implementation, [`MemoryReviewStore`]
//! keeps everything in process for the test suites.

pub mod memory;
pub mod reviews;

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

use reviews_core::{ProductId, Rating, RatingSummary, ReviewId};

use crate::models::{Review, ReviewDetail, ReviewPatch};

pub use memory::MemoryReviewStore;
pub use reviews::PgReviewStore;

/// Errors that can occur during repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Data in the database is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// Constraint violation (e.g., duplicate id).
    #[error("constraint violation: {0}")]
    Conflict(String),
}

/// Document store holding reviews and the products they rate.
///
/// Implementations do no authorization or validation beyond what the schema
/// enforces; that is the job of [`crate::services::ReviewService`].
#[async_trait]
pub trait ReviewStore: Send + Sync {
    /// Get a review by its ID.
    async fn find_review(&self, id: ReviewId) -> Result<Option<Review>, RepositoryError>;

    /// Get a review with its author (name, email) and product (name) resolved.
    async fn find_review_detail(
        &self,
        id: ReviewId,
    ) -> Result<Option<ReviewDetail>, RepositoryError>;

    /// Apply `patch` to a review and stamp `updated_at`.
    ///
    /// Returns `false` if the review no longer exists.
    async fn update_review(
        &self,
        id: ReviewId,
        patch: &ReviewPatch,
        now: DateTime<Utc>,
    ) -> Result<bool, RepositoryError>;

    /// Delete a review.
    ///
    /// Returns `false` if the review did not exist.
    async fn delete_review(&self, id: ReviewId) -> Result<bool, RepositoryError>;

    /// Ratings of every review currently referencing `product_id`.
    async fn product_ratings(&self, product_id: ProductId) -> Result<Vec<Rating>, RepositoryError>;

    /// Overwrite a product's derived rating fields.
    ///
    /// Returns `false` if the product does not exist; nothing is created.
    async fn set_product_rating(
        &self,
        product_id: ProductId,
        summary: RatingSummary,
    ) -> Result<bool, RepositoryError>;

    /// Check that the store is reachable.
    async fn ping(&self) -> Result<(), RepositoryError>;
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Arguments
///
/// * `database_url` - `PostgreSQL` connection string (wrapped in `SecretString`)
/// * `max_connections` - Upper bound on pooled connections
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(
    database_url: &secrecy::SecretString,
    max_connections: u32,
) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(max_connections)
        .min_connections(1)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}
