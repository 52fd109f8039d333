//! Review service.
//!
//! Owns the review lifecycle and keeps each product's `average_rating` /
//! `review_count` consistent with the reviews that reference it. Every
//! mutation is followed by a recompute of the affected product before the
//! caller gets a response.

mod error;
mod locks;

pub use error::{ReviewAction, ReviewError};
pub use locks::{ProductGuard, ProductLocks};

use std::sync::Arc;

use chrono::Utc;
use tracing::instrument;

use reviews_core::{ProductId, RatingSummary, ReviewId};

use crate::db::ReviewStore;
use crate::models::{CurrentUser, Review, ReviewDetail, UpdateReview};

/// Review service.
///
/// Cheap to clone; clones share the store and the product locks.
#[derive(Clone)]
pub struct ReviewService {
    store: Arc<dyn ReviewStore>,
    locks: Arc<ProductLocks>,
}

impl ReviewService {
    /// Create a new review service over `store`.
    #[must_use]
    pub fn new(store: Arc<dyn ReviewStore>) -> Self {
        Self {
            store,
            locks: Arc::new(ProductLocks::new()),
        }
    }

    /// Get a reference to the underlying store.
    #[must_use]
    pub fn store(&self) -> &dyn ReviewStore {
        self.store.as_ref()
    }

    // =========================================================================
    // Read
    // =========================================================================

    /// Fetch a review with its author and product resolved.
    ///
    /// # Errors
    ///
    /// Returns `ReviewError::InvalidIdentifier` if `review_id` is malformed.
    /// Returns `ReviewError::NotFound` if no such review exists.
    #[instrument(skip(self))]
    pub async fn fetch(&self, review_id: &str) -> Result<ReviewDetail, ReviewError> {
        let id = parse_review_id(review_id)?;

        let detail = self
            .store
            .find_review_detail(id)
            .await?
            .ok_or(ReviewError::NotFound)?;

        tracing::debug!(review_id = %id, "Fetched review");
        Ok(detail)
    }

    // =========================================================================
    // Mutations
    // =========================================================================

    /// Check that `caller` may perform `action` on the review.
    ///
    /// Runs the checks shared by update and delete, in order: caller present,
    /// id well-formed, review exists, caller is the author or an admin.
    ///
    /// # Errors
    ///
    /// Returns `ReviewError::Unauthenticated` if there is no caller.
    /// Returns `ReviewError::InvalidIdentifier` if `review_id` is malformed.
    /// Returns `ReviewError::NotFound` if no such review exists.
    /// Returns `ReviewError::Forbidden` if the caller may not touch the review.
    pub async fn authorize(
        &self,
        review_id: &str,
        caller: Option<&CurrentUser>,
        action: ReviewAction,
    ) -> Result<Review, ReviewError> {
        let caller = caller.ok_or(ReviewError::Unauthenticated)?;
        let id = parse_review_id(review_id)?;

        let review = self
            .store
            .find_review(id)
            .await?
            .ok_or(ReviewError::NotFound)?;

        if !caller.can_modify(review.user_id) {
            tracing::info!(
                review_id = %id,
                caller = %caller.user_id,
                action = %action,
                "Caller may not modify review"
            );
            return Err(ReviewError::Forbidden(action));
        }

        Ok(review)
    }

    /// Update a review's rating and/or comment, then recompute its product.
    ///
    /// # Errors
    ///
    /// See [`Self::authorize`]. Additionally returns
    /// `ReviewError::InvalidInput` if the rating is not a whole number in
    /// 1..=5, and `ReviewError::NotFound` if the review disappears while
    /// being updated.
    pub async fn update(
        &self,
        review_id: &str,
        caller: Option<&CurrentUser>,
        body: UpdateReview,
    ) -> Result<ReviewDetail, ReviewError> {
        let review = self
            .authorize(review_id, caller, ReviewAction::Update)
            .await?;
        self.apply_update(&review, body).await
    }

    /// Second half of [`Self::update`], for a review already returned by
    /// [`Self::authorize`].
    ///
    /// # Errors
    ///
    /// Returns `ReviewError::InvalidInput` if the rating is invalid; nothing
    /// is written in that case.
    /// Returns `ReviewError::NotFound` if the review is gone.
    #[instrument(skip(self, review, body), fields(review_id = %review.id, product_id = %review.product_id))]
    pub async fn apply_update(
        &self,
        review: &Review,
        body: UpdateReview,
    ) -> Result<ReviewDetail, ReviewError> {
        let patch = body.validate()?;

        let _guard = self.locks.lock(review.product_id).await;

        if !self
            .store
            .update_review(review.id, &patch, Utc::now())
            .await?
        {
            return Err(ReviewError::NotFound);
        }

        let detail = self
            .store
            .find_review_detail(review.id)
            .await?
            .ok_or(ReviewError::NotFound)?;

        let summary = self.recompute_locked(review.product_id).await?;

        tracing::info!(
            average_rating = %summary.average_rating,
            review_count = summary.review_count,
            rating_changed = patch.rating.is_some(),
            comment_changed = patch.comment.is_some(),
            "Review updated"
        );

        Ok(detail)
    }

    /// Delete a review, then recompute its product.
    ///
    /// # Errors
    ///
    /// See [`Self::authorize`]. Additionally returns `ReviewError::NotFound`
    /// if the review was deleted concurrently.
    pub async fn delete(
        &self,
        review_id: &str,
        caller: Option<&CurrentUser>,
    ) -> Result<(), ReviewError> {
        let review = self
            .authorize(review_id, caller, ReviewAction::Delete)
            .await?;
        self.remove(&review).await
    }

    #[instrument(skip(self, review), fields(review_id = %review.id, product_id = %review.product_id))]
    async fn remove(&self, review: &Review) -> Result<(), ReviewError> {
        let _guard = self.locks.lock(review.product_id).await;

        if !self.store.delete_review(review.id).await? {
            return Err(ReviewError::NotFound);
        }

        let summary = self.recompute_locked(review.product_id).await?;

        tracing::info!(
            average_rating = %summary.average_rating,
            review_count = summary.review_count,
            "Review deleted"
        );

        Ok(())
    }

    // =========================================================================
    // Aggregate
    // =========================================================================

    /// Recompute a product's `average_rating` and `review_count` from the
    /// reviews currently referencing it.
    ///
    /// A missing product is left missing.
    ///
    /// # Errors
    ///
    /// Returns `ReviewError::Repository` if the store fails.
    pub async fn recompute(&self, product_id: ProductId) -> Result<RatingSummary, ReviewError> {
        let _guard = self.locks.lock(product_id).await;
        self.recompute_locked(product_id).await
    }

    /// Recompute with the product lock already held by the caller.
    async fn recompute_locked(&self, product_id: ProductId) -> Result<RatingSummary, ReviewError> {
        let ratings = self.store.product_ratings(product_id).await?;
        let summary = RatingSummary::from_ratings(ratings);

        if !self.store.set_product_rating(product_id, summary).await? {
            tracing::warn!(product_id = %product_id, "Recompute skipped: product not found");
        }

        Ok(summary)
    }
}

fn parse_review_id(raw: &str) -> Result<ReviewId, ReviewError> {
    ReviewId::parse(raw).map_err(|_| ReviewError::InvalidIdentifier)
}
