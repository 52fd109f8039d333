//! In-process review store.
//!
//! Keeps users, products and reviews in hash maps behind a single lock. Backs
//! the unit and router test suites. Clones share the same data.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use reviews_core::{ProductId, Rating, RatingSummary, ReviewId, UserId};

use super::{RepositoryError, ReviewStore};
use crate::models::{ProductSummary, Review, ReviewDetail, ReviewPatch, UserSummary};

#[derive(Debug, Clone)]
struct StoredUser {
    name: String,
    email: String,
}

#[derive(Debug, Clone)]
struct StoredProduct {
    name: String,
    rating: RatingSummary,
}

#[derive(Debug, Default)]
struct Collections {
    users: HashMap<UserId, StoredUser>,
    products: HashMap<ProductId, StoredProduct>,
    reviews: HashMap<ReviewId, Review>,
}

/// Review store kept entirely in memory.
#[derive(Debug, Clone, Default)]
pub struct MemoryReviewStore {
    inner: Arc<RwLock<Collections>>,
}

impl MemoryReviewStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a user.
    pub async fn insert_user(&self, name: &str, email: &str) -> UserId {
        let id = UserId::generate();
        self.inner.write().await.users.insert(
            id,
            StoredUser {
                name: name.to_owned(),
                email: email.to_owned(),
            },
        );
        id
    }

    /// Add a product with no reviews.
    pub async fn insert_product(&self, name: &str) -> ProductId {
        let id = ProductId::generate();
        self.inner.write().await.products.insert(
            id,
            StoredProduct {
                name: name.to_owned(),
                rating: RatingSummary::empty(),
            },
        );
        id
    }

    /// Add a review. The product aggregate is not touched.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the user or product does not exist.
    pub async fn insert_review(
        &self,
        user_id: UserId,
        product_id: ProductId,
        rating: Rating,
        comment: Option<&str>,
    ) -> Result<Review, RepositoryError> {
        let mut data = self.inner.write().await;
        if !data.users.contains_key(&user_id) || !data.products.contains_key(&product_id) {
            return Err(RepositoryError::Conflict(
                "unknown user or product".to_owned(),
            ));
        }

        let now = Utc::now();
        let review = Review {
            id: ReviewId::generate(),
            user_id,
            product_id,
            rating,
            comment: comment.map(str::to_owned),
            created_at: now,
            updated_at: now,
        };
        data.reviews.insert(review.id, review.clone());
        Ok(review)
    }

    /// Remove a user, leaving their reviews pointing at nothing.
    pub async fn remove_user(&self, id: UserId) -> bool {
        self.inner.write().await.users.remove(&id).is_some()
    }

    /// Get a product's derived rating fields.
    pub async fn product_rating(&self, product_id: ProductId) -> Option<RatingSummary> {
        self.inner
            .read()
            .await
            .products
            .get(&product_id)
            .map(|p| p.rating)
    }

    /// Number of stored reviews.
    pub async fn review_count(&self) -> usize {
        self.inner.read().await.reviews.len()
    }
}

#[async_trait]
impl ReviewStore for MemoryReviewStore {
    async fn find_review(&self, id: ReviewId) -> Result<Option<Review>, RepositoryError> {
        Ok(self.inner.read().await.reviews.get(&id).cloned())
    }

    async fn find_review_detail(
        &self,
        id: ReviewId,
    ) -> Result<Option<ReviewDetail>, RepositoryError> {
        let data = self.inner.read().await;
        let Some(review) = data.reviews.get(&id) else {
            return Ok(None);
        };

        let user = data.users.get(&review.user_id).map(|u| UserSummary {
            id: review.user_id,
            name: u.name.clone(),
            email: u.email.clone(),
        });
        let product = data.products.get(&review.product_id).map(|p| ProductSummary {
            id: review.product_id,
            name: p.name.clone(),
        });

        Ok(Some(ReviewDetail {
            id: review.id,
            user,
            product,
            rating: review.rating,
            comment: review.comment.clone(),
            created_at: review.created_at,
            updated_at: review.updated_at,
        }))
    }

    async fn update_review(
        &self,
        id: ReviewId,
        patch: &ReviewPatch,
        now: DateTime<Utc>,
    ) -> Result<bool, RepositoryError> {
        let mut data = self.inner.write().await;
        let Some(review) = data.reviews.get_mut(&id) else {
            return Ok(false);
        };
        patch.apply(review, now);
        Ok(true)
    }

    async fn delete_review(&self, id: ReviewId) -> Result<bool, RepositoryError> {
        Ok(self.inner.write().await.reviews.remove(&id).is_some())
    }

    async fn product_ratings(&self, product_id: ProductId) -> Result<Vec<Rating>, RepositoryError> {
        Ok(self
            .inner
            .read()
            .await
            .reviews
            .values()
            .filter(|r| r.product_id == product_id)
            .map(|r| r.rating)
            .collect())
    }

    async fn set_product_rating(
        &self,
        product_id: ProductId,
        summary: RatingSummary,
    ) -> Result<bool, RepositoryError> {
        let mut data = self.inner.write().await;
        let Some(product) = data.products.get_mut(&product_id) else {
            return Ok(false);
        };
        product.rating = summary;
        Ok(true)
    }

    async fn ping(&self) -> Result<(), RepositoryError> {
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn rating(value: i64) -> Rating {
        Rating::new(value).unwrap()
    }

    #[tokio::test]
    async fn test_detail_resolves_references() {
        let store = MemoryReviewStore::new();
        let user = store.insert_user("Ada", "ada@example.com").await;
        let product = store.insert_product("Dried Mango").await;
        let review = store
            .insert_review(user, product, rating(4), Some("chewy"))
            .await
            .unwrap();

        let detail = store.find_review_detail(review.id).await.unwrap().unwrap();
        assert_eq!(detail.user.unwrap().email, "ada@example.com");
        assert_eq!(detail.product.unwrap().name, "Dried Mango");
        assert_eq!(detail.comment.as_deref(), Some("chewy"));
    }

    #[tokio::test]
    async fn test_detail_renders_missing_author_as_none() {
        let store = MemoryReviewStore::new();
        let user = store.insert_user("Ada", "ada@example.com").await;
        let product = store.insert_product("Dried Mango").await;
        let review = store
            .insert_review(user, product, rating(4), None)
            .await
            .unwrap();

        assert!(store.remove_user(user).await);
        let detail = store.find_review_detail(review.id).await.unwrap().unwrap();
        assert!(detail.user.is_none());
        assert!(detail.product.is_some());
    }

    #[tokio::test]
    async fn test_insert_review_requires_known_references() {
        let store = MemoryReviewStore::new();
        let product = store.insert_product("Dried Mango").await;
        let result = store
            .insert_review(UserId::generate(), product, rating(3), None)
            .await;
        assert!(matches!(result, Err(RepositoryError::Conflict(_))));
    }

    #[tokio::test]
    async fn test_product_ratings_only_lists_that_product() {
        let store = MemoryReviewStore::new();
        let user = store.insert_user("Ada", "ada@example.com").await;
        let mango = store.insert_product("Dried Mango").await;
        let kiwi = store.insert_product("Dried Kiwi").await;
        store.insert_review(user, mango, rating(4), None).await.unwrap();
        store.insert_review(user, mango, rating(2), None).await.unwrap();
        store.insert_review(user, kiwi, rating(5), None).await.unwrap();

        let mut ratings = store.product_ratings(mango).await.unwrap();
        ratings.sort();
        assert_eq!(ratings, vec![rating(2), rating(4)]);
    }

    #[tokio::test]
    async fn test_set_product_rating_never_creates_products() {
        let store = MemoryReviewStore::new();
        let missing = ProductId::generate();
        let updated = store
            .set_product_rating(missing, RatingSummary::empty())
            .await
            .unwrap();
        assert!(!updated);
        assert!(store.product_rating(missing).await.is_none());
    }

    #[tokio::test]
    async fn test_update_and_delete_report_missing_rows() {
        let store = MemoryReviewStore::new();
        let id = ReviewId::generate();
        assert!(
            !store
                .update_review(id, &ReviewPatch::default(), Utc::now())
                .await
                .unwrap()
        );
        assert!(!store.delete_review(id).await.unwrap());
    }
}
