//! `PostgreSQL` review store.
//!
//! Queries are checked at runtime (`query_as` + `FromRow`) so the crate builds
//! without a live database.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;

use reviews_core::{ProductId, Rating, RatingSummary, ReviewId, Role, UserId};

use super::{RepositoryError, ReviewStore};
use crate::models::{ProductSummary, Review, ReviewDetail, ReviewPatch, UserSummary};

// =============================================================================
// Internal Row Types
// =============================================================================

/// Internal row type for plain review queries.
#[derive(Debug, sqlx::FromRow)]
struct ReviewRow {
    id: ReviewId,
    user_id: UserId,
    product_id: ProductId,
    rating: Rating,
    comment: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<ReviewRow> for Review {
    fn from(row: ReviewRow) -> Self {
        Self {
            id: row.id,
            user_id: row.user_id,
            product_id: row.product_id,
            rating: row.rating,
            comment: row.comment,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

/// Internal row type for a review joined with its author and product.
#[derive(Debug, sqlx::FromRow)]
struct ReviewDetailRow {
    id: ReviewId,
    rating: Rating,
    comment: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    user_id: UserId,
    user_name: Option<String>,
    user_email: Option<String>,
    product_id: ProductId,
    product_name: Option<String>,
}

impl From<ReviewDetailRow> for ReviewDetail {
    fn from(row: ReviewDetailRow) -> Self {
        let user = match (row.user_name, row.user_email) {
            (Some(name), Some(email)) => Some(UserSummary {
                id: row.user_id,
                name,
                email,
            }),
            _ => None,
        };
        let product = row.product_name.map(|name| ProductSummary {
            id: row.product_id,
            name,
        });

        Self {
            id: row.id,
            user,
            product,
            rating: row.rating,
            comment: row.comment,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

/// Internal row type for a product's derived rating fields.
#[derive(Debug, sqlx::FromRow)]
struct ProductRatingRow {
    average_rating: Decimal,
    review_count: i32,
}

/// Convert a review count to the `INTEGER` column type.
fn review_count_column(count: u32) -> Result<i32, RepositoryError> {
    i32::try_from(count).map_err(|e| {
        RepositoryError::DataCorruption(format!("review count {count} does not fit the column: {e}"))
    })
}

impl TryFrom<ProductRatingRow> for RatingSummary {
    type Error = RepositoryError;

    fn try_from(row: ProductRatingRow) -> Result<Self, Self::Error> {
        let review_count = u32::try_from(row.review_count).map_err(|e| {
            RepositoryError::DataCorruption(format!("negative review count in database: {e}"))
        })?;

        Ok(Self {
            average_rating: row.average_rating,
            review_count,
        })
    }
}

// =============================================================================
// Store
// =============================================================================

/// Review store backed by `PostgreSQL`.
#[derive(Debug, Clone)]
pub struct PgReviewStore {
    pool: PgPool,
}

impl PgReviewStore {
    /// Create a new store on an existing pool.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Get a reference to the underlying pool.
    #[must_use]
    pub const fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Create a user, or refresh the name/role of the user with that email.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn upsert_user(
        &self,
        name: &str,
        email: &str,
        role: Role,
    ) -> Result<UserId, RepositoryError> {
        let id = sqlx::query_scalar::<_, UserId>(
            r#"
            INSERT INTO reviews.user (id, name, email, role)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (email) DO UPDATE SET name = EXCLUDED.name, role = EXCLUDED.role
            RETURNING id
            "#,
        )
        .bind(UserId::generate())
        .bind(name)
        .bind(email)
        .bind(role)
        .fetch_one(&self.pool)
        .await?;

        Ok(id)
    }

    /// Create a product with no reviews.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn create_product(&self, name: &str) -> Result<ProductId, RepositoryError> {
        let id = ProductId::generate();

        sqlx::query(
            r#"
            INSERT INTO reviews.product (id, name)
            VALUES ($1, $2)
            "#,
        )
        .bind(id)
        .bind(name)
        .execute(&self.pool)
        .await?;

        Ok(id)
    }

    /// Create a review. The product aggregate is not touched.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the user or product does not exist.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn create_review(
        &self,
        user_id: UserId,
        product_id: ProductId,
        rating: Rating,
        comment: Option<&str>,
    ) -> Result<Review, RepositoryError> {
        let row = sqlx::query_as::<_, ReviewRow>(
            r#"
            INSERT INTO reviews.review (id, user_id, product_id, rating, comment)
            SELECT $1, $2, $3, $4, $5
            WHERE EXISTS (SELECT 1 FROM reviews.user WHERE id = $2)
              AND EXISTS (SELECT 1 FROM reviews.product WHERE id = $3)
            RETURNING id, user_id, product_id, rating, comment, created_at, updated_at
            "#,
        )
        .bind(ReviewId::generate())
        .bind(user_id)
        .bind(product_id)
        .bind(rating)
        .bind(comment)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| RepositoryError::Conflict("unknown user or product".to_owned()))?;

        Ok(row.into())
    }

    /// Get a product's derived rating fields.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if the stored count is negative.
    pub async fn find_product_rating(
        &self,
        product_id: ProductId,
    ) -> Result<Option<RatingSummary>, RepositoryError> {
        let row = sqlx::query_as::<_, ProductRatingRow>(
            r#"
            SELECT average_rating, review_count
            FROM reviews.product
            WHERE id = $1
            "#,
        )
        .bind(product_id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(TryInto::try_into).transpose()
    }
}

#[async_trait]
impl ReviewStore for PgReviewStore {
    async fn find_review(&self, id: ReviewId) -> Result<Option<Review>, RepositoryError> {
        let row = sqlx::query_as::<_, ReviewRow>(
            r#"
            SELECT id, user_id, product_id, rating, comment, created_at, updated_at
            FROM reviews.review
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Into::into))
    }

    async fn find_review_detail(
        &self,
        id: ReviewId,
    ) -> Result<Option<ReviewDetail>, RepositoryError> {
        let row = sqlx::query_as::<_, ReviewDetailRow>(
            r#"
            SELECT r.id, r.rating, r.comment, r.created_at, r.updated_at,
                   r.user_id, u.name AS user_name, u.email AS user_email,
                   r.product_id, p.name AS product_name
            FROM reviews.review r
            LEFT JOIN reviews.user u ON u.id = r.user_id
            LEFT JOIN reviews.product p ON p.id = r.product_id
            WHERE r.id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Into::into))
    }

    async fn update_review(
        &self,
        id: ReviewId,
        patch: &ReviewPatch,
        now: DateTime<Utc>,
    ) -> Result<bool, RepositoryError> {
        let result = sqlx::query(
            r#"
            UPDATE reviews.review
            SET rating = COALESCE($2, rating),
                comment = CASE WHEN $3 THEN $4 ELSE comment END,
                updated_at = $5
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(patch.rating)
        .bind(patch.comment.is_some())
        .bind(patch.comment.clone().flatten())
        .bind(now)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn delete_review(&self, id: ReviewId) -> Result<bool, RepositoryError> {
        let result = sqlx::query(
            r#"
            DELETE FROM reviews.review
            WHERE id = $1
            "#,
        )
        .bind(id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn product_ratings(&self, product_id: ProductId) -> Result<Vec<Rating>, RepositoryError> {
        let ratings = sqlx::query_scalar::<_, Rating>(
            r#"
            SELECT rating
            FROM reviews.review
            WHERE product_id = $1
            "#,
        )
        .bind(product_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(ratings)
    }

    async fn set_product_rating(
        &self,
        product_id: ProductId,
        summary: RatingSummary,
    ) -> Result<bool, RepositoryError> {
        let review_count = review_count_column(summary.review_count)?;

        let result = sqlx::query(
            r#"
            UPDATE reviews.product
            SET average_rating = $2, review_count = $3, updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(product_id)
        .bind(summary.average_rating)
        .bind(review_count)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn ping(&self) -> Result<(), RepositoryError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}
