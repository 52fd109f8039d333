//! Review domain types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use reviews_core::{ProductId, Rating, RatingError, ReviewId, UserId};

/// A stored review (domain type).
///
/// `user_id` and `product_id` are fixed at creation; only `rating` and
/// `comment` change afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Review {
    /// Unique review ID.
    pub id: ReviewId,
    /// Author of the review.
    pub user_id: UserId,
    /// Product being reviewed.
    pub product_id: ProductId,
    /// Star rating.
    pub rating: Rating,
    /// Free-text comment.
    pub comment: Option<String>,
    /// When the review was created.
    pub created_at: DateTime<Utc>,
    /// When the review was last updated.
    pub updated_at: DateTime<Utc>,
}

/// Author projection shown alongside a review.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserSummary {
    pub id: UserId,
    pub name: String,
    pub email: String,
}

/// Product projection shown alongside a review.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProductSummary {
    pub id: ProductId,
    pub name: String,
}

/// A review with its author and product resolved, as returned to clients.
///
/// A reference whose target no longer exists is rendered as `null`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewDetail {
    pub id: ReviewId,
    pub user: Option<UserSummary>,
    pub product: Option<ProductSummary>,
    pub rating: Rating,
    pub comment: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Raw body of a review update.
///
/// Each field is doubly optional: the outer `Option` is `None` when the key
/// is absent, the inner one is `None` when the key is present but `null`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct UpdateReview {
    #[serde(default, deserialize_with = "present")]
    pub rating: Option<Option<serde_json::Number>>,
    #[serde(default, deserialize_with = "present")]
    pub comment: Option<Option<String>>,
}

impl UpdateReview {
    /// Check the requested values and turn them into a patch.
    ///
    /// # Errors
    ///
    /// Returns `RatingError` if a rating is given that is not a whole number
    /// between 1 and 5 (including an explicit `null`).
    pub fn validate(self) -> Result<ReviewPatch, RatingError> {
        let rating = self
            .rating
            .map(|value| {
                value
                    .as_ref()
                    .and_then(whole_number)
                    .ok_or(RatingError::OutOfRange {
                        min: Rating::MIN,
                        max: Rating::MAX,
                    })
                    .and_then(Rating::new)
            })
            .transpose()?;

        Ok(ReviewPatch {
            rating,
            comment: self.comment,
        })
    }
}

/// Validated partial update of a review.
///
/// `None` leaves a field unchanged. `comment: Some(None)` clears the comment
/// and `comment: Some(Some(String::new()))` sets it to the empty string.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReviewPatch {
    pub rating: Option<Rating>,
    pub comment: Option<Option<String>>,
}

impl ReviewPatch {
    /// Returns `true` if the patch changes nothing.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.rating.is_none() && self.comment.is_none()
    }

    /// Apply the present fields to `review`, stamping `updated_at`.
    pub fn apply(&self, review: &mut Review, now: DateTime<Utc>) {
        if let Some(rating) = self.rating {
            review.rating = rating;
        }
        if let Some(comment) = &self.comment {
            review.comment.clone_from(comment);
        }
        review.updated_at = now;
    }
}

/// Deserialize a present field (even `null`) as `Some`.
fn present<'de, T, D>(deserializer: D) -> Result<Option<T>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    T::deserialize(deserializer).map(Some)
}

/// Integer value of a JSON number, accepting `4.0` as `4`.
#[allow(clippy::cast_possible_truncation)]
fn whole_number(number: &serde_json::Number) -> Option<i64> {
    number.as_i64().or_else(|| {
        number
            .as_f64()
            .filter(|f| f.fract() == 0.0 && f.abs() <= f64::from(u32::MAX))
            .map(|f| f as i64)
    })
}
