//! Star ratings and the per-product rating aggregate.

use core::fmt;

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

/// Errors that can occur when constructing a [`Rating`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum RatingError {
    /// The value is outside the 1-5 star range.
    #[error("Rating must be between {min} and {max}")]
    OutOfRange {
        /// Smallest accepted value.
        min: u8,
        /// Largest accepted value.
        max: u8,
    },
}

/// A whole-star rating between 1 and 5 inclusive.
///
/// ## Examples
///
/// ```
/// use reviews_core::Rating;
///
/// assert!(Rating::new(1).is_ok());
/// assert!(Rating::new(5).is_ok());
///
/// assert!(Rating::new(0).is_err());
/// assert!(Rating::new(6).is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "u8")]
pub struct Rating(u8);

impl Rating {
    /// Lowest rating.
    pub const MIN: u8 = 1;
    /// Highest rating.
    pub const MAX: u8 = 5;

    /// Create a rating, checking the 1-5 range.
    ///
    /// # Errors
    ///
    /// Returns `RatingError::OutOfRange` if `value` is not between 1 and 5.
    pub fn new(value: i64) -> Result<Self, RatingError> {
        u8::try_from(value)
            .ok()
            .filter(|v| (Self::MIN..=Self::MAX).contains(v))
            .map(Self)
            .ok_or(RatingError::OutOfRange {
                min: Self::MIN,
                max: Self::MAX,
            })
    }

    /// Get the number of stars.
    #[must_use]
    pub const fn get(self) -> u8 {
        self.0
    }
}

impl fmt::Display for Rating {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<i64> for Rating {
    type Error = RatingError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Rating> for u8 {
    fn from(rating: Rating) -> Self {
        rating.0
    }
}

// Stored as SMALLINT.
#[cfg(feature = "postgres")]
impl sqlx::Type<sqlx::Postgres> for Rating {
    fn type_info() -> sqlx::postgres::PgTypeInfo {
        <i16 as sqlx::Type<sqlx::Postgres>>::type_info()
    }

    fn compatible(ty: &sqlx::postgres::PgTypeInfo) -> bool {
        <i16 as sqlx::Type<sqlx::Postgres>>::compatible(ty)
    }
}

#[cfg(feature = "postgres")]
impl<'r> sqlx::Decode<'r, sqlx::Postgres> for Rating {
    fn decode(value: sqlx::postgres::PgValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        let stars = <i16 as sqlx::Decode<sqlx::Postgres>>::decode(value)?;
        Ok(Self::new(i64::from(stars))?)
    }
}

#[cfg(feature = "postgres")]
impl sqlx::Encode<'_, sqlx::Postgres> for Rating {
    fn encode_by_ref(
        &self,
        buf: &mut sqlx::postgres::PgArgumentBuffer,
    ) -> Result<sqlx::encode::IsNull, sqlx::error::BoxDynError> {
        <i16 as sqlx::Encode<sqlx::Postgres>>::encode_by_ref(&i16::from(self.0), buf)
    }
}

/// The derived rating fields of a product.
///
/// `average_rating` is the arithmetic mean of all ratings rounded half-up to
/// one decimal place; `review_count` is the number of ratings. Both are zero
/// for a product without reviews.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RatingSummary {
    /// Mean rating, one decimal place.
    #[serde(with = "rust_decimal::serde::float")]
    pub average_rating: Decimal,
    /// Number of reviews the mean was taken over.
    pub review_count: u32,
}

impl RatingSummary {
    /// Summary of a product with no reviews.
    #[must_use]
    pub const fn empty() -> Self {
        Self {
            average_rating: Decimal::ZERO,
            review_count: 0,
        }
    }

    /// Compute the summary for a set of ratings.
    ///
    /// ```
    /// use reviews_core::{Rating, RatingSummary};
    /// use rust_decimal::Decimal;
    ///
    /// let ratings = [4, 5].map(|r| Rating::new(r).unwrap());
    /// let summary = RatingSummary::from_ratings(ratings);
    /// assert_eq!(summary.average_rating, Decimal::new(45, 1));
    /// assert_eq!(summary.review_count, 2);
    /// ```
    #[must_use]
    pub fn from_ratings<I>(ratings: I) -> Self
    where
        I: IntoIterator<Item = Rating>,
    {
        let (sum, count) = ratings
            .into_iter()
            .fold((0_u64, 0_u32), |(sum, count), rating| {
                (sum + u64::from(rating.get()), count.saturating_add(1))
            });

        if count == 0 {
            return Self::empty();
        }

        let mean = Decimal::from(sum) / Decimal::from(count);

        Self {
            average_rating: mean.round_dp_with_strategy(1, RoundingStrategy::MidpointAwayFromZero),
            review_count: count,
        }
    }
}

impl Default for RatingSummary {
    fn default() -> Self {
        Self::empty()
    }
}
