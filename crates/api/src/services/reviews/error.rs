//! Review service error types.

use std::fmt;

use thiserror::Error;

use reviews_core::RatingError;

use crate::db::RepositoryError;

/// Mutation a caller asked to perform on a review.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReviewAction {
    Update,
    Delete,
}

impl fmt::Display for ReviewAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Update => write!(f, "update"),
            Self::Delete => write!(f, "delete"),
        }
    }
}

/// Errors that can occur during review operations.
#[derive(Debug, Error)]
pub enum ReviewError {
    /// The review id is not a well-formed document id.
    #[error("Invalid review ID")]
    InvalidIdentifier,

    /// No caller identity on a mutation.
    #[error("Unauthorized")]
    Unauthenticated,

    /// Caller is neither the author nor an admin.
    #[error("Unauthorized to {0} this review")]
    Forbidden(ReviewAction),

    /// Review does not exist (or vanished mid-operation).
    #[error("Review not found")]
    NotFound,

    /// Request body failed validation.
    #[error("{0}")]
    InvalidInput(String),

    /// Repository/database error.
    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),
}

impl From<RatingError> for ReviewError {
    fn from(err: RatingError) -> Self {
        Self::InvalidInput(err.to_string())
    }
}
