//! Domain models for the reviews service.
//!
//! These types represent validated domain objects separate from database row
//! types.

pub mod review;
pub mod session;

pub use review::{ProductSummary, Review, ReviewDetail, ReviewPatch, UpdateReview, UserSummary};
pub use session::{CurrentUser, keys as session_keys};
