//! Core types for the reviews service.
//!
//! This module provides type-safe wrappers for the review domain.

pub mod id;
pub mod rating;
pub mod role;

pub use id::*;
pub use rating::{Rating, RatingError, RatingSummary};
pub use role::Role;
