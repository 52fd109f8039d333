//! Business logic services.
//!
//! # Services
//!
//! - `reviews` - Review lifecycle (fetch, update, delete) and the product
//!   rating aggregate kept in step with it

pub mod reviews;

pub use reviews::{ReviewAction, ReviewError, ReviewService};
