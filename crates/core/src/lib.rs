//! Product Reviews Core - Shared domain types.
//!
//! This crate provides the types shared by the reviews components:
//! - `api` - HTTP service for reading, updating and deleting reviews
//! - `cli` - Command-line tools for migrations and seed data
//!
//! # Architecture
//!
//! The core crate contains only types and pure computations - no I/O, no
//! database access, no HTTP. The product rating aggregate lives here so that
//! every store computes it the same way.
//!
//! # Modules
//!
//! - [`types`] - Document ids, ratings, rating summaries and caller roles

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
