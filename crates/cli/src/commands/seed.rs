//! Seed the database with demo data.
//!
//! Creates (or refreshes) a demo admin and a demo author, adds a new product
//! with one review per requested rating, then recomputes the product's rating
//! through the same path the API uses after a mutation.

use std::sync::Arc;

use reviews_api::config::ApiConfig;
use reviews_api::db::{self, PgReviewStore};
use reviews_api::services::ReviewService;
use reviews_core::{Rating, Role};

const DEMO_ADMIN: (&str, &str) = ("Demo Admin", "admin@reviews.example");
const DEMO_AUTHOR: (&str, &str) = ("Demo Author", "author@reviews.example");
const DEMO_PRODUCT: &str = "Toasted Coconut Chips";

/// Seed demo users, a product and its reviews.
///
/// # Errors
///
/// Returns an error if a rating is out of range, the configuration is
/// incomplete or a database operation fails.
pub async fn demo(ratings: &[i64]) -> Result<(), Box<dyn std::error::Error>> {
    // Validate before touching the database
    let ratings = ratings
        .iter()
        .map(|&value| Rating::new(value))
        .collect::<Result<Vec<_>, _>>()?;

    let config = ApiConfig::from_env()?;
    let pool = db::create_pool(&config.database_url, 2).await?;
    let store = PgReviewStore::new(pool);

    let admin = store
        .upsert_user(DEMO_ADMIN.0, DEMO_ADMIN.1, Role::Admin)
        .await?;
    let author = store
        .upsert_user(DEMO_AUTHOR.0, DEMO_AUTHOR.1, Role::User)
        .await?;
    tracing::info!(%admin, %author, "Demo users ready");

    let product = store.create_product(DEMO_PRODUCT).await?;

    for rating in ratings {
        let review = store
            .create_review(author, product, rating, Some("Seeded review"))
            .await?;
        tracing::info!(review_id = %review.id, %rating, "Review created");
    }

    let service = ReviewService::new(Arc::new(store.clone()));
    let summary = service.recompute(product).await?;

    let stored = store.find_product_rating(product).await?;
    tracing::info!(
        %product,
        average_rating = %summary.average_rating,
        review_count = summary.review_count,
        persisted = stored.is_some(),
        "Seed complete"
    );

    Ok(())
}
