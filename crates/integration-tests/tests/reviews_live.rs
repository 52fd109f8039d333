//! Live tests for the review endpoints.
//!
//! These tests require:
//! - A migrated `PostgreSQL` database (`reviews-cli migrate`)
//! - The API running against it (`cargo run -p reviews-api`)
//! - `REVIEWS_DATABASE_URL` pointing at that database
//! - `REVIEWS_TEST_BASE_URL` if the API is not on <http://localhost:3000>
//!
//! Run with: cargo test -p reviews-integration-tests -- --ignored

use reqwest::StatusCode;
use rust_decimal::Decimal;
use serde_json::{Value, json};

use reviews_api::models::CurrentUser;
use reviews_core::{ProductId, Rating, ReviewId, Role, UserId};
use reviews_integration_tests::LiveContext;

/// A product with reviews by a fresh author.
struct Fixture {
    author: UserId,
    product: ProductId,
    reviews: Vec<ReviewId>,
}

async fn fixture(ctx: &LiveContext, ratings: &[i64]) -> Fixture {
    // Unique per run so repeated runs don't collide on email
    let tag = ReviewId::generate();
    let author = ctx
        .store
        .upsert_user("Live Author", &format!("author-{tag}@reviews.test"), Role::User)
        .await
        .expect("Failed to create author");
    let product = ctx
        .store
        .create_product(&format!("Live Product {tag}"))
        .await
        .expect("Failed to create product");

    let mut reviews = Vec::new();
    for &value in ratings {
        let review = ctx
            .store
            .create_review(
                author,
                product,
                Rating::new(value).expect("valid rating"),
                None,
            )
            .await
            .expect("Failed to create review");
        reviews.push(review.id);
    }

    Fixture {
        author,
        product,
        reviews,
    }
}

async fn product_rating(ctx: &LiveContext, product: ProductId) -> (Decimal, u32) {
    let summary = ctx
        .store
        .find_product_rating(product)
        .await
        .expect("Failed to read product")
        .expect("product exists");
    (summary.average_rating, summary.review_count)
}

fn dec(s: &str) -> Decimal {
    s.parse().expect("valid decimal")
}

// ============================================================================
// Public Routes
// ============================================================================

#[tokio::test]
#[ignore = "Requires running reviews API and database"]
async fn test_health() {
    let ctx = LiveContext::new().await;

    let resp = ctx
        .client
        .get(ctx.url("/health/ready"))
        .send()
        .await
        .expect("Failed to reach server");

    assert_eq!(resp.status(), StatusCode::OK);
    assert!(resp.headers().contains_key("x-request-id"));
}

#[tokio::test]
#[ignore = "Requires running reviews API and database"]
async fn test_user_route_placeholder() {
    let ctx = LiveContext::new().await;

    let body: Value = ctx
        .client
        .get(ctx.url("/users/abc123"))
        .send()
        .await
        .expect("Failed to reach server")
        .json()
        .await
        .expect("Failed to parse response");

    assert_eq!(
        body,
        json!({"message": "User route is working", "userId": "abc123"})
    );
}

#[tokio::test]
#[ignore = "Requires running reviews API and database"]
async fn test_get_review() {
    let ctx = LiveContext::new().await;
    let fx = fixture(&ctx, &[4]).await;

    let resp = ctx
        .client
        .get(ctx.url(&format!("/reviews/{}", fx.reviews[0])))
        .send()
        .await
        .expect("Failed to reach server");
    assert_eq!(resp.status(), StatusCode::OK);

    let body: Value = resp.json().await.expect("Failed to parse response");
    assert_eq!(body["data"]["user"]["id"], fx.author.to_string());
    assert_eq!(body["data"]["product"]["id"], fx.product.to_string());
    assert_eq!(body["data"]["rating"], 4);
}

// ============================================================================
// Mutations
// ============================================================================

#[tokio::test]
#[ignore = "Requires running reviews API and database"]
async fn test_delete_recomputes_product() {
    let ctx = LiveContext::new().await;
    let fx = fixture(&ctx, &[4, 5, 3]).await;
    let cookie = ctx
        .login(CurrentUser {
            user_id: fx.author,
            role: Role::User,
        })
        .await;

    let resp = ctx
        .client
        .delete(ctx.url(&format!("/reviews/{}", fx.reviews[2])))
        .header("cookie", &cookie)
        .send()
        .await
        .expect("Failed to reach server");
    assert_eq!(resp.status(), StatusCode::OK);

    assert_eq!(product_rating(&ctx, fx.product).await, (dec("4.5"), 2));

    let again = ctx
        .client
        .delete(ctx.url(&format!("/reviews/{}", fx.reviews[2])))
        .header("cookie", &cookie)
        .send()
        .await
        .expect("Failed to reach server");
    assert_eq!(again.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
#[ignore = "Requires running reviews API and database"]
async fn test_update_recomputes_product() {
    let ctx = LiveContext::new().await;
    let fx = fixture(&ctx, &[2, 3]).await;
    let cookie = ctx
        .login(CurrentUser {
            user_id: fx.author,
            role: Role::User,
        })
        .await;

    let resp = ctx
        .client
        .put(ctx.url(&format!("/reviews/{}", fx.reviews[0])))
        .header("cookie", &cookie)
        .json(&json!({"rating": 5, "comment": ""}))
        .send()
        .await
        .expect("Failed to reach server");
    assert_eq!(resp.status(), StatusCode::OK);

    let body: Value = resp.json().await.expect("Failed to parse response");
    assert_eq!(body["data"]["rating"], 5);
    assert_eq!(body["data"]["comment"], "");

    assert_eq!(product_rating(&ctx, fx.product).await, (dec("4.0"), 2));
}

#[tokio::test]
#[ignore = "Requires running reviews API and database"]
async fn test_stranger_is_forbidden() {
    let ctx = LiveContext::new().await;
    let fx = fixture(&ctx, &[2, 3]).await;
    let cookie = ctx
        .login(CurrentUser {
            user_id: UserId::generate(),
            role: Role::User,
        })
        .await;

    let resp = ctx
        .client
        .put(ctx.url(&format!("/reviews/{}", fx.reviews[0])))
        .header("cookie", &cookie)
        .json(&json!({"rating": 5}))
        .send()
        .await
        .expect("Failed to reach server");
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);

    let body: Value = resp.json().await.expect("Failed to parse response");
    assert_eq!(body["code"], "forbidden");
    assert_eq!(product_rating(&ctx, fx.product).await.1, 0);
}

#[tokio::test]
#[ignore = "Requires running reviews API and database"]
async fn test_out_of_range_rating_is_rejected() {
    let ctx = LiveContext::new().await;
    let fx = fixture(&ctx, &[3]).await;
    let cookie = ctx
        .login(CurrentUser {
            user_id: fx.author,
            role: Role::User,
        })
        .await;

    let resp = ctx
        .client
        .put(ctx.url(&format!("/reviews/{}", fx.reviews[0])))
        .header("cookie", &cookie)
        .json(&json!({"rating": 9}))
        .send()
        .await
        .expect("Failed to reach server");
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let body: Value = resp.json().await.expect("Failed to parse response");
    assert_eq!(body["error"], "Rating must be between 1 and 5");
}
