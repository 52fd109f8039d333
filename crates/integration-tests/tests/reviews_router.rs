//! Router tests for the review endpoints.
//!
//! Drive the full application router (sessions, request ids, error envelope)
//! in process over the in-memory review and session stores.

use axum::body::Body;
use axum::http::{Method, Request, StatusCode, header};
use rust_decimal::Decimal;
use serde_json::json;

use reviews_api::models::{CurrentUser, Review};
use reviews_core::{ProductId, Rating, ReviewId, Role, UserId};
use reviews_integration_tests::{TestApp, TestResponse};

struct World {
    app: TestApp,
    product: ProductId,
    author: UserId,
    stranger: UserId,
    admin: UserId,
}

impl World {
    async fn new() -> Self {
        let app = TestApp::new();
        let author = app
            .store
            .insert_user("Ada", "ada@example.com")
            .await;
        let stranger = app
            .store
            .insert_user("Bob", "bob@example.com")
            .await;
        let admin = app
            .store
            .insert_user("Root", "root@example.com")
            .await;
        let product = app.store.insert_product("Dried Mango").await;

        Self {
            app,
            product,
            author,
            stranger,
            admin,
        }
    }

    /// Add reviews by the author, then bring the product aggregate up to date
    /// the way the API would after a write.
    async fn reviews(&self, ratings: &[i64]) -> Vec<Review> {
        let mut reviews = Vec::new();
        for &value in ratings {
            let review = self
                .app
                .store
                .insert_review(
                    self.author,
                    self.product,
                    Rating::new(value).expect("valid rating"),
                    Some("tasty"),
                )
                .await
                .expect("Failed to insert review");
            reviews.push(review);
        }
        let ratings = reviews.iter().map(|r| r.rating);
        let summary = reviews_core::RatingSummary::from_ratings(ratings);
        reviews_api::db::ReviewStore::set_product_rating(&self.app.store, self.product, summary)
            .await
            .expect("Failed to set product rating");
        reviews
    }

    async fn cookie(&self, user_id: UserId, role: Role) -> String {
        self.app.login(CurrentUser { user_id, role }).await
    }

    async fn get(&self, uri: &str) -> TestResponse {
        self.app.send(Method::GET, uri, None, None).await
    }

    async fn put(&self, uri: &str, cookie: Option<&str>, body: &str) -> TestResponse {
        self.app.send(Method::PUT, uri, cookie, Some(body)).await
    }

    async fn delete(&self, uri: &str, cookie: Option<&str>) -> TestResponse {
        self.app.send(Method::DELETE, uri, cookie, None).await
    }

    async fn product_rating(&self) -> (Decimal, u32) {
        let summary = self
            .app
            .store
            .product_rating(self.product)
            .await
            .expect("product exists");
        (summary.average_rating, summary.review_count)
    }
}

fn dec(s: &str) -> Decimal {
    s.parse().expect("valid decimal")
}

fn assert_error(response: &TestResponse, status: StatusCode, code: &str, message: &str) {
    assert_eq!(response.status, status, "body: {}", response.body);
    assert_eq!(response.body["success"], false);
    assert_eq!(response.body["code"], code);
    assert_eq!(response.body["error"], message);
}

// =============================================================================
// GET /reviews/{reviewId}
// =============================================================================

#[tokio::test]
async fn test_get_review_resolves_references() {
    let world = World::new().await;
    let reviews = world.reviews(&[4]).await;
    let id = reviews[0].id;

    let response = world.get(&format!("/reviews/{id}")).await;

    assert_eq!(response.status, StatusCode::OK);
    let body = &response.body;
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["id"], id.to_string());
    assert_eq!(body["data"]["rating"], 4);
    assert_eq!(body["data"]["comment"], "tasty");
    assert_eq!(
        body["data"]["user"],
        json!({"id": world.author.to_string(), "name": "Ada", "email": "ada@example.com"})
    );
    assert_eq!(
        body["data"]["product"],
        json!({"id": world.product.to_string(), "name": "Dried Mango"})
    );
    assert!(body["data"]["createdAt"].is_string());
    assert!(body["data"]["updatedAt"].is_string());
}

#[tokio::test]
async fn test_get_review_with_deleted_author_renders_null() {
    let world = World::new().await;
    let reviews = world.reviews(&[4]).await;
    world.app.store.remove_user(world.author).await;

    let response = world.get(&format!("/reviews/{}", reviews[0].id)).await;

    assert_eq!(response.status, StatusCode::OK);
    assert!(response.body["data"]["user"].is_null());
    assert_eq!(response.body["data"]["product"]["name"], "Dried Mango");
}

#[tokio::test]
async fn test_get_review_invalid_id() {
    let world = World::new().await;
    let response = world.get("/reviews/not-an-id").await;
    assert_error(
        &response,
        StatusCode::BAD_REQUEST,
        "invalid_identifier",
        "Invalid review ID",
    );
}

#[tokio::test]
async fn test_get_review_not_found() {
    let world = World::new().await;
    let response = world
        .get(&format!("/reviews/{}", ReviewId::generate()))
        .await;
    assert_error(
        &response,
        StatusCode::NOT_FOUND,
        "not_found",
        "Review not found",
    );
}

// =============================================================================
// PUT /reviews/{reviewId}
// =============================================================================

#[tokio::test]
async fn test_put_requires_session() {
    let world = World::new().await;
    let reviews = world.reviews(&[4]).await;

    let response = world
        .put(&format!("/reviews/{}", reviews[0].id), None, r#"{"rating": 1}"#)
        .await;

    assert_error(
        &response,
        StatusCode::UNAUTHORIZED,
        "unauthenticated",
        "Unauthorized",
    );
    assert_eq!(world.product_rating().await, (dec("4.0"), 1));
}

#[tokio::test]
async fn test_put_with_unknown_session_cookie_is_unauthenticated() {
    let world = World::new().await;
    let reviews = world.reviews(&[4]).await;

    let response = world
        .put(
            &format!("/reviews/{}", reviews[0].id),
            Some("reviews_session=bm90LWEtc2Vzc2lvbi1pZA"),
            r#"{"rating": 1}"#,
        )
        .await;

    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_put_updates_rating_and_recomputes() {
    let world = World::new().await;
    let reviews = world.reviews(&[2, 3]).await;
    let cookie = world.cookie(world.author, Role::User).await;

    let response = world
        .put(
            &format!("/reviews/{}", reviews[0].id),
            Some(&cookie),
            r#"{"rating": 5}"#,
        )
        .await;

    assert_eq!(response.status, StatusCode::OK, "body: {}", response.body);
    assert_eq!(response.body["success"], true);
    assert_eq!(response.body["data"]["rating"], 5);
    assert_eq!(response.body["data"]["comment"], "tasty");
    assert_eq!(response.body["data"]["user"]["name"], "Ada");
    assert_eq!(world.product_rating().await, (dec("4.0"), 2));
}

#[tokio::test]
async fn test_put_without_content_type_still_updates() {
    let world = World::new().await;
    let reviews = world.reviews(&[2, 3]).await;
    let cookie = world.cookie(world.author, Role::User).await;

    let request = Request::builder()
        .method(Method::PUT)
        .uri(format!("/reviews/{}", reviews[0].id))
        .header(header::COOKIE, &cookie)
        .body(Body::from(r#"{"rating":5}"#))
        .expect("Failed to build request");
    let response = world.app.request(request).await;

    assert_eq!(response.status, StatusCode::OK, "body: {}", response.body);
    assert_eq!(response.body["data"]["rating"], 5);
    assert_eq!(world.product_rating().await, (dec("4.0"), 2));
}

#[tokio::test]
async fn test_put_by_stranger_is_forbidden() {
    let world = World::new().await;
    let reviews = world.reviews(&[2, 3]).await;
    let cookie = world.cookie(world.stranger, Role::User).await;

    let response = world
        .put(
            &format!("/reviews/{}", reviews[0].id),
            Some(&cookie),
            r#"{"rating": 5}"#,
        )
        .await;

    assert_error(
        &response,
        StatusCode::FORBIDDEN,
        "forbidden",
        "Unauthorized to update this review",
    );
    let stored = world
        .get(&format!("/reviews/{}", reviews[0].id))
        .await;
    assert_eq!(stored.body["data"]["rating"], 2);
    assert_eq!(world.product_rating().await, (dec("2.5"), 2));
}

#[tokio::test]
async fn test_put_by_admin_is_allowed() {
    let world = World::new().await;
    let reviews = world.reviews(&[2]).await;
    let cookie = world.cookie(world.admin, Role::Admin).await;

    let response = world
        .put(
            &format!("/reviews/{}", reviews[0].id),
            Some(&cookie),
            r#"{"comment": null}"#,
        )
        .await;

    assert_eq!(response.status, StatusCode::OK);
    assert!(response.body["data"]["comment"].is_null());
}

#[tokio::test]
async fn test_put_out_of_range_rating() {
    let world = World::new().await;
    let reviews = world.reviews(&[3]).await;
    let cookie = world.cookie(world.author, Role::User).await;

    for body in [r#"{"rating": 6}"#, r#"{"rating": 0}"#, r#"{"rating": 3.5}"#] {
        let response = world
            .put(&format!("/reviews/{}", reviews[0].id), Some(&cookie), body)
            .await;
        assert_error(
            &response,
            StatusCode::BAD_REQUEST,
            "invalid_input",
            "Rating must be between 1 and 5",
        );
    }
    assert_eq!(world.product_rating().await, (dec("3.0"), 1));
}

#[tokio::test]
async fn test_put_malformed_body_is_invalid_input() {
    let world = World::new().await;
    let reviews = world.reviews(&[3]).await;
    let cookie = world.cookie(world.author, Role::User).await;

    for body in ["{not json", r#"{"rating": "five"}"#, "42"] {
        let response = world
            .put(&format!("/reviews/{}", reviews[0].id), Some(&cookie), body)
            .await;
        assert_eq!(response.status, StatusCode::BAD_REQUEST, "{body}");
        assert_eq!(response.body["code"], "invalid_input");
        assert_eq!(response.body["success"], false);
    }
}

#[tokio::test]
async fn test_put_checks_caller_before_body() {
    let world = World::new().await;
    let reviews = world.reviews(&[3]).await;
    let cookie = world.cookie(world.stranger, Role::User).await;

    let response = world
        .put(&format!("/reviews/{}", reviews[0].id), Some(&cookie), "{not json")
        .await;
    assert_eq!(response.status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_put_unknown_review() {
    let world = World::new().await;
    let cookie = world.cookie(world.admin, Role::Admin).await;

    let response = world
        .put(
            &format!("/reviews/{}", ReviewId::generate()),
            Some(&cookie),
            r#"{"rating": 4}"#,
        )
        .await;
    assert_error(
        &response,
        StatusCode::NOT_FOUND,
        "not_found",
        "Review not found",
    );
}

// =============================================================================
// DELETE /reviews/{reviewId}
// =============================================================================

#[tokio::test]
async fn test_delete_recomputes_product() {
    let world = World::new().await;
    let reviews = world.reviews(&[4, 5, 3]).await;
    let cookie = world.cookie(world.author, Role::User).await;

    let response = world
        .delete(&format!("/reviews/{}", reviews[2].id), Some(&cookie))
        .await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(
        response.body,
        json!({"success": true, "message": "Review deleted successfully"})
    );
    assert_eq!(world.product_rating().await, (dec("4.5"), 2));
}

#[tokio::test]
async fn test_delete_twice() {
    let world = World::new().await;
    let reviews = world.reviews(&[4]).await;
    let cookie = world.cookie(world.author, Role::User).await;
    let uri = format!("/reviews/{}", reviews[0].id);

    assert_eq!(world.delete(&uri, Some(&cookie)).await.status, StatusCode::OK);
    let second = world.delete(&uri, Some(&cookie)).await;
    assert_error(&second, StatusCode::NOT_FOUND, "not_found", "Review not found");
    assert_eq!(world.product_rating().await, (dec("0"), 0));
}

#[tokio::test]
async fn test_delete_by_stranger_is_forbidden() {
    let world = World::new().await;
    let reviews = world.reviews(&[4]).await;
    let cookie = world.cookie(world.stranger, Role::User).await;

    let response = world
        .delete(&format!("/reviews/{}", reviews[0].id), Some(&cookie))
        .await;

    assert_error(
        &response,
        StatusCode::FORBIDDEN,
        "forbidden",
        "Unauthorized to delete this review",
    );
    assert_eq!(world.app.store.review_count().await, 1);
}

#[tokio::test]
async fn test_delete_requires_session_before_id_check() {
    let world = World::new().await;
    let response = world.delete("/reviews/abc", None).await;
    assert_error(
        &response,
        StatusCode::UNAUTHORIZED,
        "unauthenticated",
        "Unauthorized",
    );
}

#[tokio::test]
async fn test_delete_invalid_id_with_session() {
    let world = World::new().await;
    let cookie = world.cookie(world.author, Role::User).await;
    let response = world.delete("/reviews/abc", Some(&cookie)).await;
    assert_error(
        &response,
        StatusCode::BAD_REQUEST,
        "invalid_identifier",
        "Invalid review ID",
    );
}

// =============================================================================
// Other routes
// =============================================================================

#[tokio::test]
async fn test_user_route_placeholder() {
    let world = World::new().await;
    let response = world.get("/users/abc123").await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(
        response.body,
        json!({"message": "User route is working", "userId": "abc123"})
    );
}

#[tokio::test]
async fn test_health_endpoints() {
    let world = World::new().await;

    let live = world.get("/health").await;
    assert_eq!(live.status, StatusCode::OK);
    assert_eq!(live.body, json!("ok"));

    let ready = world.get("/health/ready").await;
    assert_eq!(ready.status, StatusCode::OK);
}

#[tokio::test]
async fn test_unknown_route_uses_envelope() {
    let world = World::new().await;
    let response = world.get("/products").await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);
    assert_eq!(response.body["success"], false);
    assert_eq!(response.body["code"], "not_found");
}

#[tokio::test]
async fn test_request_id_is_generated() {
    let world = World::new().await;

    let response = world.get("/health").await;
    let generated = response
        .headers
        .get("x-request-id")
        .expect("request id header");
    assert_eq!(generated.len(), 36);
}
