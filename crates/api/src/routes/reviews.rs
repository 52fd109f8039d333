//! Review route handlers.

use axum::{
    Json,
    body::Bytes,
    extract::{
        Path, State,
        rejection::{BytesRejection, PathRejection},
    },
};
use serde::Serialize;

use crate::error::{AppError, Result};
use crate::middleware::OptionalAuth;
use crate::models::{ReviewDetail, UpdateReview};
use crate::services::ReviewAction;
use crate::state::AppState;

type PathParam = std::result::Result<Path<String>, PathRejection>;

/// Successful response carrying a payload.
#[derive(Debug, Serialize)]
pub struct DataResponse<T> {
    pub success: bool,
    pub data: T,
}

impl<T> DataResponse<T> {
    const fn new(data: T) -> Self {
        Self {
            success: true,
            data,
        }
    }
}

/// Successful response carrying a human-readable message.
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub success: bool,
    pub message: &'static str,
}

/// Raw path segment. An undecodable segment becomes the empty string, which
/// the service reports as an invalid id.
fn review_id(path: PathParam) -> String {
    path.map(|Path(id)| id).unwrap_or_default()
}

/// Decode a PUT body as JSON whatever `Content-Type` the client sent.
fn update_body(body: &[u8]) -> Result<UpdateReview> {
    serde_json::from_slice(body)
        .map_err(|e| AppError::BadRequest(format!("Invalid request body: {e}")))
}

/// Fetch a review.
pub async fn show(
    State(state): State<AppState>,
    path: PathParam,
) -> Result<Json<DataResponse<ReviewDetail>>> {
    let detail = state.reviews().fetch(&review_id(path)).await?;
    Ok(Json(DataResponse::new(detail)))
}

/// Update a review's rating and/or comment.
///
/// The body is only looked at once the caller is known to be allowed to
/// touch the review.
pub async fn update(
    State(state): State<AppState>,
    OptionalAuth(caller): OptionalAuth,
    path: PathParam,
    body: std::result::Result<Bytes, BytesRejection>,
) -> Result<Json<DataResponse<ReviewDetail>>> {
    let review = state
        .reviews()
        .authorize(&review_id(path), caller.as_ref(), ReviewAction::Update)
        .await?;

    let body = update_body(&body?)?;

    let detail = state.reviews().apply_update(&review, body).await?;
    Ok(Json(DataResponse::new(detail)))
}

/// Delete a review.
pub async fn delete(
    State(state): State<AppState>,
    OptionalAuth(caller): OptionalAuth,
    path: PathParam,
) -> Result<Json<MessageResponse>> {
    state
        .reviews()
        .delete(&review_id(path), caller.as_ref())
        .await?;

    Ok(Json(MessageResponse {
        success: true,
        message: "Review deleted successfully",
    }))
}
