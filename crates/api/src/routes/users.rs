//! User route handlers.
//!
//! User lookup is not implemented. The route exists so clients can call it;
//! it echoes the requested id without checking that the user exists or that
//! the id is well-formed.

use axum::{Json, extract::Path};
use serde::Serialize;

/// Placeholder response for the user route.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserRouteResponse {
    pub message: &'static str,
    pub user_id: String,
}

/// Echo the requested user id.
pub async fn show(Path(user_id): Path<String>) -> Json<UserRouteResponse> {
    Json(UserRouteResponse {
        message: "User route is working",
        user_id,
    })
}
