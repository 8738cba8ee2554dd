//! The response for routes and files that do not exist.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;

/// The message sent in the body of every 404 response.
pub const NOT_FOUND_MESSAGE: &str = "Not Found";

/// The fallback handler for unmatched routes.
pub async fn get_404_not_found() -> Response {
    get_404_not_found_response()
}

/// A 404 response with the JSON body `{"message":"Not Found"}`.
pub fn get_404_not_found_response() -> Response {
    (
        StatusCode::NOT_FOUND,
        Json(json!({ "message": NOT_FOUND_MESSAGE })),
    )
        .into_response()
}
