use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde_json::json;

use auditdesk_infra::SeedError;

pub fn seed_error_to_response(err: &SeedError) -> axum::response::Response {
    json_error(StatusCode::INTERNAL_SERVER_ERROR, err.to_string())
}

/// `{ "error": message }`, the body the functions client reads on failure.
pub fn json_error(status: StatusCode, message: impl Into<String>) -> axum::response::Response {
    (status, axum::Json(json!({ "error": message.into() }))).into_response()
}
