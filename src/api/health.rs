use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

/// Liveness probe. Does not touch the upstream.
pub fn health_handler() -> Response {
    (StatusCode::OK, "OK").into_response()
}
