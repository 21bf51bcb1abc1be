use std::sync::Arc;

use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};

use crate::state::AppState;

/// Serve the configured HTML page.
pub async fn index_handler(state: Arc<AppState>) -> Response {
    let path = &state.config.server.index_path;
    match tokio::fs::read(path).await {
        Ok(contents) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, "text/html; charset=utf-8")],
            contents,
        )
            .into_response(),
        Err(err) => {
            tracing::warn!(path = %path, error = %err, "index page unavailable");
            StatusCode::NOT_FOUND.into_response()
        }
    }
}
