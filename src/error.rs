use serde_json::json;

/// Error type shared by every stage of a completion flow.
#[derive(Debug, thiserror::Error)]
pub enum RelayError {
    #[error("Config error: {0}")]
    Config(String),
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
    #[error("HTTP error with the status: {status} {message}")]
    Upstream { status: u16, message: String },
    #[error("Transport error: {0}")]
    Transport(String),
    #[error("Upstream returned no choices")]
    EmptyChoices,
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Broad error category for status code selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    InvalidRequest,
    BadGateway,
    ServerError,
}

impl RelayError {
    #[must_use]
    pub fn category(&self) -> ErrorCategory {
        match self {
            RelayError::InvalidRequest(_) => ErrorCategory::InvalidRequest,
            RelayError::Upstream { .. } | RelayError::Transport(_) | RelayError::EmptyChoices => {
                ErrorCategory::BadGateway
            }
            RelayError::Config(_) | RelayError::Internal(_) => ErrorCategory::ServerError,
        }
    }

    /// Status code reported to the inbound caller for this error.
    #[must_use]
    pub fn status_code(&self) -> http::StatusCode {
        match self.category() {
            ErrorCategory::InvalidRequest => http::StatusCode::BAD_REQUEST,
            ErrorCategory::BadGateway => http::StatusCode::BAD_GATEWAY,
            ErrorCategory::ServerError => http::StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn type_name(&self) -> &'static str {
        match self {
            RelayError::Config(_) => "config_error",
            RelayError::InvalidRequest(_) => "invalid_request_error",
            RelayError::Upstream { .. } => "upstream_error",
            RelayError::Transport(_) => "transport_error",
            RelayError::EmptyChoices => "empty_choices",
            RelayError::Internal(_) => "internal_error",
        }
    }
}

impl From<reqwest::Error> for RelayError {
    fn from(err: reqwest::Error) -> Self {
        RelayError::Transport(err.to_string())
    }
}

/// Format an error as `(status_code, JSON body)` for the inbound caller.
#[must_use]
pub fn format_error(err: &RelayError) -> (http::StatusCode, serde_json::Value) {
    let body = json!({
        "error": {
            "message": err.to_string(),
            "type": err.type_name(),
        }
    });
    (err.status_code(), body)
}

impl axum::response::IntoResponse for RelayError {
    fn into_response(self) -> axum::response::Response {
        let (status, body) = format_error(&self);
        (status, axum::Json(body)).into_response()
    }
}
