//! Error types for portal fetching and the HTTP layer

use axum::{
    Json,
    extract::rejection::QueryRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;
use tracing::error;

/// Errors that can occur while serving a portal request
#[derive(Debug, Error)]
pub enum ApiError {
    /// Upstream request failed (transport error or non-success status)
    #[error("Upstream request failed: {0}")]
    Upstream(#[from] reqwest::Error),

    /// Upstream body was not the expected JSON
    #[error("Upstream returned malformed JSON: {0}")]
    Decode(#[from] serde_json::Error),

    /// A link or base URL could not be resolved
    #[error("Invalid URL: {0}")]
    Url(#[from] url::ParseError),

    /// Query string could not be decoded (e.g. a repeated key)
    #[error("Invalid query string: {0}")]
    Query(#[from] QueryRejection),

    /// `date` parameter could not be read as a calendar date
    #[error("Invalid date '{0}', expected an ISO 8601 date such as YYYY-MM-DD")]
    InvalidDate(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::InvalidDate(_) => StatusCode::BAD_REQUEST,
            ApiError::Query(rejection) => rejection.status(),
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!(error = %self, "Request failed");
        }
        let body = Json(serde_json::json!({ "error": self.to_string() }));
        (status, body).into_response()
    }
}
