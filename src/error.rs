use axum::{
    Json,
    response::{IntoResponse, Response},
};
use http::StatusCode;
use thiserror::Error;

use crate::envelope::ApiResponse;

#[derive(Debug, Clone, Error)]
pub enum Error {
    #[error("Failed to read config value {0}")]
    Config(String),
    #[error("Failed to generate CSRF token")]
    GenToken,
    #[error("CSRF token not matched")]
    CSRFNotMatch,
    #[error("Failed to parse url")]
    URL,
}

pub const NOT_ELIGIBLE_SUMMARY: &str =
    "This content is not eligible for instant indexing. Keep sitemaps fresh and use internal links.";

/// Failures the dispatcher turns into an error envelope.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ApiError {
    #[error("Not authenticated")]
    AuthenticationRequired,
    #[error("{0}")]
    Validation(String),
    #[error("Not found")]
    NotFound,
    #[error("Invalid OAuth state")]
    InvalidState,
    #[error("OAuth exchange failed")]
    OAuthExchange,
    #[error("Upstream request failed")]
    Transport,
    #[error("Upstream request timed out")]
    Timeout,
}

impl ApiError {
    pub fn missing_fields() -> Self {
        Self::Validation("Missing required field(s)".to_string())
    }

    pub fn not_eligible() -> Self {
        Self::Validation(NOT_ELIGIBLE_SUMMARY.to_string())
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::AuthenticationRequired => StatusCode::UNAUTHORIZED,
            ApiError::Validation(_) | ApiError::InvalidState => StatusCode::BAD_REQUEST,
            ApiError::NotFound => StatusCode::NOT_FOUND,
            ApiError::OAuthExchange | ApiError::Transport => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::Timeout => StatusCode::GATEWAY_TIMEOUT,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body: ApiResponse = ApiResponse::failure(self.to_string());
        (status, Json(body)).into_response()
    }
}
