//! API error types and response formatting.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use crate::content::{ListError, ReadError};
use crate::security::boundary::Denial;
use crate::themes::SaveError;

/// API error type that converts to appropriate HTTP responses.
///
/// Every filesystem or parsing failure is mapped into one of these at the
/// handler boundary; nothing propagates to the caller as a raw error.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Malformed path, id, or request body.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Boundary violation, symlink, permission, or CSRF failure. The
    /// detail stays in the logs; the response body is generic.
    #[error("access denied: {0}")]
    AccessDenied(String),

    /// Resource not found.
    #[error("not found: {0}")]
    NotFound(String),

    /// File or payload over its size cap.
    #[error("too large: {0}")]
    TooLarge(String),

    /// Client exceeded the request-rate window.
    #[error("rate limited")]
    RateLimited,

    /// Unexpected I/O or internal failure.
    #[error("internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

/// JSON error response body.
#[derive(Debug, Clone, Serialize)]
struct ErrorResponse {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    message: Option<String>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error, message) = match &self {
            Self::InvalidInput(msg) => (StatusCode::BAD_REQUEST, "invalid_input", Some(msg.clone())),
            Self::AccessDenied(_) => (
                StatusCode::FORBIDDEN,
                "access_denied",
                Some("Access denied".to_string()),
            ),
            Self::NotFound(msg) => (StatusCode::NOT_FOUND, "not_found", Some(msg.clone())),
            Self::TooLarge(msg) => (
                StatusCode::PAYLOAD_TOO_LARGE,
                "too_large",
                Some(msg.clone()),
            ),
            Self::RateLimited => (
                StatusCode::TOO_MANY_REQUESTS,
                "rate_limited",
                Some("Rate limit exceeded".to_string()),
            ),
            Self::Internal(err) => {
                tracing::error!(error = %err, "internal server error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal_error",
                    Some("An internal error occurred".to_string()),
                )
            }
        };

        let body = ErrorResponse {
            error: error.to_string(),
            message,
        };

        (status, Json(body)).into_response()
    }
}

impl From<Denial> for ApiError {
    fn from(denial: Denial) -> Self {
        match denial {
            Denial::InvalidPath => ApiError::InvalidInput("invalid path".to_string()),
            Denial::SymlinkRejected => ApiError::AccessDenied("symlink rejected".to_string()),
            Denial::OutsideBoundary => ApiError::AccessDenied("outside boundary".to_string()),
        }
    }
}

impl From<ListError> for ApiError {
    fn from(e: ListError) -> Self {
        match e {
            ListError::PermissionDenied => ApiError::AccessDenied("permission denied".to_string()),
            ListError::Io(e) => ApiError::Internal(e.into()),
        }
    }
}

impl From<ReadError> for ApiError {
    fn from(e: ReadError) -> Self {
        match e {
            ReadError::NotFound => ApiError::NotFound("file not found".to_string()),
            ReadError::NotMarkdown => ApiError::InvalidInput("not a markdown file".to_string()),
            ReadError::TooLarge { size, max } => {
                ApiError::TooLarge(format!("file is {} bytes, cap is {}", size, max))
            }
            ReadError::InvalidEncoding => {
                ApiError::InvalidInput("file is not valid UTF-8".to_string())
            }
            ReadError::PermissionDenied => {
                ApiError::AccessDenied("permission denied".to_string())
            }
            ReadError::Io(e) => ApiError::Internal(e.into()),
        }
    }
}

impl From<SaveError> for ApiError {
    fn from(e: SaveError) -> Self {
        match e {
            SaveError::InvalidId => ApiError::InvalidInput("valid theme id required".to_string()),
            SaveError::TooLarge { size, max } => {
                ApiError::TooLarge(format!("theme is {} bytes serialized, cap is {}", size, max))
            }
            SaveError::Io(e) => ApiError::Internal(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        let cases = [
            (ApiError::InvalidInput("x".into()), StatusCode::BAD_REQUEST),
            (ApiError::AccessDenied("x".into()), StatusCode::FORBIDDEN),
            (ApiError::NotFound("x".into()), StatusCode::NOT_FOUND),
            (ApiError::TooLarge("x".into()), StatusCode::PAYLOAD_TOO_LARGE),
            (ApiError::RateLimited, StatusCode::TOO_MANY_REQUESTS),
            (
                ApiError::Internal(anyhow::anyhow!("boom")),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];
        for (error, status) in cases {
            assert_eq!(error.into_response().status(), status);
        }
    }

    #[test]
    fn test_denied_response_hides_reason() {
        let response = ApiError::AccessDenied("symlink rejected".into()).into_response();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
        // Detail is for the logs; the body carries the generic message only.
    }

    #[test]
    fn test_denial_conversion() {
        assert!(matches!(
            ApiError::from(Denial::InvalidPath),
            ApiError::InvalidInput(_)
        ));
        assert!(matches!(
            ApiError::from(Denial::SymlinkRejected),
            ApiError::AccessDenied(_)
        ));
        assert!(matches!(
            ApiError::from(Denial::OutsideBoundary),
            ApiError::AccessDenied(_)
        ));
    }
}
