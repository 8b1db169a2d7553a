//! API error handling module
//!
//! Provides a unified error type for all API endpoints with structured error variants.
//! Every error body is envelope-shaped: `{success: false, message, code, timestamp}`.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use lifecheck_core::LivenessError;
use thiserror::Error;

/// API error type with structured variants for different error categories
#[derive(Debug, Error)]
pub enum ApiError {
    /// Bad request - client provided invalid input
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Unauthorized - missing or invalid credentials
    #[error("{0}")]
    Unauthorized(String),

    /// Not found - requested resource does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// Conflict - resource already exists
    #[error("{0}")]
    Conflict(String),

    /// Internal server error - unexpected server-side failure
    #[error("Internal error: {0}")]
    Internal(String),

    /// Service unavailable - required service is not configured or available
    #[error("Service unavailable: {0}")]
    ServiceUnavailable(String),

    /// Liveness core error
    #[error("Liveness error: {0}")]
    Liveness(#[from] LivenessError),
}

impl ApiError {
    /// Create a bad request error
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::BadRequest(message.into())
    }

    /// Create an unauthorized error
    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::Unauthorized(message.into())
    }

    /// Create a not found error
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound(message.into())
    }

    /// Create a conflict error
    pub fn conflict(message: impl Into<String>) -> Self {
        Self::Conflict(message.into())
    }

    /// Create an internal server error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// Create a service unavailable error
    pub fn service_unavailable(message: impl Into<String>) -> Self {
        Self::ServiceUnavailable(message.into())
    }

    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::ServiceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            Self::Liveness(ref e) => match e {
                LivenessError::UserNotFound(_) => StatusCode::NOT_FOUND,

                // Client-provided invalid input → 400
                LivenessError::InvalidMedia(_) | LivenessError::NoProfilePhoto => {
                    StatusCode::BAD_REQUEST
                }

                // Capability and local failures → 500
                LivenessError::Transport(_)
                | LivenessError::Capability(_)
                | LivenessError::Internal(_)
                | LivenessError::Directory(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
        }
    }

    /// Get the error code for programmatic error handling
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::BadRequest(_) => "INVALID_INPUT",
            Self::Unauthorized(_) => "UNAUTHORIZED",
            Self::NotFound(_) => "NOT_FOUND",
            Self::Conflict(_) => "CONFLICT",
            Self::Internal(_) => "INTERNAL_ERROR",
            Self::ServiceUnavailable(_) => "SERVICE_UNAVAILABLE",
            Self::Liveness(ref e) => match e {
                LivenessError::UserNotFound(_) => "USER_NOT_FOUND",
                LivenessError::NoProfilePhoto => "NO_PROFILE_PHOTO",
                LivenessError::InvalidMedia(_) => "INVALID_MEDIA",
                LivenessError::Transport(_) => "LIVENESS_UNAVAILABLE",
                LivenessError::Capability(_) => "LIVENESS_ERROR",
                LivenessError::Internal(_) => "INTERNAL_ERROR",
                LivenessError::Directory(_) => "STORAGE_ERROR",
            },
        }
    }

    /// Get sanitized error message for client response
    pub fn client_message(&self) -> String {
        match self {
            // For liveness errors, hide local paths and upstream details
            Self::Liveness(ref e) => match e {
                LivenessError::UserNotFound(_) => "User not found".to_string(),
                LivenessError::NoProfilePhoto | LivenessError::InvalidMedia(_) => e.detail(),
                LivenessError::Transport(_) | LivenessError::Capability(_) => {
                    "Verification service unavailable".to_string()
                }
                LivenessError::Internal(_) => "Internal server error".to_string(),
                LivenessError::Directory(_) => "User directory unavailable".to_string(),
            },
            Self::Internal(_) => "Internal server error".to_string(),
            // For other errors, use the Display message
            _ => self.to_string(),
        }
    }

    /// Get the error category for logging
    fn error_category(&self) -> &'static str {
        match self {
            Self::BadRequest(_) => "bad_request",
            Self::Unauthorized(_) => "unauthorized",
            Self::NotFound(_) => "not_found",
            Self::Conflict(_) => "conflict",
            Self::Internal(_) => "internal",
            Self::ServiceUnavailable(_) => "service_unavailable",
            Self::Liveness(ref e) => e.kind(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let category = self.error_category();
        let code = self.error_code();
        let internal_message = self.to_string();
        let client_message = self.client_message();

        // Log based on severity, always including internal details
        if status.is_server_error() {
            tracing::error!(
                status = %status,
                category = category,
                code = code,
                error = %internal_message,
                "Server error"
            );
        } else if matches!(self, Self::Unauthorized(_)) {
            tracing::warn!(
                status = %status,
                category = category,
                code = code,
                error = %internal_message,
                "Authentication error"
            );
        } else {
            tracing::warn!(
                status = %status,
                category = category,
                code = code,
                error = %internal_message,
                "Client error"
            );
        }

        let body = serde_json::json!({
            "success": false,
            "message": client_message,
            "code": code,
            "timestamp": chrono::Utc::now().timestamp_millis(),
        });

        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lifecheck_core::Rejection;

    #[test]
    fn test_liveness_status_mapping() {
        let cases = [
            (LivenessError::UserNotFound("x".into()), StatusCode::NOT_FOUND),
            (LivenessError::NoProfilePhoto, StatusCode::BAD_REQUEST),
            (
                LivenessError::InvalidMedia(Rejection::Empty("video")),
                StatusCode::BAD_REQUEST,
            ),
            (LivenessError::Transport("t".into()), StatusCode::INTERNAL_SERVER_ERROR),
            (LivenessError::Capability("c".into()), StatusCode::INTERNAL_SERVER_ERROR),
            (LivenessError::Internal("i".into()), StatusCode::INTERNAL_SERVER_ERROR),
            (LivenessError::Directory("d".into()), StatusCode::INTERNAL_SERVER_ERROR),
        ];

        for (err, expected) in cases {
            assert_eq!(ApiError::from(err).status_code(), expected);
        }
    }

    #[test]
    fn test_client_message_hides_internals() {
        let err = ApiError::from(LivenessError::Internal("/srv/temp-videos/abc: EIO".into()));
        assert!(!err.client_message().contains("/srv"));

        let err = ApiError::from(LivenessError::InvalidMedia(Rejection::Empty("video")));
        assert_eq!(err.client_message(), "No video file provided");
    }

    #[test]
    fn test_media_rejection_message_is_unprefixed() {
        let err = ApiError::from(LivenessError::InvalidMedia(Rejection::WrongType {
            expected: "a video",
            declared: Some("text/plain".into()),
        }));
        assert_eq!(
            err.client_message(),
            "Invalid file type. Please upload a video file."
        );
        assert_eq!(err.error_code(), "INVALID_MEDIA");

        let err = ApiError::from(LivenessError::NoProfilePhoto);
        assert_eq!(
            err.client_message(),
            "User profile picture not found. Please upload a profile picture first."
        );
    }

    #[tokio::test]
    async fn test_error_body_is_envelope_shaped() {
        let response = ApiError::conflict("Username is already taken!").into_response();
        assert_eq!(response.status(), StatusCode::CONFLICT);

        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["success"], false);
        assert_eq!(json["message"], "Username is already taken!");
        assert_eq!(json["code"], "CONFLICT");
        assert!(json["timestamp"].is_i64());
    }
}
