//! Error types for the Tollgate SDK

use crate::auth::{AuthError, RenewalFailure};
use reqwest::StatusCode;
use serde::Deserialize;

/// Result type alias for client operations
pub type Result<T> = std::result::Result<T, ApiError>;

/// Errors surfaced by [`AuthClient`](crate::AuthClient)
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Network-level failure, including timeouts
    #[error("HTTP client error: {0}")]
    HttpClient(#[from] reqwest::Error),

    /// A 401 could not be recovered because renewal failed
    #[error("Authorization failed and could not be renewed: {0}")]
    Renewal(RenewalFailure),

    /// Request rejected without a replay (403)
    #[error("Authorization failed ({status}): {message}")]
    Authorization { status: StatusCode, message: String },

    /// Request rejected again after its single replay
    #[error("Authorization failed after credential renewal ({status}): {message}")]
    TerminalAuthorization { status: StatusCode, message: String },

    /// The request body cannot be cloned for a replay
    #[error("Request cannot be replayed: its body is a stream")]
    RequestNotReplayable,

    #[error("Rate limit exceeded")]
    RateLimitExceeded,

    #[error("Resource not found: {resource}")]
    NotFound { resource: String },

    #[error("Bad request: {message}")]
    BadRequest { message: String },

    #[error("Invalid request: {message}")]
    InvalidRequest { message: String },

    #[error("Credential storage error: {0}")]
    Storage(#[from] AuthError),

    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl ApiError {
    /// Whether the error belongs to the authorization-failure family
    pub fn is_authorization_failure(&self) -> bool {
        matches!(
            self,
            ApiError::Renewal(_)
                | ApiError::Authorization { .. }
                | ApiError::TerminalAuthorization { .. }
        )
    }

    /// Renewal failure behind this error, if any
    pub fn renewal_failure(&self) -> Option<&RenewalFailure> {
        match self {
            ApiError::Renewal(failure) => Some(failure),
            _ => None,
        }
    }
}

/// Error body returned by the API
#[derive(Debug, Deserialize)]
pub struct ErrorResponse {
    pub error: ErrorDetail,
}

#[derive(Debug, Deserialize)]
pub struct ErrorDetail {
    pub message: String,
}

/// Extract a human readable message from an error body.
pub(crate) fn error_message(body: &str, fallback: &str) -> String {
    if let Ok(error_response) = serde_json::from_str::<ErrorResponse>(body) {
        return error_response.error.message;
    }
    if body.trim().is_empty() {
        fallback.to_string()
    } else {
        body.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_message_prefers_structured_body() {
        let body = r#"{"error":{"code":"AUTH_EXPIRED","message":"Token expired"}}"#;
        assert_eq!(error_message(body, "fallback"), "Token expired");
    }

    #[test]
    fn test_error_message_fallbacks() {
        assert_eq!(error_message("", "Access forbidden"), "Access forbidden");
        assert_eq!(error_message("plain text", "x"), "plain text");
    }

    #[test]
    fn test_authorization_family() {
        assert!(ApiError::Renewal(RenewalFailure::NoRefreshToken).is_authorization_failure());
        assert!(ApiError::Authorization {
            status: StatusCode::FORBIDDEN,
            message: String::new(),
        }
        .is_authorization_failure());
        assert!(!ApiError::RateLimitExceeded.is_authorization_failure());
    }
}
