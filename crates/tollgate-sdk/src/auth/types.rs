//! Authentication-related types and data structures
//!
//! This module defines the credential pair, the renewal wire format and the
//! error types shared by the store, the renewal executor and the coordinator.

use serde::{Deserialize, Serialize};

/// Result type for authentication operations
pub type AuthResult<T> = Result<T, AuthError>;

/// Storage key of the access token
pub const ACCESS_TOKEN_KEY: &str = "token";

/// Storage key of the refresh token
pub const REFRESH_TOKEN_KEY: &str = "refreshToken";

/// Storage key of the opaque user profile blob
pub const PROFILE_KEY: &str = "user";

/// Storage key of the one-shot "session began via registration" marker
pub const REGISTRATION_MARKER_KEY: &str = "registrationPending";

/// Access token together with the refresh token that renews it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CredentialPair {
    /// Short-lived token attached to every request
    pub access_token: String,
    /// Longer-lived token exchanged for a new access token
    pub refresh_token: String,
}

impl CredentialPair {
    pub fn new(access_token: impl Into<String>, refresh_token: impl Into<String>) -> Self {
        Self {
            access_token: access_token.into(),
            refresh_token: refresh_token.into(),
        }
    }
}

/// Body sent to the renewal endpoint
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RenewalRequest<'a> {
    pub refresh_token: &'a str,
}

/// Body returned by the renewal endpoint on success
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RenewalResponse {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
}

/// Why a renewal did not produce a new access token
///
/// Cloneable so that one outcome can be handed to every waiter of an
/// in-flight renewal.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RenewalFailure {
    /// No refresh token is stored; no network call was made
    #[error("No refresh token available")]
    NoRefreshToken,

    /// The renewal endpoint answered with a non-2xx status
    #[error("Renewal rejected by server with status {status}")]
    ServerRejected { status: u16 },

    /// The renewal call could not complete (timeout, connectivity)
    #[error("Renewal network error: {0}")]
    NetworkError(String),

    /// The renewal endpoint answered 2xx with an unusable body
    #[error("Invalid renewal response: {0}")]
    InvalidResponse(String),

    /// The renewal was dropped before it settled
    #[error("Renewal abandoned before completion")]
    Abandoned,
}

/// Authentication errors
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// Stored token does not have the three-segment structure
    #[error("Malformed credential: {0}")]
    MalformedCredential(String),

    /// Persistent storage could not be read or written
    #[error("Token storage error: {0}")]
    Storage(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Generic IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_renewal_request_uses_camel_case() {
        let body = serde_json::to_value(RenewalRequest {
            refresh_token: "r1",
        })
        .unwrap();
        assert_eq!(body, json!({ "refreshToken": "r1" }));
    }

    #[test]
    fn test_renewal_response_without_rotation() {
        let response: RenewalResponse =
            serde_json::from_value(json!({ "accessToken": "a2" })).unwrap();
        assert_eq!(response.access_token, "a2");
        assert!(response.refresh_token.is_none());
    }

    #[test]
    fn test_renewal_response_with_rotation() {
        let response: RenewalResponse =
            serde_json::from_value(json!({ "accessToken": "a2", "refreshToken": "r2" })).unwrap();
        assert_eq!(response.refresh_token.as_deref(), Some("r2"));
    }
}
