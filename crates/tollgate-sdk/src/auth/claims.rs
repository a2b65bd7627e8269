//! Decoding of access-token claims
//!
//! Claims are read from the payload segment of a `header.payload.signature`
//! token without verifying the signature. Verification is the server's job;
//! the client only needs the expiry to schedule renewals.

use super::types::{AuthError, AuthResult};
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use serde::Deserialize;

/// Claims decoded from an access token's payload segment
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Claims {
    /// Expiration time as a unix timestamp
    #[serde(default)]
    pub exp: Option<i64>,
    /// Subject
    #[serde(default)]
    pub sub: Option<String>,
    /// Every other claim, untouched
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// Check that a token has exactly three non-empty dot-separated segments.
pub fn validate_structure(token: &str) -> AuthResult<()> {
    let segments: Vec<&str> = token.split('.').collect();
    if segments.len() != 3 {
        return Err(AuthError::MalformedCredential(format!(
            "expected 3 segments, found {}",
            segments.len()
        )));
    }
    if segments[0].is_empty() || segments[1].is_empty() {
        return Err(AuthError::MalformedCredential(
            "empty header or payload segment".to_string(),
        ));
    }
    Ok(())
}

/// Decode the claims of a token.
///
/// Fails with `MalformedCredential` when the structure is wrong, the payload
/// is not base64url, or the payload is not a JSON object.
pub fn decode_claims(token: &str) -> AuthResult<Claims> {
    validate_structure(token)?;

    // Some issuers keep the padding even though the format forbids it
    let payload = token
        .split('.')
        .nth(1)
        .unwrap_or_default()
        .trim_end_matches('=');

    let decoded = URL_SAFE_NO_PAD
        .decode(payload.as_bytes())
        .map_err(|e| AuthError::MalformedCredential(format!("payload is not base64url: {}", e)))?;

    serde_json::from_slice(&decoded)
        .map_err(|e| AuthError::MalformedCredential(format!("payload is not a claims object: {}", e)))
}


#[cfg(test)]
mod tests {
    use super::testing::token_with_claims;
    use super::*;
    use serde_json::json;

    #[test]
    fn test_decode_valid_token() {
        let token = token_with_claims(json!({ "sub": "user-42", "exp": 1_900_000_000, "role": "admin" }));
        let claims = decode_claims(&token).unwrap();

        assert_eq!(claims.exp, Some(1_900_000_000));
        assert_eq!(claims.sub.as_deref(), Some("user-42"));
        assert_eq!(claims.extra.get("role"), Some(&json!("admin")));
    }

    #[test]
    fn test_missing_exp_is_not_an_error() {
        let token = token_with_claims(json!({ "sub": "user-42" }));
        let claims = decode_claims(&token).unwrap();
        assert!(claims.exp.is_none());
    }

    #[test]
    fn test_wrong_segment_count_is_malformed() {
        for token in ["", "abc", "a.b", "a.b.c.d"] {
            assert!(
                matches!(validate_structure(token), Err(AuthError::MalformedCredential(_))),
                "{token:?} should be malformed"
            );
        }
    }

    #[test]
    fn test_garbage_payload_is_malformed() {
        assert!(matches!(
            decode_claims("header.!!!.sig"),
            Err(AuthError::MalformedCredential(_))
        ));

        let not_json = format!("h.{}.s", URL_SAFE_NO_PAD.encode("not json"));
        assert!(matches!(
            decode_claims(&not_json),
            Err(AuthError::MalformedCredential(_))
        ));
    }

    #[test]
    fn test_padded_payload_is_accepted() {
        let token = token_with_claims(json!({ "exp": 1 }));
        let mut parts: Vec<String> = token.split('.').map(str::to_string).collect();
        parts[1].push_str("==");
        let claims = decode_claims(&parts.join(".")).unwrap();
        assert_eq!(claims.exp, Some(1));
    }
}
