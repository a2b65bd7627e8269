//! Expiry prediction for access tokens

use super::claims::decode_claims;
use std::time::Duration;

/// Default lead time before expiry at which a token counts as expiring
pub const LEAD_TIME: Duration = Duration::from_secs(300);

/// Decides whether an access token should be renewed before use
#[derive(Debug, Clone, Copy)]
pub struct ExpiryPredictor {
    lead_time: Duration,
}

impl Default for ExpiryPredictor {
    fn default() -> Self {
        Self::new(LEAD_TIME)
    }
}

impl ExpiryPredictor {
    pub fn new(lead_time: Duration) -> Self {
        Self { lead_time }
    }

    pub fn lead_time(&self) -> Duration {
        self.lead_time
    }

    /// Check whether `token` expires within the lead time from now.
    pub fn is_near_expiry(&self, token: &str) -> bool {
        self.is_near_expiry_at(token, chrono::Utc::now().timestamp())
    }

    /// Check whether `token` expires within the lead time from `now`.
    ///
    /// Unreadable tokens and tokens without an `exp` claim count as expiring.
    pub fn is_near_expiry_at(&self, token: &str, now: i64) -> bool {
        let Some(expires_at) = decode_claims(token).ok().and_then(|claims| claims.exp) else {
            return true;
        };

        let lead_time = i64::try_from(self.lead_time.as_secs()).unwrap_or(i64::MAX);
        expires_at.saturating_sub(now) < lead_time
    }
}

/// Check `token` against the default lead time.
pub fn is_near_expiry(token: &str) -> bool {
    ExpiryPredictor::default().is_near_expiry(token)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::claims::testing::{token_expiring_in, token_with_claims};
    use serde_json::json;

    const NOW: i64 = 1_700_000_000;

    #[test]
    fn test_far_from_expiry() {
        let token = token_with_claims(json!({ "exp": NOW + 3600 }));
        assert!(!ExpiryPredictor::default().is_near_expiry_at(&token, NOW));
    }

    #[test]
    fn test_within_lead_time() {
        let token = token_with_claims(json!({ "exp": NOW + 60 }));
        assert!(ExpiryPredictor::default().is_near_expiry_at(&token, NOW));
    }

    #[test]
    fn test_lead_time_boundary() {
        let predictor = ExpiryPredictor::default();
        let exactly = token_with_claims(json!({ "exp": NOW + 300 }));
        let just_inside = token_with_claims(json!({ "exp": NOW + 299 }));

        assert!(!predictor.is_near_expiry_at(&exactly, NOW));
        assert!(predictor.is_near_expiry_at(&just_inside, NOW));
    }

    #[test]
    fn test_already_expired() {
        let token = token_with_claims(json!({ "exp": NOW - 10 }));
        assert!(ExpiryPredictor::default().is_near_expiry_at(&token, NOW));
    }

    #[test]
    fn test_unreadable_tokens_fail_safe() {
        let predictor = ExpiryPredictor::default();
        assert!(predictor.is_near_expiry_at("not-a-token", NOW));
        assert!(predictor.is_near_expiry_at("a.b.c", NOW));
        assert!(predictor.is_near_expiry_at(&token_with_claims(json!({ "sub": "x" })), NOW));
    }

    #[test]
    fn test_custom_lead_time() {
        let predictor = ExpiryPredictor::new(Duration::from_secs(30));
        let token = token_with_claims(json!({ "exp": NOW + 60 }));
        assert!(!predictor.is_near_expiry_at(&token, NOW));
    }

    #[test]
    fn test_wall_clock_helper() {
        assert!(is_near_expiry(&token_expiring_in(60)));
        assert!(!is_near_expiry(&token_expiring_in(3600)));
    }
}
