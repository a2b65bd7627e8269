//! Token renewal
//!
//! Exchanges the stored refresh token for a new access token. One call to
//! [`Renewer::renew`] is exactly one network round trip at most; retries and
//! deduplication belong to the refresh coordinator.

use super::claims::decode_claims;
use super::store::CredentialStore;
use super::types::{RenewalFailure, RenewalRequest, RenewalResponse};
use async_trait::async_trait;
use tracing::{debug, info, warn};

/// Something that can produce a fresh access token
#[async_trait]
pub trait Renewer: Send + Sync {
    async fn renew(&self) -> Result<String, RenewalFailure>;
}

/// Renews tokens against `POST <base>/auth/refresh`
#[derive(Debug, Clone)]
pub struct RenewalExecutor {
    http_client: reqwest::Client,
    endpoint: String,
    store: CredentialStore,
}

impl RenewalExecutor {
    pub fn new(
        http_client: reqwest::Client,
        endpoint: impl Into<String>,
        store: CredentialStore,
    ) -> Self {
        Self {
            http_client,
            endpoint: endpoint.into(),
            store,
        }
    }

    async fn exchange(&self, refresh_token: &str) -> Result<RenewalResponse, RenewalFailure> {
        let response = self
            .http_client
            .post(&self.endpoint)
            .json(&RenewalRequest { refresh_token })
            .send()
            .await
            .map_err(|e| RenewalFailure::NetworkError(format!("Token refresh request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            debug!("Token refresh rejected with status {}: {}", status, error_text);
            return Err(RenewalFailure::ServerRejected {
                status: status.as_u16(),
            });
        }

        let body: RenewalResponse = response.json().await.map_err(|e| {
            RenewalFailure::InvalidResponse(format!("Failed to parse token response: {}", e))
        })?;

        decode_claims(&body.access_token)
            .map_err(|e| RenewalFailure::InvalidResponse(e.to_string()))?;

        Ok(body)
    }

    async fn clear_after_failure(&self, failure: &RenewalFailure) {
        warn!("Token refresh failed: {}", failure);
        if let Err(e) = self.store.clear().await {
            warn!("Failed to clear credentials after refresh failure: {}", e);
        }
    }
}

#[async_trait]
impl Renewer for RenewalExecutor {
    async fn renew(&self) -> Result<String, RenewalFailure> {
        let refresh_token = match self.store.get_refresh().await {
            Ok(Some(token)) => token,
            Ok(None) => {
                debug!("No refresh token stored, skipping renewal call");
                return Err(RenewalFailure::NoRefreshToken);
            }
            Err(e) => {
                warn!("Failed to read refresh token: {}", e);
                return Err(RenewalFailure::NoRefreshToken);
            }
        };

        debug!("Refreshing access token");
        let body = match self.exchange(&refresh_token).await {
            Ok(body) => body,
            Err(failure) => {
                self.clear_after_failure(&failure).await;
                return Err(failure);
            }
        };

        // Keep the old refresh token unless the server rotated it
        let next_refresh = body.refresh_token.as_deref().unwrap_or(&refresh_token);
        if let Err(e) = self.store.set_pair(&body.access_token, next_refresh).await {
            let failure = RenewalFailure::InvalidResponse(format!("Failed to store tokens: {}", e));
            self.clear_after_failure(&failure).await;
            return Err(failure);
        }

        info!("Token refresh completed successfully");
        Ok(body.access_token)
    }
}
