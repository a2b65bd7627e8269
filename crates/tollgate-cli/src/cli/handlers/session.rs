//! Session management commands

use super::build_client;
use crate::error::{CliError, Result};
use chrono::{DateTime, Utc};
use console::style;
use tollgate_sdk::auth::{claims::decode_claims, ExpiryPredictor};
use tollgate_sdk::ClientConfig;
use tracing::debug;

/// Store a credential pair, optionally marking it as fresh from registration
pub async fn handle_login(
    config: &ClientConfig,
    access_token: &str,
    refresh_token: &str,
    registered: bool,
    profile: Option<&str>,
) -> Result<()> {
    decode_claims(access_token)
        .map_err(|e| CliError::invalid_argument(format!("Access token rejected: {e}")))?;
    if let Some(profile) = profile {
        serde_json::from_str::<serde_json::Value>(profile)
            .map_err(|e| CliError::invalid_argument(format!("Profile is not JSON: {e}")))?;
    }

    let client = build_client(config)?;
    let store = client.store();
    store.set_pair(access_token, refresh_token).await?;
    if let Some(profile) = profile {
        store.set_profile(profile).await?;
    }
    if registered {
        store.mark_registration().await?;
    }

    debug!("Stored credentials for {}", client.base_url());
    println!("{} Credentials stored", style("✓").green());
    Ok(())
}

/// Forget the stored session
pub async fn handle_logout(config: &ClientConfig) -> Result<()> {
    let client = build_client(config)?;
    client.store().clear_session().await?;
    println!("{} Logged out", style("✓").green());
    Ok(())
}

/// Print the stored session's subject and expiry
pub async fn handle_status(config: &ClientConfig) -> Result<()> {
    let client = build_client(config)?;
    let store = client.store();

    let Some(token) = store.get_access().await? else {
        let hint = if store.get_refresh().await?.is_some() {
            " (a refresh token is stored; the next request will renew)"
        } else {
            ""
        };
        println!("{}{}", style("Not logged in").yellow(), hint);
        return Ok(());
    };

    let claims = store.claims().await.ok().flatten();
    let subject = claims
        .as_ref()
        .and_then(|c| c.sub.clone())
        .unwrap_or_else(|| "unknown".to_string());
    println!("Subject:    {}", subject);

    match claims.and_then(|c| c.exp).and_then(|exp| DateTime::<Utc>::from_timestamp(exp, 0)) {
        Some(expires_at) => println!("Expires at: {}", expires_at.to_rfc3339()),
        None => println!("Expires at: {}", style("unknown").yellow()),
    }

    let predictor = ExpiryPredictor::new(config.refresh_lead_time());
    if predictor.is_near_expiry(&token) {
        println!("{}", style("Token is near expiry and will be renewed on next use").yellow());
    } else {
        println!("{}", style("Token is valid").green());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use tempfile::TempDir;
    use tollgate_sdk::auth::{CredentialStore, FileStorage};

    fn config_in(dir: &TempDir) -> ClientConfig {
        ClientConfig {
            storage_dir: Some(dir.path().to_path_buf()),
            ..ClientConfig::default()
        }
    }

    // {"alg":"HS256"}.{"sub":"ada"}
    const TOKEN: &str = "eyJhbGciOiJIUzI1NiJ9.eyJzdWIiOiJhZGEifQ.sig";

    fn store_in(dir: &TempDir) -> CredentialStore {
        CredentialStore::new(Arc::new(FileStorage::in_dir(dir.path())))
    }

    #[tokio::test]
    async fn test_login_then_logout() {
        let dir = TempDir::new().unwrap();
        let config = config_in(&dir);

        handle_login(&config, TOKEN, "r1", true, Some(r#"{"name":"ada"}"#))
            .await
            .unwrap();

        let store = store_in(&dir);
        assert_eq!(store.get_access().await.unwrap().as_deref(), Some(TOKEN));
        assert!(store.profile().await.unwrap().is_some());
        assert!(store.take_registration_marker().await.unwrap());

        handle_logout(&config).await.unwrap();
        assert!(store.get_pair().await.unwrap().is_none());
        assert!(store.profile().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_login_rejects_malformed_token() {
        let dir = TempDir::new().unwrap();
        for token in ["opaque", "a.b.c"] {
            let result = handle_login(&config_in(&dir), token, "r1", false, None).await;
            assert!(matches!(result, Err(CliError::InvalidArgument(_))));
        }
    }

    #[tokio::test]
    async fn test_status_without_session() {
        let dir = TempDir::new().unwrap();
        handle_status(&config_in(&dir)).await.unwrap();
    }
}
