//! Credential store
//!
//! Process-wide view of the persisted session: access token, refresh token,
//! profile blob and registration marker. Reads always go to storage so every
//! component, and every process sharing the same storage, sees the same state.

use super::claims::{decode_claims, Claims};
use super::storage::KeyValueStorage;
use super::types::{
    AuthResult, CredentialPair, ACCESS_TOKEN_KEY, PROFILE_KEY, REFRESH_TOKEN_KEY,
    REGISTRATION_MARKER_KEY,
};
use std::sync::Arc;
use tracing::{debug, warn};

/// Holder of the current credential pair
#[derive(Clone)]
pub struct CredentialStore {
    storage: Arc<dyn KeyValueStorage>,
}

impl std::fmt::Debug for CredentialStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialStore").finish_non_exhaustive()
    }
}

impl CredentialStore {
    pub fn new(storage: Arc<dyn KeyValueStorage>) -> Self {
        Self { storage }
    }

    /// Store backed by in-process memory only
    pub fn in_memory() -> Self {
        Self::new(Arc::new(super::storage::MemoryStorage::new()))
    }

    /// Current access token, if present and well-formed.
    ///
    /// A stored token whose claims cannot be decoded is purged and reported
    /// as absent so it can never be attached to a request.
    pub async fn get_access(&self) -> AuthResult<Option<String>> {
        let Some(token) = self.storage.get(ACCESS_TOKEN_KEY).await? else {
            return Ok(None);
        };

        if let Err(e) = decode_claims(&token) {
            warn!("Purging stored access token: {}", e);
            self.storage.remove(ACCESS_TOKEN_KEY).await?;
            return Ok(None);
        }

        Ok(Some(token))
    }

    pub async fn get_refresh(&self) -> AuthResult<Option<String>> {
        self.storage.get(REFRESH_TOKEN_KEY).await
    }

    /// Store both tokens in a single storage write.
    pub async fn set_pair(&self, access: &str, refresh: &str) -> AuthResult<()> {
        self.storage
            .set_many(&[(ACCESS_TOKEN_KEY, access), (REFRESH_TOKEN_KEY, refresh)])
            .await?;
        debug!("Stored new credential pair");
        Ok(())
    }

    /// Both tokens, only when both are present
    pub async fn get_pair(&self) -> AuthResult<Option<CredentialPair>> {
        let access = self.get_access().await?;
        let refresh = self.get_refresh().await?;
        Ok(access.zip(refresh).map(|(a, r)| CredentialPair::new(a, r)))
    }

    /// Remove the access and refresh tokens.
    pub async fn clear(&self) -> AuthResult<()> {
        self.storage
            .remove_many(&[ACCESS_TOKEN_KEY, REFRESH_TOKEN_KEY])
            .await?;
        debug!("Cleared credential pair");
        Ok(())
    }

    /// Remove the tokens and the profile blob.
    pub async fn clear_session(&self) -> AuthResult<()> {
        self.storage
            .remove_many(&[ACCESS_TOKEN_KEY, REFRESH_TOKEN_KEY, PROFILE_KEY])
            .await?;
        debug!("Cleared session state");
        Ok(())
    }

    /// Decoded claims of the current access token
    pub async fn claims(&self) -> AuthResult<Option<Claims>> {
        match self.get_access().await? {
            Some(token) => decode_claims(&token).map(Some),
            None => Ok(None),
        }
    }

    pub async fn profile(&self) -> AuthResult<Option<String>> {
        self.storage.get(PROFILE_KEY).await
    }

    pub async fn set_profile(&self, profile: &str) -> AuthResult<()> {
        self.storage.set(PROFILE_KEY, profile).await
    }

    /// Record that the current session was just created by a registration.
    pub async fn mark_registration(&self) -> AuthResult<()> {
        self.storage.set(REGISTRATION_MARKER_KEY, "1").await
    }

    /// Consume the registration marker, returning whether it was set.
    pub async fn take_registration_marker(&self) -> AuthResult<bool> {
        Ok(self.storage.take(REGISTRATION_MARKER_KEY).await?.is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::claims::testing::token_expiring_in;
    use crate::auth::storage::{FileStorage, MemoryStorage};
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_empty_store() {
        let store = CredentialStore::in_memory();
        assert!(store.get_access().await.unwrap().is_none());
        assert!(store.get_refresh().await.unwrap().is_none());
        assert!(store.get_pair().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_set_pair_updates_both() {
        let store = CredentialStore::in_memory();
        let first = token_expiring_in(3600);
        let second = token_expiring_in(7200);

        store.set_pair(&first, "r1").await.unwrap();
        store.set_pair(&second, "r2").await.unwrap();

        assert_eq!(store.get_access().await.unwrap(), Some(second));
        assert_eq!(store.get_refresh().await.unwrap().as_deref(), Some("r2"));
    }

    #[tokio::test]
    async fn test_malformed_access_token_is_purged() {
        let storage = Arc::new(MemoryStorage::new());
        storage
            .set_many(&[(ACCESS_TOKEN_KEY, "opaque-token"), (REFRESH_TOKEN_KEY, "r1")])
            .await
            .unwrap();
        let store = CredentialStore::new(storage.clone());

        assert!(store.get_access().await.unwrap().is_none());
        assert!(storage.get(ACCESS_TOKEN_KEY).await.unwrap().is_none());
        // The refresh token is left for the renewal path
        assert_eq!(store.get_refresh().await.unwrap().as_deref(), Some("r1"));
    }

    #[tokio::test]
    async fn test_undecodable_access_token_is_purged() {
        let storage = Arc::new(MemoryStorage::new());
        storage
            .set_many(&[(ACCESS_TOKEN_KEY, "a.b.c"), (REFRESH_TOKEN_KEY, "r1")])
            .await
            .unwrap();
        let store = CredentialStore::new(storage.clone());

        assert!(store.get_access().await.unwrap().is_none());
        assert!(storage.get(ACCESS_TOKEN_KEY).await.unwrap().is_none());
        assert!(store.claims().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_clear_keeps_profile_but_clear_session_does_not() {
        let store = CredentialStore::in_memory();
        store.set_pair(&token_expiring_in(60), "r1").await.unwrap();
        store.set_profile(r#"{"name":"ada"}"#).await.unwrap();

        store.clear().await.unwrap();
        assert!(store.get_pair().await.unwrap().is_none());
        assert!(store.profile().await.unwrap().is_some());

        store.clear_session().await.unwrap();
        assert!(store.profile().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_registration_marker_is_one_shot() {
        let store = CredentialStore::in_memory();
        assert!(!store.take_registration_marker().await.unwrap());

        store.mark_registration().await.unwrap();
        assert!(store.take_registration_marker().await.unwrap());
        assert!(!store.take_registration_marker().await.unwrap());
    }

    #[tokio::test]
    async fn test_registration_marker_taken_once_under_concurrency() {
        let dir = TempDir::new().unwrap();
        let store = CredentialStore::new(Arc::new(FileStorage::in_dir(dir.path())));
        store.mark_registration().await.unwrap();

        let results = futures::future::join_all(
            (0..5).map(|_| store.take_registration_marker()),
        )
        .await;

        let taken = results.into_iter().filter(|r| *r.as_ref().unwrap()).count();
        assert_eq!(taken, 1);
    }

    #[tokio::test]
    async fn test_claims_of_current_token() {
        let store = CredentialStore::in_memory();
        assert!(store.claims().await.unwrap().is_none());

        store.set_pair(&token_expiring_in(600), "r1").await.unwrap();
        let claims = store.claims().await.unwrap().unwrap();
        assert_eq!(claims.sub.as_deref(), Some("user-1"));
    }

    #[tokio::test]
    async fn test_two_stores_share_file_state() {
        let dir = TempDir::new().unwrap();
        let a = CredentialStore::new(Arc::new(FileStorage::in_dir(dir.path())));
        let b = CredentialStore::new(Arc::new(FileStorage::in_dir(dir.path())));
        let token = token_expiring_in(600);

        a.set_pair(&token, "r1").await.unwrap();
        assert_eq!(b.get_access().await.unwrap(), Some(token));

        b.clear().await.unwrap();
        assert!(a.get_refresh().await.unwrap().is_none());
    }
}
