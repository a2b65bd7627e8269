//! Client configuration
//!
//! Values are layered: built-in defaults, then a TOML file, then
//! `TOLLGATE_`-prefixed environment variables.

use crate::auth::{AuthError, AuthResult};
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Default configuration file looked up in the working directory
pub const DEFAULT_CONFIG_FILE: &str = "tollgate.toml";

/// Environment variable prefix
pub const ENV_PREFIX: &str = "TOLLGATE_";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Base URL every request path is joined to
    pub base_url: String,

    /// Path of the renewal endpoint relative to `base_url`
    pub refresh_path: String,

    /// Timeout applied to every network call, in seconds
    pub request_timeout_secs: u64,

    /// Renew proactively when the access token expires within this many seconds
    pub refresh_lead_time_secs: u64,

    /// Re-authentication entry point used in termination redirects
    pub reauth_path: String,

    /// Directory holding persisted session state (platform data dir when unset)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub storage_dir: Option<PathBuf>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8080".to_string(),
            refresh_path: "/auth/refresh".to_string(),
            request_timeout_secs: 10,
            refresh_lead_time_secs: 300,
            reauth_path: "/login".to_string(),
            storage_dir: None,
        }
    }
}

impl ClientConfig {
    /// Load configuration, using `path` instead of the default file when given.
    pub fn load(path: Option<&Path>) -> AuthResult<Self> {
        let file = path
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE));

        Figment::from(Serialized::defaults(ClientConfig::default()))
            .merge(Toml::file(file))
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
            .extract::<ClientConfig>()
            .map_err(|e| AuthError::Config(e.to_string()))
            .and_then(Self::validated)
    }

    fn validated(self) -> AuthResult<Self> {
        url::Url::parse(&self.base_url)
            .map_err(|e| AuthError::Config(format!("invalid base_url {:?}: {}", self.base_url, e)))?;
        if self.request_timeout_secs == 0 {
            return Err(AuthError::Config(
                "request_timeout_secs must be greater than 0".to_string(),
            ));
        }
        Ok(self)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn refresh_lead_time(&self) -> Duration {
        Duration::from_secs(self.refresh_lead_time_secs)
    }

    /// Absolute URL of the renewal endpoint
    pub fn refresh_url(&self) -> String {
        join_url(&self.base_url, &self.refresh_path)
    }
}

pub(crate) fn join_url(base: &str, path: &str) -> String {
    format!(
        "{}/{}",
        base.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}
