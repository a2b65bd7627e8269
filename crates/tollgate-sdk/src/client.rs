//! Authenticated HTTP client
//!
//! [`AuthClient`] wraps every outbound call with credential handling:
//!
//! - **Outbound**: the stored access token is attached as
//!   `Authorization: Bearer {token}`. When the token is close to expiry and no
//!   renewal is running, it is renewed first and the fresh token is attached.
//!   A failed proactive renewal is logged and the current token is sent anyway.
//! - **Inbound**: a 401 triggers one renewal through the shared
//!   [`RefreshCoordinator`] and one replay of the original request. A second
//!   401, a 403, or a failed renewal ends the session through the
//!   [`SessionTerminator`].
//!
//! Network failures, timeouts included, are returned as
//! [`ApiError::HttpClient`] and never trigger renewal.
//!
//! # Usage Examples
//!
//! ```rust,no_run
//! use tollgate_sdk::{ClientBuilder, ClientConfig};
//!
//! # async fn example() -> tollgate_sdk::Result<()> {
//! let config = ClientConfig::load(None)?;
//! let client = ClientBuilder::from_config(&config).build()?;
//!
//! let items: serde_json::Value = client.get("/items").await?;
//! # Ok(())
//! # }
//! ```

use crate::{
    auth::{
        CredentialStore, ExpiryPredictor, FileStorage, KeyValueStorage, MemoryStorage,
        RefreshCoordinator, RenewalExecutor, SessionTerminator, TerminationContext,
        TerminationSink, TracingSink, LEAD_TIME,
    },
    config::{join_url, ClientConfig},
    error::{error_message, ApiError, Result},
};
use reqwest::header::{HeaderValue, AUTHORIZATION};
use reqwest::{Method, Request, RequestBuilder, Response, StatusCode};
use serde::{de::DeserializeOwned, Serialize};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// Default timeout for every network call
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Default renewal endpoint path
pub const DEFAULT_REFRESH_PATH: &str = "/auth/refresh";

/// A request on its way through the pipeline
struct PendingRequest {
    template: Option<Request>,
    retried: bool,
}

impl PendingRequest {
    fn new(request: Request) -> Self {
        Self {
            template: Some(request),
            retried: false,
        }
    }

    /// Produce the next attempt with `token` attached.
    ///
    /// Streaming bodies cannot be cloned, so such a request is sent as is on
    /// the first attempt and cannot be replayed.
    fn next_attempt(&mut self, token: Option<&str>) -> Result<Request> {
        let mut request = match self.template.as_ref().and_then(Request::try_clone) {
            Some(request) => request,
            None => self.template.take().ok_or(ApiError::RequestNotReplayable)?,
        };

        if let Some(token) = token {
            let value = HeaderValue::from_str(&format!("Bearer {}", token)).map_err(|e| {
                ApiError::InvalidRequest {
                    message: format!("Access token is not a valid header value: {}", e),
                }
            })?;
            request.headers_mut().insert(AUTHORIZATION, value);
        }

        Ok(request)
    }
}

/// HTTP client with automatic credential renewal
pub struct AuthClient {
    http_client: reqwest::Client,
    base_url: String,
    store: CredentialStore,
    coordinator: Arc<RefreshCoordinator>,
    terminator: SessionTerminator,
    predictor: ExpiryPredictor,
}

impl std::fmt::Debug for AuthClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthClient")
            .field("base_url", &self.base_url)
            .field("coordinator", &self.coordinator)
            .finish_non_exhaustive()
    }
}

impl AuthClient {
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Credential store shared with the renewal executor
    pub fn store(&self) -> &CredentialStore {
        &self.store
    }

    pub fn coordinator(&self) -> &Arc<RefreshCoordinator> {
        &self.coordinator
    }

    /// Start a request to `path` relative to the base URL
    pub fn request(&self, method: Method, path: &str) -> RequestBuilder {
        self.http_client.request(method, join_url(&self.base_url, path))
    }

    /// Build and send a request through the pipeline
    pub async fn send(&self, request: RequestBuilder) -> Result<Response> {
        let request = request.build()?;
        self.execute(request).await
    }

    /// Send a request, attaching credentials and recovering from one 401.
    pub async fn execute(&self, request: Request) -> Result<Response> {
        let mut pending = PendingRequest::new(request);
        let mut token = self.preflight_token().await?;

        loop {
            let request = pending.next_attempt(token.as_deref())?;
            let url = request.url().to_string();
            debug!("{} {}", request.method(), url);

            let response = self.http_client.execute(request).await?;
            let status = response.status();

            match status {
                StatusCode::UNAUTHORIZED if !pending.retried => {
                    pending.retried = true;
                    debug!("Request to {} unauthorized, renewing credentials", url);

                    match self.coordinator.coordinate_refresh().await {
                        Ok(fresh) => token = Some(fresh),
                        Err(failure) => {
                            self.terminator
                                .terminate(TerminationContext::RenewalFailed(failure.clone()))
                                .await;
                            return Err(ApiError::Renewal(failure));
                        }
                    }
                }
                StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                    let body = response.text().await.unwrap_or_default();
                    self.terminator
                        .terminate(TerminationContext::AuthorizationFailure {
                            status: status.as_u16(),
                            url,
                        })
                        .await;

                    return Err(if status == StatusCode::UNAUTHORIZED {
                        ApiError::TerminalAuthorization {
                            status,
                            message: error_message(&body, "Authentication failed"),
                        }
                    } else {
                        ApiError::Authorization {
                            status,
                            message: error_message(&body, "Access forbidden"),
                        }
                    });
                }
                _ => return Ok(response),
            }
        }
    }

    /// Token to attach before sending, renewing it first when near expiry
    async fn preflight_token(&self) -> Result<Option<String>> {
        let Some(token) = self.store.get_access().await? else {
            return Ok(None);
        };

        if !self.predictor.is_near_expiry(&token) || !self.coordinator.is_idle() {
            return Ok(Some(token));
        }

        debug!("Access token near expiry, renewing before send");
        match self.coordinator.coordinate_refresh().await {
            Ok(fresh) => Ok(Some(fresh)),
            Err(failure) => {
                warn!("Proactive renewal failed, sending current token: {}", failure);
                Ok(Some(token))
            }
        }
    }

    // ===== JSON helpers =====

    /// Generic GET request
    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let response = self.send(self.request(Method::GET, path)).await?;
        handle_response(response).await
    }

    /// Generic POST request
    pub async fn post<B: Serialize, T: DeserializeOwned>(&self, path: &str, body: &B) -> Result<T> {
        let response = self.send(self.request(Method::POST, path).json(body)).await?;
        handle_response(response).await
    }

    /// Generic PUT request
    pub async fn put<B: Serialize, T: DeserializeOwned>(&self, path: &str, body: &B) -> Result<T> {
        let response = self.send(self.request(Method::PUT, path).json(body)).await?;
        handle_response(response).await
    }

    /// Generic DELETE request without body
    pub async fn delete(&self, path: &str) -> Result<()> {
        let response = self.send(self.request(Method::DELETE, path)).await?;
        if response.status().is_success() {
            Ok(())
        } else {
            handle_error_response(response).await
        }
    }
}

/// Decode a successful response or map the failure status
async fn handle_response<T: DeserializeOwned>(response: Response) -> Result<T> {
    if response.status().is_success() {
        response.json().await.map_err(ApiError::HttpClient)
    } else {
        handle_error_response(response).await
    }
}

/// Map a non-success status that the pipeline passed through
async fn handle_error_response<T>(response: Response) -> Result<T> {
    let status = response.status();
    let error_text = response.text().await.unwrap_or_default();

    match status {
        StatusCode::TOO_MANY_REQUESTS => Err(ApiError::RateLimitExceeded),
        StatusCode::NOT_FOUND => Err(ApiError::NotFound {
            resource: error_message(&error_text, "Resource not found"),
        }),
        StatusCode::BAD_REQUEST => Err(ApiError::BadRequest {
            message: error_message(&error_text, "Bad request"),
        }),
        _ => Err(ApiError::Internal {
            message: format!(
                "Request failed with status {status}: {}",
                error_message(&error_text, "no body")
            ),
        }),
    }
}

/// Builder for constructing an [`AuthClient`]
#[derive(Default)]
pub struct ClientBuilder {
    base_url: Option<String>,
    refresh_path: Option<String>,
    timeout: Option<Duration>,
    connect_timeout: Option<Duration>,
    lead_time: Option<Duration>,
    reauth_path: Option<String>,
    storage: Option<Arc<dyn KeyValueStorage>>,
    storage_dir: Option<PathBuf>,
    sink: Option<Arc<dyn TerminationSink>>,
}

impl ClientBuilder {
    /// Create a new builder with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder pre-populated from a loaded configuration
    pub fn from_config(config: &ClientConfig) -> Self {
        let mut builder = Self::new()
            .base_url(&config.base_url)
            .refresh_path(&config.refresh_path)
            .timeout(config.request_timeout())
            .refresh_lead_time(config.refresh_lead_time())
            .reauth_path(&config.reauth_path);
        builder.storage_dir = config.storage_dir.clone();
        builder
    }

    /// Set the base URL for the API
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    /// Set the renewal endpoint path
    pub fn refresh_path(mut self, path: impl Into<String>) -> Self {
        self.refresh_path = Some(path.into());
        self
    }

    /// Set the timeout applied to every network call
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Set the connection timeout
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = Some(timeout);
        self
    }

    /// Set how long before expiry a token is renewed proactively
    pub fn refresh_lead_time(mut self, lead_time: Duration) -> Self {
        self.lead_time = Some(lead_time);
        self
    }

    /// Set the re-authentication entry point used in redirects
    pub fn reauth_path(mut self, path: impl Into<String>) -> Self {
        self.reauth_path = Some(path.into());
        self
    }

    /// Use the given storage for session state
    pub fn storage(mut self, storage: Arc<dyn KeyValueStorage>) -> Self {
        self.storage = Some(storage);
        self
    }

    /// Keep session state in memory only
    pub fn with_memory_storage(self) -> Self {
        self.storage(Arc::new(MemoryStorage::new()))
    }

    /// Persist session state in `dir`
    pub fn storage_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.storage_dir = Some(dir.into());
        self
    }

    /// Receive session termination events
    pub fn termination_sink(mut self, sink: Arc<dyn TerminationSink>) -> Self {
        self.sink = Some(sink);
        self
    }

    /// Build the client
    pub fn build(self) -> Result<AuthClient> {
        let base_url = self.base_url.ok_or_else(|| ApiError::InvalidRequest {
            message: "base_url is required".into(),
        })?;
        url::Url::parse(&base_url).map_err(|e| ApiError::InvalidRequest {
            message: format!("Invalid base URL {base_url:?}: {e}"),
        })?;

        let mut http_builder =
            reqwest::Client::builder().timeout(self.timeout.unwrap_or(DEFAULT_TIMEOUT));
        if let Some(connect_timeout) = self.connect_timeout {
            http_builder = http_builder.connect_timeout(connect_timeout);
        }
        let http_client = http_builder.build().map_err(ApiError::HttpClient)?;

        let storage: Arc<dyn KeyValueStorage> = match (self.storage, self.storage_dir) {
            (Some(storage), _) => storage,
            (None, Some(dir)) => Arc::new(FileStorage::in_dir(dir)),
            (None, None) => Arc::new(FileStorage::default_location()?),
        };
        let store = CredentialStore::new(storage);

        let refresh_url = join_url(
            &base_url,
            self.refresh_path.as_deref().unwrap_or(DEFAULT_REFRESH_PATH),
        );
        let executor = RenewalExecutor::new(http_client.clone(), refresh_url, store.clone());
        let coordinator = Arc::new(RefreshCoordinator::new(Arc::new(executor)));

        let terminator = SessionTerminator::new(
            store.clone(),
            self.sink.unwrap_or_else(|| Arc::new(TracingSink)),
            self.reauth_path
                .unwrap_or_else(|| crate::auth::session::DEFAULT_REAUTH_PATH.to_string()),
        );

        Ok(AuthClient {
            http_client,
            base_url,
            store,
            coordinator,
            terminator,
            predictor: ExpiryPredictor::new(self.lead_time.unwrap_or(LEAD_TIME)),
        })
    }
}
