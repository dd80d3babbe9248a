//! `GetPaid` API client.
//!
//! [`GetPaidClient`] owns one [`CredentialStore`] and one [`RequestPipeline`].
//! Resource wrappers (customers, invoices, ...) are thin forwarding layers
//! over [`GetPaidClient::request`] and the verb helpers.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use getpaid_core::{ApiError, ConfigError, ErrorKind, HealthStatus, RequestSpec};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, info};

use crate::auth::{AuthType, CredentialConfig, CredentialStore, TokenProvider, token_fn};
use crate::config::ClientConfig;
use crate::pipeline::RequestPipeline;
use crate::retry::RetryPolicy;
use crate::transport::{ReqwestTransport, Transport};

/// Health endpoint path.
const HEALTH_PATH: &str = "/api/health";

// ============================================================================
// Client
// ============================================================================

/// Typed client for the `GetPaid` API.
///
/// Clones share the same credential store, so `update_api_key` on one clone
/// is seen by all of them.
#[derive(Clone)]
pub struct GetPaidClient {
    pipeline: RequestPipeline,
    config: ClientConfig,
}

impl GetPaidClient {
    /// Starts building a client.
    pub fn builder() -> GetPaidClientBuilder {
        GetPaidClientBuilder::default()
    }

    /// Creates a client authenticated with an API key and default settings.
    pub fn with_api_key(api_key: impl Into<String>) -> Result<Self, ConfigError> {
        Self::builder().api_key(api_key).build()
    }

    /// The underlying pipeline.
    pub fn pipeline(&self) -> &RequestPipeline {
        &self.pipeline
    }

    /// The configuration the client was built with.
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// The shared credential store.
    pub fn credentials(&self) -> &Arc<CredentialStore> {
        self.pipeline.credentials()
    }

    /// Kind of the active credential.
    pub fn auth_type(&self) -> AuthType {
        self.credentials().auth_type()
    }

    /// Replaces the active credential with an API key.
    ///
    /// Applies to every attempt that has not applied auth yet.
    pub fn update_api_key(&self, api_key: impl Into<String>) -> Result<(), ConfigError> {
        self.credentials().update_api_key(api_key)
    }

    /// Replaces the active credential with a static bearer token.
    pub fn update_bearer_token(&self, token: impl Into<String>) -> Result<(), ConfigError> {
        self.credentials().update_bearer_token(token)
    }

    /// Executes an arbitrary request.
    pub async fn request<T: DeserializeOwned>(&self, spec: &RequestSpec) -> Result<T, ApiError> {
        self.pipeline.execute(spec).await
    }

    /// GET `path`.
    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        self.request(&RequestSpec::get(path)).await
    }

    /// POST `body` to `path`.
    pub async fn post<T, B>(&self, path: &str, body: &B) -> Result<T, ApiError>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let spec = RequestSpec::post(path).json(body).map_err(body_error)?;
        self.request(&spec).await
    }

    /// PUT `body` to `path`.
    pub async fn put<T, B>(&self, path: &str, body: &B) -> Result<T, ApiError>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let spec = RequestSpec::put(path).json(body).map_err(body_error)?;
        self.request(&spec).await
    }

    /// PATCH `path` with `body`.
    pub async fn patch<T, B>(&self, path: &str, body: &B) -> Result<T, ApiError>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let spec = RequestSpec::patch(path).json(body).map_err(body_error)?;
        self.request(&spec).await
    }

    /// DELETE `path`.
    pub async fn delete<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        self.request(&RequestSpec::delete(path)).await
    }

    /// Checks API health.
    pub async fn health_check(&self) -> Result<HealthStatus, ApiError> {
        self.get(HEALTH_PATH).await
    }
}

/// A body that cannot be serialized never reaches the network.
fn body_error(err: serde_json::Error) -> ApiError {
    ApiError::new(
        ErrorKind::Api,
        format!("Failed to serialize request body: {err}"),
    )
}

// ============================================================================
// Builder
// ============================================================================

/// Builder for [`GetPaidClient`].
#[derive(Default)]
pub struct GetPaidClientBuilder {
    config: ClientConfig,
    credentials: CredentialConfig,
    transport: Option<Arc<dyn Transport>>,
}

impl GetPaidClientBuilder {
    /// Authenticates with an API key (`X-API-Key`).
    #[must_use]
    pub fn api_key(mut self, api_key: impl Into<String>) -> Self {
        self.credentials.api_key = Some(api_key.into());
        self
    }

    /// Authenticates with a static bearer token.
    #[must_use]
    pub fn bearer_token(mut self, token: impl Into<String>) -> Self {
        self.credentials.bearer_token = Some(token.into());
        self
    }

    /// Authenticates with a bearer token resolved before every attempt.
    #[must_use]
    pub fn token_provider(mut self, provider: Arc<dyn TokenProvider>) -> Self {
        self.credentials.token_provider = Some(provider);
        self
    }

    /// Authenticates with a bearer token from an async closure.
    #[must_use]
    pub fn get_token<F, Fut>(self, f: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Option<String>> + Send + 'static,
    {
        self.token_provider(token_fn(f))
    }

    /// Authenticates public payment calls with a `token` query parameter.
    #[must_use]
    pub fn token(mut self, token: impl Into<String>) -> Self {
        self.credentials.token = Some(token.into());
        self
    }

    /// Replaces all credentials at once.
    #[must_use]
    pub fn credentials(mut self, credentials: CredentialConfig) -> Self {
        self.credentials = credentials;
        self
    }

    /// Replaces the whole configuration.
    #[must_use]
    pub fn config(mut self, config: ClientConfig) -> Self {
        self.config = config;
        self
    }

    /// Sets the base URL.
    #[must_use]
    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.config.base_url = base_url.into();
        self
    }

    /// Sets the per-attempt timeout.
    #[must_use]
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.config.timeout = timeout;
        self
    }

    /// Sets the number of retries after the first attempt.
    #[must_use]
    pub fn retries(mut self, retries: u32) -> Self {
        self.config.retries = retries;
        self
    }

    /// Sets the backoff base delay.
    #[must_use]
    pub fn retry_delay(mut self, delay: Duration) -> Self {
        self.config.retry_delay = delay;
        self
    }

    /// Sets the user agent.
    #[must_use]
    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.config.user_agent = user_agent.into();
        self
    }

    /// Uses a custom transport instead of `reqwest`.
    #[must_use]
    pub fn transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = Some(transport);
        self
    }

    /// Builds the client.
    ///
    /// Credentials are checked first, so a client without any credential
    /// fails before anything else is set up.
    pub fn build(self) -> Result<GetPaidClient, ConfigError> {
        let credentials = Arc::new(CredentialStore::new(self.credentials)?);
        self.config.validate()?;

        let transport = match self.transport {
            Some(transport) => transport,
            None => Arc::new(ReqwestTransport::new(&self.config)?),
        };

        let retry = RetryPolicy::from_config(&self.config);
        debug!(
            base_url = %self.config.base_url,
            retries = retry.retries(),
            timeout = ?self.config.timeout,
            "Building client"
        );
        info!(auth_type = %credentials.auth_type(), "GetPaid client ready");

        Ok(GetPaidClient {
            pipeline: RequestPipeline::new(transport, credentials, retry),
            config: self.config,
        })
    }
}

// ============================================================================
// Tests
// ============================================================================
