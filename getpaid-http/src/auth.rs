//! Authentication credentials and request augmentation.
//!
//! A client holds exactly one active [`Credential`]. When several are
//! configured at construction the winner is picked by precedence:
//!
//! 1. **API key** - `X-API-Key: <key>`
//! 2. **Dynamic bearer** - `Authorization: Bearer <provider()>`
//! 3. **Static bearer** - `Authorization: Bearer <token>`
//! 4. **Query token** - `?token=<value>` merged into the query
//!
//! ## Consistency
//!
//! The [`CredentialStore`] is shared by every call on a client. Writes are
//! last-write-wins; each [`CredentialStore::apply`] reads the credential that
//! is current at that instant, so an update is visible to every attempt that
//! has not applied auth yet. Requests that already carry their credential are
//! never patched.

use std::fmt;
use std::future::Future;
use std::sync::{Arc, PoisonError, RwLock};

use async_trait::async_trait;
use getpaid_core::ConfigError;
use tracing::{debug, trace};

use crate::transport::PreparedRequest;

/// Header carrying the API key.
pub const API_KEY_HEADER: &str = "X-API-Key";

/// Header carrying bearer tokens.
pub const AUTHORIZATION_HEADER: &str = "Authorization";

/// Query parameter carrying the public payment token.
pub const TOKEN_QUERY_PARAM: &str = "token";

// ============================================================================
// Token Provider
// ============================================================================

/// Asynchronous source of bearer tokens, consulted on every attempt.
///
/// Returning `None` still sends the request with an empty bearer token; the
/// server then answers with an authentication failure.
#[async_trait]
pub trait TokenProvider: Send + Sync {
    /// Resolves the token for the next request.
    async fn token(&self) -> Option<String>;
}

struct FnTokenProvider<F>(F);

#[async_trait]
impl<F, Fut> TokenProvider for FnTokenProvider<F>
where
    F: Fn() -> Fut + Send + Sync,
    Fut: Future<Output = Option<String>> + Send + 'static,
{
    async fn token(&self) -> Option<String> {
        (self.0)().await
    }
}

/// Wraps an async closure as a [`TokenProvider`].
///
/// ```ignore
/// let provider = token_fn(|| async { Some(fetch_oauth_token().await) });
/// ```
pub fn token_fn<F, Fut>(f: F) -> Arc<dyn TokenProvider>
where
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Option<String>> + Send + 'static,
{
    Arc::new(FnTokenProvider(f))
}

// ============================================================================
// Credential
// ============================================================================

/// The active authentication mechanism.
#[derive(Clone)]
pub enum Credential {
    /// Static API key.
    ApiKey(String),
    /// Static bearer token.
    BearerStatic(String),
    /// Bearer token resolved per request.
    BearerDynamic(Arc<dyn TokenProvider>),
    /// Token sent as a query parameter (public payment endpoints).
    QueryToken(String),
}

impl Credential {
    /// The kind of this credential.
    pub fn auth_type(&self) -> AuthType {
        match self {
            Self::ApiKey(_) => AuthType::ApiKey,
            Self::BearerStatic(_) | Self::BearerDynamic(_) => AuthType::Bearer,
            Self::QueryToken(_) => AuthType::QueryToken,
        }
    }

    /// Picks the highest-precedence non-empty credential.
    pub fn select(config: CredentialConfig) -> Option<Self> {
        let non_empty = |value: Option<String>| value.filter(|v| !v.is_empty());

        if let Some(key) = non_empty(config.api_key) {
            return Some(Self::ApiKey(key));
        }
        if let Some(provider) = config.token_provider {
            return Some(Self::BearerDynamic(provider));
        }
        if let Some(token) = non_empty(config.bearer_token) {
            return Some(Self::BearerStatic(token));
        }
        non_empty(config.token).map(Self::QueryToken)
    }

    /// Adds this credential to a request.
    ///
    /// Only the dynamic bearer variant suspends.
    pub async fn apply_to(&self, request: &mut PreparedRequest) {
        match self {
            Self::ApiKey(key) => request.set_header(API_KEY_HEADER, key.as_str()),
            Self::BearerStatic(token) => {
                request.set_header(AUTHORIZATION_HEADER, format!("Bearer {token}"));
            }
            Self::BearerDynamic(provider) => {
                let token = provider.token().await.unwrap_or_default();
                if token.is_empty() {
                    debug!("Token provider returned no token, sending empty bearer");
                }
                request.set_header(AUTHORIZATION_HEADER, format!("Bearer {token}"));
            }
            Self::QueryToken(token) => request.set_query(TOKEN_QUERY_PARAM, token.as_str()),
        }
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let variant = match self {
            Self::ApiKey(_) => "ApiKey",
            Self::BearerStatic(_) => "BearerStatic",
            Self::BearerDynamic(_) => "BearerDynamic",
            Self::QueryToken(_) => "QueryToken",
        };
        write!(f, "{variant}(<redacted>)")
    }
}

/// Kind of the active credential.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AuthType {
    /// `X-API-Key` header.
    ApiKey,
    /// `Authorization: Bearer` header, static or dynamic.
    Bearer,
    /// `token` query parameter.
    QueryToken,
}

impl fmt::Display for AuthType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::ApiKey => "api_key",
            Self::Bearer => "bearer",
            Self::QueryToken => "token",
        })
    }
}

// ============================================================================
// Credential Config
// ============================================================================

/// Credentials as supplied by the caller; any subset may be set.
#[derive(Clone, Default)]
pub struct CredentialConfig {
    /// API key (`sk_...`).
    pub api_key: Option<String>,
    /// Static bearer token.
    pub bearer_token: Option<String>,
    /// Per-request bearer token source.
    pub token_provider: Option<Arc<dyn TokenProvider>>,
    /// Public payment token.
    pub token: Option<String>,
}

impl fmt::Debug for CredentialConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CredentialConfig")
            .field("api_key", &self.api_key.is_some())
            .field("bearer_token", &self.bearer_token.is_some())
            .field("token_provider", &self.token_provider.is_some())
            .field("token", &self.token.is_some())
            .finish()
    }
}

// ============================================================================
// Credential Store
// ============================================================================

/// Mutable cell holding the active credential of one client.
///
/// Reads clone the credential out and release the lock before any await, so
/// a slow token provider never blocks writers.
#[derive(Debug)]
pub struct CredentialStore {
    active: RwLock<Credential>,
}

impl CredentialStore {
    /// Creates a store from the caller's credentials.
    ///
    /// Fails with [`ConfigError::MissingCredentials`] when every variant is
    /// empty.
    pub fn new(config: CredentialConfig) -> Result<Self, ConfigError> {
        let credential = Credential::select(config).ok_or(ConfigError::MissingCredentials)?;
        debug!(auth_type = %credential.auth_type(), "Credential store initialized");
        Ok(Self::with_credential(credential))
    }

    /// Creates a store holding exactly this credential.
    pub fn with_credential(credential: Credential) -> Self {
        Self {
            active: RwLock::new(credential),
        }
    }

    /// Snapshot of the active credential.
    pub fn current(&self) -> Credential {
        self.active
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Kind of the active credential.
    pub fn auth_type(&self) -> AuthType {
        self.current().auth_type()
    }

    /// Makes `key` the active credential, whatever was active before.
    pub fn update_api_key(&self, key: impl Into<String>) -> Result<(), ConfigError> {
        let key = key.into();
        if key.is_empty() {
            return Err(ConfigError::EmptyCredential("API key"));
        }
        self.replace(Credential::ApiKey(key));
        Ok(())
    }

    /// Makes `token` the active credential as a static bearer token.
    pub fn update_bearer_token(&self, token: impl Into<String>) -> Result<(), ConfigError> {
        let token = token.into();
        if token.is_empty() {
            return Err(ConfigError::EmptyCredential("bearer token"));
        }
        self.replace(Credential::BearerStatic(token));
        Ok(())
    }

    fn replace(&self, credential: Credential) {
        let auth_type = credential.auth_type();
        *self.active.write().unwrap_or_else(PoisonError::into_inner) = credential;
        debug!(auth_type = %auth_type, "Credential updated");
    }

    /// Applies the credential that is current right now to `request`.
    pub async fn apply(&self, request: &mut PreparedRequest) {
        let credential = self.current();
        trace!(auth_type = %credential.auth_type(), "Applying credential");
        credential.apply_to(request).await;
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use getpaid_core::RequestSpec;

    fn request() -> PreparedRequest {
        PreparedRequest::from_spec(&RequestSpec::get("/api/customers").query("page", 1))
    }

    fn config() -> CredentialConfig {
        CredentialConfig::default()
    }

    #[test]
    fn test_no_credentials_fails() {
        let err = CredentialStore::new(config()).unwrap_err();
        assert_eq!(err, ConfigError::MissingCredentials);
    }

    #[test]
    fn test_empty_strings_count_as_missing() {
        let cfg = CredentialConfig {
            api_key: Some(String::new()),
            bearer_token: Some(String::new()),
            token: Some(String::new()),
            ..config()
        };
        assert!(CredentialStore::new(cfg).is_err());
    }

    #[test]
    fn test_precedence() {
        let all = CredentialConfig {
            api_key: Some("a".into()),
            bearer_token: Some("b".into()),
            token_provider: Some(token_fn(|| async { Some("d".to_string()) })),
            token: Some("q".into()),
        };
        assert_eq!(Credential::select(all.clone()).unwrap().auth_type(), AuthType::ApiKey);

        let no_key = CredentialConfig { api_key: None, ..all.clone() };
        assert!(matches!(
            Credential::select(no_key).unwrap(),
            Credential::BearerDynamic(_)
        ));

        let static_only = CredentialConfig {
            api_key: None,
            token_provider: None,
            ..all.clone()
        };
        assert!(matches!(
            Credential::select(static_only).unwrap(),
            Credential::BearerStatic(ref t) if t == "b"
        ));

        let token_only = CredentialConfig {
            token: Some("q".into()),
            ..config()
        };
        assert_eq!(
            Credential::select(token_only).unwrap().auth_type(),
            AuthType::QueryToken
        );
    }

    #[tokio::test]
    async fn test_api_key_wins_over_bearer() {
        let store = CredentialStore::new(CredentialConfig {
            api_key: Some("a".into()),
            bearer_token: Some("b".into()),
            ..config()
        })
        .unwrap();

        let mut req = request();
        store.apply(&mut req).await;

        assert_eq!(req.header("x-api-key"), Some("a"));
        assert_eq!(req.header("authorization"), None);
        assert!(req.query_values("token").is_empty());
    }

    #[tokio::test]
    async fn test_dynamic_bearer() {
        let store = CredentialStore::with_credential(Credential::BearerDynamic(token_fn(|| async {
            Some("oauth_123".to_string())
        })));

        let mut req = request();
        store.apply(&mut req).await;
        assert_eq!(req.header("Authorization"), Some("Bearer oauth_123"));
    }

    #[tokio::test]
    async fn test_dynamic_bearer_none_sends_empty_token() {
        let store =
            CredentialStore::with_credential(Credential::BearerDynamic(token_fn(|| async { None })));

        let mut req = request();
        store.apply(&mut req).await;
        assert_eq!(req.header("Authorization"), Some("Bearer "));
    }

    #[tokio::test]
    async fn test_query_token_preserves_params() {
        let store = CredentialStore::with_credential(Credential::QueryToken("pub_1".into()));

        let mut req = PreparedRequest::from_spec(
            &RequestSpec::get("/api/pay/slug")
                .query("page", 2)
                .query("token", "stale"),
        );
        store.apply(&mut req).await;

        assert_eq!(req.query_values("page"), vec!["2"]);
        assert_eq!(req.query_values("token"), vec!["pub_1"]);
        assert_eq!(req.header("x-api-key"), None);
        assert_eq!(req.header("authorization"), None);
    }

    #[tokio::test]
    async fn test_update_api_key_takes_over() {
        let store = CredentialStore::with_credential(Credential::QueryToken("pub_1".into()));
        store.update_api_key("sk_new").unwrap();
        assert_eq!(store.auth_type(), AuthType::ApiKey);

        let mut req = request();
        store.apply(&mut req).await;
        assert_eq!(req.header("X-API-Key"), Some("sk_new"));
        assert!(req.query_values("token").is_empty());
    }

    #[test]
    fn test_update_bearer_replaces_api_key() {
        let store = CredentialStore::with_credential(Credential::ApiKey("sk".into()));
        store.update_bearer_token("tok").unwrap();
        assert_eq!(store.auth_type(), AuthType::Bearer);
    }

    #[test]
    fn test_empty_update_rejected() {
        let store = CredentialStore::with_credential(Credential::ApiKey("sk".into()));
        assert_eq!(
            store.update_api_key(""),
            Err(ConfigError::EmptyCredential("API key"))
        );
        assert!(matches!(store.current(), Credential::ApiKey(ref k) if k == "sk"));
    }

    #[test]
    fn test_debug_redacts_secrets() {
        let debug = format!("{:?}", Credential::ApiKey("sk_live_secret".into()));
        assert!(!debug.contains("sk_live_secret"));
    }
}
