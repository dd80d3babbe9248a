//! Transport seam between the pipeline and the network.
//!
//! The pipeline only ever sees a [`PreparedRequest`] going out and an
//! [`Outcome`] coming back. [`ReqwestTransport`] is the production
//! implementation; tests substitute scripted transports.

use std::time::Duration;

use async_trait::async_trait;
use getpaid_core::{ConfigError, Method, RequestSpec};
use reqwest::header::{self, HeaderMap, HeaderName, HeaderValue};
use reqwest::Client;
use serde_json::Value;
use tracing::{debug, instrument};
use url::Url;

use crate::config::ClientConfig;
use crate::error::TransportError;

/// Response header carrying the request-correlation id.
pub const REQUEST_ID_HEADER: &str = "x-request-id";

// ============================================================================
// Prepared Request
// ============================================================================

/// A request ready to send: the [`RequestSpec`] plus whatever auth added.
///
/// Built fresh from the [`RequestSpec`] on every attempt.
#[derive(Debug, Clone, PartialEq)]
pub struct PreparedRequest {
    /// HTTP verb.
    pub method: Method,
    /// Path relative to the base URL.
    pub path: String,
    /// Ordered query parameters.
    pub query: Vec<(String, String)>,
    /// Headers on top of the transport defaults.
    pub headers: Vec<(String, String)>,
    /// JSON body.
    pub body: Option<Value>,
}

impl PreparedRequest {
    /// Copies a spec into a mutable request.
    pub fn from_spec(spec: &RequestSpec) -> Self {
        Self {
            method: spec.method,
            path: spec.path.clone(),
            query: spec.query.clone(),
            headers: spec.headers.clone(),
            body: spec.body.clone(),
        }
    }

    /// Returns the first header with the given name, ignoring case.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Sets a header, replacing any existing value with the same name.
    pub fn set_header(&mut self, name: &str, value: impl Into<String>) {
        self.headers.retain(|(k, _)| !k.eq_ignore_ascii_case(name));
        self.headers.push((name.to_string(), value.into()));
    }

    /// Returns all values of a query parameter.
    pub fn query_values(&self, key: &str) -> Vec<&str> {
        self.query
            .iter()
            .filter(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
            .collect()
    }

    /// Sets a query parameter, replacing existing entries for the same key and
    /// leaving every other parameter in place.
    pub fn set_query(&mut self, key: &str, value: impl Into<String>) {
        self.query.retain(|(k, _)| k != key);
        self.query.push((key.to_string(), value.into()));
    }
}

// ============================================================================
// Raw Response & Outcome
// ============================================================================

/// A response as received, before any decoding.
#[derive(Debug, Clone)]
pub struct RawResponse {
    /// HTTP status code.
    pub status: u16,
    /// Response headers.
    pub headers: HeaderMap,
    /// Raw body bytes.
    pub body: Vec<u8>,
}

impl RawResponse {
    /// Creates a response with no headers.
    pub fn new(status: u16, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            headers: HeaderMap::new(),
            body: body.into(),
        }
    }

    /// Adds a header. Invalid names or values are ignored.
    #[must_use]
    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        if let (Ok(name), Ok(value)) = (
            HeaderName::from_bytes(name.as_bytes()),
            HeaderValue::from_str(value),
        ) {
            self.headers.insert(name, value);
        }
        self
    }

    /// Returns true for 2xx.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Returns a header value as text.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// The `x-request-id` header.
    pub fn request_id(&self) -> Option<&str> {
        self.header(REQUEST_ID_HEADER)
    }

    /// The `Retry-After` header as integer seconds.
    pub fn retry_after_secs(&self) -> Option<u64> {
        self.header(header::RETRY_AFTER.as_str())
            .and_then(|v| v.trim().parse().ok())
    }
}

/// What one attempt produced.
#[derive(Debug, Clone)]
pub enum Outcome {
    /// A response was received, whatever its status.
    Response(RawResponse),
    /// No response was received.
    Network(TransportError),
}

impl Outcome {
    /// Status code, if a response was received.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Response(response) => Some(response.status),
            Self::Network(_) => None,
        }
    }

    /// Returns true for a 2xx response.
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Response(response) if response.is_success())
    }

    /// Returns true if no response was received.
    pub fn is_network_failure(&self) -> bool {
        matches!(self, Self::Network(_))
    }
}

// ============================================================================
// Transport Trait
// ============================================================================

/// Sends one attempt.
///
/// Implementations never fail: anything short of a response is reported as
/// [`Outcome::Network`].
#[async_trait]
pub trait Transport: Send + Sync {
    /// Sends the request and waits for the full response.
    async fn send(&self, request: &PreparedRequest) -> Outcome;
}

// ============================================================================
// Reqwest Transport
// ============================================================================

/// Production transport backed by `reqwest`.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    inner: Client,
    base_url: String,
    timeout: Duration,
}

impl ReqwestTransport {
    /// Creates a transport from the client configuration.
    ///
    /// The per-attempt timeout and user agent are fixed for the lifetime of
    /// the transport.
    pub fn new(config: &ClientConfig) -> Result<Self, ConfigError> {
        config.validate()?;

        let mut default_headers = HeaderMap::new();
        default_headers.insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static("application/json"),
        );

        let inner = Client::builder()
            .timeout(config.timeout)
            .user_agent(config.user_agent.as_str())
            .default_headers(default_headers)
            .build()
            .map_err(|e| ConfigError::HttpClient(e.to_string()))?;

        Ok(Self {
            inner,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            timeout: config.timeout,
        })
    }

    /// Joins the base URL, path and query.
    pub fn url_for(&self, request: &PreparedRequest) -> Result<Url, TransportError> {
        let separator = if request.path.starts_with('/') { "" } else { "/" };
        let mut url = Url::parse(&format!("{}{separator}{}", self.base_url, request.path))
            .map_err(|e| TransportError::InvalidRequest(e.to_string()))?;

        if !request.query.is_empty() {
            url.query_pairs_mut().extend_pairs(&request.query);
        }

        Ok(url)
    }

    async fn try_send(&self, request: &PreparedRequest) -> Result<RawResponse, TransportError> {
        let url = self.url_for(request)?;

        let mut builder = self.inner.request(to_reqwest_method(request.method), url);
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let map_err = |e: reqwest::Error| TransportError::from_reqwest(&e, self.timeout);

        let response = builder.send().await.map_err(map_err)?;
        let status = response.status().as_u16();
        let headers = response.headers().clone();
        let body = response.bytes().await.map_err(map_err)?.to_vec();

        Ok(RawResponse {
            status,
            headers,
            body,
        })
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    #[instrument(skip(self, request), fields(method = %request.method, path = %request.path))]
    async fn send(&self, request: &PreparedRequest) -> Outcome {
        match self.try_send(request).await {
            Ok(response) => {
                debug!(status = response.status, "Response received");
                Outcome::Response(response)
            }
            Err(error) => {
                debug!(error = %error, "No response received");
                Outcome::Network(error)
            }
        }
    }
}

fn to_reqwest_method(method: Method) -> reqwest::Method {
    match method {
        Method::Get => reqwest::Method::GET,
        Method::Post => reqwest::Method::POST,
        Method::Put => reqwest::Method::PUT,
        Method::Patch => reqwest::Method::PATCH,
        Method::Delete => reqwest::Method::DELETE,
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn transport(base_url: &str) -> ReqwestTransport {
        ReqwestTransport::new(&ClientConfig::new(base_url)).unwrap()
    }

    #[test]
    fn test_url_join() {
        let t = transport("https://api.example.com/");
        let req = PreparedRequest::from_spec(&RequestSpec::get("/api/customers"));
        assert_eq!(
            t.url_for(&req).unwrap().as_str(),
            "https://api.example.com/api/customers"
        );
    }

    #[test]
    fn test_url_keeps_base_path() {
        let t = transport("https://example.com/billing");
        let req = PreparedRequest::from_spec(&RequestSpec::get("api/health"));
        assert_eq!(
            t.url_for(&req).unwrap().as_str(),
            "https://example.com/billing/api/health"
        );
    }

    #[test]
    fn test_url_query_encoding() {
        let t = transport("https://api.example.com");
        let req = PreparedRequest::from_spec(
            &RequestSpec::get("/api/invoices")
                .query("email", "a b@c.co")
                .query_values("status", ["open"]),
        );
        assert_eq!(
            t.url_for(&req).unwrap().query(),
            Some("email=a+b%40c.co&status%5B%5D=open")
        );
    }

    #[test]
    fn test_set_query_replaces_only_same_key() {
        let mut req = PreparedRequest::from_spec(
            &RequestSpec::get("/api/pay/x").query("token", "old").query("page", 2),
        );
        req.set_query("token", "new");
        assert_eq!(req.query_values("token"), vec!["new"]);
        assert_eq!(req.query_values("page"), vec!["2"]);
    }

    #[test]
    fn test_set_header_is_case_insensitive() {
        let mut req = PreparedRequest::from_spec(
            &RequestSpec::get("/").header("authorization", "Basic abc"),
        );
        req.set_header("Authorization", "Bearer t");
        assert_eq!(req.headers.len(), 1);
        assert_eq!(req.header("AUTHORIZATION"), Some("Bearer t"));
    }

    #[test]
    fn test_retry_after_parsing() {
        let ok = RawResponse::new(429, "").with_header("retry-after", "30");
        assert_eq!(ok.retry_after_secs(), Some(30));

        let date = RawResponse::new(429, "")
            .with_header("retry-after", "Wed, 21 Oct 2015 07:28:00 GMT");
        assert_eq!(date.retry_after_secs(), None);
    }

    #[test]
    fn test_outcome_status() {
        let network = Outcome::Network(TransportError::Connect("refused".into()));
        assert_eq!(network.status(), None);
        assert!(network.is_network_failure());

        let ok = Outcome::Response(RawResponse::new(204, ""));
        assert!(ok.is_success());
        assert_eq!(ok.status(), Some(204));
    }
}
