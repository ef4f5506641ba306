//! Transport Layer for the Resource Client
//!
//! Abstracts the HTTP connection for testability. Provides:
//! - Transport trait: interface for issuing one request
//! - MockTransport: in-process mock BMC for unit and integration tests
//! - HttpTransport: reqwest client with a cookie-backed session for production

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::cookie::{CookieStore, Jar};
use reqwest::header::HeaderValue;
use reqwest::Url;
use serde_json::Value;

use crate::mock::MockBmc;

/// Header the BMC web server expects to mirror the XSRF cookie
pub const XSRF_HEADER: &str = "X-XSRF-TOKEN";

/// Cookie carrying the session XSRF token
pub const XSRF_COOKIE: &str = "XSRF-TOKEN";

/// Cookie flagging an authenticated session
pub const IS_AUTHENTICATED_COOKIE: &str = "IsAuthenticated";

/// HTTP verbs used against the Redfish tree
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    Get,
    Post,
    Patch,
    Delete,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Patch => "PATCH",
            Method::Delete => "DELETE",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A single request against the service
#[derive(Debug, Clone, PartialEq)]
pub struct ApiRequest {
    pub method: Method,
    pub path: String,
    pub body: Option<Value>,
}

impl ApiRequest {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            body: None,
        }
    }

    pub fn with_body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }
}

/// Status and parsed body of a response
#[derive(Debug, Clone, PartialEq)]
pub struct ApiResponse {
    pub status: u16,
    /// Parsed JSON body; `Null` when the response had no content
    pub body: Value,
}

impl ApiResponse {
    pub fn new(status: u16, body: Value) -> Self {
        Self { status, body }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Transport trait for issuing requests
#[async_trait]
pub trait Transport: Send + Sync {
    /// Execute a request and return the raw response.
    ///
    /// Non-2xx statuses are returned as responses, not errors; only failures
    /// to obtain a response at all are transport errors.
    async fn execute(&self, request: &ApiRequest) -> Result<ApiResponse, TransportError>;
}

/// Transport errors
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Request timed out")]
    Timeout,

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("JSON serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("HTTP error: {0}")]
    Http(String),
}

impl From<reqwest::Error> for TransportError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            TransportError::Timeout
        } else if err.is_connect() {
            TransportError::ConnectionFailed(err.to_string())
        } else {
            TransportError::Http(err.to_string())
        }
    }
}

/// Mock transport for testing - dispatches directly to a MockBmc in-process
#[derive(Clone, Default)]
pub struct MockTransport {
    bmc: MockBmc,
}

impl MockTransport {
    /// Create a mock transport with a freshly seeded BMC
    pub fn new() -> Self {
        Self {
            bmc: MockBmc::new(),
        }
    }

    /// Create a mock transport around a pre-configured BMC
    pub fn with_bmc(bmc: MockBmc) -> Self {
        Self { bmc }
    }

    /// The underlying mock BMC, for test configuration and inspection
    pub fn bmc(&self) -> &MockBmc {
        &self.bmc
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn execute(&self, request: &ApiRequest) -> Result<ApiResponse, TransportError> {
        Ok(self.bmc.handle_request(request).await)
    }
}

/// HTTP transport configuration
#[derive(Debug, Clone)]
pub struct HttpConfig {
    /// Scheme and authority of the BMC, e.g. `https://bmc.example`
    pub base_url: String,
    pub connect_timeout_seconds: u64,
    pub request_timeout_seconds: u64,
    /// Verify the BMC certificate (most BMCs ship self-signed ones)
    pub verify_tls: bool,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            base_url: "https://localhost".to_string(),
            connect_timeout_seconds: 30,
            request_timeout_seconds: 60,
            verify_tls: true,
        }
    }
}

/// HTTPS transport for production use
///
/// Session state lives in a cookie jar shared with
/// [`CookieSessionMarkers`](crate::session::CookieSessionMarkers); the
/// XSRF cookie is echoed back in the `X-XSRF-TOKEN` header on every request.
pub struct HttpTransport {
    client: reqwest::Client,
    base_url: Url,
    jar: Arc<Jar>,
}

impl HttpTransport {
    /// Build a transport with a fresh cookie jar
    pub fn new(config: &HttpConfig) -> Result<Self, TransportError> {
        let base_url = Url::parse(&config.base_url)
            .map_err(|e| TransportError::InvalidUrl(format!("{}: {}", config.base_url, e)))?;
        let jar = Arc::new(Jar::default());

        let client = reqwest::Client::builder()
            .cookie_provider(Arc::clone(&jar))
            .connect_timeout(Duration::from_secs(config.connect_timeout_seconds))
            .timeout(Duration::from_secs(config.request_timeout_seconds))
            .danger_accept_invalid_certs(!config.verify_tls)
            .build()?;

        Ok(Self {
            client,
            base_url,
            jar,
        })
    }

    /// Cookie jar holding the session cookies
    pub fn cookie_jar(&self) -> Arc<Jar> {
        Arc::clone(&self.jar)
    }

    /// Base URL the jar is scoped to
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn xsrf_token(&self) -> Option<HeaderValue> {
        let header = self.jar.cookies(&self.base_url)?;
        let cookies = header.to_str().ok()?;
        let token = cookie_value(cookies, XSRF_COOKIE)?;
        HeaderValue::from_str(token).ok()
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn execute(&self, request: &ApiRequest) -> Result<ApiResponse, TransportError> {
        let url = self
            .base_url
            .join(&request.path)
            .map_err(|e| TransportError::InvalidUrl(format!("{}: {}", request.path, e)))?;

        let mut builder = match request.method {
            Method::Get => self.client.get(url),
            Method::Post => self.client.post(url),
            Method::Patch => self.client.patch(url),
            Method::Delete => self.client.delete(url),
        };

        if let Some(token) = self.xsrf_token() {
            builder = builder.header(XSRF_HEADER, token);
        }
        if let Some(ref body) = request.body {
            builder = builder.json(body);
        }

        let response = builder.send().await?;
        let status = response.status().as_u16();
        let text = response.text().await?;

        let body = if text.trim().is_empty() {
            Value::Null
        } else {
            // Error pages from the web server are not always JSON
            serde_json::from_str(&text).unwrap_or(Value::String(text))
        };

        Ok(ApiResponse::new(status, body))
    }
}

/// Find a cookie value in a `Cookie` header string.
pub(crate) fn cookie_value<'a>(cookies: &'a str, name: &str) -> Option<&'a str> {
    cookies.split(';').find_map(|pair| {
        let (key, value) = pair.trim().split_once('=')?;
        (key == name && !value.is_empty()).then_some(value)
    })
}
