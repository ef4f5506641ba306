//! Session markers
//!
//! The BMC web server hands out two cookies on login: `XSRF-TOKEN`, which
//! doubles as the session token, and `IsAuthenticated`. The console only
//! reads them, and drops them on logout.

use std::sync::{Arc, PoisonError, RwLock};

use reqwest::cookie::{CookieStore, Jar};
use reqwest::Url;

use crate::client::transport::{cookie_value, IS_AUTHENTICATED_COOKIE, XSRF_COOKIE};

/// Read access to the session cookies
pub trait SessionMarkers: Send + Sync {
    /// Session token (`XSRF-TOKEN`)
    fn xsrf_token(&self) -> Option<String>;

    /// Raw `IsAuthenticated` value
    fn is_authenticated_flag(&self) -> Option<String>;

    /// Drop both markers
    fn clear(&self);
}

#[derive(Debug, Default, Clone)]
struct Markers {
    xsrf_token: Option<String>,
    is_authenticated: Option<String>,
}

/// In-memory markers, set explicitly by tests or embedding code
#[derive(Debug, Default)]
pub struct MemorySessionMarkers {
    inner: RwLock<Markers>,
}

impl MemorySessionMarkers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Markers as the web server leaves them after a successful login
    pub fn authenticated(token: &str) -> Self {
        let markers = Self::new();
        markers.set_xsrf_token(Some(token));
        markers.set_is_authenticated(Some("true"));
        markers
    }

    pub fn set_xsrf_token(&self, token: Option<&str>) {
        let mut inner = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        inner.xsrf_token = token.map(str::to_string);
    }

    pub fn set_is_authenticated(&self, value: Option<&str>) {
        let mut inner = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        inner.is_authenticated = value.map(str::to_string);
    }

    fn snapshot(&self) -> Markers {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl SessionMarkers for MemorySessionMarkers {
    fn xsrf_token(&self) -> Option<String> {
        self.snapshot().xsrf_token
    }

    fn is_authenticated_flag(&self) -> Option<String> {
        self.snapshot().is_authenticated
    }

    fn clear(&self) {
        let mut inner = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        *inner = Markers::default();
    }
}

/// Markers backed by the cookie jar of an [`HttpTransport`](crate::client::HttpTransport)
pub struct CookieSessionMarkers {
    jar: Arc<Jar>,
    url: Url,
}

impl CookieSessionMarkers {
    pub fn new(jar: Arc<Jar>, url: Url) -> Self {
        Self { jar, url }
    }

    fn cookie(&self, name: &str) -> Option<String> {
        let header = self.jar.cookies(&self.url)?;
        let cookies = header.to_str().ok()?;
        cookie_value(cookies, name).map(str::to_string)
    }
}

impl SessionMarkers for CookieSessionMarkers {
    fn xsrf_token(&self) -> Option<String> {
        self.cookie(XSRF_COOKIE)
    }

    fn is_authenticated_flag(&self) -> Option<String> {
        self.cookie(IS_AUTHENTICATED_COOKIE)
    }

    fn clear(&self) {
        // An already-expired cookie evicts the stored one
        for name in [XSRF_COOKIE, IS_AUTHENTICATED_COOKIE] {
            self.jar
                .add_cookie_str(&format!("{}=; Max-Age=0; Path=/", name), &self.url);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_markers() {
        let markers = MemorySessionMarkers::authenticated("tok");
        assert_eq!(markers.xsrf_token().as_deref(), Some("tok"));
        assert_eq!(markers.is_authenticated_flag().as_deref(), Some("true"));

        markers.clear();
        assert!(markers.xsrf_token().is_none());
        assert!(markers.is_authenticated_flag().is_none());
    }

    #[test]
    fn test_cookie_markers_read_and_clear() {
        let url: Url = "https://bmc.example/".parse().unwrap();
        let jar = Arc::new(Jar::default());
        jar.add_cookie_str("XSRF-TOKEN=abc; Path=/", &url);
        jar.add_cookie_str("IsAuthenticated=true; Path=/", &url);

        let markers = CookieSessionMarkers::new(Arc::clone(&jar), url);
        assert_eq!(markers.xsrf_token().as_deref(), Some("abc"));
        assert_eq!(markers.is_authenticated_flag().as_deref(), Some("true"));

        markers.clear();
        assert!(markers.xsrf_token().is_none());
        assert!(markers.is_authenticated_flag().is_none());
    }
}
