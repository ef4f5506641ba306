//! Failure Injection for the Mock BMC
//!
//! Failures are keyed by verb and path so a test can break one resource of a
//! batch while its siblings keep succeeding.

use std::collections::HashMap;
use std::time::Duration;

use redfish_protocol::{ErrorBody, ErrorKind};

use crate::client::{ApiResponse, Method};

/// Failure configuration for one resource
#[derive(Debug, Clone)]
pub struct FailureConfig {
    /// Status to return; `None` lets the request through after `delay`
    pub status: Option<u16>,
    /// Error body to return with `status`
    pub body: Option<ErrorBody>,
    /// Delay to add before responding
    pub delay: Option<Duration>,
    /// Number of times to fail before succeeding (None = always fail)
    pub fail_count: Option<u32>,
}

impl FailureConfig {
    /// Create a config that returns an error with an explicit code
    pub fn error(status: u16, code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            status: Some(status),
            body: Some(ErrorBody::new(code, message)),
            delay: None,
            fail_count: None,
        }
    }

    /// Create a config that returns an error of a classified kind
    pub fn kind(status: u16, kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            status: Some(status),
            body: Some(ErrorBody::for_kind(kind, message)),
            delay: None,
            fail_count: None,
        }
    }

    /// Create a config that returns a bare status with no error body
    pub fn status(status: u16) -> Self {
        Self {
            status: Some(status),
            body: None,
            delay: None,
            fail_count: None,
        }
    }

    /// Create a config that just adds delay
    pub fn delay(duration: Duration) -> Self {
        Self {
            status: None,
            body: None,
            delay: Some(duration),
            fail_count: None,
        }
    }

    /// Add a delay before the failure is returned
    pub fn with_delay(mut self, duration: Duration) -> Self {
        self.delay = Some(duration);
        self
    }

    /// Set the number of times to fail before succeeding
    pub fn with_fail_count(mut self, count: u32) -> Self {
        self.fail_count = Some(count);
        self
    }

    /// Response to return instead of dispatching, if this config fails
    pub fn response(&self) -> Option<ApiResponse> {
        let status = self.status?;
        let body = self
            .body
            .as_ref()
            .map(ErrorBody::to_value)
            .unwrap_or(serde_json::Value::Null);
        Some(ApiResponse::new(status, body))
    }
}

type FailureKey = (Method, String);

/// Failure injector for the mock BMC
#[derive(Debug, Default)]
pub struct FailureInjector {
    configs: HashMap<FailureKey, FailureConfig>,
    /// Call counts per resource (for fail_count tracking)
    call_counts: HashMap<FailureKey, u32>,
}

impl FailureInjector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inject a failure for a verb on a path
    pub fn inject(&mut self, method: Method, path: impl Into<String>, config: FailureConfig) {
        let key = (method, normalize(&path.into()).to_string());
        self.call_counts.insert(key.clone(), 0);
        self.configs.insert(key, config);
    }

    /// Inject an error of a classified kind
    pub fn inject_kind(
        &mut self,
        method: Method,
        path: impl Into<String>,
        status: u16,
        kind: ErrorKind,
    ) {
        self.inject(method, path, FailureConfig::kind(status, kind, "Injected failure"));
    }

    /// Inject a delay
    pub fn inject_delay(&mut self, method: Method, path: impl Into<String>, delay: Duration) {
        self.inject(method, path, FailureConfig::delay(delay));
    }

    /// Clear all failure injections
    pub fn clear(&mut self) {
        self.configs.clear();
        self.call_counts.clear();
    }

    /// Clear failure injection for one resource
    pub fn clear_path(&mut self, method: Method, path: &str) {
        let key = (method, normalize(path).to_string());
        self.configs.remove(&key);
        self.call_counts.remove(&key);
    }

    /// Check if a failure should occur for a request
    /// Returns the failure config if one should occur, None otherwise
    pub fn check(&mut self, method: Method, path: &str) -> Option<&FailureConfig> {
        let key = (method, normalize(path).to_string());
        let config = self.configs.get(&key)?;
        let count = self.call_counts.entry(key).or_insert(0);
        *count += 1;

        match config.fail_count {
            Some(limit) if *count > limit => None,
            _ => Some(config),
        }
    }
}

/// Strip trailing slashes so `/a/` and `/a` address the same resource.
pub(crate) fn normalize(path: &str) -> &str {
    let trimmed = path.trim_end_matches('/');
    if trimmed.is_empty() {
        "/"
    } else {
        trimmed
    }
}
