//! Built-in defaults (layer 1)

use serde::{Deserialize, Serialize};

/// Built-in default configuration values
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuiltinDefaults {
    /// BMC address (default: "https://localhost")
    pub base_url: String,

    /// Connection timeout in seconds (default: 30)
    pub connect_timeout_seconds: u64,

    /// Whole-request timeout in seconds (default: 120)
    pub request_timeout_seconds: u64,

    /// Verify the BMC certificate (default: true)
    pub verify_tls: bool,

    /// Simultaneous batch requests, 0 = unbounded (default: 0)
    pub batch_max_in_flight: u64,

    /// JSON log output (default: false)
    pub logging_json: bool,
}

impl Default for BuiltinDefaults {
    fn default() -> Self {
        Self {
            base_url: "https://localhost".to_string(),
            connect_timeout_seconds: 30,
            request_timeout_seconds: 120,
            verify_tls: true,
            batch_max_in_flight: 0,
            logging_json: false,
        }
    }
}

impl BuiltinDefaults {
    /// Convert to JSON Value for merging
    ///
    /// `locale.file` and `profile.path` have no built-in value; they resolve
    /// to the embedded catalog and the per-user profile file.
    pub fn to_value(&self) -> serde_json::Value {
        serde_json::json!({
            "base_url": self.base_url,
            "connect_timeout_seconds": self.connect_timeout_seconds,
            "request_timeout_seconds": self.request_timeout_seconds,
            "verify_tls": self.verify_tls,
            "batch": {
                "max_in_flight": self.batch_max_in_flight
            },
            "logging": {
                "json": self.logging_json
            }
        })
    }
}
