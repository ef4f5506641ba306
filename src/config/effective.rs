//! Effective configuration
//!
//! The merged settings together with the sources that produced them.
//! Secrets that end up in a layer (a password passed on the command line,
//! say) are redacted before anything is stored.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sha2::{Digest, Sha256};
use std::fs;
use std::path::{Path, PathBuf};

use super::defaults::BuiltinDefaults;
use super::merge::merge_layers;

/// Schema version for the effective config
pub const SCHEMA_VERSION: u32 = 1;

/// Schema identifier
pub const SCHEMA_ID: &str = "bmc-console/effective_config@1";

/// Origin of a configuration source
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum ConfigOrigin {
    Builtin,
    User,
    Cli,
}

/// A contributing config source with provenance
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigSource {
    /// Origin of this source
    pub origin: ConfigOrigin,

    /// File path (None for builtin/cli)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,

    /// SHA-256 digest of raw file bytes (None for builtin/cli)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub digest: Option<String>,
}

/// Effective configuration with full provenance
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EffectiveConfig {
    /// Schema version
    pub schema_version: u32,

    /// Schema identifier
    pub schema_id: String,

    /// When this config was computed
    pub created_at: DateTime<Utc>,

    /// The merged configuration object
    pub config: Value,

    /// Contributing sources in precedence order
    pub sources: Vec<ConfigSource>,

    /// Redacted key paths
    pub redactions: Vec<String>,
}

/// Typed view of the settings the console reads
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConsoleSettings {
    pub base_url: String,
    pub connect_timeout_seconds: u64,
    pub request_timeout_seconds: u64,
    pub verify_tls: bool,
    /// 0 = unbounded
    pub batch_max_in_flight: usize,
    /// Message catalog overlaid on the built-in English one
    pub locale_file: Option<PathBuf>,
    pub profile_path: Option<PathBuf>,
    pub logging_json: bool,
}

/// Key fragments whose values never appear in the effective config
const SECRET_KEYS: &[&str] = &["password", "token", "otp", "secret", "credential"];

/// Inclusive bounds for the numeric settings
const BOUNDS: &[(&str, u64, u64)] = &[
    ("connect_timeout_seconds", 1, 300),
    ("request_timeout_seconds", 1, 3600),
];

impl EffectiveConfig {
    /// Default user config location: `~/.config/bmc-console/config.toml`
    pub fn default_user_config_path() -> Option<PathBuf> {
        let home = std::env::var_os("HOME")?;
        Some(PathBuf::from(home).join(".config/bmc-console/config.toml"))
    }

    /// Merge built-in defaults, the user file (when it exists) and CLI
    /// overrides, in that order.
    pub fn build(
        user_config_path: Option<&Path>,
        cli_overrides: Option<Value>,
    ) -> Result<Self, ConfigError> {
        let mut layers = vec![(
            ConfigSource::new(ConfigOrigin::Builtin),
            BuiltinDefaults::default().to_value(),
        )];

        if let Some(path) = user_config_path.filter(|p| p.exists()) {
            let (value, digest) = load_toml_file(path)?;
            let source = ConfigSource {
                origin: ConfigOrigin::User,
                path: Some(path.display().to_string()),
                digest: Some(digest),
            };
            layers.push((source, value));
        }

        if let Some(cli) = cli_overrides {
            layers.push((ConfigSource::new(ConfigOrigin::Cli), cli));
        }

        let (sources, values): (Vec<_>, Vec<_>) = layers.into_iter().unzip();
        let mut config = merge_layers(values);
        let mut redactions = Vec::new();
        redact(&mut config, "", &mut redactions);
        validate(&config)?;

        Ok(Self {
            schema_version: SCHEMA_VERSION,
            schema_id: SCHEMA_ID.to_string(),
            created_at: Utc::now(),
            config,
            sources,
            redactions,
        })
    }

    /// Typed settings; absent keys fall back to the built-in defaults
    pub fn settings(&self) -> ConsoleSettings {
        let defaults = BuiltinDefaults::default();
        let path = |key: &str| self.get_str(key).map(PathBuf::from);
        ConsoleSettings {
            base_url: self
                .get_str("base_url")
                .map(str::to_string)
                .unwrap_or(defaults.base_url),
            connect_timeout_seconds: self
                .get_u64("connect_timeout_seconds")
                .unwrap_or(defaults.connect_timeout_seconds),
            request_timeout_seconds: self
                .get_u64("request_timeout_seconds")
                .unwrap_or(defaults.request_timeout_seconds),
            verify_tls: self.get_bool("verify_tls").unwrap_or(defaults.verify_tls),
            batch_max_in_flight: self
                .get_u64("batch.max_in_flight")
                .unwrap_or(defaults.batch_max_in_flight) as usize,
            locale_file: path("locale.file"),
            profile_path: path("profile.path"),
            logging_json: self.get_bool("logging.json").unwrap_or(defaults.logging_json),
        }
    }

    /// Serialize to JSON
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Value at a dot-separated path, e.g. `batch.max_in_flight`
    pub fn get(&self, path: &str) -> Option<&Value> {
        self.config.pointer(&format!("/{}", path.replace('.', "/")))
    }

    pub fn get_u64(&self, path: &str) -> Option<u64> {
        self.get(path).and_then(Value::as_u64)
    }

    pub fn get_str(&self, path: &str) -> Option<&str> {
        self.get(path).and_then(Value::as_str)
    }

    pub fn get_bool(&self, path: &str) -> Option<bool> {
        self.get(path).and_then(Value::as_bool)
    }
}

impl ConfigSource {
    fn new(origin: ConfigOrigin) -> Self {
        Self {
            origin,
            path: None,
            digest: None,
        }
    }
}

/// Parse a TOML file, returning its value and the SHA-256 of its bytes
fn load_toml_file(path: &Path) -> Result<(Value, String), ConfigError> {
    let bytes = fs::read(path)
        .map_err(|e| ConfigError::IoError(format!("{}: {}", path.display(), e)))?;
    let digest = hex::encode(Sha256::digest(&bytes));

    let contents = std::str::from_utf8(&bytes)
        .map_err(|e| ConfigError::ParseError(format!("{}: invalid UTF-8: {}", path.display(), e)))?;
    let value: Value = toml::from_str(contents)
        .map_err(|e| ConfigError::ParseError(format!("{}: {}", path.display(), e)))?;
    Ok((value, digest))
}

/// Replace secret scalars with a marker, recording their paths
fn redact(value: &mut Value, prefix: &str, redactions: &mut Vec<String>) {
    let Value::Object(map) = value else {
        return;
    };
    for (key, child) in map.iter_mut() {
        let path = if prefix.is_empty() {
            key.clone()
        } else {
            format!("{}.{}", prefix, key)
        };
        let lower = key.to_lowercase();
        if child.is_object() {
            redact(child, &path, redactions);
        } else if SECRET_KEYS.iter().any(|s| lower.contains(s)) {
            *child = Value::String("[REDACTED]".to_string());
            redactions.push(path);
        }
    }
}

fn validate(config: &Value) -> Result<(), ConfigError> {
    let invalid = |msg: String| Err(ConfigError::ValidationError(msg));

    if let Some(url) = config.get("base_url") {
        let scheme_ok = url
            .as_str()
            .is_some_and(|u| u.starts_with("https://") || u.starts_with("http://"));
        if !scheme_ok {
            return invalid("base_url must start with http:// or https://".to_string());
        }
    }

    for &(key, min, max) in BOUNDS {
        if let Some(value) = config.get(key) {
            if !value.as_u64().is_some_and(|v| (min..=max).contains(&v)) {
                return invalid(format!("{} must be an integer in [{}, {}]", key, min, max));
            }
        }
    }

    if let Some(max) = config.pointer("/batch/max_in_flight") {
        if !max.is_u64() {
            return invalid("batch.max_in_flight must be a non-negative integer".to_string());
        }
    }

    Ok(())
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    IoError(String),

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Validation error: {0}")]
    ValidationError(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::{NamedTempFile, TempDir};

    #[test]
    fn test_build_with_defaults_only() {
        let config = EffectiveConfig::build(None, None).unwrap();

        assert_eq!(config.schema_version, SCHEMA_VERSION);
        assert_eq!(config.get_u64("connect_timeout_seconds"), Some(30));
        assert_eq!(config.get_u64("batch.max_in_flight"), Some(0));
    }

    #[test]
    fn test_build_with_cli_override() {
        let cli = serde_json::json!({
            "base_url": "https://bmc.example"
        });

        let config = EffectiveConfig::build(None, Some(cli)).unwrap();

        assert_eq!(config.get_str("base_url"), Some("https://bmc.example"));
    }

    #[test]
    fn test_validation_request_timeout() {
        let cli = serde_json::json!({
            "request_timeout_seconds": 0
        });

        let result = EffectiveConfig::build(None, Some(cli));
        assert!(result.is_err());
        assert!(result
            .unwrap_err()
            .to_string()
            .contains("request_timeout_seconds"));
    }

    #[test]
    fn test_validation_connect_timeout() {
        let cli = serde_json::json!({
            "connect_timeout_seconds": 500
        });

        let result = EffectiveConfig::build(None, Some(cli));
        assert!(result
            .unwrap_err()
            .to_string()
            .contains("connect_timeout_seconds"));
    }

    #[test]
    fn test_validation_base_url() {
        let cli = serde_json::json!({ "base_url": "bmc.example" });
        let result = EffectiveConfig::build(None, Some(cli));
        assert!(result.unwrap_err().to_string().contains("base_url"));
    }

    #[test]
    fn test_validation_max_in_flight() {
        let cli = serde_json::json!({ "batch": { "max_in_flight": -1 } });
        let result = EffectiveConfig::build(None, Some(cli));
        assert!(result.unwrap_err().to_string().contains("max_in_flight"));
    }

    #[test]
    fn test_secret_redaction() {
        let cli = serde_json::json!({
            "password": "0penBmc0",
            "normal_value": "visible"
        });

        let config = EffectiveConfig::build(None, Some(cli)).unwrap();

        assert_eq!(config.get_str("password"), Some("[REDACTED]"));
        assert_eq!(config.get_str("normal_value"), Some("visible"));
        assert!(config.redactions.contains(&"password".to_string()));
    }

    #[test]
    fn test_nested_secret_redaction() {
        let cli = serde_json::json!({
            "auth": {
                "token": "secret-token",
                "username": "admin"
            }
        });

        let config = EffectiveConfig::build(None, Some(cli)).unwrap();

        assert_eq!(config.get_str("auth.token"), Some("[REDACTED]"));
        assert_eq!(config.get_str("auth.username"), Some("admin"));
    }

    #[test]
    fn test_load_toml_file() {
        let mut temp = NamedTempFile::new().unwrap();
        writeln!(temp, "base_url = \"https://10.0.0.5\"").unwrap();
        writeln!(temp, "[batch]").unwrap();
        writeln!(temp, "max_in_flight = 4").unwrap();

        let config = EffectiveConfig::build(Some(temp.path()), None).unwrap();

        assert_eq!(config.get_str("base_url"), Some("https://10.0.0.5"));
        assert_eq!(config.get_u64("batch.max_in_flight"), Some(4));
        assert_eq!(config.sources.len(), 2);
        assert_eq!(config.sources[1].origin, ConfigOrigin::User);
        assert_eq!(config.sources[1].digest.as_ref().map(String::len), Some(64));
    }

    #[test]
    fn test_missing_user_file_is_skipped() {
        let dir = TempDir::new().unwrap();
        let config = EffectiveConfig::build(Some(&dir.path().join("absent.toml")), None).unwrap();

        assert_eq!(config.sources.len(), 1);
        assert_eq!(config.sources[0].origin, ConfigOrigin::Builtin);
    }

    #[test]
    fn test_typed_settings() {
        let cli = serde_json::json!({
            "verify_tls": false,
            "batch": { "max_in_flight": 2 },
            "locale": { "file": "/etc/bmc-console/de.toml" },
            "logging": { "json": true }
        });
        let settings = EffectiveConfig::build(None, Some(cli)).unwrap().settings();

        assert!(!settings.verify_tls);
        assert_eq!(settings.batch_max_in_flight, 2);
        assert_eq!(
            settings.locale_file,
            Some(PathBuf::from("/etc/bmc-console/de.toml"))
        );
        assert!(settings.profile_path.is_none());
        assert!(settings.logging_json);
        assert_eq!(settings.request_timeout_seconds, 120);
    }

    #[test]
    fn test_to_json_carries_schema_id() {
        let json = EffectiveConfig::build(None, None).unwrap().to_json().unwrap();
        assert!(json.contains(SCHEMA_ID));
        assert!(json.contains("\"builtin\""));
    }
}
