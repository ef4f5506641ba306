//! Layer merging
//!
//! Tables merge key by key; anything else in a later layer (arrays
//! included) replaces what came before.

use serde_json::Value;

/// Merge `overlay` onto `base`.
pub fn deep_merge(base: Value, overlay: Value) -> Value {
    match (base, overlay) {
        (Value::Object(mut merged), Value::Object(overlay)) => {
            for (key, value) in overlay {
                let value = match merged.remove(&key) {
                    Some(previous) => deep_merge(previous, value),
                    None => value,
                };
                merged.insert(key, value);
            }
            Value::Object(merged)
        }
        (_, overlay) => overlay,
    }
}

/// Merge layers lowest precedence first
pub fn merge_layers(layers: Vec<Value>) -> Value {
    layers.into_iter().fold(Value::Null, deep_merge)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_scalar_override() {
        let base = json!({"verify_tls": true});
        let overlay = json!({"verify_tls": false});
        let result = deep_merge(base, overlay);
        assert_eq!(result["verify_tls"], false);
    }

    #[test]
    fn test_object_deep_merge() {
        let base = json!({
            "logging": {
                "json": false,
                "level": "info"
            }
        });
        let overlay = json!({
            "logging": {
                "json": true
            }
        });
        let result = deep_merge(base, overlay);

        assert_eq!(result["logging"]["json"], true);
        assert_eq!(result["logging"]["level"], "info");
    }

    #[test]
    fn test_array_replace() {
        let base = json!({
            "locales": ["en", "de", "fr"]
        });
        let overlay = json!({
            "locales": ["ja", "zh"]
        });
        let result = deep_merge(base, overlay);

        let locales = result["locales"].as_array().unwrap();
        assert_eq!(locales.len(), 2);
        assert_eq!(locales[0], "ja");
        assert_eq!(locales[1], "zh");
    }

    #[test]
    fn test_add_new_key() {
        let base = json!({"verify_tls": true});
        let overlay = json!({"locale": {"file": "de.toml"}});
        let result = deep_merge(base, overlay);

        assert_eq!(result["verify_tls"], true);
        assert_eq!(result["locale"]["file"], "de.toml");
    }

    #[test]
    fn test_null_override() {
        let base = json!({"base_url": "https://bmc"});
        let overlay = json!({"base_url": null});
        let result = deep_merge(base, overlay);

        assert!(result["base_url"].is_null());
    }

    #[test]
    fn test_merge_layers() {
        let builtin = json!({
            "request_timeout_seconds": 120,
            "batch": {"max_in_flight": 0}
        });
        let user = json!({
            "request_timeout_seconds": 60,
            "batch": {"max_in_flight": 4}
        });
        let cli = json!({
            "request_timeout_seconds": 10
        });

        let result = merge_layers(vec![builtin, user, cli]);

        assert_eq!(result["request_timeout_seconds"], 10);
        assert_eq!(result["batch"]["max_in_flight"], 4);
    }

    #[test]
    fn test_nested_deep_merge() {
        let base = json!({
            "level1": {
                "level2": {
                    "a": 1,
                    "b": 2
                }
            }
        });
        let overlay = json!({
            "level1": {
                "level2": {
                    "b": 3,
                    "c": 4
                }
            }
        });
        let result = deep_merge(base, overlay);

        assert_eq!(result["level1"]["level2"]["a"], 1);
        assert_eq!(result["level1"]["level2"]["b"], 3);
        assert_eq!(result["level1"]["level2"]["c"], 4);
    }
}
