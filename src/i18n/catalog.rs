//! TOML message catalog
//!
//! Tables are flattened into dotted keys, so
//!
//! ```toml
//! [event_logs.toast]
//! success_delete = "Deleted {count} log. | Deleted {count} logs."
//! ```
//!
//! is looked up as `event_logs.toast.success_delete`.

use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::Path;

use super::Localizer;

/// Built-in English messages
const ENGLISH: &str = include_str!("../../locales/en.toml");

/// Errors loading a catalog
#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("Failed to read catalog {path}: {source}")]
    Read { path: String, source: io::Error },

    #[error("Failed to parse catalog: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Message {key} must be a string")]
    NotAString { key: String },
}

/// Flat key → message table
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    messages: HashMap<String, String>,
}

impl Catalog {
    /// Parse a catalog from TOML text
    pub fn from_toml_str(content: &str) -> Result<Self, CatalogError> {
        let table: toml::Table = content.parse()?;
        let mut messages = HashMap::new();
        flatten("", &table, &mut messages)?;
        Ok(Self { messages })
    }

    /// Load a catalog file
    pub fn load(path: &Path) -> Result<Self, CatalogError> {
        let content = fs::read_to_string(path).map_err(|source| CatalogError::Read {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml_str(&content)
    }

    /// The built-in English catalog
    pub fn english() -> Self {
        // Parsed in test_english_catalog_has_every_key
        Self::from_toml_str(ENGLISH).unwrap_or_default()
    }

    /// Overlay another catalog; its messages win
    pub fn merge(&mut self, overlay: Catalog) {
        self.messages.extend(overlay.messages);
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.messages.get(key).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}

fn flatten(
    prefix: &str,
    table: &toml::Table,
    out: &mut HashMap<String, String>,
) -> Result<(), CatalogError> {
    for (name, value) in table {
        let key = if prefix.is_empty() {
            name.clone()
        } else {
            format!("{}.{}", prefix, name)
        };
        match value {
            toml::Value::Table(nested) => flatten(&key, nested, out)?,
            toml::Value::String(message) => {
                out.insert(key, message.clone());
            }
            _ => return Err(CatalogError::NotAString { key }),
        }
    }
    Ok(())
}

/// Pick the plural form for `count`.
///
/// Two forms are `one | other`; three are `zero | one | other`.
fn plural_form(message: &str, count: usize) -> &str {
    let forms: Vec<&str> = message.split('|').map(str::trim).collect();
    let index = match forms.len() {
        1 => 0,
        2 => usize::from(count != 1),
        _ => count.min(2),
    };
    forms.get(index).copied().unwrap_or(message)
}

fn interpolate(template: &str, params: &[(&str, &str)]) -> String {
    params
        .iter()
        .fold(template.to_string(), |text, (name, value)| {
            text.replace(&format!("{{{}}}", name), value)
        })
}

impl Localizer for Catalog {
    fn t(&self, key: &str, params: &[(&str, &str)]) -> String {
        match self.get(key) {
            Some(message) => interpolate(message, params),
            None => key.to_string(),
        }
    }

    fn tc(&self, key: &str, count: usize) -> String {
        let Some(message) = self.get(key) else {
            return key.to_string();
        };
        let text = count.to_string();
        interpolate(
            plural_form(message, count),
            &[("count", &text), ("n", &text)],
        )
    }
}
