//! Profile cache
//!
//! Small per-user values remembered between invocations (the logged-in
//! username, preferred language, ...). All of them are dropped on logout.

use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{PoisonError, RwLock};

use super::SessionError;

/// Keys of the profile cache
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProfileKey {
    ModelType,
    Username,
    CurrentUser,
    HmcManagedValue,
    Language,
}

impl ProfileKey {
    /// Every key, in the order logout clears them
    pub const ALL: [ProfileKey; 5] = [
        ProfileKey::ModelType,
        ProfileKey::Username,
        ProfileKey::CurrentUser,
        ProfileKey::HmcManagedValue,
        ProfileKey::Language,
    ];

    /// Stored name of the key
    pub fn as_str(&self) -> &'static str {
        match self {
            ProfileKey::ModelType => "storedModelType",
            ProfileKey::Username => "storedUsername",
            ProfileKey::CurrentUser => "storedCurrentUser",
            ProfileKey::HmcManagedValue => "storedHmcManagedValue",
            ProfileKey::Language => "storedLanguage",
        }
    }
}

/// Key/value profile storage
pub trait ProfileCache: Send + Sync {
    fn get(&self, key: ProfileKey) -> Option<String>;

    fn set(&self, key: ProfileKey, value: &str) -> Result<(), SessionError>;

    fn remove(&self, key: ProfileKey) -> Result<(), SessionError>;

    /// Remove every profile key
    fn clear(&self) -> Result<(), SessionError> {
        for key in ProfileKey::ALL {
            self.remove(key)?;
        }
        Ok(())
    }
}

/// In-memory profile cache
#[derive(Debug, Default)]
pub struct MemoryProfileCache {
    values: RwLock<HashMap<ProfileKey, String>>,
}

impl MemoryProfileCache {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ProfileCache for MemoryProfileCache {
    fn get(&self, key: ProfileKey) -> Option<String> {
        self.values
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&key)
            .cloned()
    }

    fn set(&self, key: ProfileKey, value: &str) -> Result<(), SessionError> {
        self.values
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key, value.to_string());
        Ok(())
    }

    fn remove(&self, key: ProfileKey) -> Result<(), SessionError> {
        self.values
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&key);
        Ok(())
    }
}

/// Profile cache persisted as a JSON object, for the CLI
///
/// Unknown keys in the file are preserved.
#[derive(Debug)]
pub struct FileProfileCache {
    path: PathBuf,
    /// Serializes read-modify-write cycles within this process
    lock: RwLock<()>,
}

impl FileProfileCache {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: RwLock::new(()),
        }
    }

    /// Default location: `~/.config/bmc-console/profile.json`
    pub fn default_path() -> Option<PathBuf> {
        std::env::var_os("HOME").map(|home| {
            PathBuf::from(home)
                .join(".config")
                .join("bmc-console")
                .join("profile.json")
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read(&self) -> Result<BTreeMap<String, String>, SessionError> {
        if !self.path.exists() {
            return Ok(BTreeMap::new());
        }
        let content = fs::read_to_string(&self.path).map_err(|source| SessionError::Io {
            path: self.path.display().to_string(),
            source,
        })?;
        if content.trim().is_empty() {
            return Ok(BTreeMap::new());
        }
        Ok(serde_json::from_str(&content)?)
    }

    fn write(&self, values: &BTreeMap<String, String>) -> Result<(), SessionError> {
        let io_err = |source: io::Error| SessionError::Io {
            path: self.path.display().to_string(),
            source,
        };
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(io_err)?;
        }
        let content = serde_json::to_string_pretty(values)?;
        fs::write(&self.path, content).map_err(io_err)
    }

    fn update<F>(&self, f: F) -> Result<(), SessionError>
    where
        F: FnOnce(&mut BTreeMap<String, String>),
    {
        let _guard = self.lock.write().unwrap_or_else(PoisonError::into_inner);
        let mut values = self.read()?;
        f(&mut values);
        self.write(&values)
    }
}

impl ProfileCache for FileProfileCache {
    fn get(&self, key: ProfileKey) -> Option<String> {
        let _guard = self.lock.read().unwrap_or_else(PoisonError::into_inner);
        match self.read() {
            Ok(values) => values.get(key.as_str()).cloned(),
            Err(e) => {
                tracing::warn!(path = %self.path.display(), error = %e, "unreadable profile cache");
                None
            }
        }
    }

    fn set(&self, key: ProfileKey, value: &str) -> Result<(), SessionError> {
        self.update(|values| {
            values.insert(key.as_str().to_string(), value.to_string());
        })
    }

    fn remove(&self, key: ProfileKey) -> Result<(), SessionError> {
        self.update(|values| {
            values.remove(key.as_str());
        })
    }

    fn clear(&self) -> Result<(), SessionError> {
        self.update(|values| {
            for key in ProfileKey::ALL {
                values.remove(key.as_str());
            }
        })
    }
}
