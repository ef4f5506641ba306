//! Session providers
//!
//! Session cookies and the profile cache are injected into the stores
//! through traits so tests and the CLI can supply their own backing.

mod markers;
mod profile;

pub use markers::{CookieSessionMarkers, MemorySessionMarkers, SessionMarkers};
pub use profile::{FileProfileCache, MemoryProfileCache, ProfileCache, ProfileKey};

use std::io;

/// Session provider errors
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("Profile cache {path}: {source}")]
    Io { path: String, source: io::Error },

    #[error("Profile cache is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
}
