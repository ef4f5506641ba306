//! Domain stores
//!
//! Each store owns its state behind a lock, issues requests through the
//! shared [`ResourceClient`] and reports results as localized messages.
//! Locks are never held across an `.await`.

mod authentication;
mod event_log;
mod user_management;

pub use authentication::AuthenticationStore;
pub use event_log::{
    health_status, high_priority_events, EventLogEntry, EventLogState, EventLogStore,
    HealthStatus,
};
pub use user_management::{
    permitted_role_change, AccountPatch, AccountSettings, NewUser, PasswordRequirements,
    UserManagementState, UserManagementStore, UserUpdate, READ_ONLY_ROLE,
};

use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::batch::BatchExecutor;
use crate::client::{ClientError, ResourceClient, Transport};
use crate::i18n::Localizer;
use crate::session::{ProfileCache, SessionError, SessionMarkers};
use crate::state::AuthStateError;

/// Store errors
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Localized, display-ready failure of a single operation
    #[error("{0}")]
    Operation(String),

    /// Unlocalized failure of a fetch
    #[error(transparent)]
    Remote(#[from] ClientError),

    #[error("No logged-in user in the profile cache")]
    MissingProfile,

    #[error(transparent)]
    Session(#[from] SessionError),

    #[error(transparent)]
    State(#[from] AuthStateError),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Dependencies shared by every store
#[derive(Clone)]
pub struct StoreContext {
    pub client: Arc<ResourceClient>,
    pub markers: Arc<dyn SessionMarkers>,
    pub profile: Arc<dyn ProfileCache>,
    pub localizer: Arc<dyn Localizer>,
    pub executor: BatchExecutor,
}

impl StoreContext {
    pub fn new(
        transport: Arc<dyn Transport>,
        markers: Arc<dyn SessionMarkers>,
        profile: Arc<dyn ProfileCache>,
        localizer: Arc<dyn Localizer>,
    ) -> Self {
        Self {
            client: Arc::new(ResourceClient::new(transport)),
            markers,
            profile,
            localizer,
            executor: BatchExecutor::new(),
        }
    }

    pub fn with_executor(mut self, executor: BatchExecutor) -> Self {
        self.executor = executor;
        self
    }

    /// Localized message with named parameters
    pub(crate) fn t(&self, key: &str, params: &[(&str, &str)]) -> String {
        self.localizer.t(key, params)
    }

    /// Localized message pluralized on `count`
    pub(crate) fn tc(&self, key: &str, count: usize) -> String {
        self.localizer.tc(key, count)
    }
}

pub(crate) fn read<T>(lock: &RwLock<T>) -> RwLockReadGuard<'_, T> {
    lock.read().unwrap_or_else(PoisonError::into_inner)
}

pub(crate) fn write<T>(lock: &RwLock<T>) -> RwLockWriteGuard<'_, T> {
    lock.write().unwrap_or_else(PoisonError::into_inner)
}
