//! BMC Console - Redfish management client
//!
//! Session, event-log and user-account management for Redfish BMCs.
//! Bulk operations fan out concurrently, tolerate partial failure and are
//! summarized into localized messages.

pub mod batch;
pub mod client;
pub mod config;
pub mod i18n;
pub mod logging;
pub mod mock;
pub mod session;
pub mod state;
pub mod stores;

pub use batch::{BatchExecutor, BatchOutcome, BatchSummary, ToastKind, ToastMessage};
pub use client::{ClientError, HttpConfig, HttpTransport, MockTransport, ResourceClient, Transport};
pub use config::{ConsoleSettings, EffectiveConfig};
pub use i18n::{Catalog, Localizer};
pub use mock::MockBmc;
pub use stores::{
    AuthenticationStore, EventLogStore, StoreContext, StoreError, StoreResult, UserManagementStore,
};

use std::sync::Arc;

use session::{MemoryProfileCache, MemorySessionMarkers};

/// The three stores over one shared context
pub struct BmcConsole {
    pub auth: AuthenticationStore,
    pub event_log: EventLogStore,
    pub users: UserManagementStore,
}

impl BmcConsole {
    pub fn new(ctx: StoreContext) -> Self {
        Self {
            auth: AuthenticationStore::new(ctx.clone()),
            event_log: EventLogStore::new(ctx.clone()),
            users: UserManagementStore::new(ctx),
        }
    }

    /// Console with in-memory session markers and profile, English messages
    pub fn in_memory(transport: Arc<dyn Transport>) -> Self {
        Self::new(StoreContext::new(
            transport,
            Arc::new(MemorySessionMarkers::new()),
            Arc::new(MemoryProfileCache::new()),
            Arc::new(Catalog::english()),
        ))
    }
}
