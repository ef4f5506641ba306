//! Event log store
//!
//! Entries of the event log and the correctable-error (CE) log, the health
//! status derived from them, and bulk delete / resolve / unresolve.

use std::fmt;
use std::sync::RwLock;

use chrono::{DateTime, Utc};
use redfish_protocol::{paths, Collection, ErrorKind, LogEntry};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{debug, warn};

use super::{read, write, StoreContext, StoreError, StoreResult};
use crate::batch::{summarize, BatchSummary, MessageKeys};
use crate::i18n::keys;

const DELETE_KEYS: MessageKeys =
    MessageKeys::new(keys::EVENT_SUCCESS_DELETE, keys::EVENT_ERROR_DELETE)
        .with_special_case(keys::EVENT_ERROR_DELETE_GUARD_RECORD);

const RESOLVE_KEYS: MessageKeys =
    MessageKeys::new(keys::EVENT_SUCCESS_RESOLVE_LOGS, keys::EVENT_ERROR_RESOLVE_LOGS)
        .with_special_case(keys::EVENT_ERROR_RESOLVE_LOGS_GUARD_RECORD);

const UNRESOLVE_KEYS: MessageKeys =
    MessageKeys::new(keys::EVENT_SUCCESS_UNRESOLVE_LOGS, keys::EVENT_ERROR_UNRESOLVE_LOGS);

/// Log entry as presented by the console
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventLogEntry {
    pub id: String,
    pub event_id: Option<String>,
    pub severity: Option<String>,
    pub date: Option<DateTime<Utc>>,
    pub entry_type: Option<String>,
    pub description: Option<String>,
    pub name: Option<String>,
    pub modified_date: Option<DateTime<Utc>>,
    pub resolution: Option<String>,
    pub uri: String,
    /// "Resolved" or "Unresolved"
    pub filter_by_status: String,
    /// Resolved flag
    pub status: bool,
    pub additional_data_uri: Option<String>,
}

impl EventLogEntry {
    pub fn is_severity(&self, severity: &str) -> bool {
        self.severity.as_deref() == Some(severity)
    }
}

impl From<LogEntry> for EventLogEntry {
    fn from(entry: LogEntry) -> Self {
        let filter_by_status = if entry.resolved { "Resolved" } else { "Unresolved" };
        Self {
            id: entry.id,
            event_id: entry.event_id,
            severity: entry.severity,
            date: entry.created.as_deref().and_then(parse_date),
            entry_type: entry.entry_type,
            description: entry.message,
            name: entry.name,
            modified_date: entry.modified.as_deref().and_then(parse_date),
            resolution: entry.resolution,
            uri: entry.odata_id,
            filter_by_status: filter_by_status.to_string(),
            status: entry.resolved,
            additional_data_uri: entry.additional_data_uri,
        }
    }
}

fn parse_date(value: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|t| t.with_timezone(&Utc))
        .ok()
}

/// Aggregate health of the logs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum HealthStatus {
    /// Nothing loaded yet
    #[default]
    #[serde(rename = "")]
    Unknown,
    #[serde(rename = "OK")]
    Ok,
    Warning,
    Critical,
}

impl HealthStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            HealthStatus::Unknown => "",
            HealthStatus::Ok => "OK",
            HealthStatus::Warning => "Warning",
            HealthStatus::Critical => "Critical",
        }
    }
}

impl fmt::Display for HealthStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Health over a set of entries.
///
/// Critical wins over Warning; resolved entries are ignored.
pub fn health_status(entries: &[EventLogEntry], loaded: bool) -> HealthStatus {
    let mut status = if loaded {
        HealthStatus::Ok
    } else {
        HealthStatus::Unknown
    };
    for entry in entries.iter().filter(|e| !e.status) {
        if entry.is_severity("Critical") {
            return HealthStatus::Critical;
        }
        if entry.is_severity("Warning") {
            status = HealthStatus::Warning;
        }
    }
    status
}

/// Critical entries, resolved or not
pub fn high_priority_events(entries: &[EventLogEntry]) -> Vec<EventLogEntry> {
    entries
        .iter()
        .filter(|e| e.is_severity("Critical"))
        .cloned()
        .collect()
}

/// Event log store state
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EventLogState {
    pub event_logs: Vec<EventLogEntry>,
    pub ce_logs: Vec<EventLogEntry>,
    /// Set by the first successful fetch
    pub loaded_events: bool,
}

impl EventLogState {
    /// Event log followed by the CE log
    pub fn all_events(&self) -> Vec<EventLogEntry> {
        self.event_logs
            .iter()
            .chain(&self.ce_logs)
            .cloned()
            .collect()
    }
}

/// Event log store
pub struct EventLogStore {
    ctx: StoreContext,
    state: RwLock<EventLogState>,
}

impl EventLogStore {
    pub fn new(ctx: StoreContext) -> Self {
        Self {
            ctx,
            state: RwLock::new(EventLogState::default()),
        }
    }

    /// Snapshot of the current state
    pub fn state(&self) -> EventLogState {
        read(&self.state).clone()
    }

    async fn fetch_entries(&self, path: &str) -> StoreResult<Vec<EventLogEntry>> {
        let collection: Collection<LogEntry> = self.ctx.client.get_as(path).await.map_err(|e| {
            warn!(path, error = %e, "failed to load log entries");
            e
        })?;
        Ok(collection.members.into_iter().map(EventLogEntry::from).collect())
    }

    /// Load the event log
    pub async fn fetch_event_logs(&self) -> StoreResult<()> {
        let entries = self.fetch_entries(paths::EVENT_LOG_ENTRIES).await?;
        debug!(count = entries.len(), "loaded event log");
        let mut state = write(&self.state);
        state.event_logs = entries;
        state.loaded_events = true;
        Ok(())
    }

    /// Load the CE log
    pub async fn fetch_ce_logs(&self) -> StoreResult<()> {
        let entries = self.fetch_entries(paths::CE_LOG_ENTRIES).await?;
        debug!(count = entries.len(), "loaded CE log");
        let mut state = write(&self.state);
        state.ce_logs = entries;
        state.loaded_events = true;
        Ok(())
    }

    /// Load both logs concurrently; the first error is returned after both finish
    pub async fn refresh(&self) -> StoreResult<()> {
        let (events, ce) = futures::join!(self.fetch_event_logs(), self.fetch_ce_logs());
        events.and(ce)
    }

    /// Empty both logs and mark them loaded
    pub fn initialize_logs(&self) {
        let mut state = write(&self.state);
        state.event_logs.clear();
        state.ce_logs.clear();
        state.loaded_events = true;
    }

    pub fn all_events(&self) -> Vec<EventLogEntry> {
        read(&self.state).all_events()
    }

    pub fn ce_logs(&self) -> Vec<EventLogEntry> {
        read(&self.state).ce_logs.clone()
    }

    pub fn loaded_events(&self) -> bool {
        read(&self.state).loaded_events
    }

    pub fn health_status(&self) -> HealthStatus {
        let state = read(&self.state);
        health_status(&state.all_events(), state.loaded_events)
    }

    pub fn high_priority_events(&self) -> Vec<EventLogEntry> {
        high_priority_events(&read(&self.state).all_events())
    }

    /// Clear the whole event log; `count` only sizes the failure message
    pub async fn delete_all_event_logs(&self, count: usize) -> StoreResult<()> {
        self.ctx
            .client
            .post(paths::CLEAR_EVENT_LOG, None)
            .await
            .map_err(|e| {
                warn!(error = %e, "failed to clear event log");
                StoreError::Operation(self.ctx.tc(keys::EVENT_ERROR_DELETE, count))
            })?;
        Ok(())
    }

    /// Delete entries by URI
    pub async fn delete_event_logs(&self, uris: Vec<String>) -> BatchSummary {
        let client = &self.ctx.client;
        let outcome = self
            .ctx
            .executor
            .run(uris, |uri| async move { client.delete(&uri).await })
            .await;
        summarize(&outcome, &DELETE_KEYS, self.ctx.localizer.as_ref())
    }

    /// Mark entries resolved
    pub async fn resolve_event_logs(&self, uris: Vec<String>) -> BatchSummary {
        self.patch_resolved(uris, true, &RESOLVE_KEYS).await
    }

    /// Mark entries unresolved
    pub async fn unresolve_event_logs(&self, uris: Vec<String>) -> BatchSummary {
        self.patch_resolved(uris, false, &UNRESOLVE_KEYS).await
    }

    async fn patch_resolved(
        &self,
        uris: Vec<String>,
        resolved: bool,
        message_keys: &MessageKeys,
    ) -> BatchSummary {
        let client = &self.ctx.client;
        let outcome = self
            .ctx
            .executor
            .run(uris, |uri| async move {
                client.patch(&uri, json!({ "Resolved": resolved })).await
            })
            .await;
        summarize(&outcome, message_keys, self.ctx.localizer.as_ref())
    }

    /// Resolve or unresolve one entry, returning the success message
    pub async fn update_event_log_status(&self, uri: &str, resolved: bool) -> StoreResult<String> {
        match self
            .ctx
            .client
            .patch(uri, json!({ "Resolved": resolved }))
            .await
        {
            Ok(_) => {
                let key = if resolved {
                    keys::EVENT_SUCCESS_RESOLVE_LOGS
                } else {
                    keys::EVENT_SUCCESS_UNRESOLVE_LOGS
                };
                Ok(self.ctx.tc(key, 1))
            }
            Err(e) => {
                warn!(uri, error = %e, "failed to update log status");
                let mut message = self.ctx.t(keys::EVENT_ERROR_LOG_STATUS_UPDATE, &[]);
                if e.kind() == ErrorKind::ExternalConflict {
                    message.push('\n');
                    message.push_str(&self.ctx.tc(keys::EVENT_ERROR_RESOLVE_LOGS_GUARD_RECORD, 1));
                }
                Err(StoreError::Operation(message))
            }
        }
    }

    /// PEL JSON attached to an entry, if the service has one
    pub async fn download_log_data(&self, uri: &str) -> StoreResult<Option<String>> {
        let body: Value = self
            .ctx
            .client
            .get(&paths::pel_attachment(uri))
            .await
            .map_err(|e| {
                warn!(uri, error = %e, "failed to download log data");
                StoreError::Operation(self.ctx.t(keys::EVENT_ERROR_DOWNLOAD, &[]))
            })?;
        Ok(body
            .pointer("/Oem/IBM/PelJson")
            .and_then(Value::as_str)
            .map(str::to_string))
    }
}
