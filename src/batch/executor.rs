//! Batch executor
//!
//! Runs one operation per target concurrently and collects every result in
//! input order. A failing item never aborts its siblings.

use std::fmt;
use std::future::Future;

use futures::stream::{self, StreamExt};
use redfish_protocol::ErrorKind;
use serde::Serialize;
use serde_json::Value;
use tracing::warn;

use crate::client::ClientError;

/// Why one item of a batch failed
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FailureDetail {
    /// `error.code` sent by the service, if any
    pub code: Option<String>,
    pub kind: ErrorKind,
    /// HTTP status, absent for transport failures
    pub status: Option<u16>,
    /// Diagnostic text, not meant for display
    pub message: String,
}

impl FailureDetail {
    /// Conflict with a guard record held outside the console
    pub fn is_special_case(&self) -> bool {
        self.kind == ErrorKind::ExternalConflict
    }
}

impl From<&ClientError> for FailureDetail {
    fn from(err: &ClientError) -> Self {
        Self {
            code: err.code().map(str::to_string),
            kind: err.kind(),
            status: err.status(),
            message: err.to_string(),
        }
    }
}

/// Result of one item
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "result", content = "detail", rename_all = "snake_case")]
pub enum OperationResult {
    Success(Value),
    Failure(FailureDetail),
}

impl OperationResult {
    pub fn is_success(&self) -> bool {
        matches!(self, OperationResult::Success(_))
    }

    pub fn failure(&self) -> Option<&FailureDetail> {
        match self {
            OperationResult::Failure(detail) => Some(detail),
            OperationResult::Success(_) => None,
        }
    }

    pub fn is_special_case(&self) -> bool {
        self.failure().is_some_and(FailureDetail::is_special_case)
    }
}

impl From<Result<Value, ClientError>> for OperationResult {
    fn from(result: Result<Value, ClientError>) -> Self {
        match result {
            Ok(body) => OperationResult::Success(body),
            Err(err) => OperationResult::Failure(FailureDetail::from(&err)),
        }
    }
}

/// Results of a batch, in input order
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BatchOutcome {
    results: Vec<OperationResult>,
}

impl BatchOutcome {
    pub fn new(results: Vec<OperationResult>) -> Self {
        Self { results }
    }

    pub fn results(&self) -> &[OperationResult] {
        &self.results
    }

    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, OperationResult> {
        self.results.iter()
    }

    /// True when at least one item succeeded
    pub fn any_success(&self) -> bool {
        self.results.iter().any(OperationResult::is_success)
    }
}

impl<'a> IntoIterator for &'a BatchOutcome {
    type Item = &'a OperationResult;
    type IntoIter = std::slice::Iter<'a, OperationResult>;

    fn into_iter(self) -> Self::IntoIter {
        self.results.iter()
    }
}

/// Concurrent fan-out over a set of targets
#[derive(Debug, Clone, Copy, Default)]
pub struct BatchExecutor {
    /// Simultaneous requests; 0 is unbounded
    max_in_flight: usize,
}

impl BatchExecutor {
    /// Executor that launches every item at once
    pub fn new() -> Self {
        Self::default()
    }

    /// Executor that keeps at most `max_in_flight` items running (0 = unbounded)
    pub fn with_max_in_flight(max_in_flight: usize) -> Self {
        Self { max_in_flight }
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight
    }

    /// Run `op` for each target and collect the outcome in input order.
    pub async fn run<T, F, Fut>(&self, targets: Vec<T>, op: F) -> BatchOutcome
    where
        T: fmt::Display,
        F: Fn(T) -> Fut,
        Fut: Future<Output = Result<Value, ClientError>>,
    {
        if targets.is_empty() {
            return BatchOutcome::default();
        }

        let labels: Vec<String> = targets.iter().map(ToString::to_string).collect();
        let pending = targets.into_iter().map(op);

        let results: Vec<Result<Value, ClientError>> = if self.max_in_flight == 0 {
            futures::future::join_all(pending).await
        } else {
            // `buffered` yields in input order, unlike `buffer_unordered`
            stream::iter(pending)
                .buffered(self.max_in_flight)
                .collect()
                .await
        };

        let results = results
            .into_iter()
            .zip(labels)
            .map(|(result, item)| {
                if let Err(ref e) = result {
                    warn!(item = %item, error = %e, "batch item failed");
                }
                OperationResult::from(result)
            })
            .collect();

        BatchOutcome::new(results)
    }
}
