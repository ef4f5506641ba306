//! Batch operations with partial-failure aggregation
//!
//! - [`BatchExecutor`]: fan out one request per target, keep input order
//! - [`summarize`]: count outcomes and build localized messages

mod executor;
mod summary;

pub use executor::{BatchExecutor, BatchOutcome, FailureDetail, OperationResult};
pub use summary::{summarize, BatchSummary, MessageKeys, ToastKind, ToastMessage};
