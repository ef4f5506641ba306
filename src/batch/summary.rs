//! Outcome summarizer
//!
//! Turns a [`BatchOutcome`] into counts and the ordered toast messages the
//! console shows: success, then the special case, then the generic error.

use serde::{Deserialize, Serialize};

use super::executor::BatchOutcome;
use crate::i18n::Localizer;

/// Toast category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ToastKind {
    Success,
    Error,
}

/// One user-facing message
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToastMessage {
    #[serde(rename = "type")]
    pub kind: ToastKind,
    pub message: String,
}

impl ToastMessage {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            kind: ToastKind::Success,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            kind: ToastKind::Error,
            message: message.into(),
        }
    }
}

/// Message keys of one batch operation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MessageKeys {
    pub success: &'static str,
    pub error: &'static str,
    /// Guard-record conflict message; operations without one never emit it
    pub special_case: Option<&'static str>,
}

impl MessageKeys {
    pub const fn new(success: &'static str, error: &'static str) -> Self {
        Self {
            success,
            error,
            special_case: None,
        }
    }

    pub const fn with_special_case(self, key: &'static str) -> Self {
        Self {
            special_case: Some(key),
            ..self
        }
    }
}

/// Counts and messages for one batch
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchSummary {
    pub success_count: usize,
    /// Every failure, special cases included
    pub error_count: usize,
    pub special_case_count: usize,
    pub messages: Vec<ToastMessage>,
}

impl BatchSummary {
    pub fn total(&self) -> usize {
        self.success_count + self.error_count
    }

    pub fn has_errors(&self) -> bool {
        self.error_count > 0
    }
}

/// Summarize an outcome.
///
/// Each message is emitted only when its count is non-zero and is pluralized
/// on that count.
pub fn summarize(
    outcome: &BatchOutcome,
    keys: &MessageKeys,
    localizer: &dyn Localizer,
) -> BatchSummary {
    let success_count = outcome.iter().filter(|r| r.is_success()).count();
    let error_count = outcome.len() - success_count;
    let special_case_count = outcome.iter().filter(|r| r.is_special_case()).count();

    let mut messages = Vec::new();
    if success_count > 0 {
        messages.push(ToastMessage::success(localizer.tc(keys.success, success_count)));
    }
    if error_count > 0 {
        if let Some(key) = keys.special_case.filter(|_| special_case_count > 0) {
            messages.push(ToastMessage::error(localizer.tc(key, special_case_count)));
        }
        messages.push(ToastMessage::error(localizer.tc(keys.error, error_count)));
    }

    BatchSummary {
        success_count,
        error_count,
        special_case_count,
        messages,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::batch::{FailureDetail, OperationResult};
    use crate::i18n::Catalog;
    use redfish_protocol::ErrorKind;
    use serde_json::{json, Value};

    const KEYS: MessageKeys = MessageKeys::new("ok", "err").with_special_case("guard");

    fn catalog() -> Catalog {
        Catalog::from_toml_str(
            r#"
            ok = "{count} done | {count} done (many)"
            err = "{count} failed | {count} failed (many)"
            guard = "{count} guarded | {count} guarded (many)"
            "#,
        )
        .unwrap()
    }

    fn failure(kind: ErrorKind) -> OperationResult {
        OperationResult::Failure(FailureDetail {
            code: Some(kind.registry_code()),
            kind,
            status: Some(400),
            message: String::new(),
        })
    }

    fn success() -> OperationResult {
        OperationResult::Success(Value::Null)
    }

    #[test]
    fn test_empty_outcome() {
        let summary = summarize(&BatchOutcome::default(), &KEYS, &catalog());
        assert_eq!(summary, BatchSummary::default());
    }

    #[test]
    fn test_mixed_outcome_message_order() {
        let outcome = BatchOutcome::new(vec![
            success(),
            failure(ErrorKind::ExternalConflict),
            success(),
        ]);
        let summary = summarize(&outcome, &KEYS, &catalog());

        assert_eq!(summary.success_count, 2);
        assert_eq!(summary.error_count, 1);
        assert_eq!(summary.special_case_count, 1);
        assert_eq!(
            summary.messages,
            vec![
                ToastMessage::success("2 done (many)"),
                ToastMessage::error("1 guarded"),
                ToastMessage::error("1 failed"),
            ]
        );
    }

    #[test]
    fn test_no_special_case_key() {
        let keys = MessageKeys::new("ok", "err");
        let outcome = BatchOutcome::new(vec![failure(ErrorKind::ExternalConflict)]);
        let summary = summarize(&outcome, &keys, &catalog());

        assert_eq!(summary.special_case_count, 1);
        assert_eq!(summary.messages, vec![ToastMessage::error("1 failed")]);
    }

    #[test]
    fn test_plain_failures() {
        let outcome = BatchOutcome::new(vec![
            failure(ErrorKind::Other),
            failure(ErrorKind::PropertyValueFormat),
        ]);
        let summary = summarize(&outcome, &KEYS, &catalog());

        assert_eq!(summary.special_case_count, 0);
        assert_eq!(summary.total(), 2);
        assert_eq!(summary.messages, vec![ToastMessage::error("2 failed (many)")]);
    }

    #[test]
    fn test_toast_serializes_type_field() {
        assert_eq!(
            serde_json::to_value(ToastMessage::success("x")).unwrap(),
            json!({"type": "success", "message": "x"})
        );
    }
}
