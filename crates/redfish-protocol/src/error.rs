//! Redfish error bodies and error-code classification.
//!
//! Redfish services report failures as
//! `{"error": {"code": "<Registry>.<Version>.<MessageKey>", ...}}`.
//! Only the trailing message key is stable across firmware releases, so
//! every match against a code goes through [`ErrorKind::classify`].

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

use crate::EXTENDED_INFO;

/// Registry prefix used when building codes for the Base message registry.
pub const BASE_REGISTRY: &str = "Base.1.13.0";

/// Registry prefix used for vendor (OpenBMC) messages.
pub const OPENBMC_REGISTRY: &str = "OpenBMC.0.5";

/// Classified error kinds recognized by the console.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Login succeeded but a TOTP secret must be generated first.
    GenerateSecretKeyRequired,
    /// The resource was changed by something other than this client
    /// (e.g. a guard record held by the service processor).
    ExternalConflict,
    /// A property value had the wrong format (password policy rejection).
    PropertyValueFormat,
    /// The collection is full (maximum number of accounts reached).
    CreateLimitReached,
    /// Anything else, including a missing code.
    Other,
}

impl ErrorKind {
    /// Kinds with a recognized message key, in match order.
    const RECOGNIZED: [ErrorKind; 4] = [
        ErrorKind::GenerateSecretKeyRequired,
        ErrorKind::ExternalConflict,
        ErrorKind::PropertyValueFormat,
        ErrorKind::CreateLimitReached,
    ];

    /// Message key suffix identifying this kind
    pub fn suffix(&self) -> &'static str {
        match self {
            ErrorKind::GenerateSecretKeyRequired => "GenerateSecretKeyRequired",
            ErrorKind::ExternalConflict => "PropertyValueExternalConflict",
            ErrorKind::PropertyValueFormat => "PropertyValueFormatError",
            ErrorKind::CreateLimitReached => "CreateLimitReachedForResource",
            ErrorKind::Other => "",
        }
    }

    /// Classify a code or message id by its trailing message key.
    pub fn classify(code: &str) -> ErrorKind {
        Self::RECOGNIZED
            .into_iter()
            .find(|kind| code.ends_with(kind.suffix()))
            .unwrap_or(ErrorKind::Other)
    }

    /// Classify an optional code; `None` is always [`ErrorKind::Other`].
    pub fn classify_opt(code: Option<&str>) -> ErrorKind {
        code.map(Self::classify).unwrap_or(ErrorKind::Other)
    }

    /// Fully qualified code as a service would emit it.
    pub fn registry_code(&self) -> String {
        match self {
            ErrorKind::GenerateSecretKeyRequired => {
                format!("{}.{}", OPENBMC_REGISTRY, self.suffix())
            }
            ErrorKind::Other => format!("{}.GeneralError", BASE_REGISTRY),
            _ => format!("{}.{}", BASE_REGISTRY, self.suffix()),
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorKind::Other => write!(f, "Other"),
            kind => write!(f, "{}", kind.suffix()),
        }
    }
}

/// One entry of a `@Message.ExtendedInfo` array.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ExtendedInfo {
    /// Registry-qualified message id
    pub message_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub message_args: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub severity: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resolution: Option<String>,
}

impl ExtendedInfo {
    /// Create an entry for a recognized kind.
    pub fn for_kind(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            message_id: kind.registry_code(),
            message: Some(message.into()),
            message_args: Vec::new(),
            severity: None,
            resolution: None,
        }
    }
}

/// Inner `error` object of a Redfish error response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RedfishError {
    pub code: String,
    pub message: String,
    #[serde(rename = "@Message.ExtendedInfo", default, skip_serializing_if = "Vec::is_empty")]
    pub extended_info: Vec<ExtendedInfo>,
}

/// Redfish error response body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: RedfishError,
}

impl ErrorBody {
    /// Create an error body with an explicit code.
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error: RedfishError {
                code: code.into(),
                message: message.into(),
                extended_info: Vec::new(),
            },
        }
    }

    /// Create an error body for a classified kind.
    pub fn for_kind(kind: ErrorKind, message: impl Into<String>) -> Self {
        let message = message.into();
        let mut body = Self::new(kind.registry_code(), message.clone());
        body.error.extended_info.push(ExtendedInfo::for_kind(kind, message));
        body
    }

    /// Kind of this error
    pub fn kind(&self) -> ErrorKind {
        ErrorKind::classify(&self.error.code)
    }

    /// Convert to a JSON value
    pub fn to_value(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}

/// Read `error.code` from an arbitrary response body.
pub fn error_code(body: &Value) -> Option<&str> {
    body.get("error")?.get("code")?.as_str()
}

/// Read the first `MessageId` of an extended-info annotation.
///
/// `property` selects a property-scoped annotation such as
/// `Password@Message.ExtendedInfo`; `None` reads the resource-level one.
pub fn first_message_id<'a>(body: &'a Value, property: Option<&str>) -> Option<&'a str> {
    let annotation = match property {
        Some(property) => format!("{}{}", property, EXTENDED_INFO),
        None => EXTENDED_INFO.to_string(),
    };
    body.get(annotation.as_str())?
        .as_array()?
        .first()?
        .get("MessageId")?
        .as_str()
}
