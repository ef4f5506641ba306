//! Redfish resource representations.
//!
//! Only the properties the console reads are modelled; everything else in
//! a payload is ignored on deserialization.

use serde::{Deserialize, Serialize};

/// Reference to another resource.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ODataLink {
    #[serde(rename = "@odata.id")]
    pub odata_id: String,
}

impl ODataLink {
    pub fn new(odata_id: impl Into<String>) -> Self {
        Self {
            odata_id: odata_id.into(),
        }
    }
}

/// Generic resource collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Collection<T = ODataLink> {
    #[serde(rename = "Members", default = "Vec::new")]
    pub members: Vec<T>,
    #[serde(rename = "Members@odata.count", default, skip_serializing_if = "Option::is_none")]
    pub members_count: Option<usize>,
}

impl<T> Collection<T> {
    pub fn new(members: Vec<T>) -> Self {
        let count = members.len();
        Self {
            members,
            members_count: Some(count),
        }
    }
}

impl<T> Default for Collection<T> {
    fn default() -> Self {
        Self {
            members: Vec::new(),
            members_count: None,
        }
    }
}

/// `LogEntry` as served by the EventLog and CELog services.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct LogEntry {
    #[serde(rename = "@odata.id")]
    pub odata_id: String,
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub severity: Option<String>,
    /// RFC 3339 creation timestamp
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entry_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// RFC 3339 modification timestamp
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub modified: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resolution: Option<String>,
    #[serde(default)]
    pub resolved: bool,
    #[serde(rename = "AdditionalDataURI", default, skip_serializing_if = "Option::is_none")]
    pub additional_data_uri: Option<String>,
}

/// Multi-factor bypass settings of an account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct MfaBypass {
    #[serde(default)]
    pub bypass_types: Vec<String>,
}

impl MfaBypass {
    /// Bypass type exempting an account from TOTP
    pub const GOOGLE_AUTHENTICATOR: &'static str = "GoogleAuthenticator";
    /// Bypass type requiring TOTP
    pub const NONE: &'static str = "None";

    /// Bypass settings for the given flag
    pub fn from_flag(bypass: bool) -> Self {
        let kind = if bypass {
            Self::GOOGLE_AUTHENTICATOR
        } else {
            Self::NONE
        };
        Self {
            bypass_types: vec![kind.to_string()],
        }
    }

    pub fn is_bypassed(&self) -> bool {
        self.bypass_types
            .iter()
            .any(|t| t == Self::GOOGLE_AUTHENTICATOR)
    }
}

/// `ManagerAccount` resource.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ManagerAccount {
    #[serde(rename = "@odata.id")]
    pub odata_id: String,
    #[serde(default)]
    pub id: String,
    pub user_name: String,
    #[serde(default)]
    pub role_id: String,
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub locked: bool,
    #[serde(default)]
    pub password_change_required: bool,
    #[serde(rename = "MFABypass", default, skip_serializing_if = "Option::is_none")]
    pub mfa_bypass: Option<MfaBypass>,
}

/// Google Authenticator settings of the account service.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct GoogleAuthenticator {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enabled: Option<bool>,
}

/// Multi-factor authentication settings of the account service.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct MultiFactorAuth {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub google_authenticator: Option<GoogleAuthenticator>,
}

/// `AccountService` resource.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct AccountService {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub account_lockout_duration: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub account_lockout_threshold: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_password_length: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_password_length: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub multi_factor_auth: Option<MultiFactorAuth>,
}

impl AccountService {
    /// Whether TOTP is enabled service-wide
    pub fn global_mfa_enabled(&self) -> bool {
        self.multi_factor_auth
            .as_ref()
            .and_then(|m| m.google_authenticator.as_ref())
            .and_then(|g| g.enabled)
            .unwrap_or(false)
    }
}

/// `Role` resource.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Role {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub assigned_privileges: Vec<String>,
}

/// Vendor block of the service root (`Oem.IBM`).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ServiceRootOem {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub serial_number: Option<String>,
    #[serde(rename = "ACFWindowActive", default)]
    pub acf_window_active: bool,
    #[serde(default)]
    pub multi_factor_auth_enabled: bool,
}
