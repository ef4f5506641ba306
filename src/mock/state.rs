//! Mock BMC State
//!
//! Resource data held by the mock service: accounts with their credentials,
//! the role catalogue, account-service policy and both log services.

use std::collections::{BTreeMap, HashMap, HashSet};

use chrono::{SecondsFormat, Utc};
use redfish_protocol::{
    paths, AccountService, LogEntry, ManagerAccount, MfaBypass, Role, ServiceRootOem,
};
use redfish_protocol::resources::{GoogleAuthenticator, MultiFactorAuth};

/// Role that may not be granted from the console
pub const SERVICE_AGENT_ROLE: &str = "OemIBMServiceAgent";

/// Default account seeded into every mock
pub const DEFAULT_USERNAME: &str = "admin";
pub const DEFAULT_PASSWORD: &str = "0penBmc0";

/// An account together with the server-side secrets it owns
#[derive(Debug, Clone)]
pub struct MockAccount {
    pub account: ManagerAccount,
    pub password: String,
    /// TOTP secret, set by GenerateSecretKey
    pub secret_key: Option<String>,
}

impl MockAccount {
    pub fn new(username: &str, password: &str, role: &str) -> Self {
        Self {
            account: ManagerAccount {
                odata_id: paths::account(username),
                id: username.to_string(),
                user_name: username.to_string(),
                role_id: role.to_string(),
                enabled: true,
                locked: false,
                password_change_required: false,
                mfa_bypass: Some(MfaBypass::from_flag(false)),
            },
            password: password.to_string(),
            secret_key: None,
        }
    }

    /// Rename the account, keeping its URI in step
    pub fn rename(&mut self, username: &str) {
        self.account.user_name = username.to_string();
        self.account.id = username.to_string();
        self.account.odata_id = paths::account(username);
    }

    pub fn is_mfa_bypassed(&self) -> bool {
        self.account
            .mfa_bypass
            .as_ref()
            .map(MfaBypass::is_bypassed)
            .unwrap_or(false)
    }
}

/// Which log service an entry lives in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogService {
    Event,
    CorrectableError,
}

impl LogService {
    pub fn entries_path(&self) -> &'static str {
        match self {
            LogService::Event => paths::EVENT_LOG_ENTRIES,
            LogService::CorrectableError => paths::CE_LOG_ENTRIES,
        }
    }
}

/// Mock BMC state container
#[derive(Debug)]
pub struct MockState {
    pub service_root: ServiceRootOem,
    pub account_service: AccountService,
    /// Accounts by username (ordered for stable listings)
    pub accounts: BTreeMap<String, MockAccount>,
    pub roles: Vec<Role>,
    pub event_log: Vec<LogEntry>,
    pub ce_log: Vec<LogEntry>,
    /// PEL attachments by entry URI
    pub pel_attachments: HashMap<String, String>,
    /// Resource paths held by a guard record; PATCH and DELETE conflict
    pub guarded: HashSet<String>,
    /// Active session ids
    pub sessions: Vec<String>,
    pub max_accounts: usize,
    /// The one code VerifyTimeBasedOneTimePassword and login accept
    pub totp_code: String,
    id_counter: u64,
}

impl Default for MockState {
    fn default() -> Self {
        Self::seeded()
    }
}

impl MockState {
    /// State of a freshly provisioned BMC: one administrator, standard
    /// roles, MFA disabled and empty logs.
    pub fn seeded() -> Self {
        let roles = [
            ("Administrator", "Administrator"),
            ("Operator", "Operator"),
            ("ReadOnly", "ReadOnly"),
            (SERVICE_AGENT_ROLE, "OemIBMServiceAgent"),
        ]
        .into_iter()
        .map(|(id, description)| Role {
            id: id.to_string(),
            description: description.to_string(),
            assigned_privileges: Vec::new(),
        })
        .collect();

        let mut accounts = BTreeMap::new();
        accounts.insert(
            DEFAULT_USERNAME.to_string(),
            MockAccount::new(DEFAULT_USERNAME, DEFAULT_PASSWORD, "Administrator"),
        );

        Self {
            service_root: ServiceRootOem {
                date_time: Some(now()),
                model: Some("9105-22A".to_string()),
                serial_number: Some("13E5F8X".to_string()),
                acf_window_active: false,
                multi_factor_auth_enabled: false,
            },
            account_service: AccountService {
                account_lockout_duration: Some(300),
                account_lockout_threshold: Some(3),
                min_password_length: Some(8),
                max_password_length: Some(20),
                multi_factor_auth: Some(MultiFactorAuth {
                    google_authenticator: Some(GoogleAuthenticator {
                        enabled: Some(false),
                    }),
                }),
            },
            accounts,
            roles,
            event_log: Vec::new(),
            ce_log: Vec::new(),
            pel_attachments: HashMap::new(),
            guarded: HashSet::new(),
            sessions: Vec::new(),
            max_accounts: 15,
            totp_code: "123456".to_string(),
            id_counter: 0,
        }
    }

    /// Generate a unique ID
    pub fn next_id(&mut self, prefix: &str) -> String {
        self.id_counter += 1;
        format!("{}{:08x}", prefix, self.id_counter)
    }

    pub fn log(&self, service: LogService) -> &Vec<LogEntry> {
        match service {
            LogService::Event => &self.event_log,
            LogService::CorrectableError => &self.ce_log,
        }
    }

    pub fn log_mut(&mut self, service: LogService) -> &mut Vec<LogEntry> {
        match service {
            LogService::Event => &mut self.event_log,
            LogService::CorrectableError => &mut self.ce_log,
        }
    }

    /// Find a log entry by its URI in either service
    pub fn find_entry(&self, uri: &str) -> Option<&LogEntry> {
        self.event_log
            .iter()
            .chain(self.ce_log.iter())
            .find(|entry| entry.odata_id == uri)
    }

    /// Append a log entry and return its URI
    pub fn push_entry(
        &mut self,
        service: LogService,
        id: &str,
        severity: &str,
        resolved: bool,
    ) -> String {
        let uri = format!("{}/{}", service.entries_path(), id);
        let created = now();
        self.log_mut(service).push(LogEntry {
            odata_id: uri.clone(),
            id: id.to_string(),
            event_id: Some(format!("BD8D{}", id)),
            severity: Some(severity.to_string()),
            created: Some(created.clone()),
            entry_type: Some("Event".to_string()),
            message: Some(format!("{} event {}", severity, id)),
            name: Some("System Event Log Entry".to_string()),
            modified: Some(created),
            resolution: None,
            resolved,
            additional_data_uri: Some(paths::pel_attachment(&uri)),
        });
        uri
    }

    pub fn global_mfa_enabled(&self) -> bool {
        self.account_service.global_mfa_enabled()
    }

    pub fn role_exists(&self, role: &str) -> bool {
        self.roles.iter().any(|r| r.id == role)
    }

    /// Whether a password satisfies the length policy
    pub fn password_acceptable(&self, password: &str) -> bool {
        let len = password.chars().count() as u32;
        let min = self.account_service.min_password_length.unwrap_or(0);
        let max = self.account_service.max_password_length.unwrap_or(u32::MAX);
        (min..=max).contains(&len)
    }
}

/// Current time as a Redfish timestamp
pub fn now() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Secs, false)
}
