//! User management store
//!
//! Accounts, roles, account-service settings and the TOTP (multi-factor)
//! flow. Mutations refresh the affected data afterwards; a failed refresh
//! is logged and never turns a successful mutation into a failure.

use std::sync::RwLock;

use futures::future::try_join_all;
use redfish_protocol::resources::{GoogleAuthenticator, MultiFactorAuth};
use redfish_protocol::{
    paths, AccountService, Collection, ErrorKind, ManagerAccount, MfaBypass, Role,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{debug, warn};

use super::{read, write, StoreContext, StoreError, StoreResult};
use crate::batch::{summarize, BatchSummary, MessageKeys};
use crate::client::{ClientError, ClientResult};
use crate::i18n::keys;
use crate::session::ProfileKey;

/// Role that cannot be changed from the user management page
pub const READ_ONLY_ROLE: &str = "ReadOnly";

/// Vendor service role, never offered for assignment
const SERVICE_AGENT_ROLE: &str = "OemIBMServiceAgent";

const DELETE_KEYS: MessageKeys =
    MessageKeys::new(keys::USER_SUCCESS_BATCH_DELETE, keys::USER_ERROR_BATCH_DELETE);
const ENABLE_KEYS: MessageKeys =
    MessageKeys::new(keys::USER_SUCCESS_BATCH_ENABLE, keys::USER_ERROR_BATCH_ENABLE);
const DISABLE_KEYS: MessageKeys =
    MessageKeys::new(keys::USER_SUCCESS_BATCH_DISABLE, keys::USER_ERROR_BATCH_DISABLE);

/// Role to send when editing from the user management page.
///
/// `actor_role` is the role of the logged-in account making the edit. A
/// `ReadOnly` actor never changes a role; any other actor sends the
/// requested role whatever the target account currently holds.
pub fn permitted_role_change(requested: Option<&str>, actor_role: &str) -> Option<String> {
    let requested = requested.filter(|r| !r.is_empty())?;
    if actor_role == READ_ONLY_ROLE {
        return None;
    }
    Some(requested.to_string())
}

/// Edit of an existing account
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserUpdate {
    /// Account being edited
    pub original_username: String,
    pub username: Option<String>,
    pub password: Option<String>,
    pub privilege: Option<String>,
    pub status: Option<bool>,
    pub locked: Option<bool>,
}

/// Minimal PATCH body for an account.
///
/// Absent fields are not serialized.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct AccountPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enabled: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub locked: Option<bool>,
}

impl AccountPatch {
    /// Patch carrying every non-empty field of `update`
    pub fn from_update(update: &UserUpdate) -> Self {
        Self {
            user_name: non_empty(&update.username),
            password: non_empty(&update.password),
            role_id: non_empty(&update.privilege),
            enabled: update.status,
            locked: update.locked,
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    pub fn to_value(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}

fn non_empty(value: &Option<String>) -> Option<String> {
    value.as_ref().filter(|v| !v.is_empty()).cloned()
}

/// New account
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewUser {
    pub username: String,
    pub password: String,
    pub privilege: String,
    /// Enabled on creation
    pub status: bool,
}

/// Lockout settings of the account service
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountSettings {
    /// Seconds
    pub lockout_duration: Option<u64>,
    /// Failed attempts
    pub lockout_threshold: Option<u64>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PasswordRequirements {
    pub min_length: Option<u32>,
    pub max_length: Option<u32>,
}

/// User management store state
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UserManagementState {
    pub all_users: Vec<ManagerAccount>,
    /// Role descriptions
    pub account_roles: Vec<String>,
    pub account_settings: AccountSettings,
    pub password_requirements: PasswordRequirements,
    pub global_mfa_enabled: bool,
    pub current_user_mfa_bypassed: bool,
    /// Secret key returned by the last generate-secret-key call
    pub secret_key_info: Option<String>,
}

/// User management store
pub struct UserManagementStore {
    ctx: StoreContext,
    state: RwLock<UserManagementState>,
}

impl UserManagementStore {
    pub fn new(ctx: StoreContext) -> Self {
        Self {
            ctx,
            state: RwLock::new(UserManagementState::default()),
        }
    }

    /// Snapshot of the current state
    pub fn state(&self) -> UserManagementState {
        read(&self.state).clone()
    }

    pub fn all_users(&self) -> Vec<ManagerAccount> {
        read(&self.state).all_users.clone()
    }

    pub fn account_roles(&self) -> Vec<String> {
        read(&self.state).account_roles.clone()
    }

    /// Roles offered for assignment
    pub fn filtered_account_roles(&self) -> Vec<String> {
        read(&self.state)
            .account_roles
            .iter()
            .filter(|r| r.as_str() != SERVICE_AGENT_ROLE)
            .cloned()
            .collect()
    }

    pub fn account_settings(&self) -> AccountSettings {
        read(&self.state).account_settings
    }

    pub fn password_requirements(&self) -> PasswordRequirements {
        read(&self.state).password_requirements
    }

    pub fn global_mfa_enabled(&self) -> bool {
        read(&self.state).global_mfa_enabled
    }

    pub fn current_user_mfa_bypassed(&self) -> bool {
        read(&self.state).current_user_mfa_bypassed
    }

    pub fn secret_key_info(&self) -> Option<String> {
        read(&self.state).secret_key_info.clone()
    }

    fn username_param(&self, key: &str, username: &str) -> String {
        self.ctx.t(key, &[("username", username)])
    }

    fn operation_error(&self, key: &str, username: &str) -> StoreError {
        StoreError::Operation(self.username_param(key, username))
    }

    // === Fetch ===

    /// Load every account; one failed member fails the whole load
    pub async fn get_users(&self) -> StoreResult<()> {
        match self.load_users().await {
            Ok(users) => {
                debug!(count = users.len(), "loaded users");
                write(&self.state).all_users = users;
                Ok(())
            }
            Err(e) => {
                warn!(error = %e, "failed to load users");
                Err(StoreError::Operation(self.ctx.t(keys::USER_ERROR_LOAD_USERS, &[])))
            }
        }
    }

    async fn load_users(&self) -> ClientResult<Vec<ManagerAccount>> {
        let client = &self.ctx.client;
        let collection: Collection = client.get_as(paths::ACCOUNTS).await?;
        try_join_all(
            collection
                .members
                .iter()
                .map(|member| client.get_as::<ManagerAccount>(&member.odata_id)),
        )
        .await
    }

    /// Refresh the user list after a mutation
    async fn refresh_users(&self) {
        if let Err(e) = self.get_users().await {
            warn!(error = %e, "user refresh failed");
        }
    }

    /// Load lockout, password policy and global MFA settings
    pub async fn get_account_settings(&self) -> StoreResult<()> {
        let service: AccountService = match self.ctx.client.get_as(paths::ACCOUNT_SERVICE).await {
            Ok(service) => service,
            Err(e) => {
                warn!(error = %e, "failed to load account settings");
                return Err(StoreError::Operation(
                    self.ctx.t(keys::USER_ERROR_LOAD_ACCOUNT_SETTINGS, &[]),
                ));
            }
        };

        let mut state = write(&self.state);
        state.account_settings = AccountSettings {
            lockout_duration: service.account_lockout_duration,
            lockout_threshold: service.account_lockout_threshold,
        };
        state.password_requirements = PasswordRequirements {
            min_length: service.min_password_length,
            max_length: service.max_password_length,
        };
        state.global_mfa_enabled = service.global_mfa_enabled();
        Ok(())
    }

    async fn refresh_account_settings(&self) {
        if let Err(e) = self.get_account_settings().await {
            warn!(error = %e, "account settings refresh failed");
        }
    }

    /// Load the description of every role
    pub async fn get_account_roles(&self) -> StoreResult<()> {
        let roles = self.load_roles().await.map_err(|e| {
            warn!(error = %e, "failed to load account roles");
            e
        })?;
        write(&self.state).account_roles = roles;
        Ok(())
    }

    async fn load_roles(&self) -> ClientResult<Vec<String>> {
        let client = &self.ctx.client;
        let collection: Collection = client.get_as(paths::ROLES).await?;
        let roles = try_join_all(
            collection
                .members
                .iter()
                .map(|member| client.get_as::<Role>(&member.odata_id)),
        )
        .await?;
        Ok(roles.into_iter().map(|role| role.description).collect())
    }

    // === Accounts ===

    pub async fn create_user(&self, user: &NewUser) -> StoreResult<String> {
        let body = json!({
            "UserName": user.username,
            "Password": user.password,
            "RoleId": user.privilege,
            "Enabled": user.status,
        });

        if let Err(e) = self.ctx.client.post(paths::ACCOUNTS, Some(body)).await {
            warn!(username = %user.username, error = %e, "failed to create user");
            let key = match e.kind() {
                ErrorKind::PropertyValueFormat => {
                    keys::USER_ERROR_CREATE_USER_PASSWORD_NOT_ACCEPTED
                }
                ErrorKind::CreateLimitReached => keys::USER_ERROR_CREATE_USER_MAX_USERS,
                _ => keys::USER_ERROR_CREATE_USER,
            };
            return Err(self.operation_error(key, &user.username));
        }

        self.refresh_users().await;
        Ok(self.username_param(keys::USER_SUCCESS_CREATE_USER, &user.username))
    }

    /// Edit an account; the failure message is chosen from the password
    /// property's extended info.
    pub async fn update_user(&self, update: &UserUpdate) -> StoreResult<String> {
        let patch = AccountPatch::from_update(update);
        self.patch_user(update, patch, |e| {
            ErrorKind::classify_opt(e.property_message_id("Password"))
        })
        .await
    }

    /// Edit an account from the user management page.
    ///
    /// `actor_role` is the logged-in account's role. The role is sent only
    /// as [`permitted_role_change`] allows; the failure message is chosen
    /// from the error code.
    pub async fn update_user_from_user_management(
        &self,
        update: &UserUpdate,
        actor_role: &str,
    ) -> StoreResult<String> {
        let mut patch = AccountPatch::from_update(update);
        patch.role_id = permitted_role_change(update.privilege.as_deref(), actor_role);
        self.patch_user(update, patch, |e| e.kind()).await
    }

    async fn patch_user<F>(
        &self,
        update: &UserUpdate,
        patch: AccountPatch,
        classify: F,
    ) -> StoreResult<String>
    where
        F: Fn(&ClientError) -> ErrorKind,
    {
        let username = update.original_username.as_str();
        if let Err(e) = self
            .ctx
            .client
            .patch(&paths::account(username), patch.to_value())
            .await
        {
            warn!(username, error = %e, "failed to update user");
            let key = match classify(&e) {
                ErrorKind::PropertyValueFormat => {
                    keys::USER_ERROR_UPDATE_USER_PASSWORD_NOT_ACCEPTED
                }
                _ => keys::USER_ERROR_UPDATE_USER,
            };
            return Err(self.operation_error(key, username));
        }

        self.refresh_users().await;
        Ok(self.username_param(keys::USER_SUCCESS_UPDATE_USER, username))
    }

    pub async fn delete_user(&self, username: &str) -> StoreResult<String> {
        if let Err(e) = self.ctx.client.delete(&paths::account(username)).await {
            warn!(username, error = %e, "failed to delete user");
            return Err(self.operation_error(keys::USER_ERROR_DELETE_USER, username));
        }

        self.refresh_users().await;
        Ok(self.username_param(keys::USER_SUCCESS_DELETE_USER, username))
    }

    pub async fn delete_users(&self, usernames: Vec<String>) -> BatchSummary {
        let client = &self.ctx.client;
        let outcome = self
            .ctx
            .executor
            .run(usernames, |username| async move {
                client.delete(&paths::account(&username)).await
            })
            .await;
        if !outcome.is_empty() {
            self.refresh_users().await;
        }
        summarize(&outcome, &DELETE_KEYS, self.ctx.localizer.as_ref())
    }

    pub async fn enable_users(&self, usernames: Vec<String>) -> BatchSummary {
        self.set_enabled(usernames, true, &ENABLE_KEYS).await
    }

    pub async fn disable_users(&self, usernames: Vec<String>) -> BatchSummary {
        self.set_enabled(usernames, false, &DISABLE_KEYS).await
    }

    async fn set_enabled(
        &self,
        usernames: Vec<String>,
        enabled: bool,
        message_keys: &MessageKeys,
    ) -> BatchSummary {
        let client = &self.ctx.client;
        let outcome = self
            .ctx
            .executor
            .run(usernames, |username| async move {
                client
                    .patch(&paths::account(&username), json!({ "Enabled": enabled }))
                    .await
            })
            .await;
        if !outcome.is_empty() {
            self.refresh_users().await;
        }
        summarize(&outcome, message_keys, self.ctx.localizer.as_ref())
    }

    /// Save the lockout settings that are set
    pub async fn save_account_settings(&self, settings: AccountSettings) -> StoreResult<String> {
        let patch = AccountService {
            account_lockout_duration: settings.lockout_duration,
            account_lockout_threshold: settings.lockout_threshold,
            ..Default::default()
        };
        let body = serde_json::to_value(&patch).unwrap_or(Value::Null);

        if let Err(e) = self.ctx.client.patch(paths::ACCOUNT_SERVICE, body).await {
            warn!(error = %e, "failed to save account settings");
            return Err(StoreError::Operation(self.ctx.t(keys::USER_ERROR_SAVE_SETTINGS, &[])));
        }

        self.refresh_account_settings().await;
        Ok(self.ctx.t(keys::USER_SUCCESS_SAVE_SETTINGS, &[]))
    }

    // === Multi-factor authentication ===

    /// Enable or disable TOTP service-wide.
    ///
    /// The flag is set before the request and rolled back if it fails.
    pub async fn update_global_mfa(&self, enabled: bool) -> StoreResult<String> {
        write(&self.state).global_mfa_enabled = enabled;

        let patch = AccountService {
            multi_factor_auth: Some(MultiFactorAuth {
                google_authenticator: Some(GoogleAuthenticator {
                    enabled: Some(enabled),
                }),
            }),
            ..Default::default()
        };
        let body = serde_json::to_value(&patch).unwrap_or(Value::Null);

        match self.ctx.client.patch(paths::ACCOUNT_SERVICE, body).await {
            Ok(_) => {
                self.refresh_users().await;
                let key = if enabled {
                    keys::USER_SUCCESS_ENABLE_MFA
                } else {
                    keys::USER_SUCCESS_DISABLE_MFA
                };
                Ok(self.ctx.t(key, &[]))
            }
            Err(e) => {
                warn!(enabled, error = %e, "failed to update global MFA");
                write(&self.state).global_mfa_enabled = !enabled;
                self.refresh_account_settings().await;
                let key = if enabled {
                    keys::USER_ERROR_ENABLE_MFA
                } else {
                    keys::USER_ERROR_DISABLE_MFA
                };
                Err(StoreError::Operation(self.ctx.t(key, &[])))
            }
        }
    }

    /// Clear the TOTP secret of an account; users are refreshed either way
    pub async fn clear_set_secret_key(&self, account_uri: &str) -> StoreResult<String> {
        let result = self
            .ctx
            .client
            .post(&paths::clear_secret_key(account_uri), None)
            .await;
        self.refresh_users().await;

        match result {
            Ok(_) => Ok(self.ctx.t(keys::USER_SUCCESS_CLEAR_SECRET_KEY, &[])),
            Err(e) => {
                warn!(account_uri, error = %e, "failed to clear secret key");
                Err(StoreError::Operation(self.ctx.t(keys::USER_ERROR_CLEAR_SECRET_KEY, &[])))
            }
        }
    }

    fn bypass_keys(bypass: bool) -> (&'static str, &'static str) {
        if bypass {
            (keys::USER_SUCCESS_ENABLE_MFA_BYPASS, keys::USER_ERROR_ENABLE_MFA_BYPASS)
        } else {
            (keys::USER_SUCCESS_DISABLE_MFA_BYPASS, keys::USER_ERROR_DISABLE_MFA_BYPASS)
        }
    }

    /// Exempt an account from TOTP, or stop exempting it.
    ///
    /// Users are refreshed only on failure.
    pub async fn update_mfa_bypass(&self, account_uri: &str, bypass: bool) -> StoreResult<String> {
        let (success, error) = Self::bypass_keys(bypass);
        let body = json!({ "MFABypass": MfaBypass::from_flag(bypass) });

        match self.ctx.client.patch(account_uri, body).await {
            Ok(_) => Ok(self.ctx.t(success, &[])),
            Err(e) => {
                warn!(account_uri, bypass, error = %e, "failed to update MFA bypass");
                self.refresh_users().await;
                Err(StoreError::Operation(self.ctx.t(error, &[])))
            }
        }
    }

    /// Set the bypass of an account just created
    pub async fn update_mfa_bypass_new_user(
        &self,
        username: &str,
        bypass: bool,
    ) -> StoreResult<()> {
        let (_, error) = Self::bypass_keys(bypass);
        let body = json!({ "MFABypass": MfaBypass::from_flag(bypass) });

        if let Err(e) = self.ctx.client.patch(&paths::account(username), body).await {
            warn!(username, bypass, error = %e, "failed to set MFA bypass");
            return Err(StoreError::Operation(self.ctx.t(error, &[])));
        }
        self.refresh_users().await;
        Ok(())
    }

    /// Read whether the logged-in account is exempt from TOTP
    pub async fn check_current_user_mfa_bypassed(&self, account_uri: &str) -> StoreResult<bool> {
        let account: ManagerAccount = self.ctx.client.get_as(account_uri).await.map_err(|e| {
            warn!(account_uri, error = %e, "failed to read MFA bypass");
            e
        })?;
        let bypassed = account
            .mfa_bypass
            .as_ref()
            .is_some_and(MfaBypass::is_bypassed);
        write(&self.state).current_user_mfa_bypassed = bypassed;
        Ok(bypassed)
    }

    /// Forget the secret key shown to the user
    pub fn clear_secret_key(&self) {
        write(&self.state).secret_key_info = None;
    }

    fn current_username(&self) -> StoreResult<String> {
        self.ctx
            .profile
            .get(ProfileKey::Username)
            .ok_or(StoreError::MissingProfile)
    }

    /// Generate a TOTP secret for the logged-in account
    pub async fn generate_secret_key(&self) -> StoreResult<String> {
        let username = self.current_username()?;
        let response = self
            .ctx
            .client
            .post(&paths::generate_secret_key(&username), None)
            .await
            .map_err(|e| {
                warn!(username = %username, error = %e, "failed to generate secret key");
                StoreError::Operation(self.ctx.t(keys::USER_ERROR_GENERATE_SECRET_KEY, &[]))
            })?;

        let secret = response
            .get("SecretKey")
            .and_then(Value::as_str)
            .map(str::to_string);
        write(&self.state).secret_key_info = secret.clone();
        secret.ok_or_else(|| {
            StoreError::Operation(self.ctx.t(keys::USER_ERROR_GENERATE_SECRET_KEY, &[]))
        })
    }

    /// Confirm TOTP registration of the logged-in account
    pub async fn verify_register_totp(&self, otp: &str) -> StoreResult<String> {
        let username = self.current_username()?;
        let body = json!({ "TimeBasedOneTimePassword": otp });

        if let Err(e) = self
            .ctx
            .client
            .post(&paths::verify_totp(&username), Some(body))
            .await
        {
            warn!(username = %username, error = %e, "TOTP verification failed");
            return Err(StoreError::Operation(self.ctx.t(keys::USER_ERROR_OTP, &[])));
        }

        self.refresh_users().await;
        Ok(self.ctx.t(keys::USER_SUCCESS_ENABLE_MFA, &[]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_guard() {
        assert_eq!(
            permitted_role_change(Some("Operator"), "Administrator").as_deref(),
            Some("Operator")
        );
        assert_eq!(
            permitted_role_change(Some("ReadOnly"), "Operator").as_deref(),
            Some("ReadOnly")
        );
        assert_eq!(
            permitted_role_change(Some("Administrator"), "Operator").as_deref(),
            Some("Administrator")
        );
        assert_eq!(permitted_role_change(Some("Operator"), "ReadOnly"), None);
        assert_eq!(permitted_role_change(Some("ReadOnly"), "ReadOnly"), None);
        assert_eq!(permitted_role_change(None, "Operator"), None);
        assert_eq!(permitted_role_change(Some(""), "Operator"), None);
    }

    #[test]
    fn test_patch_only_password() {
        let update = UserUpdate {
            original_username: "op".to_string(),
            password: Some("x".to_string()),
            ..Default::default()
        };
        assert_eq!(
            AccountPatch::from_update(&update).to_value(),
            json!({ "Password": "x" })
        );
    }

    #[test]
    fn test_patch_skips_empty_strings() {
        let update = UserUpdate {
            original_username: "op".to_string(),
            username: Some(String::new()),
            privilege: Some(String::new()),
            status: Some(false),
            locked: Some(false),
            ..Default::default()
        };
        let patch = AccountPatch::from_update(&update);
        assert_eq!(patch.to_value(), json!({ "Enabled": false, "Locked": false }));
        assert!(!patch.is_empty());
        assert!(AccountPatch::default().is_empty());
    }
}
