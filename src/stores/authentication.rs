//! Authentication store
//!
//! Login and logout against the session service, the session markers left
//! by the web server, and the details shown on the login page.

use std::sync::RwLock;

use chrono::{DateTime, Utc};
use redfish_protocol::error::first_message_id;
use redfish_protocol::{paths, ErrorKind, ManagerAccount, ServiceRootOem};
use serde_json::{json, Value};
use tokio::sync::Mutex;
use tracing::{info, warn};

use super::{read, write, StoreContext, StoreError, StoreResult};
use crate::i18n::keys;
use crate::session::ProfileKey;
use crate::state::{AuthMutation, AuthenticationState, LoginPageDetails};

/// Authentication store
pub struct AuthenticationStore {
    ctx: StoreContext,
    state: RwLock<AuthenticationState>,
    /// Held for the whole of a login request
    login_lock: Mutex<()>,
}

impl AuthenticationStore {
    /// Create the store, seeding state from the markers already present
    pub fn new(ctx: StoreContext) -> Self {
        let state = AuthenticationState::new(
            ctx.markers.xsrf_token(),
            ctx.markers.is_authenticated_flag(),
        );
        Self {
            ctx,
            state: RwLock::new(state),
            login_lock: Mutex::new(()),
        }
    }

    /// Snapshot of the current state
    pub fn state(&self) -> AuthenticationState {
        read(&self.state).clone()
    }

    fn mutate(&self, mutation: AuthMutation) -> StoreResult<()> {
        write(&self.state).apply(mutation)?;
        Ok(())
    }

    pub fn is_logged_in(&self) -> bool {
        read(&self.state).is_logged_in()
    }

    /// Session token marker
    pub fn token(&self) -> Option<String> {
        read(&self.state).xsrf_token.clone()
    }

    pub fn auth_error(&self) -> bool {
        read(&self.state).auth_error
    }

    pub fn unauth_error(&self) -> bool {
        read(&self.state).unauth_error
    }

    pub fn generate_otp_required(&self) -> bool {
        read(&self.state).generate_otp_required
    }

    pub fn global_mfa_enabled(&self) -> bool {
        read(&self.state).global_mfa_enabled
    }

    pub fn login_page_details(&self) -> Option<LoginPageDetails> {
        read(&self.state).login_page_details.clone()
    }

    /// Log in; `otp` is sent as `Token` only when non-empty.
    ///
    /// Overlapping calls run one after another.
    pub async fn login(&self, username: &str, password: &str, otp: &str) -> StoreResult<()> {
        let _guard = self.login_lock.lock().await;
        if let Err(e) = self.mutate(AuthMutation::BeginLogin) {
            warn!(username, error = %e, "login could not start");
            return Err(StoreError::Operation(self.ctx.t(keys::LOGIN_ERROR, &[])));
        }

        let mut body = json!({ "UserName": username, "Password": password });
        if !otp.is_empty() {
            body["Token"] = json!(otp);
        }

        let response = match self.ctx.client.post(paths::SESSIONS, Some(body)).await {
            Ok(response) => response,
            Err(e) => {
                warn!(username, error = %e, "login failed");
                self.mutate(AuthMutation::AuthError)?;
                return Err(StoreError::Operation(self.ctx.t(keys::LOGIN_ERROR, &[])));
            }
        };

        let generate_otp_required = first_message_id(&response, None)
            .map(ErrorKind::classify)
            == Some(ErrorKind::GenerateSecretKeyRequired);

        self.mutate(AuthMutation::AuthSuccess {
            xsrf_token: self.ctx.markers.xsrf_token(),
            is_authenticated: self.ctx.markers.is_authenticated_flag(),
            generate_otp_required,
        })?;

        if let Err(e) = self.ctx.profile.set(ProfileKey::Username, username) {
            warn!(error = %e, "failed to remember username");
        }
        info!(username, generate_otp_required, "logged in");
        Ok(())
    }

    /// Record that the session expired
    pub fn unauth_login(&self) -> StoreResult<()> {
        self.mutate(AuthMutation::UnauthError)
    }

    /// Log out.
    ///
    /// The server call is best-effort; markers, profile and state are
    /// cleared whether or not it succeeds.
    pub async fn logout(&self) -> StoreResult<()> {
        if let Err(e) = self
            .ctx
            .client
            .post(paths::LOGOUT, Some(json!({ "data": [] })))
            .await
        {
            warn!(error = %e, "logout request failed");
        }

        self.ctx.markers.clear();
        let cleared = self.ctx.profile.clear();
        self.mutate(AuthMutation::Logout)?;
        cleared?;
        Ok(())
    }

    /// Whether the account must change its password; `None` when unknown
    pub async fn check_password_change_required(&self, username: &str) -> Option<bool> {
        match self
            .ctx
            .client
            .get_as::<ManagerAccount>(&paths::account(username))
            .await
        {
            Ok(account) => Some(account.password_change_required),
            Err(e) => {
                warn!(username, error = %e, "failed to read account");
                None
            }
        }
    }

    /// Read the login page details from the service root
    pub async fn load_login_page_details(&self) -> Option<LoginPageDetails> {
        let root = match self.ctx.client.get(paths::SERVICE_ROOT).await {
            Ok(root) => root,
            Err(e) => {
                warn!(error = %e, "failed to read service root");
                return None;
            }
        };

        let oem: ServiceRootOem = match serde_json::from_value(
            root.pointer("/Oem/IBM").cloned().unwrap_or(Value::Null),
        ) {
            Ok(oem) => oem,
            Err(e) => {
                warn!(error = %e, "service root has no usable Oem.IBM block");
                return None;
            }
        };

        let details = LoginPageDetails {
            date_time: oem.date_time.as_deref().and_then(parse_timestamp),
            model: oem.model,
            serial: oem.serial_number,
            acf_window_active: oem.acf_window_active,
        };

        let applied = self
            .mutate(AuthMutation::SetLoginPageDetails(details.clone()))
            .and_then(|_| {
                self.mutate(AuthMutation::SetGlobalMfaEnabled(
                    oem.multi_factor_auth_enabled,
                ))
            });
        if let Err(e) = applied {
            warn!(error = %e, "failed to store login page details");
        }
        Some(details)
    }

    /// Clear the error flags and re-read the markers
    pub fn reset_store_state(&self) -> StoreResult<()> {
        self.mutate(AuthMutation::Reset {
            xsrf_token: self.ctx.markers.xsrf_token(),
            is_authenticated: self.ctx.markers.is_authenticated_flag(),
        })
    }
}

fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|t| t.with_timezone(&Utc))
        .ok()
}
