//! Mock BMC
//!
//! An in-process Redfish service covering the resources the console uses.
//! All state sits behind `Arc<Mutex<_>>` so a cloned handle can configure
//! and inspect the same BMC a [`MockTransport`](crate::client::MockTransport)
//! is talking to.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use redfish_protocol::error::BASE_REGISTRY;
use redfish_protocol::{
    paths, AccountService, Collection, ErrorBody, ErrorKind, ExtendedInfo, LogEntry,
    ManagerAccount, MfaBypass, ODataLink, EXTENDED_INFO, ODATA_ID,
};
use serde_json::{json, Value};

use super::failure::{normalize, FailureConfig, FailureInjector};
use super::state::{LogService, MockAccount, MockState};
use crate::client::{ApiRequest, ApiResponse, Method};

/// Mock BMC implementation
#[derive(Clone, Default)]
pub struct MockBmc {
    state: Arc<Mutex<MockState>>,
    failures: Arc<Mutex<FailureInjector>>,
    requests: Arc<Mutex<Vec<ApiRequest>>>,
}

impl MockBmc {
    /// Create a freshly seeded BMC
    pub fn new() -> Self {
        Self::default()
    }

    // === Configuration ===

    /// Inject a failure for a verb on a path
    pub fn inject_failure(&self, method: Method, path: &str, config: FailureConfig) {
        self.failures.lock().unwrap().inject(method, path, config);
    }

    /// Inject an error of a classified kind
    pub fn inject_error(&self, method: Method, path: &str, status: u16, kind: ErrorKind) {
        self.failures
            .lock()
            .unwrap()
            .inject_kind(method, path, status, kind);
    }

    /// Delay responses for a verb on a path
    pub fn inject_delay(&self, method: Method, path: &str, delay: Duration) {
        self.failures
            .lock()
            .unwrap()
            .inject_delay(method, path, delay);
    }

    /// Clear all injected failures
    pub fn clear_failures(&self) {
        self.failures.lock().unwrap().clear();
    }

    /// Hold a resource with a guard record: PATCH and DELETE conflict
    pub fn guard(&self, path: &str) {
        let mut state = self.state.lock().unwrap();
        state.guarded.insert(normalize(path).to_string());
    }

    /// Add an account and return its URI
    pub fn add_account(&self, username: &str, password: &str, role: &str) -> String {
        let mut state = self.state.lock().unwrap();
        let account = MockAccount::new(username, password, role);
        let uri = account.account.odata_id.clone();
        state.accounts.insert(username.to_string(), account);
        uri
    }

    /// Flag an account as needing a password change
    pub fn set_password_change_required(&self, username: &str, required: bool) {
        let mut state = self.state.lock().unwrap();
        if let Some(account) = state.accounts.get_mut(username) {
            account.account.password_change_required = required;
        }
    }

    /// Exempt an account from TOTP
    pub fn set_mfa_bypass(&self, username: &str, bypass: bool) {
        let mut state = self.state.lock().unwrap();
        if let Some(account) = state.accounts.get_mut(username) {
            account.account.mfa_bypass = Some(MfaBypass::from_flag(bypass));
        }
    }

    /// Enable or disable TOTP service-wide
    pub fn set_global_mfa(&self, enabled: bool) {
        let mut state = self.state.lock().unwrap();
        state.service_root.multi_factor_auth_enabled = enabled;
        set_global_mfa_flag(&mut state.account_service, enabled);
    }

    pub fn set_acf_window_active(&self, active: bool) {
        self.state.lock().unwrap().service_root.acf_window_active = active;
    }

    pub fn set_max_accounts(&self, max: usize) {
        self.state.lock().unwrap().max_accounts = max;
    }

    /// The TOTP code the BMC accepts
    pub fn totp_code(&self) -> String {
        self.state.lock().unwrap().totp_code.clone()
    }

    /// Add an event log entry and return its URI
    pub fn add_event_entry(&self, id: &str, severity: &str, resolved: bool) -> String {
        self.state
            .lock()
            .unwrap()
            .push_entry(LogService::Event, id, severity, resolved)
    }

    /// Add a CE log entry and return its URI
    pub fn add_ce_entry(&self, id: &str, severity: &str, resolved: bool) -> String {
        self.state
            .lock()
            .unwrap()
            .push_entry(LogService::CorrectableError, id, severity, resolved)
    }

    /// Attach PEL JSON to an entry
    pub fn set_pel_attachment(&self, entry_uri: &str, pel_json: &str) {
        self.state
            .lock()
            .unwrap()
            .pel_attachments
            .insert(entry_uri.to_string(), pel_json.to_string());
    }

    // === Inspection ===

    /// All requests received, in arrival order
    pub fn requests(&self) -> Vec<ApiRequest> {
        self.requests.lock().unwrap().clone()
    }

    /// Number of requests received for a verb on a path
    pub fn request_count(&self, method: Method, path: &str) -> usize {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.method == method && normalize(&r.path) == normalize(path))
            .count()
    }

    pub fn account(&self, username: &str) -> Option<ManagerAccount> {
        let state = self.state.lock().unwrap();
        state.accounts.get(username).map(|a| a.account.clone())
    }

    pub fn secret_key(&self, username: &str) -> Option<String> {
        let state = self.state.lock().unwrap();
        state.accounts.get(username).and_then(|a| a.secret_key.clone())
    }

    pub fn log_entry(&self, uri: &str) -> Option<LogEntry> {
        self.state.lock().unwrap().find_entry(uri).cloned()
    }

    pub fn account_service(&self) -> AccountService {
        self.state.lock().unwrap().account_service.clone()
    }

    pub fn session_count(&self) -> usize {
        self.state.lock().unwrap().sessions.len()
    }

    // === Request handling ===

    /// Handle one request
    pub async fn handle_request(&self, request: &ApiRequest) -> ApiResponse {
        self.requests.lock().unwrap().push(request.clone());

        // Clone out of the lock; the delay is awaited without holding it
        let failure = self.check_failure(request);
        if let Some(failure) = failure {
            if let Some(delay) = failure.delay {
                tokio::time::sleep(delay).await;
            }
            if let Some(response) = failure.response() {
                return response;
            }
        }

        self.dispatch(request)
    }

    fn check_failure(&self, request: &ApiRequest) -> Option<FailureConfig> {
        let mut failures = self.failures.lock().unwrap();
        failures.check(request.method, &request.path).cloned()
    }

    fn dispatch(&self, request: &ApiRequest) -> ApiResponse {
        let path = normalize(&request.path);
        let body = request.body.as_ref().unwrap_or(&Value::Null);
        let mut state = self.state.lock().unwrap();

        if matches!(request.method, Method::Patch | Method::Delete)
            && state.guarded.contains(path)
        {
            return error(
                400,
                ErrorBody::for_kind(
                    ErrorKind::ExternalConflict,
                    "The resource is held by a guard record.",
                ),
            );
        }

        match (request.method, path) {
            (Method::Get, p) if p == normalize(paths::SERVICE_ROOT) => handle_service_root(&state),
            (Method::Post, paths::SESSIONS) => handle_create_session(&mut state, body),
            (Method::Post, paths::LOGOUT) => {
                state.sessions.clear();
                ok(json!({}))
            }
            (Method::Get, paths::ACCOUNT_SERVICE) => handle_get_account_service(&state),
            (Method::Patch, paths::ACCOUNT_SERVICE) => {
                handle_patch_account_service(&mut state, body)
            }
            (Method::Get, paths::ACCOUNTS) => handle_list_accounts(&state),
            (Method::Post, paths::ACCOUNTS) => handle_create_account(&mut state, body),
            (Method::Get, paths::ROLES) => handle_list_roles(&state),
            (Method::Get, paths::EVENT_LOG_ENTRIES) => {
                handle_list_entries(&state, LogService::Event)
            }
            (Method::Get, paths::CE_LOG_ENTRIES) => {
                handle_list_entries(&state, LogService::CorrectableError)
            }
            (Method::Post, paths::CLEAR_EVENT_LOG) => {
                let cleared: Vec<String> = state.event_log.drain(..).map(|e| e.odata_id).collect();
                for uri in cleared {
                    state.pel_attachments.remove(&uri);
                }
                ok(json!({}))
            }
            (method, path) => dispatch_nested(&mut state, method, path, body),
        }
    }
}

fn dispatch_nested(state: &mut MockState, method: Method, path: &str, body: &Value) -> ApiResponse {
    if let Some(rest) = child_of(path, paths::ACCOUNTS) {
        return match rest.split_once("/Actions/") {
            Some((username, action)) => {
                handle_account_action(state, method, username, action, body)
            }
            None => handle_account(state, method, rest, body),
        };
    }

    if let Some(id) = child_of(path, paths::ROLES) {
        if method == Method::Get {
            if let Some(role) = state.roles.iter().find(|r| r.id == id) {
                let mut value = to_value(role);
                value[ODATA_ID] = json!(path);
                return ok(value);
            }
        }
        return not_found(path);
    }

    for service in [LogService::Event, LogService::CorrectableError] {
        if let Some(rest) = child_of(path, service.entries_path()) {
            return match rest.strip_suffix("/OemPelAttachment") {
                Some(id) if method == Method::Get => handle_pel_attachment(state, service, id),
                Some(_) => not_found(path),
                None => handle_entry(state, method, service, rest, body),
            };
        }
    }

    not_found(path)
}

// === Service root and sessions ===

fn handle_service_root(state: &MockState) -> ApiResponse {
    ok(json!({
        ODATA_ID: paths::SERVICE_ROOT,
        "Id": "RootService",
        "RedfishVersion": "1.17.0",
        "Oem": { "IBM": to_value(&state.service_root) },
    }))
}

fn handle_create_session(state: &mut MockState, body: &Value) -> ApiResponse {
    let username = body["UserName"].as_str().unwrap_or_default();
    let password = body["Password"].as_str().unwrap_or_default();
    let token = body["Token"].as_str();

    let global_mfa = state.global_mfa_enabled();
    let totp_code = state.totp_code.clone();

    let Some(account) = state.accounts.get(username) else {
        return unauthorized();
    };
    if account.password != password || !account.account.enabled || account.account.locked {
        return unauthorized();
    }

    let needs_totp = global_mfa && !account.is_mfa_bypassed();
    let needs_secret = needs_totp && account.secret_key.is_none();
    if needs_totp && !needs_secret && token != Some(totp_code.as_str()) {
        return unauthorized();
    }

    let id = state.next_id("");
    state.sessions.push(id.clone());

    let mut response = json!({
        ODATA_ID: format!("{}/{}", paths::SESSIONS, id),
        "Id": id,
        "UserName": username,
    });
    if needs_secret {
        response[EXTENDED_INFO] = json!([ExtendedInfo::for_kind(
            ErrorKind::GenerateSecretKeyRequired,
            "A secret key must be generated before TOTP login.",
        )]);
    }
    ApiResponse::new(201, response)
}

// === Account service ===

fn handle_get_account_service(state: &MockState) -> ApiResponse {
    let mut value = to_value(&state.account_service);
    value[ODATA_ID] = json!(paths::ACCOUNT_SERVICE);
    value["Accounts"] = json!({ ODATA_ID: paths::ACCOUNTS });
    value["Roles"] = json!({ ODATA_ID: paths::ROLES });
    ok(value)
}

fn handle_patch_account_service(state: &mut MockState, body: &Value) -> ApiResponse {
    let patch: AccountService = match serde_json::from_value(body.clone()) {
        Ok(patch) => patch,
        Err(e) => return malformed(&e.to_string()),
    };

    let service = &mut state.account_service;
    if patch.account_lockout_duration.is_some() {
        service.account_lockout_duration = patch.account_lockout_duration;
    }
    if patch.account_lockout_threshold.is_some() {
        service.account_lockout_threshold = patch.account_lockout_threshold;
    }
    if patch.multi_factor_auth.is_some() {
        let enabled = patch.global_mfa_enabled();
        set_global_mfa_flag(service, enabled);
        state.service_root.multi_factor_auth_enabled = enabled;
    }
    ok(json!({}))
}

fn set_global_mfa_flag(service: &mut AccountService, enabled: bool) {
    let mfa = service.multi_factor_auth.get_or_insert_with(Default::default);
    mfa.google_authenticator
        .get_or_insert_with(Default::default)
        .enabled = Some(enabled);
}

// === Accounts ===

fn handle_list_accounts(state: &MockState) -> ApiResponse {
    let members = state
        .accounts
        .values()
        .map(|a| ODataLink::new(a.account.odata_id.clone()))
        .collect();
    let mut value = to_value(&Collection::new(members));
    value[ODATA_ID] = json!(paths::ACCOUNTS);
    ok(value)
}

fn handle_create_account(state: &mut MockState, body: &Value) -> ApiResponse {
    let Some(username) = body["UserName"].as_str().filter(|u| !u.is_empty()) else {
        return error(
            400,
            ErrorBody::new(
                format!("{}.PropertyMissing", BASE_REGISTRY),
                "The property UserName is a required property.",
            ),
        );
    };
    let password = body["Password"].as_str().unwrap_or_default();
    let role = body["RoleId"].as_str().unwrap_or("ReadOnly");

    if state.accounts.contains_key(username) {
        return error(
            409,
            ErrorBody::new(
                format!("{}.ResourceAlreadyExists", BASE_REGISTRY),
                "The requested resource already exists.",
            ),
        );
    }
    if state.accounts.len() >= state.max_accounts {
        return error(
            400,
            ErrorBody::for_kind(
                ErrorKind::CreateLimitReached,
                "The create operation failed because the resource has reached the limit of possible resources.",
            ),
        );
    }
    if !state.password_acceptable(password) {
        return password_rejected();
    }
    if !state.role_exists(role) {
        return value_not_in_list("RoleId", role);
    }

    let mut account = MockAccount::new(username, password, role);
    account.account.enabled = body["Enabled"].as_bool().unwrap_or(true);
    let value = to_value(&account.account);
    state.accounts.insert(username.to_string(), account);
    ApiResponse::new(201, value)
}

fn handle_account(
    state: &mut MockState,
    method: Method,
    username: &str,
    body: &Value,
) -> ApiResponse {
    if !state.accounts.contains_key(username) {
        return not_found(&paths::account(username));
    }

    match method {
        Method::Get => ok(to_value(&state.accounts[username].account)),
        Method::Delete => {
            state.accounts.remove(username);
            ok(json!({}))
        }
        Method::Patch => handle_patch_account(state, username, body),
        Method::Post => not_found(&paths::account(username)),
    }
}

fn handle_patch_account(state: &mut MockState, username: &str, body: &Value) -> ApiResponse {
    if let Some(password) = body["Password"].as_str() {
        if !state.password_acceptable(password) {
            return password_rejected();
        }
    }
    if let Some(role) = body["RoleId"].as_str() {
        if !state.role_exists(role) {
            return value_not_in_list("RoleId", role);
        }
    }
    let mfa_bypass = match body.get("MFABypass") {
        Some(value) => match serde_json::from_value::<MfaBypass>(value.clone()) {
            Ok(bypass) => Some(bypass),
            Err(e) => return malformed(&e.to_string()),
        },
        None => None,
    };

    let Some(mut account) = state.accounts.remove(username) else {
        return not_found(&paths::account(username));
    };

    if let Some(password) = body["Password"].as_str() {
        account.password = password.to_string();
        account.account.password_change_required = false;
    }
    if let Some(role) = body["RoleId"].as_str() {
        account.account.role_id = role.to_string();
    }
    if let Some(enabled) = body["Enabled"].as_bool() {
        account.account.enabled = enabled;
    }
    if let Some(locked) = body["Locked"].as_bool() {
        account.account.locked = locked;
    }
    if mfa_bypass.is_some() {
        account.account.mfa_bypass = mfa_bypass;
    }
    if let Some(new_name) = body["UserName"].as_str().filter(|n| *n != username) {
        account.rename(new_name);
    }

    let value = to_value(&account.account);
    state
        .accounts
        .insert(account.account.user_name.clone(), account);
    ok(value)
}

fn handle_account_action(
    state: &mut MockState,
    method: Method,
    username: &str,
    action: &str,
    body: &Value,
) -> ApiResponse {
    let path = format!("{}/Actions/{}", paths::account(username), action);
    if method != Method::Post {
        return not_found(&path);
    }

    let secret = state.next_id("SECRET");
    let totp_code = state.totp_code.clone();
    let Some(account) = state.accounts.get_mut(username) else {
        return not_found(&path);
    };

    match action {
        "ManagerAccount.GenerateSecretKey" => {
            account.secret_key = Some(secret.clone());
            ok(json!({ "SecretKey": secret }))
        }
        "ManagerAccount.VerifyTimeBasedOneTimePassword" => {
            let otp = body["TimeBasedOneTimePassword"].as_str();
            if account.secret_key.is_some() && otp == Some(totp_code.as_str()) {
                ok(json!({}))
            } else {
                error(
                    400,
                    ErrorBody::new(
                        format!("{}.ActionParameterValueError", BASE_REGISTRY),
                        "The value for the parameter TimeBasedOneTimePassword is invalid.",
                    ),
                )
            }
        }
        "ManagerAccount.ClearSecretKey" => {
            account.secret_key = None;
            ok(json!({}))
        }
        _ => not_found(&path),
    }
}

// === Roles ===

fn handle_list_roles(state: &MockState) -> ApiResponse {
    let members = state
        .roles
        .iter()
        .map(|r| ODataLink::new(format!("{}/{}", paths::ROLES, r.id)))
        .collect();
    let mut value = to_value(&Collection::new(members));
    value[ODATA_ID] = json!(paths::ROLES);
    ok(value)
}

// === Log services ===

fn handle_list_entries(state: &MockState, service: LogService) -> ApiResponse {
    let mut value = to_value(&Collection::new(state.log(service).clone()));
    value[ODATA_ID] = json!(service.entries_path());
    ok(value)
}

fn handle_entry(
    state: &mut MockState,
    method: Method,
    service: LogService,
    id: &str,
    body: &Value,
) -> ApiResponse {
    let uri = format!("{}/{}", service.entries_path(), id);
    let log = state.log_mut(service);
    let Some(index) = log.iter().position(|e| e.id == id) else {
        return not_found(&uri);
    };

    match method {
        Method::Get => ok(to_value(&log[index])),
        Method::Patch => {
            let entry = &mut log[index];
            if let Some(resolved) = body["Resolved"].as_bool() {
                entry.resolved = resolved;
            }
            entry.modified = Some(super::state::now());
            ok(to_value(entry))
        }
        Method::Delete => {
            log.remove(index);
            state.pel_attachments.remove(&uri);
            ok(json!({}))
        }
        Method::Post => not_found(&uri),
    }
}

fn handle_pel_attachment(state: &MockState, service: LogService, id: &str) -> ApiResponse {
    let uri = format!("{}/{}", service.entries_path(), id);
    let Some(entry) = state.find_entry(&uri) else {
        return not_found(&paths::pel_attachment(&uri));
    };

    let pel = state.pel_attachments.get(&uri).cloned().unwrap_or_else(|| {
        json!({ "Private Header": { "Platform Log Id": entry.id, "Severity": entry.severity } })
            .to_string()
    });
    ok(json!({ "Oem": { "IBM": { "PelJson": pel } } }))
}

// === Response helpers ===

fn child_of<'a>(path: &'a str, parent: &str) -> Option<&'a str> {
    path.strip_prefix(parent)?
        .strip_prefix('/')
        .filter(|rest| !rest.is_empty())
}

fn to_value<T: serde::Serialize>(value: &T) -> Value {
    serde_json::to_value(value).unwrap_or(Value::Null)
}

fn ok(body: Value) -> ApiResponse {
    ApiResponse::new(200, body)
}

fn error(status: u16, body: ErrorBody) -> ApiResponse {
    ApiResponse::new(status, body.to_value())
}

fn not_found(path: &str) -> ApiResponse {
    error(
        404,
        ErrorBody::new(
            format!("{}.ResourceNotFound", BASE_REGISTRY),
            format!("The requested resource {} was not found.", path),
        ),
    )
}

fn unauthorized() -> ApiResponse {
    error(
        401,
        ErrorBody::new(
            format!("{}.ResourceAtUriUnauthorized", BASE_REGISTRY),
            "While accessing the resource, the service denied the request.",
        ),
    )
}

fn malformed(message: &str) -> ApiResponse {
    error(
        400,
        ErrorBody::new(format!("{}.MalformedJSON", BASE_REGISTRY), message),
    )
}

fn value_not_in_list(property: &str, value: &str) -> ApiResponse {
    error(
        400,
        ErrorBody::new(
            format!("{}.PropertyValueNotInList", BASE_REGISTRY),
            format!(
                "The value {} for the property {} is not in the list of acceptable values.",
                value, property
            ),
        ),
    )
}

/// Password policy rejection, reported both on the error and on the property
fn password_rejected() -> ApiResponse {
    let message =
        "The value for the property Password is of a different format than the property can accept.";
    let mut body = ErrorBody::for_kind(ErrorKind::PropertyValueFormat, message).to_value();
    body[format!("Password{}", EXTENDED_INFO)] =
        json!([ExtendedInfo::for_kind(ErrorKind::PropertyValueFormat, message)]);
    ApiResponse::new(400, body)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::state::{DEFAULT_PASSWORD, DEFAULT_USERNAME};

    fn get(path: &str) -> ApiRequest {
        ApiRequest::new(Method::Get, path)
    }

    #[tokio::test]
    async fn test_service_root_oem() {
        let bmc = MockBmc::new();
        bmc.set_acf_window_active(true);
        let response = bmc.handle_request(&get(paths::SERVICE_ROOT)).await;

        assert_eq!(response.status, 200);
        assert_eq!(response.body["Oem"]["IBM"]["ACFWindowActive"], json!(true));
        assert!(response.body["Oem"]["IBM"]["Model"].is_string());
    }

    #[tokio::test]
    async fn test_login_checks_password() {
        let bmc = MockBmc::new();
        let bad = ApiRequest::new(Method::Post, paths::SESSIONS)
            .with_body(json!({"UserName": DEFAULT_USERNAME, "Password": "wrong"}));
        assert_eq!(bmc.handle_request(&bad).await.status, 401);

        let good = ApiRequest::new(Method::Post, paths::SESSIONS)
            .with_body(json!({"UserName": DEFAULT_USERNAME, "Password": DEFAULT_PASSWORD}));
        let response = bmc.handle_request(&good).await;
        assert_eq!(response.status, 201);
        assert!(response.body.get(EXTENDED_INFO).is_none());
        assert_eq!(bmc.session_count(), 1);
    }

    #[tokio::test]
    async fn test_login_requires_secret_key_generation() {
        let bmc = MockBmc::new();
        bmc.set_global_mfa(true);
        let request = ApiRequest::new(Method::Post, paths::SESSIONS)
            .with_body(json!({"UserName": DEFAULT_USERNAME, "Password": DEFAULT_PASSWORD}));
        let response = bmc.handle_request(&request).await;

        assert_eq!(response.status, 201);
        let message_id = response.body[EXTENDED_INFO][0]["MessageId"].as_str().unwrap();
        assert!(message_id.ends_with("GenerateSecretKeyRequired"));
    }

    #[tokio::test]
    async fn test_guarded_entry_conflicts() {
        let bmc = MockBmc::new();
        let uri = bmc.add_event_entry("1", "Critical", false);
        bmc.guard(&uri);

        let response = bmc.handle_request(&ApiRequest::new(Method::Delete, &uri)).await;
        assert_eq!(response.status, 400);
        assert_eq!(
            ErrorBody::kind(&serde_json::from_value(response.body).unwrap()),
            ErrorKind::ExternalConflict
        );
        assert!(bmc.log_entry(&uri).is_some());
    }

    #[tokio::test]
    async fn test_create_account_limits() {
        let bmc = MockBmc::new();
        let create = |name: &str, password: &str| {
            ApiRequest::new(Method::Post, paths::ACCOUNTS).with_body(json!({
                "UserName": name, "Password": password, "RoleId": "Operator", "Enabled": true
            }))
        };

        let response = bmc.handle_request(&create("op", "short")).await;
        assert!(response.body["error"]["code"]
            .as_str()
            .unwrap()
            .ends_with("PropertyValueFormatError"));

        bmc.set_max_accounts(1);
        let response = bmc.handle_request(&create("op", "long-enough")).await;
        assert!(response.body["error"]["code"]
            .as_str()
            .unwrap()
            .ends_with("CreateLimitReachedForResource"));
    }

    #[tokio::test]
    async fn test_patch_password_rejection_is_property_scoped() {
        let bmc = MockBmc::new();
        let request = ApiRequest::new(Method::Patch, paths::account(DEFAULT_USERNAME))
            .with_body(json!({"Password": "x"}));
        let response = bmc.handle_request(&request).await;

        assert_eq!(response.status, 400);
        let id = response.body["Password@Message.ExtendedInfo"][0]["MessageId"]
            .as_str()
            .unwrap();
        assert!(id.ends_with("PropertyValueFormatError"));
    }

    #[tokio::test]
    async fn test_rename_account() {
        let bmc = MockBmc::new();
        bmc.add_account("op", "password1", "Operator");
        let request = ApiRequest::new(Method::Patch, paths::account("op"))
            .with_body(json!({"UserName": "operator"}));
        assert_eq!(bmc.handle_request(&request).await.status, 200);

        assert!(bmc.account("op").is_none());
        assert_eq!(bmc.account("operator").unwrap().role_id, "Operator");
    }

    #[tokio::test]
    async fn test_secret_key_actions() {
        let bmc = MockBmc::new();
        let generate = ApiRequest::new(Method::Post, paths::generate_secret_key(DEFAULT_USERNAME));
        let response = bmc.handle_request(&generate).await;
        assert!(response.body["SecretKey"].is_string());

        let verify = ApiRequest::new(Method::Post, paths::verify_totp(DEFAULT_USERNAME))
            .with_body(json!({"TimeBasedOneTimePassword": bmc.totp_code()}));
        assert_eq!(bmc.handle_request(&verify).await.status, 200);

        let clear = ApiRequest::new(
            Method::Post,
            paths::clear_secret_key(&paths::account(DEFAULT_USERNAME)),
        );
        assert_eq!(bmc.handle_request(&clear).await.status, 200);
        assert!(bmc.secret_key(DEFAULT_USERNAME).is_none());
    }

    #[tokio::test]
    async fn test_clear_log_and_pel() {
        let bmc = MockBmc::new();
        let uri = bmc.add_event_entry("3", "Warning", false);
        bmc.set_pel_attachment(&uri, "{\"pel\":1}");

        let response = bmc.handle_request(&get(&paths::pel_attachment(&uri))).await;
        assert_eq!(response.body["Oem"]["IBM"]["PelJson"], json!("{\"pel\":1}"));

        let clear = ApiRequest::new(Method::Post, paths::CLEAR_EVENT_LOG);
        assert_eq!(bmc.handle_request(&clear).await.status, 200);
        assert!(bmc.log_entry(&uri).is_none());
    }

    #[tokio::test]
    async fn test_injected_failure_precedes_dispatch() {
        let bmc = MockBmc::new();
        bmc.inject_failure(
            Method::Get,
            paths::ACCOUNTS,
            FailureConfig::status(503).with_fail_count(1),
        );

        assert_eq!(bmc.handle_request(&get(paths::ACCOUNTS)).await.status, 503);
        assert_eq!(bmc.handle_request(&get(paths::ACCOUNTS)).await.status, 200);
        assert_eq!(bmc.request_count(Method::Get, paths::ACCOUNTS), 2);
    }
}
