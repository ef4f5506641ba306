//! Redfish resource paths used by the console.

/// Service root
pub const SERVICE_ROOT: &str = "/redfish/v1/";

/// Session collection (login)
pub const SESSIONS: &str = "/redfish/v1/SessionService/Sessions";

/// Web-server logout endpoint (outside the Redfish tree)
pub const LOGOUT: &str = "/logout";

/// Account service
pub const ACCOUNT_SERVICE: &str = "/redfish/v1/AccountService";

/// Account collection
pub const ACCOUNTS: &str = "/redfish/v1/AccountService/Accounts";

/// Role collection
pub const ROLES: &str = "/redfish/v1/AccountService/Roles";

/// Event log entries
pub const EVENT_LOG_ENTRIES: &str = "/redfish/v1/Systems/system/LogServices/EventLog/Entries";

/// Correctable-error (CE) log entries
pub const CE_LOG_ENTRIES: &str = "/redfish/v1/Systems/system/LogServices/CELog/Entries";

/// Clear-log action on the event log service
pub const CLEAR_EVENT_LOG: &str =
    "/redfish/v1/Systems/system/LogServices/EventLog/Actions/LogService.ClearLog";

/// Account resource for a username
pub fn account(username: &str) -> String {
    format!("{}/{}", ACCOUNTS, username)
}

/// Generate-secret-key action on an account
pub fn generate_secret_key(username: &str) -> String {
    format!("{}/Actions/ManagerAccount.GenerateSecretKey", account(username))
}

/// TOTP verification action on an account
pub fn verify_totp(username: &str) -> String {
    format!(
        "{}/Actions/ManagerAccount.VerifyTimeBasedOneTimePassword",
        account(username)
    )
}

/// Clear-secret-key action relative to an account URI
pub fn clear_secret_key(account_uri: &str) -> String {
    format!("{}/Actions/ManagerAccount.ClearSecretKey", account_uri)
}

/// PEL attachment of a log entry
pub fn pel_attachment(entry_uri: &str) -> String {
    format!("{}/OemPelAttachment", entry_uri)
}
