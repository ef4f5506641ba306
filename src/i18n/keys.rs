//! Message keys of the built-in catalog.

pub const LOGIN_ERROR: &str = "login.error";
pub const EVENT_SUCCESS_DELETE: &str = "event_logs.toast.success_delete";
pub const EVENT_ERROR_DELETE: &str = "event_logs.toast.error_delete";
pub const EVENT_ERROR_DELETE_GUARD_RECORD: &str = "event_logs.toast.error_delete_guard_record";
pub const EVENT_SUCCESS_RESOLVE_LOGS: &str = "event_logs.toast.success_resolve_logs";
pub const EVENT_ERROR_RESOLVE_LOGS: &str = "event_logs.toast.error_resolve_logs";
pub const EVENT_ERROR_RESOLVE_LOGS_GUARD_RECORD: &str =
    "event_logs.toast.error_resolve_logs_guard_record";
pub const EVENT_SUCCESS_UNRESOLVE_LOGS: &str = "event_logs.toast.success_unresolve_logs";
pub const EVENT_ERROR_UNRESOLVE_LOGS: &str = "event_logs.toast.error_unresolve_logs";
pub const EVENT_ERROR_LOG_STATUS_UPDATE: &str = "event_logs.toast.error_log_status_update";
pub const EVENT_ERROR_DOWNLOAD: &str = "event_logs.toast.error_download";
pub const USER_ERROR_LOAD_USERS: &str = "user_management.toast.error_load_users";
pub const USER_ERROR_LOAD_ACCOUNT_SETTINGS: &str =
    "user_management.toast.error_load_account_settings";
pub const USER_SUCCESS_CREATE_USER: &str = "user_management.toast.success_create_user";
pub const USER_ERROR_CREATE_USER: &str = "user_management.toast.error_create_user";
pub const USER_ERROR_CREATE_USER_PASSWORD_NOT_ACCEPTED: &str =
    "user_management.toast.error_create_user_password_not_accepted";
pub const USER_ERROR_CREATE_USER_MAX_USERS: &str =
    "user_management.toast.error_create_user_max_users";
pub const USER_SUCCESS_UPDATE_USER: &str = "user_management.toast.success_update_user";
pub const USER_ERROR_UPDATE_USER: &str = "user_management.toast.error_update_user";
pub const USER_ERROR_UPDATE_USER_PASSWORD_NOT_ACCEPTED: &str =
    "user_management.toast.error_update_user_password_not_accepted";
pub const USER_SUCCESS_DELETE_USER: &str = "user_management.toast.success_delete_user";
pub const USER_ERROR_DELETE_USER: &str = "user_management.toast.error_delete_user";
pub const USER_SUCCESS_BATCH_DELETE: &str = "user_management.toast.success_batch_delete";
pub const USER_ERROR_BATCH_DELETE: &str = "user_management.toast.error_batch_delete";
pub const USER_SUCCESS_BATCH_ENABLE: &str = "user_management.toast.success_batch_enable";
pub const USER_ERROR_BATCH_ENABLE: &str = "user_management.toast.error_batch_enable";
pub const USER_SUCCESS_BATCH_DISABLE: &str = "user_management.toast.success_batch_disable";
pub const USER_ERROR_BATCH_DISABLE: &str = "user_management.toast.error_batch_disable";
pub const USER_SUCCESS_SAVE_SETTINGS: &str = "user_management.toast.success_save_settings";
pub const USER_ERROR_SAVE_SETTINGS: &str = "user_management.toast.error_save_settings";
pub const USER_SUCCESS_ENABLE_MFA: &str = "user_management.toast.success_enable_mfa";
pub const USER_ERROR_ENABLE_MFA: &str = "user_management.toast.error_enable_mfa";
pub const USER_SUCCESS_DISABLE_MFA: &str = "user_management.toast.success_disable_mfa";
pub const USER_ERROR_DISABLE_MFA: &str = "user_management.toast.error_disable_mfa";
pub const USER_SUCCESS_ENABLE_MFA_BYPASS: &str = "user_management.toast.success_enable_mfa_bypass";
pub const USER_ERROR_ENABLE_MFA_BYPASS: &str = "user_management.toast.error_enable_mfa_bypass";
pub const USER_SUCCESS_DISABLE_MFA_BYPASS: &str =
    "user_management.toast.success_disable_mfa_bypass";
pub const USER_ERROR_DISABLE_MFA_BYPASS: &str = "user_management.toast.error_disable_mfa_bypass";
pub const USER_SUCCESS_CLEAR_SECRET_KEY: &str = "user_management.toast.success_clear_secret_key";
pub const USER_ERROR_CLEAR_SECRET_KEY: &str = "user_management.toast.error_clear_secret_key";
pub const USER_ERROR_GENERATE_SECRET_KEY: &str = "user_management.toast.error_generate_secret_key";
pub const USER_ERROR_OTP: &str = "user_management.toast.error_otp";

/// Every key above
pub const ALL: &[&str] = &[
    LOGIN_ERROR,
    EVENT_SUCCESS_DELETE,
    EVENT_ERROR_DELETE,
    EVENT_ERROR_DELETE_GUARD_RECORD,
    EVENT_SUCCESS_RESOLVE_LOGS,
    EVENT_ERROR_RESOLVE_LOGS,
    EVENT_ERROR_RESOLVE_LOGS_GUARD_RECORD,
    EVENT_SUCCESS_UNRESOLVE_LOGS,
    EVENT_ERROR_UNRESOLVE_LOGS,
    EVENT_ERROR_LOG_STATUS_UPDATE,
    EVENT_ERROR_DOWNLOAD,
    USER_ERROR_LOAD_USERS,
    USER_ERROR_LOAD_ACCOUNT_SETTINGS,
    USER_SUCCESS_CREATE_USER,
    USER_ERROR_CREATE_USER,
    USER_ERROR_CREATE_USER_PASSWORD_NOT_ACCEPTED,
    USER_ERROR_CREATE_USER_MAX_USERS,
    USER_SUCCESS_UPDATE_USER,
    USER_ERROR_UPDATE_USER,
    USER_ERROR_UPDATE_USER_PASSWORD_NOT_ACCEPTED,
    USER_SUCCESS_DELETE_USER,
    USER_ERROR_DELETE_USER,
    USER_SUCCESS_BATCH_DELETE,
    USER_ERROR_BATCH_DELETE,
    USER_SUCCESS_BATCH_ENABLE,
    USER_ERROR_BATCH_ENABLE,
    USER_SUCCESS_BATCH_DISABLE,
    USER_ERROR_BATCH_DISABLE,
    USER_SUCCESS_SAVE_SETTINGS,
    USER_ERROR_SAVE_SETTINGS,
    USER_SUCCESS_ENABLE_MFA,
    USER_ERROR_ENABLE_MFA,
    USER_SUCCESS_DISABLE_MFA,
    USER_ERROR_DISABLE_MFA,
    USER_SUCCESS_ENABLE_MFA_BYPASS,
    USER_ERROR_ENABLE_MFA_BYPASS,
    USER_SUCCESS_DISABLE_MFA_BYPASS,
    USER_ERROR_DISABLE_MFA_BYPASS,
    USER_SUCCESS_CLEAR_SECRET_KEY,
    USER_ERROR_CLEAR_SECRET_KEY,
    USER_ERROR_GENERATE_SECRET_KEY,
    USER_ERROR_OTP,
];
