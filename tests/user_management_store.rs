//! User management store integration tests
//!
//! Account CRUD and its failure classification, bulk enable/disable/delete,
//! lockout settings and the TOTP flows against the mock BMC.

use std::sync::Arc;

use bmc_console::client::Method;
use bmc_console::mock::{FailureConfig, DEFAULT_PASSWORD, DEFAULT_USERNAME};
use bmc_console::stores::{AccountSettings, NewUser, UserUpdate};
use bmc_console::{BmcConsole, MockTransport, StoreError, ToastKind};
use redfish_protocol::{paths, ErrorKind};

fn console() -> (MockTransport, BmcConsole) {
    let transport = MockTransport::new();
    let console = BmcConsole::in_memory(Arc::new(transport.clone()));
    (transport, console)
}

fn new_user(username: &str, password: &str) -> NewUser {
    NewUser {
        username: username.to_string(),
        password: password.to_string(),
        privilege: "Operator".to_string(),
        status: true,
    }
}

fn operation_message(err: StoreError) -> String {
    match err {
        StoreError::Operation(message) => message,
        other => panic!("expected an operation error, got {:?}", other),
    }
}

// === Create ===

#[tokio::test]
async fn test_create_user_refreshes_list() {
    let (transport, console) = console();

    let message = console
        .users
        .create_user(&new_user("bob", "b0bPassword"))
        .await
        .unwrap();

    assert_eq!(message, "User bob has been created.");
    assert!(transport.bmc().account("bob").unwrap().enabled);
    let names: Vec<String> = console
        .users
        .all_users()
        .into_iter()
        .map(|u| u.user_name)
        .collect();
    assert!(names.contains(&"bob".to_string()));
    assert!(names.contains(&DEFAULT_USERNAME.to_string()));
}

#[tokio::test]
async fn test_create_user_short_password() {
    let (transport, console) = console();

    let err = console
        .users
        .create_user(&new_user("bob", "short"))
        .await
        .unwrap_err();

    assert_eq!(
        operation_message(err),
        "Error creating user bob: the password does not meet the password policy."
    );
    assert!(transport.bmc().account("bob").is_none());
}

#[tokio::test]
async fn test_create_user_limit_reached() {
    let (transport, console) = console();
    transport.bmc().set_max_accounts(1);

    let err = console
        .users
        .create_user(&new_user("bob", "b0bPassword"))
        .await
        .unwrap_err();

    assert_eq!(
        operation_message(err),
        "Error creating user bob: the maximum number of users has been reached."
    );
}

#[tokio::test]
async fn test_create_user_other_failure_is_generic() {
    let (_, console) = console();

    let err = console
        .users
        .create_user(&new_user(DEFAULT_USERNAME, "b0bPassword"))
        .await
        .unwrap_err();

    assert_eq!(operation_message(err), "Error creating user admin.");
}

// === Update ===

#[tokio::test]
async fn test_update_user_password_rejected() {
    let (_, console) = console();
    let update = UserUpdate {
        original_username: DEFAULT_USERNAME.to_string(),
        password: Some("x".to_string()),
        ..Default::default()
    };

    let err = console.users.update_user(&update).await.unwrap_err();
    assert_eq!(
        operation_message(err),
        "Error updating user admin: the password does not meet the password policy."
    );
}

#[tokio::test]
async fn test_update_user_renames_account() {
    let (transport, console) = console();
    transport.bmc().add_account("bob", "b0bPassword", "Operator");
    let update = UserUpdate {
        original_username: "bob".to_string(),
        username: Some("robert".to_string()),
        status: Some(false),
        ..Default::default()
    };

    let message = console.users.update_user(&update).await.unwrap();

    assert_eq!(message, "User bob has been updated.");
    assert!(transport.bmc().account("bob").is_none());
    assert!(!transport.bmc().account("robert").unwrap().enabled);
}

#[tokio::test]
async fn test_role_change_applied_by_administrator() {
    let (transport, console) = console();
    transport.bmc().add_account("bob", "b0bPassword", "Operator");
    let update = UserUpdate {
        original_username: "bob".to_string(),
        privilege: Some("Administrator".to_string()),
        ..Default::default()
    };

    console
        .users
        .update_user_from_user_management(&update, "Administrator")
        .await
        .unwrap();

    assert_eq!(transport.bmc().account("bob").unwrap().role_id, "Administrator");
}

#[tokio::test]
async fn test_read_only_target_promoted_by_administrator() {
    let (transport, console) = console();
    transport.bmc().add_account("viewer", "v1ewerPass", "ReadOnly");
    let update = UserUpdate {
        original_username: "viewer".to_string(),
        privilege: Some("Operator".to_string()),
        ..Default::default()
    };

    console
        .users
        .update_user_from_user_management(&update, "Administrator")
        .await
        .unwrap();

    assert_eq!(transport.bmc().account("viewer").unwrap().role_id, "Operator");
}

#[tokio::test]
async fn test_role_change_withheld_for_read_only_actor() {
    let (transport, console) = console();
    transport.bmc().add_account("viewer", "v1ewerPass", "ReadOnly");
    let update = UserUpdate {
        original_username: "viewer".to_string(),
        privilege: Some("Administrator".to_string()),
        locked: Some(false),
        ..Default::default()
    };

    console
        .users
        .update_user_from_user_management(&update, "ReadOnly")
        .await
        .unwrap();

    let body = transport
        .bmc()
        .requests()
        .into_iter()
        .find(|r| r.method == Method::Patch)
        .unwrap()
        .body
        .unwrap();
    assert!(body.get("RoleId").is_none());
    assert_eq!(body["Locked"], false);
    assert_eq!(transport.bmc().account("viewer").unwrap().role_id, "ReadOnly");
}

#[tokio::test]
async fn test_update_from_user_management_classifies_on_code() {
    let (transport, console) = console();
    transport.bmc().inject_error(
        Method::Patch,
        &paths::account(DEFAULT_USERNAME),
        400,
        ErrorKind::PropertyValueFormat,
    );
    let update = UserUpdate {
        original_username: DEFAULT_USERNAME.to_string(),
        status: Some(true),
        ..Default::default()
    };

    let err = console
        .users
        .update_user_from_user_management(&update, "Administrator")
        .await
        .unwrap_err();
    assert_eq!(
        operation_message(err),
        "Error updating user admin: the password does not meet the password policy."
    );
}

// === Delete and bulk ===

#[tokio::test]
async fn test_delete_user() {
    let (transport, console) = console();
    transport.bmc().add_account("bob", "b0bPassword", "Operator");

    let message = console.users.delete_user("bob").await.unwrap();
    assert_eq!(message, "User bob has been deleted.");
    assert!(transport.bmc().account("bob").is_none());

    let err = console.users.delete_user("bob").await.unwrap_err();
    assert_eq!(operation_message(err), "Error deleting user bob.");
}

#[tokio::test]
async fn test_delete_users_partial_failure() {
    let (transport, console) = console();
    let bmc = transport.bmc();
    bmc.add_account("a", "aPassword1", "Operator");
    let guarded = bmc.add_account("b", "bPassword1", "Operator");
    bmc.add_account("c", "cPassword1", "Operator");
    bmc.guard(&guarded);

    let summary = console
        .users
        .delete_users(vec!["a".into(), "b".into(), "c".into()])
        .await;

    assert_eq!(summary.success_count, 2);
    assert_eq!(summary.error_count, 1);
    let messages: Vec<(ToastKind, &str)> = summary
        .messages
        .iter()
        .map(|m| (m.kind, m.message.as_str()))
        .collect();
    assert_eq!(
        messages,
        vec![
            (ToastKind::Success, "Successfully deleted 2 users."),
            (ToastKind::Error, "Error deleting 1 user."),
        ]
    );

    let remaining: Vec<String> = console
        .users
        .all_users()
        .into_iter()
        .map(|u| u.user_name)
        .collect();
    assert_eq!(remaining, vec!["admin", "b"]);
}

#[tokio::test]
async fn test_disable_then_enable_users() {
    let (transport, console) = console();
    let bmc = transport.bmc();
    bmc.add_account("a", "aPassword1", "Operator");
    bmc.add_account("b", "bPassword1", "Operator");

    let summary = console
        .users
        .disable_users(vec!["a".into(), "b".into()])
        .await;
    assert_eq!(summary.messages[0].message, "Successfully disabled 2 users.");
    assert!(!bmc.account("a").unwrap().enabled);
    assert!(!bmc.account("b").unwrap().enabled);

    let summary = console.users.enable_users(vec!["a".into()]).await;
    assert_eq!(summary.messages[0].message, "Successfully enabled 1 user.");
    assert!(bmc.account("a").unwrap().enabled);
}

// === Settings and roles ===

#[tokio::test]
async fn test_empty_user_batches_send_nothing() {
    let (transport, console) = console();

    let deleted = console.users.delete_users(Vec::new()).await;
    let enabled = console.users.enable_users(Vec::new()).await;
    let disabled = console.users.disable_users(Vec::new()).await;

    for summary in [deleted, enabled, disabled] {
        assert_eq!(summary.total(), 0);
        assert!(summary.messages.is_empty());
    }
    assert!(transport.bmc().requests().is_empty());
}

#[tokio::test]
async fn test_account_settings_round_trip_through_bmc() {
    let (transport, console) = console();
    console.users.get_account_settings().await.unwrap();
    assert_eq!(console.users.account_settings().lockout_threshold, Some(3));
    assert_eq!(console.users.password_requirements().min_length, Some(8));

    let message = console
        .users
        .save_account_settings(AccountSettings {
            lockout_duration: None,
            lockout_threshold: Some(5),
        })
        .await
        .unwrap();

    assert_eq!(message, "Account settings saved.");
    let settings = console.users.account_settings();
    assert_eq!(settings.lockout_threshold, Some(5));
    assert_eq!(settings.lockout_duration, Some(300));
    assert_eq!(
        transport.bmc().account_service().account_lockout_threshold,
        Some(5)
    );
}

#[tokio::test]
async fn test_account_roles_hide_service_agent() {
    let (_, console) = console();
    console.users.get_account_roles().await.unwrap();

    assert_eq!(console.users.account_roles().len(), 4);
    assert_eq!(
        console.users.filtered_account_roles(),
        vec!["Administrator", "Operator", "ReadOnly"]
    );
}

#[tokio::test]
async fn test_load_users_failure_message() {
    let (transport, console) = console();
    transport
        .bmc()
        .inject_failure(Method::Get, paths::ACCOUNTS, FailureConfig::status(500));

    let err = console.users.get_users().await.unwrap_err();
    assert_eq!(operation_message(err), "Error loading users.");
}

// === Multi-factor authentication ===

#[tokio::test]
async fn test_enable_global_mfa() {
    let (transport, console) = console();

    let message = console.users.update_global_mfa(true).await.unwrap();

    assert_eq!(message, "Multi-factor authentication enabled.");
    assert!(console.users.global_mfa_enabled());
    assert!(transport.bmc().account_service().global_mfa_enabled());
}

#[tokio::test]
async fn test_global_mfa_failure_rolls_back() {
    let (transport, console) = console();
    transport.bmc().inject_failure(
        Method::Patch,
        paths::ACCOUNT_SERVICE,
        FailureConfig::status(500),
    );

    let err = console.users.update_global_mfa(true).await.unwrap_err();

    assert_eq!(
        operation_message(err),
        "Error enabling multi-factor authentication."
    );
    assert!(!console.users.global_mfa_enabled());
}

#[tokio::test]
async fn test_mfa_bypass_and_check() {
    let (transport, console) = console();
    let uri = transport.bmc().add_account("svc", "svcPassword1", "Operator");

    let message = console.users.update_mfa_bypass(&uri, true).await.unwrap();
    assert_eq!(message, "Multi-factor authentication bypass enabled.");
    assert!(console.users.check_current_user_mfa_bypassed(&uri).await.unwrap());
    assert!(console.users.current_user_mfa_bypassed());

    console.users.update_mfa_bypass(&uri, false).await.unwrap();
    assert!(!console.users.check_current_user_mfa_bypassed(&uri).await.unwrap());
}

#[tokio::test]
async fn test_mfa_bypass_for_new_user() {
    let (transport, console) = console();
    console
        .users
        .create_user(&new_user("bob", "b0bPassword"))
        .await
        .unwrap();

    console
        .users
        .update_mfa_bypass_new_user("bob", true)
        .await
        .unwrap();

    let bypass = transport.bmc().account("bob").unwrap().mfa_bypass.unwrap();
    assert!(bypass.is_bypassed());
    let listed = console
        .users
        .all_users()
        .into_iter()
        .find(|u| u.user_name == "bob")
        .unwrap();
    assert!(listed.mfa_bypass.unwrap().is_bypassed());
}

#[tokio::test]
async fn test_generate_secret_key_needs_logged_in_user() {
    let (_, console) = console();
    let err = console.users.generate_secret_key().await.unwrap_err();
    assert!(matches!(err, StoreError::MissingProfile));
}

#[tokio::test]
async fn test_secret_key_enrollment() {
    let (transport, console) = console();
    let bmc = transport.bmc();
    bmc.set_global_mfa(true);
    console
        .auth
        .login(DEFAULT_USERNAME, DEFAULT_PASSWORD, "")
        .await
        .unwrap();

    let secret = console.users.generate_secret_key().await.unwrap();
    assert_eq!(console.users.secret_key_info().as_deref(), Some(secret.as_str()));
    assert_eq!(bmc.secret_key(DEFAULT_USERNAME), Some(secret));

    let err = console
        .users
        .verify_register_totp("000000")
        .await
        .unwrap_err();
    assert_eq!(operation_message(err), "Invalid one-time password.");

    let message = console
        .users
        .verify_register_totp(&bmc.totp_code())
        .await
        .unwrap();
    assert_eq!(message, "Multi-factor authentication enabled.");

    console.users.clear_secret_key();
    assert!(console.users.secret_key_info().is_none());
}

#[tokio::test]
async fn test_clear_set_secret_key() {
    let (transport, console) = console();
    let bmc = transport.bmc();
    console
        .auth
        .login(DEFAULT_USERNAME, DEFAULT_PASSWORD, "")
        .await
        .unwrap();
    console.users.generate_secret_key().await.unwrap();

    let message = console
        .users
        .clear_set_secret_key(&paths::account(DEFAULT_USERNAME))
        .await
        .unwrap();

    assert_eq!(message, "Secret key cleared.");
    assert!(bmc.secret_key(DEFAULT_USERNAME).is_none());
    assert!(!console.users.all_users().is_empty());
}
