//! Authentication flow integration tests
//!
//! Login with and without TOTP, secret-key enrollment and logout against
//! the mock BMC.

use std::sync::Arc;

use bmc_console::client::Method;
use bmc_console::i18n::Catalog;
use bmc_console::mock::{FailureConfig, DEFAULT_PASSWORD, DEFAULT_USERNAME};
use bmc_console::session::{
    MemoryProfileCache, MemorySessionMarkers, ProfileCache, ProfileKey, SessionMarkers,
};
use bmc_console::state::AuthPhase;
use bmc_console::{BmcConsole, MockTransport, StoreContext};
use redfish_protocol::paths;

struct Harness {
    transport: MockTransport,
    markers: Arc<MemorySessionMarkers>,
    profile: Arc<MemoryProfileCache>,
    console: BmcConsole,
}

fn harness(markers: MemorySessionMarkers) -> Harness {
    let transport = MockTransport::new();
    let markers = Arc::new(markers);
    let profile = Arc::new(MemoryProfileCache::new());
    let ctx = StoreContext::new(
        Arc::new(transport.clone()),
        markers.clone(),
        profile.clone(),
        Arc::new(Catalog::english()),
    );
    Harness {
        transport,
        markers,
        profile,
        console: BmcConsole::new(ctx),
    }
}

#[tokio::test]
async fn test_login_caches_username() {
    let h = harness(MemorySessionMarkers::new());
    h.console
        .auth
        .login(DEFAULT_USERNAME, DEFAULT_PASSWORD, "")
        .await
        .unwrap();

    assert_eq!(h.profile.get(ProfileKey::Username).as_deref(), Some(DEFAULT_USERNAME));
    assert_eq!(h.transport.bmc().session_count(), 1);
    assert_eq!(h.console.auth.state().phase, AuthPhase::Authenticated);
}

#[tokio::test]
async fn test_failed_login_leaves_profile_alone() {
    let h = harness(MemorySessionMarkers::new());
    assert!(h
        .console
        .auth
        .login(DEFAULT_USERNAME, "not-the-password", "")
        .await
        .is_err());

    assert!(h.console.auth.auth_error());
    assert!(h.profile.get(ProfileKey::Username).is_none());
    assert_eq!(h.transport.bmc().session_count(), 0);
}

#[tokio::test]
async fn test_session_expiry_recorded_after_failed_login() {
    let h = harness(MemorySessionMarkers::new());
    assert!(h
        .console
        .auth
        .login(DEFAULT_USERNAME, "not-the-password", "")
        .await
        .is_err());

    h.console.auth.unauth_login().unwrap();
    assert!(h.console.auth.unauth_error());
}

#[tokio::test]
async fn test_overlapping_logins_open_two_sessions() {
    let h = harness(MemorySessionMarkers::new());
    h.transport.bmc().inject_delay(
        Method::Post,
        paths::SESSIONS,
        std::time::Duration::from_millis(20),
    );

    let (a, b) = tokio::join!(
        h.console.auth.login(DEFAULT_USERNAME, DEFAULT_PASSWORD, ""),
        h.console.auth.login(DEFAULT_USERNAME, DEFAULT_PASSWORD, ""),
    );

    assert!(a.is_ok());
    assert!(b.is_ok());
    assert_eq!(h.transport.bmc().session_count(), 2);
    assert_eq!(h.console.auth.state().phase, AuthPhase::Authenticated);
}

#[tokio::test]
async fn test_totp_login_sends_token() {
    let h = harness(MemorySessionMarkers::new());
    let bmc = h.transport.bmc();
    bmc.set_global_mfa(true);

    // First login enrolls: the BMC asks for a secret key
    h.console
        .auth
        .login(DEFAULT_USERNAME, DEFAULT_PASSWORD, "")
        .await
        .unwrap();
    assert!(h.console.auth.generate_otp_required());

    h.console.users.generate_secret_key().await.unwrap();
    assert!(bmc.secret_key(DEFAULT_USERNAME).is_some());

    // Without a code the enrolled account is refused
    assert!(h
        .console
        .auth
        .login(DEFAULT_USERNAME, DEFAULT_PASSWORD, "")
        .await
        .is_err());

    let code = bmc.totp_code();
    h.console
        .auth
        .login(DEFAULT_USERNAME, DEFAULT_PASSWORD, &code)
        .await
        .unwrap();
    assert!(!h.console.auth.generate_otp_required());

    let body = bmc.requests().pop().unwrap().body.unwrap();
    assert_eq!(body["Token"], code.as_str());
}

#[tokio::test]
async fn test_logout_clears_everything_when_server_fails() {
    let h = harness(MemorySessionMarkers::authenticated("tok"));
    h.profile.set(ProfileKey::Username, DEFAULT_USERNAME).unwrap();
    h.profile.set(ProfileKey::Language, "en").unwrap();
    h.transport
        .bmc()
        .inject_failure(Method::Post, paths::LOGOUT, FailureConfig::status(500));
    assert!(h.console.auth.is_logged_in());

    h.console.auth.logout().await.unwrap();

    assert!(!h.console.auth.is_logged_in());
    assert!(h.markers.xsrf_token().is_none());
    assert!(h.markers.is_authenticated_flag().is_none());
    for key in ProfileKey::ALL {
        assert!(h.profile.get(key).is_none(), "{:?} survived logout", key);
    }
    assert_eq!(h.transport.bmc().request_count(Method::Post, paths::LOGOUT), 1);
}

#[tokio::test]
async fn test_login_page_details_with_acf_window() {
    let h = harness(MemorySessionMarkers::new());
    h.transport.bmc().set_acf_window_active(true);

    let details = h.console.auth.load_login_page_details().await.unwrap();
    assert!(details.acf_window_active);
    assert_eq!(details.serial.as_deref(), Some("13E5F8X"));
    assert!(!h.console.auth.global_mfa_enabled());
}

#[tokio::test]
async fn test_login_page_details_unreachable_root() {
    let h = harness(MemorySessionMarkers::new());
    h.transport.bmc().inject_failure(
        Method::Get,
        paths::SERVICE_ROOT,
        FailureConfig::status(503),
    );

    assert!(h.console.auth.load_login_page_details().await.is_none());
    assert!(h.console.auth.login_page_details().is_none());
}
