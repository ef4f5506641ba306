//! Authentication state machine
//!
//! Phases: ANONYMOUS → AUTHENTICATING → AUTHENTICATED, with side
//! transitions to AUTH_ERROR (login rejected) and UNAUTH_ERROR (session
//! expired). Logout returns to ANONYMOUS from anywhere. A session expiry is
//! recorded from any phase; while a login is in flight it only raises the
//! flag and the login outcome decides the phase.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::next_seq;

/// Authentication phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuthPhase {
    /// No session
    #[default]
    Anonymous,
    /// Login request in flight
    Authenticating,
    /// Session established
    Authenticated,
    /// Last login attempt was rejected
    AuthError,
    /// Session expired or was revoked
    UnauthError,
}

impl AuthPhase {
    /// Check if transition from this phase to target is valid
    pub fn can_transition_to(&self, target: AuthPhase) -> bool {
        match (self, target) {
            // Logout and session expiry are always allowed
            (_, AuthPhase::Anonymous) => true,
            (_, AuthPhase::UnauthError) => true,

            (AuthPhase::Anonymous, AuthPhase::Authenticating) => true,
            (AuthPhase::AuthError, AuthPhase::Authenticating) => true,
            (AuthPhase::UnauthError, AuthPhase::Authenticating) => true,
            (AuthPhase::Authenticated, AuthPhase::Authenticating) => true,

            (AuthPhase::Authenticating, AuthPhase::Authenticated) => true,
            (AuthPhase::Authenticating, AuthPhase::AuthError) => true,

            _ => false,
        }
    }
}

/// Details shown on the login page, read from the service root
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LoginPageDetails {
    pub date_time: Option<DateTime<Utc>>,
    pub model: Option<String>,
    pub serial: Option<String>,
    pub acf_window_active: bool,
}

/// State mutations; the only way the store changes state
#[derive(Debug, Clone, PartialEq)]
pub enum AuthMutation {
    /// Login started: clears the error flags and the OTP requirement
    BeginLogin,
    /// Login accepted; markers are re-read after the response
    AuthSuccess {
        xsrf_token: Option<String>,
        is_authenticated: Option<String>,
        generate_otp_required: bool,
    },
    /// Login rejected
    AuthError,
    /// Session expired
    UnauthError,
    /// Session dropped
    Logout,
    /// Clear error flags and re-read markers without a request
    Reset {
        xsrf_token: Option<String>,
        is_authenticated: Option<String>,
    },
    SetLoginPageDetails(LoginPageDetails),
    SetGlobalMfaEnabled(bool),
}

/// Errors for auth state operations
#[derive(Debug, thiserror::Error)]
pub enum AuthStateError {
    #[error("Invalid state transition from {from:?} to {to:?}")]
    InvalidTransition { from: AuthPhase, to: AuthPhase },
}

/// Authentication store state
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthenticationState {
    pub phase: AuthPhase,
    pub auth_error: bool,
    pub unauth_error: bool,
    /// Login succeeded but a TOTP secret must be generated first
    pub generate_otp_required: bool,
    pub global_mfa_enabled: bool,
    /// Session token marker as last read
    pub xsrf_token: Option<String>,
    /// `IsAuthenticated` marker as last read
    pub is_authenticated: Option<String>,
    pub login_page_details: Option<LoginPageDetails>,
    pub updated_at: DateTime<Utc>,
    /// Monotonic sequence counter for ordering
    pub seq: u64,
}

impl Default for AuthenticationState {
    fn default() -> Self {
        Self::new(None, None)
    }
}

impl AuthenticationState {
    /// Initial state from the markers present at start-up
    pub fn new(xsrf_token: Option<String>, is_authenticated: Option<String>) -> Self {
        let phase = if logged_in(xsrf_token.as_deref(), is_authenticated.as_deref()) {
            AuthPhase::Authenticated
        } else {
            AuthPhase::Anonymous
        };
        Self {
            phase,
            auth_error: false,
            unauth_error: false,
            generate_otp_required: false,
            global_mfa_enabled: false,
            xsrf_token,
            is_authenticated,
            login_page_details: None,
            updated_at: Utc::now(),
            seq: next_seq(),
        }
    }

    /// Token marker present, or `IsAuthenticated` is `"true"`
    pub fn is_logged_in(&self) -> bool {
        logged_in(self.xsrf_token.as_deref(), self.is_authenticated.as_deref())
    }

    fn transition(&mut self, to: AuthPhase) -> Result<(), AuthStateError> {
        if !self.phase.can_transition_to(to) {
            return Err(AuthStateError::InvalidTransition {
                from: self.phase,
                to,
            });
        }
        self.phase = to;
        Ok(())
    }

    /// Apply one mutation
    pub fn apply(&mut self, mutation: AuthMutation) -> Result<(), AuthStateError> {
        match mutation {
            AuthMutation::BeginLogin => {
                self.transition(AuthPhase::Authenticating)?;
                self.generate_otp_required = false;
                self.auth_error = false;
                self.unauth_error = false;
            }
            AuthMutation::AuthSuccess {
                xsrf_token,
                is_authenticated,
                generate_otp_required,
            } => {
                self.transition(AuthPhase::Authenticated)?;
                self.auth_error = false;
                self.unauth_error = false;
                self.generate_otp_required = generate_otp_required;
                self.xsrf_token = xsrf_token;
                self.is_authenticated = is_authenticated;
            }
            AuthMutation::AuthError => {
                self.transition(AuthPhase::AuthError)?;
                self.auth_error = true;
            }
            AuthMutation::UnauthError => {
                if self.phase != AuthPhase::Authenticating {
                    self.transition(AuthPhase::UnauthError)?;
                }
                self.unauth_error = true;
            }
            AuthMutation::Logout => {
                self.transition(AuthPhase::Anonymous)?;
                self.xsrf_token = None;
                self.is_authenticated = None;
            }
            AuthMutation::Reset {
                xsrf_token,
                is_authenticated,
            } => {
                self.auth_error = false;
                self.unauth_error = false;
                self.xsrf_token = xsrf_token;
                self.is_authenticated = is_authenticated;
                self.phase = if self.is_logged_in() {
                    AuthPhase::Authenticated
                } else {
                    AuthPhase::Anonymous
                };
            }
            AuthMutation::SetLoginPageDetails(details) => {
                self.login_page_details = Some(details);
            }
            AuthMutation::SetGlobalMfaEnabled(enabled) => {
                self.global_mfa_enabled = enabled;
            }
        }

        self.updated_at = Utc::now();
        self.seq = next_seq();
        Ok(())
    }
}

fn logged_in(xsrf_token: Option<&str>, is_authenticated: Option<&str>) -> bool {
    xsrf_token.is_some() || is_authenticated == Some("true")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_transitions() {
        assert!(AuthPhase::Anonymous.can_transition_to(AuthPhase::Authenticating));
        assert!(AuthPhase::Authenticating.can_transition_to(AuthPhase::Authenticated));
        assert!(AuthPhase::Authenticating.can_transition_to(AuthPhase::AuthError));
        assert!(AuthPhase::AuthError.can_transition_to(AuthPhase::Authenticating));
        assert!(AuthPhase::Authenticated.can_transition_to(AuthPhase::UnauthError));
    }

    #[test]
    fn test_logout_from_any_phase() {
        for phase in [
            AuthPhase::Anonymous,
            AuthPhase::Authenticating,
            AuthPhase::Authenticated,
            AuthPhase::AuthError,
            AuthPhase::UnauthError,
        ] {
            assert!(phase.can_transition_to(AuthPhase::Anonymous));
        }
    }

    #[test]
    fn test_invalid_transitions() {
        assert!(!AuthPhase::Anonymous.can_transition_to(AuthPhase::Authenticated));
        assert!(!AuthPhase::Authenticated.can_transition_to(AuthPhase::AuthError));
        assert!(!AuthPhase::AuthError.can_transition_to(AuthPhase::Authenticated));
        assert!(!AuthPhase::Authenticating.can_transition_to(AuthPhase::Authenticating));
    }

    #[test]
    fn test_session_expiry_from_any_phase() {
        for phase in [
            AuthPhase::Anonymous,
            AuthPhase::Authenticating,
            AuthPhase::Authenticated,
            AuthPhase::AuthError,
            AuthPhase::UnauthError,
        ] {
            assert!(phase.can_transition_to(AuthPhase::UnauthError));
        }
    }

    #[test]
    fn test_expiry_after_rejected_login() {
        let mut state = AuthenticationState::default();
        state.apply(AuthMutation::BeginLogin).unwrap();
        state.apply(AuthMutation::AuthError).unwrap();

        state.apply(AuthMutation::UnauthError).unwrap();
        assert!(state.unauth_error);
        assert_eq!(state.phase, AuthPhase::UnauthError);
    }

    #[test]
    fn test_expiry_during_login_keeps_login_in_flight() {
        let mut state = AuthenticationState::default();
        state.apply(AuthMutation::BeginLogin).unwrap();

        state.apply(AuthMutation::UnauthError).unwrap();
        assert!(state.unauth_error);
        assert_eq!(state.phase, AuthPhase::Authenticating);

        state
            .apply(AuthMutation::AuthSuccess {
                xsrf_token: Some("tok".to_string()),
                is_authenticated: None,
                generate_otp_required: false,
            })
            .unwrap();
        assert_eq!(state.phase, AuthPhase::Authenticated);
        assert!(!state.unauth_error);
    }

    #[test]
    fn test_login_cycle() {
        let mut state = AuthenticationState::default();
        assert!(!state.is_logged_in());

        state.apply(AuthMutation::BeginLogin).unwrap();
        state
            .apply(AuthMutation::AuthSuccess {
                xsrf_token: Some("tok".to_string()),
                is_authenticated: None,
                generate_otp_required: true,
            })
            .unwrap();
        assert_eq!(state.phase, AuthPhase::Authenticated);
        assert!(state.is_logged_in());
        assert!(state.generate_otp_required);

        state.apply(AuthMutation::Logout).unwrap();
        assert_eq!(state.phase, AuthPhase::Anonymous);
        assert!(!state.is_logged_in());
    }

    #[test]
    fn test_begin_login_clears_flags() {
        let mut state = AuthenticationState::default();
        state.apply(AuthMutation::BeginLogin).unwrap();
        state.apply(AuthMutation::AuthError).unwrap();
        assert!(state.auth_error);

        state.apply(AuthMutation::BeginLogin).unwrap();
        assert!(!state.auth_error);
        assert!(!state.generate_otp_required);
    }

    #[test]
    fn test_success_without_begin_is_rejected() {
        let mut state = AuthenticationState::default();
        let err = state
            .apply(AuthMutation::AuthSuccess {
                xsrf_token: None,
                is_authenticated: None,
                generate_otp_required: false,
            })
            .unwrap_err();
        assert!(matches!(err, AuthStateError::InvalidTransition { .. }));
    }

    #[test]
    fn test_is_authenticated_marker_alone() {
        let state = AuthenticationState::new(None, Some("true".to_string()));
        assert!(state.is_logged_in());
        assert_eq!(state.phase, AuthPhase::Authenticated);

        let state = AuthenticationState::new(None, Some("false".to_string()));
        assert!(!state.is_logged_in());
    }

    #[test]
    fn test_reset_rereads_markers() {
        let mut state = AuthenticationState::default();
        state.apply(AuthMutation::UnauthError).unwrap();
        state
            .apply(AuthMutation::Reset {
                xsrf_token: Some("tok".to_string()),
                is_authenticated: Some("true".to_string()),
            })
            .unwrap();
        assert!(!state.unauth_error);
        assert_eq!(state.phase, AuthPhase::Authenticated);
    }

    #[test]
    fn test_seq_increases() {
        let mut state = AuthenticationState::default();
        let before = state.seq;
        state.apply(AuthMutation::SetGlobalMfaEnabled(true)).unwrap();
        assert!(state.seq > before);
        assert!(state.global_mfa_enabled);
    }
}
