//! Authentication state machine
//!
//! AuthPhase: ANONYMOUS → AUTHENTICATING → AUTHENTICATED, with
//! AUTH_ERROR and UNAUTH_ERROR as side states.

mod auth_state;

pub use auth_state::{
    AuthMutation, AuthPhase, AuthStateError, AuthenticationState, LoginPageDetails,
};

use std::sync::atomic::{AtomicU64, Ordering};

static STATE_SEQ: AtomicU64 = AtomicU64::new(0);

/// Stamp for the next state change; strictly increasing across stores
pub fn next_seq() -> u64 {
    STATE_SEQ.fetch_add(1, Ordering::SeqCst)
}
