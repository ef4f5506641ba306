//! Mock BMC Implementation
//!
//! An in-process Redfish service for unit and integration tests, reached
//! through [`MockTransport`](crate::client::MockTransport).
//!
//! # Resources
//!
//! - Service root with the `Oem.IBM` login-page block
//! - Sessions and `/logout`, including TOTP and secret-key generation
//! - AccountService, Accounts (CRUD and MFA actions) and Roles
//! - EventLog and CELog entries, `ClearLog` and PEL attachments
//!
//! Guard records and per-resource failure injection cover the error paths.

mod bmc;
mod failure;
mod state;

pub use bmc::MockBmc;
pub use failure::{FailureConfig, FailureInjector};
pub use state::{
    LogService, MockAccount, MockState, DEFAULT_PASSWORD, DEFAULT_USERNAME, SERVICE_AGENT_ROLE,
};
