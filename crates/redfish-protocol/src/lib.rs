//! Redfish Protocol Types
//!
//! Wire-level types shared by the console stores and the mock BMC:
//! resource paths, the Redfish error body, and the error-code
//! classification used to pick user-facing messages.

pub mod error;
pub mod paths;
pub mod resources;

pub use error::{ErrorBody, ErrorKind, ExtendedInfo, RedfishError};
pub use resources::{
    AccountService, Collection, LogEntry, ManagerAccount, MfaBypass, ODataLink, Role,
    ServiceRootOem,
};

/// OData annotation carrying the canonical URI of a resource.
pub const ODATA_ID: &str = "@odata.id";

/// Annotation key carrying extended messages on success and error bodies.
pub const EXTENDED_INFO: &str = "@Message.ExtendedInfo";
