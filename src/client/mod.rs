//! Redfish Resource Client
//!
//! Verb methods (`get`, `post`, `patch`, `delete`) against path-based
//! resource identifiers. The wire is abstracted behind [`Transport`] so the
//! stores can run against a real BMC over HTTPS or the in-process mock.

pub mod resource;
pub mod transport;

pub use resource::{ClientError, ClientResult, ResourceClient};
pub use transport::{
    ApiRequest, ApiResponse, HttpConfig, HttpTransport, Method, MockTransport, Transport,
    TransportError,
};
