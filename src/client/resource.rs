//! Resource Client
//!
//! Issues verb requests through a [`Transport`] and turns non-2xx responses
//! into structured [`ClientError::Remote`] values carrying the Redfish error
//! body, so callers can classify failures by code.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use redfish_protocol::error::{error_code, first_message_id};
use redfish_protocol::ErrorKind;
use serde::de::DeserializeOwned;
use serde_json::Value;

use super::transport::{ApiRequest, Method, Transport, TransportError};

/// Resource client errors
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    #[error("{method} {path} failed with status {status}{}", code_suffix(.body))]
    Remote {
        method: Method,
        path: String,
        status: u16,
        body: Value,
    },

    #[error("Unexpected response from {path}: {message}")]
    Decode { path: String, message: String },
}

fn code_suffix(body: &Value) -> String {
    error_code(body)
        .map(|code| format!(" ({})", code))
        .unwrap_or_default()
}

impl ClientError {
    /// HTTP status of a remote failure
    pub fn status(&self) -> Option<u16> {
        match self {
            ClientError::Remote { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Response body of a remote failure
    pub fn body(&self) -> Option<&Value> {
        match self {
            ClientError::Remote { body, .. } => Some(body),
            _ => None,
        }
    }

    /// `error.code` of a remote failure
    pub fn code(&self) -> Option<&str> {
        self.body().and_then(error_code)
    }

    /// Classified kind of `error.code`
    pub fn kind(&self) -> ErrorKind {
        ErrorKind::classify_opt(self.code())
    }

    /// First `MessageId` of a property-scoped extended-info annotation
    pub fn property_message_id(&self, property: &str) -> Option<&str> {
        self.body().and_then(|b| first_message_id(b, Some(property)))
    }
}

/// Result type for resource client operations
pub type ClientResult<T> = Result<T, ClientError>;

/// Redfish resource client
pub struct ResourceClient {
    transport: Arc<dyn Transport>,
    /// Request ID counter
    request_counter: AtomicU64,
}

impl ResourceClient {
    /// Create a new client over the given transport
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self {
            transport,
            request_counter: AtomicU64::new(0),
        }
    }

    fn next_request_id(&self) -> u64 {
        self.request_counter.fetch_add(1, Ordering::SeqCst)
    }

    async fn send(&self, request: ApiRequest) -> ClientResult<Value> {
        let request_id = self.next_request_id();
        tracing::debug!(
            request_id,
            method = %request.method,
            path = %request.path,
            "redfish request"
        );

        let response = self.transport.execute(&request).await?;

        if response.is_success() {
            Ok(response.body)
        } else {
            tracing::debug!(request_id, status = response.status, "redfish request failed");
            Err(ClientError::Remote {
                method: request.method,
                path: request.path,
                status: response.status,
                body: response.body,
            })
        }
    }

    /// GET a resource
    pub async fn get(&self, path: &str) -> ClientResult<Value> {
        self.send(ApiRequest::new(Method::Get, path)).await
    }

    /// GET a resource and decode it
    pub async fn get_as<T: DeserializeOwned>(&self, path: &str) -> ClientResult<T> {
        let body = self.get(path).await?;
        serde_json::from_value(body).map_err(|e| ClientError::Decode {
            path: path.to_string(),
            message: e.to_string(),
        })
    }

    /// POST to a collection or action; `None` sends no body
    pub async fn post(&self, path: &str, body: Option<Value>) -> ClientResult<Value> {
        let mut request = ApiRequest::new(Method::Post, path);
        if let Some(body) = body {
            request = request.with_body(body);
        }
        self.send(request).await
    }

    /// PATCH a resource
    pub async fn patch(&self, path: &str, body: Value) -> ClientResult<Value> {
        self.send(ApiRequest::new(Method::Patch, path).with_body(body))
            .await
    }

    /// DELETE a resource
    pub async fn delete(&self, path: &str) -> ClientResult<Value> {
        self.send(ApiRequest::new(Method::Delete, path)).await
    }
}
