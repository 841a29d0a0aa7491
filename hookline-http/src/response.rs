//! Response type returned by transports

use http::{HeaderMap, StatusCode};
use serde_json::Value;

/// A settled HTTP response.
#[derive(Debug, Clone)]
pub struct Response {
    /// HTTP status
    pub status: StatusCode,
    /// Response headers
    pub headers: HeaderMap,
    /// JSON response body
    pub body: Value,
}

impl Response {
    /// A `200 OK` response carrying `body`.
    pub fn ok(body: Value) -> Self {
        Self {
            status: StatusCode::OK,
            headers: HeaderMap::new(),
            body,
        }
    }

    /// A response with an explicit status and empty body.
    pub fn with_status(status: StatusCode) -> Self {
        Self {
            status,
            headers: HeaderMap::new(),
            body: Value::Null,
        }
    }

    /// Whether the status is in the 2xx range.
    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }
}
