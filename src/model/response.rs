//! Rendered dispatch outcome.

use serde::{Deserialize, Serialize};

/// Status and plain-text body produced for every handled request.
///
/// The stream transport sends both fields; the datagram transport only has
/// room for the body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Response {
    pub status_code: u16,
    pub body: String,
}

impl Response {
    pub fn new(status_code: u16, body: impl Into<String>) -> Self {
        Self {
            status_code,
            body: body.into(),
        }
    }

    pub fn ok(body: impl Into<String>) -> Self {
        Self::new(200, body)
    }
}
