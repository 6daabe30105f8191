//! Decoded request value.

use std::collections::HashMap;

use crate::model::Method;
use crate::registry::RoutingKey;

/// A request after transport decoding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    pub method: Method,
    pub path: String,
    pub params: HashMap<String, String>,
}

impl Request {
    /// Create a request with no parameters.
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            params: HashMap::new(),
        }
    }

    /// Builder-style parameter insertion; later values replace earlier ones.
    pub fn with_param(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.insert(name.into(), value.into());
        self
    }

    /// Look up a raw parameter value.
    pub fn param(&self, name: &str) -> Option<&str> {
        self.params.get(name).map(String::as_str)
    }

    /// The key this request is routed by.
    pub fn routing_key(&self) -> RoutingKey {
        RoutingKey::new(self.method, &self.path)
    }
}
