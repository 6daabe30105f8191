//! Routing keys.

use std::borrow::Borrow;
use std::fmt;

use crate::model::Method;

/// `METHOD:path` identifier, e.g. `GET:/soma`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RoutingKey(String);

impl RoutingKey {
    pub fn new(method: Method, path: &str) -> Self {
        Self(format!("{}:{}", method.as_str(), path))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RoutingKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Borrow<str> for RoutingKey {
    fn borrow(&self) -> &str {
        &self.0
    }
}
