//! Dispatch failure taxonomy.
//!
//! Every variant except [`DispatchError::AfterHook`] is rendered into a
//! response by the dispatcher. An after-hook failure leaves `dispatch` as an
//! error and the transport drops the exchange.

use thiserror::Error;

use crate::dispatch::InvokeError;
use crate::interceptor::HookError;

/// Errors surfaced while dispatching a request.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DispatchError {
    /// No operation is registered under the routing key.
    #[error("route not found: {key}")]
    RouteNotFound { key: String },

    /// A bound parameter is absent from the request.
    #[error("missing required parameter: {name}")]
    MissingParameter { name: String },

    /// The operation failed, or a parameter could not be coerced.
    #[error("internal server error: {message}")]
    InvocationFailure { message: String },

    /// Anything else unexpected while binding, resolving, or invoking.
    #[error("invalid request: {message}")]
    MalformedRequest { message: String },

    /// A before-interceptor failed; the operation was not invoked.
    #[error("{0}")]
    BeforeHook(HookError),

    /// An after-interceptor failed after a successful invocation.
    #[error("{0}")]
    AfterHook(HookError),
}

impl DispatchError {
    /// Status code used when this error is rendered as a response.
    pub fn status_code(&self) -> u16 {
        match self {
            Self::RouteNotFound { .. } => 404,
            Self::MissingParameter { .. } | Self::MalformedRequest { .. } => 400,
            Self::InvocationFailure { .. } | Self::BeforeHook(_) | Self::AfterHook(_) => 500,
        }
    }

    /// Whether the error must escape `dispatch` instead of becoming a
    /// response.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::AfterHook(_))
    }

    /// Short label for logs and metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::RouteNotFound { .. } => "route_not_found",
            Self::MissingParameter { .. } => "missing_parameter",
            Self::InvocationFailure { .. } => "invocation_failure",
            Self::MalformedRequest { .. } => "malformed_request",
            Self::BeforeHook(_) => "before_hook",
            Self::AfterHook(_) => "after_hook",
        }
    }
}

impl From<InvokeError> for DispatchError {
    fn from(err: InvokeError) -> Self {
        match err {
            InvokeError::Failed(message) => Self::InvocationFailure { message },
            other => Self::MalformedRequest {
                message: other.to_string(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatch::ArgumentError;
    use crate::interceptor::{InterceptorError, Phase};

    fn hook(phase: Phase) -> HookError {
        HookError {
            phase,
            interceptor: "audit".into(),
            source: InterceptorError::new("down"),
        }
    }

    #[test]
    fn status_mapping() {
        assert_eq!(DispatchError::RouteNotFound { key: "GET:/x".into() }.status_code(), 404);
        assert_eq!(DispatchError::MissingParameter { name: "a".into() }.status_code(), 400);
        assert_eq!(DispatchError::MalformedRequest { message: "x".into() }.status_code(), 400);
        assert_eq!(DispatchError::InvocationFailure { message: "x".into() }.status_code(), 500);
        assert_eq!(DispatchError::BeforeHook(hook(Phase::Before)).status_code(), 500);
    }

    #[test]
    fn only_after_hook_is_fatal() {
        assert!(DispatchError::AfterHook(hook(Phase::After)).is_fatal());
        assert!(!DispatchError::BeforeHook(hook(Phase::Before)).is_fatal());
        assert!(!DispatchError::RouteNotFound { key: "k".into() }.is_fatal());
    }

    #[test]
    fn invoke_errors_map_to_taxonomy() {
        let failed: DispatchError = InvokeError::failed("boom").into();
        assert_eq!(failed, DispatchError::InvocationFailure { message: "boom".into() });

        let arg: DispatchError = InvokeError::from(ArgumentError::Missing { index: 2 }).into();
        assert_eq!(arg.status_code(), 400);
        assert_eq!(arg.to_string(), "invalid request: argument 2 is missing");
    }
}
