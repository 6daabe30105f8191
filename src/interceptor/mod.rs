//! Cross-cutting hooks run around an operation.
//!
//! # Data Flow
//! ```text
//! dispatch
//!     → InterceptorChain::run_before   (declared order, stop at first failure)
//!     → bind + invoke
//!     → InterceptorChain::run_after    (only after a successful invoke)
//! ```
//!
//! # Design Decisions
//! - Each run instantiates the interceptor through its factory, so
//!   interceptors behave as stateless values
//! - Both phases default to a no-op

pub mod chain;

use std::fmt;
use std::sync::Arc;

pub use chain::{HookError, InterceptorChain, Phase};

/// A before/after hook.
pub trait Interceptor: Send {
    fn before(&self) -> Result<(), InterceptorError> {
        Ok(())
    }

    fn after(&self) -> Result<(), InterceptorError> {
        Ok(())
    }
}

/// Failure reported by an interceptor.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{0}")]
pub struct InterceptorError(String);

impl InterceptorError {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

type Factory = Arc<dyn Fn() -> Box<dyn Interceptor> + Send + Sync>;

/// Named factory for an interceptor, attached to an operation.
#[derive(Clone)]
pub struct InterceptorRef {
    name: String,
    factory: Factory,
}

impl InterceptorRef {
    /// Reference a default-constructible interceptor type.
    pub fn of<I: Interceptor + Default + 'static>() -> Self {
        Self {
            name: std::any::type_name::<I>().to_string(),
            factory: Arc::new(|| Box::new(I::default()) as Box<dyn Interceptor>),
        }
    }

    /// Reference an interceptor built by a closure, e.g. one that shares a
    /// recorder with the caller.
    pub fn from_fn<F>(name: impl Into<String>, factory: F) -> Self
    where
        F: Fn() -> Box<dyn Interceptor> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            factory: Arc::new(factory),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub(crate) fn instantiate(&self) -> Box<dyn Interceptor> {
        (self.factory)()
    }
}

impl fmt::Debug for InterceptorRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("InterceptorRef").field(&self.name).finish()
    }
}
