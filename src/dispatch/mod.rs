//! Dispatch subsystem: the single logic path shared by every transport.
//!
//! # Data Flow
//! ```text
//! Request
//!     → RouteRegistry::lookup          (miss → 404)
//!     → InterceptorChain::run_before   (failure → 500)
//!     → bind_arguments                 (missing → 400, coercion → 500)
//!     → HandlerCache::instance         (construction failure → 400)
//!     → OperationDescriptor::invoke    (failure → 500 / 400)
//!     → InterceptorChain::run_after    (failure → Err, transport drops)
//!     → Response(200, rendered value)
//! ```
//!
//! # Design Decisions
//! - Synchronous and I/O free; transports decide where it runs
//! - Failures are `DispatchError` values matched into responses

pub mod arguments;
pub mod dispatcher;
pub mod errors;

pub use arguments::{bind_arguments, ArgumentError, Arguments, InvokeError, Value};
pub use dispatcher::Dispatcher;
pub use errors::DispatchError;

use crate::model::{Request, Response};

/// The function a transport calls for every decoded request.
pub trait Dispatch: Send + Sync + 'static {
    fn dispatch(&self, request: &Request) -> Result<Response, DispatchError>;
}

impl<F> Dispatch for F
where
    F: Fn(&Request) -> Result<Response, DispatchError> + Send + Sync + 'static,
{
    fn dispatch(&self, request: &Request) -> Result<Response, DispatchError> {
        self(request)
    }
}
