//! Route registry subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (declarative registration):
//!     Operation::route(method, path)
//!         .param(..) / .before::<I>() / .after::<I>() / .invoke(..)
//!         .build()            → OperationDescriptor (immutable)
//!     RouteRegistry::register → RoutingKey ↦ Arc<OperationDescriptor>
//!
//! Per request:
//!     Request → RoutingKey ("GET:/soma") → RouteRegistry::lookup
//! ```
//!
//! # Design Decisions
//! - Exact string keys, no pattern matching
//! - Last registration for a key wins
//! - Concurrent map so lookups never block each other

pub mod binding;
pub mod descriptor;
pub mod key;
pub mod routes;

pub use binding::{ParamKind, ParameterBinding};
pub use descriptor::{Callable, HandlerType, Operation, OperationDescriptor, RegistrationError};
pub use key::RoutingKey;
pub use routes::RouteRegistry;
