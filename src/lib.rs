//! Remote-invocation middleware.
//!
//! Operations are registered declaratively with [`Operation`]; a single
//! [`Dispatcher`] resolves, binds, intercepts, and invokes them; a
//! [`Transport`](transport::Transport) carries requests in over HTTP/TCP or
//! UDP datagrams.
//!
//! # Architecture Overview
//!
//! ```text
//!   Client ──▶ transport (stream | datagram) ──▶ Dispatcher
//!                                                  │
//!                         ┌────────────────────────┼───────────────────────┐
//!                         ▼                        ▼                       ▼
//!                   RouteRegistry          InterceptorChain          HandlerCache
//!                  (key → descriptor)      (before / after)       (one per handler)
//! ```

// Core subsystems
pub mod dispatch;
pub mod interceptor;
pub mod model;
pub mod registry;

// Serving
pub mod net;
pub mod server;
pub mod transport;

// Cross-cutting concerns
pub mod config;
pub mod lifecycle;
pub mod observability;

// Sample application
pub mod app;

pub use config::schema::MiddlewareConfig;
pub use dispatch::{Dispatch, DispatchError, Dispatcher};
pub use lifecycle::{Controller, Shutdown};
pub use model::{Method, Request, Response};
pub use registry::{Operation, OperationDescriptor, ParamKind};
pub use server::MiddlewareServer;
