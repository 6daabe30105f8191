//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Handlers (handlers.rs):
//!     first dispatch to a type → construct once → shared until shutdown
//!
//! Shutdown (shutdown.rs):
//!     Signal received → transports stop accepting/receiving → Exit
//!
//! Signals (signals.rs):
//!     SIGINT (Ctrl+C) → Trigger shutdown
//! ```
//!
//! # Design Decisions
//! - Handler instances live as long as their dispatcher
//! - Requests already in flight run to completion

pub mod handlers;
pub mod shutdown;
pub mod signals;

pub use handlers::{BoxError, ConstructError, Controller, HandlerCache, SharedHandler};
pub use shutdown::Shutdown;
