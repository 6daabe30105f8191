//! Transport-agnostic request/response model.
//!
//! # Data Flow
//! ```text
//! wire bytes (HTTP exchange or datagram line)
//!     → transport decoder
//!     → Request { method, path, params }
//!     → dispatcher
//!     → Response { status_code, body }
//!     → transport encoder
//!     → wire bytes
//! ```
//!
//! # Design Decisions
//! - Values are created per call and never shared between requests
//! - Parameters are always text; typing happens at bind time in the dispatcher

pub mod method;
pub mod request;
pub mod response;

pub use method::{Method, UnknownMethod};
pub use request::Request;
pub use response::Response;
