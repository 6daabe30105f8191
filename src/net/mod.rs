//! Network layer for the stream transport.
//!
//! # Data Flow
//! ```text
//! Incoming TCP connection
//!     → listener.rs (accept loop, connection limits)
//!     → connection.rs (ID, active count)
//!     → Hand off to the stream transport's HTTP service
//! ```
//!
//! # Design Decisions
//! - Bounded accept prevents resource exhaustion
//! - Each connection is counted until its task ends

pub mod connection;
pub mod listener;
