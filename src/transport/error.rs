//! Transport-level failures.

use std::io;

use thiserror::Error;

use crate::net::listener::ListenerError;

/// Errors that stop a transport from starting or running.
///
/// Per-request problems never surface here; they are logged by the loop that
/// hit them.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("invalid bind address {0:?}")]
    Address(String),

    #[error("failed to bind {address}: {source}")]
    Bind {
        address: String,
        #[source]
        source: io::Error,
    },

    #[error(transparent)]
    Listener(#[from] ListenerError),
}
