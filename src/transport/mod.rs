//! Transport strategies.
//!
//! # Data Flow
//! ```text
//! socket bytes
//!     → decode (stream.rs: HTTP exchange, datagram.rs: request line)
//!     → Dispatch::dispatch          (blocking pool)
//!     → encode (status + body, or body only)
//!     → socket bytes
//! ```
//!
//! Transports never look at routes or bindings; everything they know about
//! the application is the [`Dispatch`] they are started with.

pub mod codec;
pub mod datagram;
pub mod error;
pub mod stream;

pub use codec::DecodeError;
pub use datagram::DatagramTransport;
pub use error::TransportError;
pub use stream::StreamTransport;

use std::net::SocketAddr;
use std::sync::Arc;

use futures_util::future::BoxFuture;
use tokio::sync::broadcast;

use crate::config::{MiddlewareConfig, TransportKind};
use crate::dispatch::Dispatch;

/// A bound socket plus its decode, dispatch, encode loop.
pub trait Transport: Send {
    fn kind(&self) -> TransportKind;

    /// Address actually bound (resolves port 0).
    fn local_addr(&self) -> SocketAddr;

    /// Serve until `shutdown` fires.
    fn start(
        self: Box<Self>,
        dispatch: Arc<dyn Dispatch>,
        shutdown: broadcast::Receiver<()>,
    ) -> BoxFuture<'static, Result<(), TransportError>>;
}

/// Bind the transport selected by `config.transport.kind`.
pub async fn bind(config: &MiddlewareConfig) -> Result<Box<dyn Transport>, TransportError> {
    let transport: Box<dyn Transport> = match config.transport.kind {
        TransportKind::Tcp => Box::new(StreamTransport::bind(&config.transport).await?),
        TransportKind::Udp => Box::new(
            DatagramTransport::bind(&config.transport.bind_address, &config.datagram).await?,
        ),
    };
    Ok(transport)
}
