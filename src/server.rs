//! Middleware server: a dispatcher plus the configured transport.
//!
//! # Responsibilities
//! - Own the shared [`Dispatcher`] that operations are registered on
//! - Bind the transport selected in [`MiddlewareConfig`]
//! - Run it until the [`Shutdown`] coordinator fires

use std::net::SocketAddr;
use std::sync::Arc;

use tokio::task::JoinHandle;

use crate::config::{MiddlewareConfig, TransportKind};
use crate::dispatch::Dispatcher;
use crate::lifecycle::Shutdown;
use crate::registry::OperationDescriptor;
use crate::transport::{self, Transport, TransportError};

/// Registration surface and entry point of the middleware.
pub struct MiddlewareServer {
    config: MiddlewareConfig,
    dispatcher: Arc<Dispatcher>,
}

impl MiddlewareServer {
    /// Create a server with an empty dispatcher.
    pub fn new(config: MiddlewareConfig) -> Self {
        Self::with_dispatcher(config, Arc::new(Dispatcher::new()))
    }

    /// Create a server around an existing dispatcher.
    pub fn with_dispatcher(config: MiddlewareConfig, dispatcher: Arc<Dispatcher>) -> Self {
        Self { config, dispatcher }
    }

    pub fn register(&self, operation: OperationDescriptor) -> &Self {
        self.dispatcher.register(operation);
        self
    }

    pub fn register_all(&self, operations: impl IntoIterator<Item = OperationDescriptor>) -> &Self {
        self.dispatcher.register_all(operations);
        self
    }

    pub fn dispatcher(&self) -> Arc<Dispatcher> {
        Arc::clone(&self.dispatcher)
    }

    pub fn config(&self) -> &MiddlewareConfig {
        &self.config
    }

    /// Bind the configured transport without serving yet.
    pub async fn bind(self) -> Result<BoundServer, TransportError> {
        let transport = transport::bind(&self.config).await?;

        tracing::info!(
            transport = %transport.kind(),
            address = %transport.local_addr(),
            routes = self.dispatcher.registry().len(),
            "Middleware bound"
        );

        Ok(BoundServer {
            transport,
            dispatcher: self.dispatcher,
        })
    }
}

/// A server whose socket is open.
pub struct BoundServer {
    transport: Box<dyn Transport>,
    dispatcher: Arc<Dispatcher>,
}

impl BoundServer {
    pub fn local_addr(&self) -> SocketAddr {
        self.transport.local_addr()
    }

    pub fn kind(&self) -> TransportKind {
        self.transport.kind()
    }

    /// Serve until `shutdown` is triggered.
    pub async fn run(self, shutdown: &Shutdown) -> Result<(), TransportError> {
        let receiver = shutdown.subscribe();
        self.transport.start(self.dispatcher, receiver).await
    }

    /// Serve on a background task.
    pub fn spawn(self, shutdown: &Shutdown) -> JoinHandle<Result<(), TransportError>> {
        let receiver = shutdown.subscribe();
        tokio::spawn(self.transport.start(self.dispatcher, receiver))
    }
}
