//! Shared utilities for integration tests.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpStream, UdpSocket};
use tokio::task::JoinHandle;

use rpc_middleware::config::{MiddlewareConfig, TransportKind};
use rpc_middleware::transport::TransportError;
use rpc_middleware::{app, Dispatcher, MiddlewareServer, Shutdown};

/// A middleware instance serving on an ephemeral local port.
pub struct TestServer {
    pub addr: SocketAddr,
    pub dispatcher: Arc<Dispatcher>,
    pub shutdown: Shutdown,
    pub handle: JoinHandle<Result<(), TransportError>>,
}

impl TestServer {
    /// Trigger shutdown and wait for the transport loop to return.
    pub async fn stop(self) -> Result<(), TransportError> {
        self.shutdown.trigger();
        tokio::time::timeout(Duration::from_secs(5), self.handle)
            .await
            .expect("transport did not stop")
            .expect("transport task panicked")
    }
}

pub fn local_config(kind: TransportKind) -> MiddlewareConfig {
    let mut config = MiddlewareConfig::default();
    config.transport.kind = kind;
    config.transport.bind_address = "127.0.0.1:0".into();
    config
}

/// Start a server with the calculator application registered.
pub async fn start_app(kind: TransportKind) -> TestServer {
    start_server(local_config(kind), |dispatcher| {
        dispatcher.register_all(app::operations().unwrap());
    })
    .await
}

/// Start a server whose dispatcher is populated by `register`.
pub async fn start_server<F>(config: MiddlewareConfig, register: F) -> TestServer
where
    F: FnOnce(&Dispatcher),
{
    let server = MiddlewareServer::new(config);
    let dispatcher = server.dispatcher();
    register(&dispatcher);

    let bound = server.bind().await.unwrap();
    let addr = bound.local_addr();
    let shutdown = Shutdown::new();
    let handle = bound.spawn(&shutdown);

    TestServer {
        addr,
        dispatcher,
        shutdown,
        handle,
    }
}

pub fn http_client() -> reqwest::Client {
    reqwest::Client::builder()
        .pool_max_idle_per_host(0)
        .no_proxy()
        .timeout(Duration::from_secs(5))
        .build()
        .unwrap()
}

/// Write a raw HTTP/1.1 request and read until the server closes.
///
/// A reset after the server aborts counts as a close; whatever arrived before
/// it is returned.
pub async fn raw_http(addr: SocketAddr, request: &str) -> String {
    let mut stream = TcpStream::connect(addr).await.unwrap();
    stream.write_all(request.as_bytes()).await.unwrap();

    let mut response = Vec::new();
    let _ = tokio::time::timeout(Duration::from_secs(5), stream.read_to_end(&mut response))
        .await
        .expect("server did not close the connection");
    String::from_utf8_lossy(&response).into_owned()
}

/// Send one datagram and wait briefly for a reply.
pub async fn datagram(addr: SocketAddr, payload: &[u8]) -> Option<String> {
    let socket = UdpSocket::bind("127.0.0.1:0").await.unwrap();
    socket.connect(addr).await.unwrap();
    socket.send(payload).await.unwrap();

    let mut buffer = vec![0u8; 65_536];
    match tokio::time::timeout(Duration::from_millis(500), socket.recv(&mut buffer)).await {
        Ok(Ok(len)) => Some(String::from_utf8_lossy(&buffer[..len]).into_owned()),
        _ => None,
    }
}
