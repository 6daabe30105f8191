//! One request line per UDP datagram.
//!
//! A packet is `METHOD PATH[?k=v&k=v]`. Query values are taken verbatim and
//! nothing beyond the first line is read. The reply is a single datagram
//! holding only the response body; status codes do not travel.

use std::net::SocketAddr;
use std::sync::Arc;

use futures_util::future::BoxFuture;
use thiserror::Error;
use tokio::net::UdpSocket;
use tokio::sync::broadcast;
use tracing::Instrument;
use uuid::Uuid;

use crate::config::{DatagramConfig, TransportKind};
use crate::dispatch::{Dispatch, DispatchError};
use crate::model::{Method, Request};
use crate::observability::metrics;
use crate::transport::codec::{merge_raw_query, DecodeError};
use crate::transport::{Transport, TransportError};

/// Why a received packet produced no reply.
#[derive(Debug, Error)]
pub enum PacketError {
    #[error("packet exceeds the {limit}-byte receive buffer")]
    Oversized { limit: usize },

    #[error(transparent)]
    Decode(#[from] DecodeError),

    #[error(transparent)]
    Dispatch(#[from] DispatchError),

    #[error("dispatch task failed: {0}")]
    Panicked(String),

    #[error("failed to send reply: {0}")]
    Send(#[source] std::io::Error),
}

impl PacketError {
    /// Label for the dropped-packet counter.
    pub fn reason(&self) -> &'static str {
        match self {
            PacketError::Oversized { .. } => "oversized",
            PacketError::Decode(_) => "undecodable",
            PacketError::Dispatch(_) => "after_hook",
            PacketError::Panicked(_) => "panicked",
            PacketError::Send(_) => "send_failed",
        }
    }
}

/// UDP transport with a single sequential receive loop.
pub struct DatagramTransport {
    socket: UdpSocket,
    local_addr: SocketAddr,
    buffer_size: usize,
}

impl DatagramTransport {
    pub async fn bind(address: &str, config: &DatagramConfig) -> Result<Self, TransportError> {
        let addr: SocketAddr = address
            .parse()
            .map_err(|_| TransportError::Address(address.to_string()))?;
        let bind_error = |source| TransportError::Bind {
            address: address.to_string(),
            source,
        };

        let socket = UdpSocket::bind(addr).await.map_err(bind_error)?;
        let local_addr = socket.local_addr().map_err(bind_error)?;

        Ok(Self {
            socket,
            local_addr,
            buffer_size: config.buffer_size,
        })
    }

    /// Receive, dispatch, and reply one packet at a time until `shutdown`
    /// fires. Per-packet failures are logged and skipped.
    pub async fn run(
        self,
        dispatch: Arc<dyn Dispatch>,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), TransportError> {
        tracing::info!(
            address = %self.local_addr,
            buffer_size = self.buffer_size,
            "Datagram transport listening"
        );

        // One spare byte tells a packet that filled the buffer apart from one
        // that was cut short.
        let mut buffer = vec![0u8; self.buffer_size + 1];

        loop {
            let received = tokio::select! {
                _ = shutdown.recv() => break,
                received = self.socket.recv_from(&mut buffer) => received,
            };

            let (len, peer) = match received {
                Ok(received) => received,
                Err(e) => {
                    tracing::warn!(error = %e, "Datagram receive failed");
                    continue;
                }
            };

            let packet_id = Uuid::new_v4();
            let span = tracing::debug_span!("packet", packet_id = %packet_id, peer = %peer, len);
            let outcome = self
                .handle_packet(&buffer[..len], peer, Arc::clone(&dispatch))
                .instrument(span.clone())
                .await;

            if let Err(e) = outcome {
                metrics::record_datagram_dropped(e.reason());
                span.in_scope(|| tracing::warn!(reason = e.reason(), error = %e, "Dropped packet"));
            }
        }

        tracing::info!("Datagram transport stopped");
        Ok(())
    }

    async fn handle_packet(
        &self,
        packet: &[u8],
        peer: SocketAddr,
        dispatch: Arc<dyn Dispatch>,
    ) -> Result<(), PacketError> {
        if packet.len() > self.buffer_size {
            return Err(PacketError::Oversized {
                limit: self.buffer_size,
            });
        }

        let request = decode_packet(packet)?;
        tracing::debug!(route = %request.routing_key(), "Decoded packet");

        let response = tokio::task::spawn_blocking(move || dispatch.dispatch(&request))
            .await
            .map_err(|e| PacketError::Panicked(e.to_string()))??;

        self.socket
            .send_to(response.body.as_bytes(), peer)
            .await
            .map_err(PacketError::Send)?;
        Ok(())
    }
}

impl Transport for DatagramTransport {
    fn kind(&self) -> TransportKind {
        TransportKind::Udp
    }

    fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    fn start(
        self: Box<Self>,
        dispatch: Arc<dyn Dispatch>,
        shutdown: broadcast::Receiver<()>,
    ) -> BoxFuture<'static, Result<(), TransportError>> {
        Box::pin((*self).run(dispatch, shutdown))
    }
}

/// Decode a received packet into a [`Request`].
pub fn decode_packet(packet: &[u8]) -> Result<Request, DecodeError> {
    let text = std::str::from_utf8(packet).map_err(|_| DecodeError::NotUtf8)?;
    decode_line(text)
}

/// Decode the first line of `text` as `METHOD PATH[?QUERY]`.
pub fn decode_line(text: &str) -> Result<Request, DecodeError> {
    let line = text.lines().next().unwrap_or_default().trim_end_matches('\r');
    if line.trim().is_empty() {
        return Err(DecodeError::Empty);
    }

    let mut tokens = line.split_whitespace();
    let (Some(method), Some(target)) = (tokens.next(), tokens.next()) else {
        return Err(DecodeError::MissingTarget {
            line: line.to_string(),
        });
    };

    let method: Method = method.parse()?;
    let (path, query) = match target.split_once('?') {
        Some((path, query)) => (path, Some(query)),
        None => (target, None),
    };

    let mut request = Request::new(method, path);
    if let Some(query) = query {
        merge_raw_query(query, &mut request.params);
    }
    Ok(request)
}
