//! HTTP over TCP.
//!
//! # Responsibilities
//! - Accept connections through the bounded [`Listener`]
//! - Serve HTTP/1.1 and HTTP/2 on each connection (auto-detected)
//! - Assign and echo an `x-request-id`
//! - Decode method, path, query, and form body into a [`Request`]
//! - Encode the [`Response`] as a plain-text HTTP response
//!
//! An after-interceptor failure aborts the exchange: the service returns an
//! error and hyper closes the connection without writing a response.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::body::Body;
use futures_util::future::BoxFuture;
use hyper::body::Incoming;
use hyper::header::{HeaderMap, HeaderValue, CONTENT_LENGTH, CONTENT_TYPE};
use hyper::{StatusCode, Uri};
use hyper_util::rt::{TokioExecutor, TokioIo};
use hyper_util::server::conn::auto::Builder;
use hyper_util::service::TowerToHyperService;
use thiserror::Error;
use tokio::sync::broadcast;
use tower::ServiceBuilder;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::TraceLayer;
use tracing::Instrument;

use crate::config::{TransportConfig, TransportKind};
use crate::dispatch::{Dispatch, DispatchError};
use crate::model::{Method, Request, Response};
use crate::net::connection::ConnectionTracker;
use crate::net::listener::{Listener, ListenerError};
use crate::transport::codec::{merge_form, DecodeError};
use crate::transport::{Transport, TransportError};

/// Returned by the per-exchange service to make hyper drop the connection.
#[derive(Debug, Error)]
#[error("exchange aborted: {0}")]
pub struct ExchangeError(#[from] pub DispatchError);

/// HTTP transport bound to a TCP listener.
pub struct StreamTransport {
    listener: Listener,
    local_addr: SocketAddr,
    max_body_bytes: usize,
    connections: ConnectionTracker,
}

impl StreamTransport {
    pub async fn bind(config: &TransportConfig) -> Result<Self, TransportError> {
        let listener = Listener::bind(config).await?;
        let local_addr = listener.local_addr().map_err(|source| TransportError::Bind {
            address: config.bind_address.clone(),
            source,
        })?;

        Ok(Self {
            listener,
            local_addr,
            max_body_bytes: config.max_body_bytes,
            connections: ConnectionTracker::new(),
        })
    }

    /// Handle on the live connection count.
    pub fn connections(&self) -> ConnectionTracker {
        self.connections.clone()
    }

    /// Accept connections until `shutdown` fires.
    pub async fn run(
        self,
        dispatch: Arc<dyn Dispatch>,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), TransportError> {
        tracing::info!(
            address = %self.local_addr,
            max_connections = self.listener.max_connections(),
            "Stream transport listening"
        );

        loop {
            let accepted = tokio::select! {
                _ = shutdown.recv() => break,
                accepted = self.listener.accept() => accepted,
            };

            let (stream, peer, permit) = match accepted {
                Ok(accepted) => accepted,
                Err(ListenerError::Accept(e)) => {
                    tracing::warn!(error = %e, "Failed to accept connection");
                    continue;
                }
                Err(e) => return Err(e.into()),
            };

            let guard = self.connections.track();
            let span = tracing::debug_span!("connection", connection_id = %guard.id(), peer = %peer);
            let dispatch = Arc::clone(&dispatch);
            let max_body_bytes = self.max_body_bytes;

            tokio::spawn(
                async move {
                    let _permit = permit;
                    let _guard = guard;

                    let service = ServiceBuilder::new()
                        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
                        .layer(TraceLayer::new_for_http())
                        .layer(PropagateRequestIdLayer::x_request_id())
                        .service_fn(move |exchange: hyper::Request<Incoming>| {
                            handle_exchange(Arc::clone(&dispatch), max_body_bytes, exchange)
                        });

                    let builder = Builder::new(TokioExecutor::new());
                    let served = builder
                        .serve_connection(TokioIo::new(stream), TowerToHyperService::new(service))
                        .await;
                    if let Err(e) = served {
                        tracing::debug!(error = %e, "Connection ended with error");
                    }
                }
                .instrument(span),
            );
        }

        tracing::info!(
            open_connections = self.connections.active_count(),
            "Stream transport stopped accepting"
        );
        Ok(())
    }
}

impl Transport for StreamTransport {
    fn kind(&self) -> TransportKind {
        TransportKind::Tcp
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

async fn handle_exchange(
    dispatch: Arc<dyn Dispatch>,
    max_body_bytes: usize,
    exchange: hyper::Request<Incoming>,
) -> Result<hyper::Response<Body>, ExchangeError> {
    let request = match decode(exchange, max_body_bytes).await {
        Ok(request) => request,
        Err(e) => {
            tracing::debug!(error = %e, "Rejected undecodable exchange");
            let rejected = DispatchError::MalformedRequest {
                message: e.to_string(),
            };
            return Ok(encode_response(Response::new(
                rejected.status_code(),
                rejected.to_string(),
            )));
        }
    };

    match tokio::task::spawn_blocking(move || dispatch.dispatch(&request)).await {
        Ok(Ok(response)) => Ok(encode_response(response)),
        Ok(Err(e)) => Err(ExchangeError(e)),
        Err(e) => {
            tracing::error!(error = %e, "Dispatch task panicked");
            Ok(encode_response(Response::new(
                500,
                "internal server error: handler panicked",
            )))
        }
    }
}

async fn decode(
    exchange: hyper::Request<Incoming>,
    max_body_bytes: usize,
) -> Result<Request, DecodeError> {
    let (parts, body) = exchange.into_parts();
    let method = Method::try_from(&parts.method)?;

    if !method.carries_body() {
        return decode_exchange(&parts.method, &parts.uri, &[]);
    }

    if declared_length(&parts.headers).is_some_and(|len| len > max_body_bytes) {
        return Err(DecodeError::BodyTooLarge {
            limit: max_body_bytes,
        });
    }
    let bytes = axum::body::to_bytes(Body::new(body), max_body_bytes)
        .await
        .map_err(|e| DecodeError::Body(e.to_string()))?;

    decode_exchange(&parts.method, &parts.uri, &bytes)
}

fn declared_length(headers: &HeaderMap) -> Option<usize> {
    headers
        .get(CONTENT_LENGTH)?
        .to_str()
        .ok()?
        .parse()
        .ok()
}

/// Build a [`Request`] from the parts of an HTTP exchange.
///
/// Query pairs are read first; for POST, PUT, and PATCH the form body is
/// merged on top, so body values win.
pub fn decode_exchange(
    method: &hyper::Method,
    uri: &Uri,
    body: &[u8],
) -> Result<Request, DecodeError> {
    let method = Method::try_from(method)?;
    let mut request = Request::new(method, uri.path());

    if let Some(query) = uri.query() {
        merge_form(query.as_bytes(), &mut request.params);
    }
    if method.carries_body() {
        merge_form(body, &mut request.params);
    }

    Ok(request)
}

/// Render a [`Response`] as `text/plain` with an explicit length.
pub fn encode_response(response: Response) -> hyper::Response<Body> {
    let status =
        StatusCode::from_u16(response.status_code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    let length = response.body.len();

    let mut encoded = hyper::Response::new(Body::from(response.body));
    *encoded.status_mut() = status;
    let headers = encoded.headers_mut();
    headers.insert(
        CONTENT_TYPE,
        HeaderValue::from_static("text/plain; charset=utf-8"),
    );
    headers.insert(CONTENT_LENGTH, HeaderValue::from(length));
    encoded
}
