//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the
//! middleware. All types derive Serde traits for deserialization from config
//! files.

use std::fmt;
use std::net::SocketAddr;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Root configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq)]
#[serde(default)]
pub struct MiddlewareConfig {
    /// Transport selection and listener settings.
    pub transport: TransportConfig,

    /// Datagram transport settings.
    pub datagram: DatagramConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Which transport strategy serves requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TransportKind {
    /// HTTP over TCP.
    #[default]
    Tcp,
    /// One text line per UDP datagram.
    Udp,
}

impl TransportKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransportKind::Tcp => "tcp",
            TransportKind::Udp => "udp",
        }
    }
}

impl fmt::Display for TransportKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error for an unrecognised transport name.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown transport {0:?} (expected \"tcp\" or \"udp\")")]
pub struct UnknownTransport(pub String);

impl FromStr for TransportKind {
    type Err = UnknownTransport;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "tcp" => Ok(TransportKind::Tcp),
            "udp" => Ok(TransportKind::Udp),
            _ => Err(UnknownTransport(s.to_string())),
        }
    }
}

/// Listener configuration shared by both transports.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct TransportConfig {
    /// Transport strategy.
    pub kind: TransportKind,

    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,

    /// Maximum concurrent stream connections (backpressure).
    pub max_connections: usize,

    /// Maximum request body read by the stream transport, in bytes.
    pub max_body_bytes: usize,
}

impl TransportConfig {
    /// Replace the port of `bind_address`, keeping its host.
    pub fn set_port(&mut self, port: u16) {
        self.bind_address = match self.bind_address.parse::<SocketAddr>() {
            Ok(mut addr) => {
                addr.set_port(port);
                addr.to_string()
            }
            Err(_) => format!("0.0.0.0:{port}"),
        };
    }
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            kind: TransportKind::Tcp,
            bind_address: "0.0.0.0:8080".to_string(),
            max_connections: 10_000,
            max_body_bytes: 1024 * 1024,
        }
    }
}

/// Datagram transport configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct DatagramConfig {
    /// Receive buffer size; larger packets are rejected.
    pub buffer_size: usize,
}

/// Largest payload a UDP datagram can carry over IPv4.
pub const MAX_DATAGRAM_PAYLOAD: usize = 65_507;

impl Default for DatagramConfig {
    fn default() -> Self {
        Self { buffer_size: 8192 }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log filter (trace, debug, info, warn, error, or an EnvFilter directive).
    pub log_level: String,

    /// Log output format.
    pub log_format: LogFormat,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}
