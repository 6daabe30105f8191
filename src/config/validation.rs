//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges and address formats
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Pure function: MiddlewareConfig → Result<(), Vec<ValidationError>>

use std::net::SocketAddr;

use crate::config::schema::{MiddlewareConfig, MAX_DATAGRAM_PAYLOAD};

/// A single semantic problem in a configuration.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("{field}: {value:?} is not a socket address")]
    InvalidAddress { field: &'static str, value: String },

    #[error("{field} must be greater than zero")]
    Zero { field: &'static str },

    #[error("datagram.buffer_size {0} exceeds the 65507 byte UDP payload limit")]
    BufferTooLarge(usize),
}

pub fn validate_config(config: &MiddlewareConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.transport.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::InvalidAddress {
            field: "transport.bind_address",
            value: config.transport.bind_address.clone(),
        });
    }
    if config.transport.max_connections == 0 {
        errors.push(ValidationError::Zero {
            field: "transport.max_connections",
        });
    }
    if config.transport.max_body_bytes == 0 {
        errors.push(ValidationError::Zero {
            field: "transport.max_body_bytes",
        });
    }
    if config.datagram.buffer_size == 0 {
        errors.push(ValidationError::Zero {
            field: "datagram.buffer_size",
        });
    } else if config.datagram.buffer_size > MAX_DATAGRAM_PAYLOAD {
        errors.push(ValidationError::BufferTooLarge(config.datagram.buffer_size));
    }
    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::InvalidAddress {
            field: "observability.metrics_address",
            value: config.observability.metrics_address.clone(),
        });
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
