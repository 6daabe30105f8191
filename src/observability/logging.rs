//! Structured logging.
//!
//! # Responsibilities
//! - Initialize the global tracing subscriber
//! - Choose pretty or JSON output
//!
//! # Design Decisions
//! - `RUST_LOG` wins over the configured level when set
//! - Installing twice is an error the binary reports, not a panic

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::{LogFormat, ObservabilityConfig};

/// Errors encountered while configuring logging.
#[derive(Debug, thiserror::Error)]
pub enum LoggingError {
    #[error("invalid log filter {filter:?}: {message}")]
    Filter { filter: String, message: String },

    #[error("failed to install tracing subscriber: {0}")]
    Install(String),
}

pub fn init_logging(config: &ObservabilityConfig) -> Result<(), LoggingError> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(&config.log_level).map_err(|e| LoggingError::Filter {
            filter: config.log_level.clone(),
            message: e.to_string(),
        })?,
    };

    let registry = tracing_subscriber::registry().with(filter);
    let installed = match config.log_format {
        LogFormat::Pretty => registry.with(fmt::layer()).try_init(),
        LogFormat::Json => registry.with(fmt::layer().json()).try_init(),
    };
    installed.map_err(|e| LoggingError::Install(e.to_string()))
}
