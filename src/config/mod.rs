//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → MiddlewareConfig (validated, immutable)
//!     → CLI overrides (--transport, --port) applied by the binary
//! ```
//!
//! # Design Decisions
//! - Config is read once at startup; the route table never depends on it
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, parse_config, ConfigError};
pub use schema::{
    DatagramConfig, LogFormat, MiddlewareConfig, ObservabilityConfig, TransportConfig,
    TransportKind, UnknownTransport,
};
pub use validation::{validate_config, ValidationError};
