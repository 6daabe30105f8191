//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! All subsystems produce:
//!     → tracing events (structured logs, request/packet spans)
//!     → metrics.rs (counters, gauges, histograms)
//!
//! Consumers:
//!     → logging.rs subscriber (stdout, pretty or JSON)
//!     → Prometheus scrape endpoint (optional)
//! ```
//!
//! # Design Decisions
//! - Request IDs (stream) and packet IDs (datagram) tag every span
//! - Metrics are cheap (atomic increments) and off by default

pub mod logging;
pub mod metrics;
