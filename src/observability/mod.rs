//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! All subsystems produce:
//!     → logging.rs (structured log events)
//!     → metrics.rs (counters, histograms)
//!
//! Consumers:
//!     → stderr (pretty for terminals, JSON for log shippers)
//!     → Metrics endpoint (Prometheus scrape, off by default)
//! ```
//!
//! # Design Decisions
//! - Request ID flows through every proxy log line
//! - Metrics are cheap (atomic increments) and safe to record without an exporter

pub mod logging;
pub mod metrics;
