//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! All subsystems produce:
//!     → logging.rs (structured log events)
//!     → metrics.rs (counters, histograms)
//!
//! Consumers:
//!     → Log aggregation (stdout)
//!     → Metrics endpoint (Prometheus scrape)
//! ```
//!
//! # Design Decisions
//! - Structured fields on every event, request ID included
//! - Metrics are cheap (atomic increments) and no-ops without a recorder
//! - Stage anomalies are both logged and counted

pub mod logging;
pub mod metrics;
