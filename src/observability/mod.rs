//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Pipeline, policies and transport produce:
//!     → logging.rs (structured log events, call spans)
//!     → metrics.rs (attempt/retry/timeout counters, delay histogram)
//!
//! Consumers:
//!     → stdout (tracing-subscriber fmt layer)
//!     → Metrics endpoint (Prometheus scrape)
//! ```
//!
//! # Design Decisions
//! - Every call carries a call id span field
//! - Metrics are cheap no-ops until a recorder is installed
//! - Installation is idempotent so tests and binaries can share setup

pub mod logging;
pub mod metrics;

pub use logging::init_logging;
pub use metrics::init_metrics;
