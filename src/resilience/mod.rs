//! Resilience subsystem.
//!
//! # Data Flow
//! ```text
//! Call through a pipeline:
//!     → pipeline.rs (nest policies in the configured order)
//!     → retries.rs (re-run the inner call while the outcome is transient)
//!         → classifier.rs (is this outcome transient?)
//!         → schedule.rs (how long to wait, how many retries remain)
//!     → timeouts.rs (bound each attempt, cancel it on expiry)
//!     → transport (one network send)
//! ```
//!
//! # Design Decisions
//! - Classifier, schedule and pipeline are immutable and shared across calls
//! - Retry state lives in a per-call context, never in the policy
//! - The backoff schedule is an explicit list; nothing is computed
//! - All resilience logic is composable middleware

pub mod classifier;
pub mod pipeline;
pub mod retries;
pub mod schedule;
pub mod timeouts;

pub use classifier::{ClassifierBuilder, TransientClassifier};
pub use pipeline::{Next, Pipeline, PipelineBuilder, Policy};
pub use retries::{RetryListener, RetryPolicy};
pub use schedule::BackoffSchedule;
pub use timeouts::{TimeoutElapsed, TimeoutPolicy};
