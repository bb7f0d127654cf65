//! Composable resilience for outbound HTTP calls.
//!
//! A [`Pipeline`] wraps a [`Transport`] in an ordered list of policies
//! (retry with a fixed backoff schedule, per-attempt timeout) and resolves
//! every call to an [`Outcome`].

pub mod client;
pub mod config;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod outcome;
pub mod report;
pub mod resilience;
pub mod transport;

pub use client::{Client, ClientError};
pub use config::ResilienceConfig;
pub use http::DemoServer;
pub use lifecycle::Shutdown;
pub use outcome::{ErrorKind, Failure, HttpResponse, Outcome};
pub use resilience::{
    BackoffSchedule, Pipeline, Policy, RetryPolicy, TimeoutPolicy, TransientClassifier,
};
pub use transport::{CallRequest, FnTransport, HyperTransport, Transport};
