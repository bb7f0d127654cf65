//! Timeout enforcement.
//!
//! # Responsibilities
//! - Bound a single inner call with a deadline
//! - Cancel the in-flight call on expiry and wait until it has stopped
//!
//! # Design Decisions
//! - Uses Tokio's timer; the inner call gets a child cancellation token
//! - Deadline expiry yields `Timeout`; caller cancellation stays `Cancelled`
//! - The inner call's cancellation result becomes the timeout's cause

use std::time::Duration;

use futures_util::future::BoxFuture;
use tokio_util::sync::CancellationToken;

use crate::observability::metrics;
use crate::outcome::{ErrorKind, Failure, Outcome};
use crate::resilience::pipeline::{Next, Policy};

/// Cause attached to `Timeout` failures.
#[derive(Debug, thiserror::Error)]
#[error("attempt exceeded deadline of {}ms", .deadline.as_millis())]
pub struct TimeoutElapsed {
    pub deadline: Duration,
    #[source]
    pub inner: Option<Failure>,
}

/// Per-call deadline policy.
#[derive(Debug, Clone, Copy)]
pub struct TimeoutPolicy {
    deadline: Duration,
}

impl TimeoutPolicy {
    pub fn new(deadline: Duration) -> Self {
        Self { deadline }
    }

    pub fn deadline(&self) -> Duration {
        self.deadline
    }

    async fn run(&self, next: &Next<'_>, cancel: CancellationToken) -> Outcome {
        let attempt = cancel.child_token();
        let mut inner = next(attempt.clone());

        tokio::select! {
            outcome = &mut inner => outcome,
            _ = tokio::time::sleep(self.deadline) => {
                attempt.cancel();
                // The attempt must observe its cancellation before we report.
                let outcome = inner.await;

                if cancel.is_cancelled() {
                    return outcome;
                }

                tracing::warn!(
                    deadline_ms = self.deadline.as_millis() as u64,
                    inner = %outcome.label(),
                    "Attempt timed out"
                );
                metrics::record_timeout();

                let inner = match outcome {
                    Outcome::Failure(failure) => Some(failure),
                    Outcome::Response(_) => None,
                };
                Outcome::Failure(Failure::with_cause(
                    ErrorKind::Timeout,
                    TimeoutElapsed {
                        deadline: self.deadline,
                        inner,
                    },
                ))
            }
        }
    }
}

impl Policy for TimeoutPolicy {
    fn name(&self) -> &'static str {
        "timeout"
    }

    fn execute<'a, 'n: 'a>(
        &'a self,
        next: &'a Next<'n>,
        cancel: CancellationToken,
    ) -> BoxFuture<'a, Outcome> {
        Box::pin(self.run(next, cancel))
    }
}
