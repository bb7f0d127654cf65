//! Retry logic.
//!
//! # Responsibilities
//! - Re-invoke the inner call while its outcome is transient
//! - Walk the backoff schedule; its length is the retry budget
//! - Notify a listener once per retry, before the wait
//!
//! # Design Decisions
//! - An exhausted call returns the last observed outcome, never a wrapper error
//! - Non-transient outcomes return at once, even after earlier transient ones
//! - Cancellation is never retried; cancelling during a wait ends the call

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use futures_util::future::BoxFuture;
use tokio_util::sync::CancellationToken;

use crate::observability::metrics;
use crate::outcome::{Failure, Outcome};
use crate::resilience::classifier::TransientClassifier;
use crate::resilience::pipeline::{Next, Policy};
use crate::resilience::schedule::BackoffSchedule;

/// Callback invoked with the transient outcome and the delay about to be waited.
pub type RetryListener = Arc<dyn Fn(&Outcome, Duration) + Send + Sync>;

/// Per-call retry state. Created by each `execute` and never shared.
///
/// The call id lives on the enclosing `call` span, so events logged here
/// carry it without repeating it.
#[derive(Debug, Default)]
struct RetryContext {
    /// Number of retries already performed.
    attempt_index: usize,
    last_outcome: Option<Outcome>,
}

/// Wait-and-retry policy driven by an explicit schedule.
#[derive(Clone)]
pub struct RetryPolicy {
    schedule: BackoffSchedule,
    classifier: TransientClassifier,
    listener: Option<RetryListener>,
}

impl RetryPolicy {
    pub fn new(schedule: BackoffSchedule, classifier: TransientClassifier) -> Self {
        Self {
            schedule,
            classifier,
            listener: None,
        }
    }

    /// Register the per-retry notification.
    pub fn on_retry<F>(self, listener: F) -> Self
    where
        F: Fn(&Outcome, Duration) + Send + Sync + 'static,
    {
        self.with_listener(Arc::new(listener))
    }

    pub fn with_listener(mut self, listener: RetryListener) -> Self {
        self.listener = Some(listener);
        self
    }

    pub fn schedule(&self) -> &BackoffSchedule {
        &self.schedule
    }

    pub fn classifier(&self) -> &TransientClassifier {
        &self.classifier
    }

    /// Delay before the next attempt, or `None` if the last outcome is final.
    fn next_delay(&self, ctx: &RetryContext, outcome: &Outcome) -> Option<Duration> {
        if outcome.is_cancelled() || !self.classifier.is_transient(outcome) {
            return None;
        }

        match self.schedule.delay_for(ctx.attempt_index) {
            Some(delay) => Some(delay),
            None => {
                tracing::warn!(
                    attempts = ctx.attempt_index + 1,
                    outcome = %outcome.label(),
                    "Retries exhausted"
                );
                metrics::record_exhausted();
                None
            }
        }
    }

    async fn run(&self, next: &Next<'_>, cancel: CancellationToken) -> Outcome {
        let mut ctx = RetryContext::default();

        loop {
            let outcome = next(cancel.clone()).await;
            metrics::record_attempt(&outcome);
            tracing::debug!(
                attempt = ctx.attempt_index + 1,
                outcome = %outcome.label(),
                "Attempt finished"
            );

            let Some(delay) = self.next_delay(&ctx, &outcome) else {
                return outcome;
            };

            tracing::info!(
                retry = ctx.attempt_index + 1,
                delay_ms = delay.as_millis() as u64,
                outcome = %outcome.label(),
                "Retrying call"
            );
            metrics::record_retry(&outcome, delay);
            if let Some(listener) = &self.listener {
                listener(&outcome, delay);
            }
            ctx.last_outcome = Some(outcome);

            tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    tracing::info!(
                        last_outcome = ?ctx.last_outcome.as_ref().map(Outcome::label),
                        "Call cancelled during backoff"
                    );
                    return Outcome::Failure(Failure::cancelled());
                }
                _ = tokio::time::sleep(delay) => {}
            }

            ctx.attempt_index += 1;
        }
    }
}

impl Policy for RetryPolicy {
    fn name(&self) -> &'static str {
        "retry"
    }

    fn execute<'a, 'n: 'a>(
        &'a self,
        next: &'a Next<'n>,
        cancel: CancellationToken,
    ) -> BoxFuture<'a, Outcome> {
        Box::pin(self.run(next, cancel))
    }
}

impl fmt::Debug for RetryPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RetryPolicy")
            .field("schedule", &self.schedule)
            .field("classifier", &self.classifier)
            .field("listener", &self.listener.is_some())
            .finish()
    }
}
