//! Policy composition.
//!
//! A pipeline is a fixed, ordered list of policies around a transport:
//!
//! ```text
//! execute(request)
//!     → policies[0].execute(next₀)          (outermost, usually retry)
//!         → next₀() = policies[1].execute(next₁)   (usually timeout)
//!             → next₁() = transport.send(request)
//! ```
//!
//! Order is whatever the builder was given. Retry outside timeout gives each
//! attempt its own deadline; the reverse bounds all attempts together.

use std::fmt;
use std::sync::Arc;

use futures_util::future::BoxFuture;
use tracing::Instrument;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::config::ResilienceConfig;
use crate::outcome::Outcome;
use crate::resilience::retries::{RetryListener, RetryPolicy};
use crate::resilience::timeouts::TimeoutPolicy;
use crate::transport::{CallRequest, Transport};

/// The remainder of the chain, as seen from inside a policy.
///
/// Each invocation issues one fresh call through every inner layer. The token
/// passed in is the one inner layers observe for cancellation.
pub type Next<'n> = dyn Fn(CancellationToken) -> BoxFuture<'n, Outcome> + Send + Sync + 'n;

/// A layer of resilience behaviour wrapped around an inner call.
pub trait Policy: Send + Sync {
    fn name(&self) -> &'static str;

    fn execute<'a, 'n: 'a>(
        &'a self,
        next: &'a Next<'n>,
        cancel: CancellationToken,
    ) -> BoxFuture<'a, Outcome>;
}

/// Static composition of policies around a transport.
#[derive(Clone)]
pub struct Pipeline {
    policies: Arc<[Arc<dyn Policy>]>,
    transport: Arc<dyn Transport>,
}

impl Pipeline {
    pub fn builder(transport: Arc<dyn Transport>) -> PipelineBuilder {
        PipelineBuilder::new(transport)
    }

    /// Build the standard stack: retry outermost, per-attempt timeout inside.
    pub fn from_config(
        config: &ResilienceConfig,
        transport: Arc<dyn Transport>,
        listener: Option<RetryListener>,
    ) -> Self {
        let mut builder = Self::builder(transport);

        if config.retry.enabled {
            let mut retry = RetryPolicy::new(config.retry.schedule(), config.retry.classifier());
            if let Some(listener) = listener {
                retry = retry.with_listener(listener);
            }
            builder = builder.policy(retry);
        }

        if let Some(deadline) = config.timeout.attempt_deadline() {
            builder = builder.policy(TimeoutPolicy::new(deadline));
        }

        builder.build()
    }

    /// Policy names from outermost to innermost.
    pub fn layers(&self) -> Vec<&'static str> {
        self.policies.iter().map(|p| p.name()).collect()
    }

    pub async fn execute(&self, request: &CallRequest) -> Outcome {
        self.execute_with_cancel(request, CancellationToken::new())
            .await
    }

    /// Run one logical call; cancelling `cancel` aborts it wherever it is.
    pub async fn execute_with_cancel(
        &self,
        request: &CallRequest,
        cancel: CancellationToken,
    ) -> Outcome {
        // Sole source of the call id; inner policies log under this span.
        let span = tracing::info_span!(
            "call",
            call_id = %Uuid::new_v4(),
            method = %request.method,
            url = %request.url,
        );

        async {
            let outcome = self.dispatch(0, request, cancel).await;
            tracing::debug!(outcome = %outcome.label(), "Call finished");
            outcome
        }
        .instrument(span)
        .await
    }

    fn dispatch<'a>(
        &'a self,
        depth: usize,
        request: &'a CallRequest,
        cancel: CancellationToken,
    ) -> BoxFuture<'a, Outcome> {
        match self.policies.get(depth) {
            None => self.transport.send(request, cancel),
            Some(policy) => Box::pin(async move {
                let next = move |token: CancellationToken| self.dispatch(depth + 1, request, token);
                policy.execute(&next, cancel).await
            }),
        }
    }
}

impl fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pipeline")
            .field("layers", &self.layers())
            .finish()
    }
}

/// Collects policies in nesting order; the first added is outermost.
pub struct PipelineBuilder {
    policies: Vec<Arc<dyn Policy>>,
    transport: Arc<dyn Transport>,
}

impl PipelineBuilder {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self {
            policies: Vec::new(),
            transport,
        }
    }

    pub fn policy(mut self, policy: impl Policy + 'static) -> Self {
        self.policies.push(Arc::new(policy));
        self
    }

    pub fn build(self) -> Pipeline {
        Pipeline {
            policies: self.policies.into(),
            transport: self.transport,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::outcome::{ErrorKind, Failure, HttpResponse};
    use crate::resilience::{BackoffSchedule, TransientClassifier};
    use crate::transport::FnTransport;
    use hyper::StatusCode;
    use std::collections::HashSet;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;
    use std::time::Duration;
    use tokio::time::Instant;

    /// Log sink shared with a scoped fmt subscriber.
    #[derive(Clone, Default)]
    struct CapturedLogs(Arc<Mutex<Vec<u8>>>);

    impl std::io::Write for CapturedLogs {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    impl CapturedLogs {
        fn text(&self) -> String {
            String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
        }
    }

    fn call_ids(line: &str) -> Vec<&str> {
        line.match_indices("call_id=")
            .map(|(at, key)| {
                let rest = &line[at + key.len()..];
                let end = rest
                    .find(|c: char| !(c.is_ascii_hexdigit() || c == '-'))
                    .unwrap_or(rest.len());
                &rest[..end]
            })
            .collect()
    }

    fn request() -> CallRequest {
        CallRequest::get("http://fixture.local/slow".parse().unwrap())
    }

    fn slow_transport(calls: Arc<AtomicUsize>, work: Duration) -> Arc<dyn Transport> {
        Arc::new(FnTransport::new(move |_req, cancel| {
            calls.fetch_add(1, Ordering::SeqCst);
            async move {
                tokio::select! {
                    _ = cancel.cancelled() => Outcome::from(Failure::cancelled()),
                    _ = tokio::time::sleep(work) => Outcome::from(HttpResponse::new(StatusCode::OK, "slow")),
                }
            }
        }))
    }

    #[tokio::test]
    async fn empty_pipeline_calls_transport_once() {
        let calls = Arc::new(AtomicUsize::new(0));
        let pipeline = Pipeline::builder(slow_transport(calls.clone(), Duration::ZERO)).build();

        let outcome = pipeline.execute(&request()).await;
        assert_eq!(outcome.status(), Some(StatusCode::OK));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(pipeline.layers().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn retry_outside_timeout_gives_each_attempt_its_own_deadline() {
        let calls = Arc::new(AtomicUsize::new(0));
        let retries = Arc::new(AtomicUsize::new(0));
        let counter = retries.clone();

        let pipeline = Pipeline::builder(slow_transport(calls.clone(), Duration::from_secs(5)))
            .policy(
                RetryPolicy::new(
                    BackoffSchedule::from_millis(&[1000, 1500, 2000]),
                    TransientClassifier::builder()
                        .or_kind(ErrorKind::Timeout)
                        .build(),
                )
                .on_retry(move |_, _| {
                    counter.fetch_add(1, Ordering::SeqCst);
                }),
            )
            .policy(TimeoutPolicy::new(Duration::from_secs(1)))
            .build();
        assert_eq!(pipeline.layers(), vec!["retry", "timeout"]);

        let start = Instant::now();
        let outcome = pipeline.execute(&request()).await;
        let elapsed = start.elapsed();

        assert_eq!(outcome.kind(), Some(ErrorKind::Timeout));
        assert_eq!(calls.load(Ordering::SeqCst), 4);
        assert_eq!(retries.load(Ordering::SeqCst), 3);
        // 4 deadlines + 1000 + 1500 + 2000 of backoff
        assert!(elapsed >= Duration::from_millis(8500), "elapsed {:?}", elapsed);
        assert!(elapsed < Duration::from_millis(8600), "elapsed {:?}", elapsed);
    }

    #[tokio::test(start_paused = true)]
    async fn timeout_outside_retry_bounds_all_attempts_together() {
        let calls = Arc::new(AtomicUsize::new(0));
        let pipeline = Pipeline::builder(slow_transport(calls.clone(), Duration::from_secs(5)))
            .policy(TimeoutPolicy::new(Duration::from_secs(1)))
            .policy(RetryPolicy::new(
                BackoffSchedule::from_millis(&[1000, 1500, 2000]),
                TransientClassifier::http(),
            ))
            .build();

        let start = Instant::now();
        let outcome = pipeline.execute(&request()).await;

        assert_eq!(outcome.kind(), Some(ErrorKind::Timeout));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(start.elapsed() < Duration::from_millis(1100));
    }

    #[tokio::test]
    async fn shared_pipeline_serves_concurrent_calls_independently() {
        let calls = Arc::new(AtomicUsize::new(0));
        let transport = Arc::new(FnTransport::new({
            let calls = calls.clone();
            move |req: &CallRequest, _cancel| {
                calls.fetch_add(1, Ordering::SeqCst);
                let status = if req.url.path() == "/transientError" {
                    StatusCode::INTERNAL_SERVER_ERROR
                } else {
                    StatusCode::OK
                };
                async move { Outcome::from(HttpResponse::new(status, "")) }
            }
        }));
        let pipeline = Arc::new(
            Pipeline::builder(transport)
                .policy(RetryPolicy::new(
                    BackoffSchedule::from_millis(&[1, 1]),
                    TransientClassifier::http(),
                ))
                .build(),
        );

        let mut handles = Vec::new();
        for i in 0..8 {
            let pipeline = pipeline.clone();
            handles.push(tokio::spawn(async move {
                let path = if i % 2 == 0 { "/transientError" } else { "/" };
                let req = CallRequest::get(format!("http://fixture.local{}", path).parse().unwrap());
                pipeline.execute(&req).await.status()
            }));
        }

        let mut errors = 0;
        for handle in handles {
            if handle.await.unwrap() == Some(StatusCode::INTERNAL_SERVER_ERROR) {
                errors += 1;
            }
        }
        assert_eq!(errors, 4);
        // 4 failing calls × 3 attempts + 4 successful calls × 1 attempt
        assert_eq!(calls.load(Ordering::SeqCst), 16);
    }

    #[test]
    fn from_config_orders_retry_then_timeout() {
        let mut config = ResilienceConfig::default();
        config.timeout.attempt_ms = Some(1000);
        let transport = slow_transport(Arc::new(AtomicUsize::new(0)), Duration::ZERO);

        let pipeline = Pipeline::from_config(&config, transport.clone(), None);
        assert_eq!(pipeline.layers(), vec!["retry", "timeout"]);

        config.retry.enabled = false;
        config.timeout.attempt_ms = None;
        let pipeline = Pipeline::from_config(&config, transport, None);
        assert!(pipeline.layers().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn each_call_logs_under_a_single_call_id() {
        let logs = CapturedLogs::default();
        let writer = logs.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(move || writer.clone())
            .with_ansi(false)
            .with_max_level(tracing::Level::DEBUG)
            .finish();
        let _guard = tracing::subscriber::set_default(subscriber);

        let transport = Arc::new(FnTransport::new(|_req: &CallRequest, _cancel| async {
            Outcome::from(HttpResponse::new(StatusCode::INTERNAL_SERVER_ERROR, ""))
        }));
        let pipeline = Pipeline::builder(transport)
            .policy(RetryPolicy::new(
                BackoffSchedule::from_millis(&[1]),
                TransientClassifier::http(),
            ))
            .build();

        pipeline.execute(&request()).await;
        pipeline.execute(&request()).await;

        let text = logs.text();
        let retry_lines: Vec<&str> = text.lines().filter(|l| l.contains("Retrying call")).collect();
        assert_eq!(retry_lines.len(), 2, "{text}");

        let mut distinct = HashSet::new();
        for line in text.lines().filter(|l| l.contains("call{")) {
            let ids = call_ids(line);
            assert_eq!(ids.len(), 1, "one call id per event: {line}");
            assert!(!ids[0].is_empty(), "{line}");
            distinct.insert(ids[0].to_string());
        }
        for line in retry_lines {
            assert!(line.contains("call{"), "retry event outside call span: {line}");
        }
        assert_eq!(distinct.len(), 2, "{text}");
    }
}
