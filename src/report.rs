//! One-shot call reports.
//!
//! Runs a single GET through a config-built pipeline and summarizes what the
//! resilience layers did, for printing as JSON.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use serde::Serialize;
use url::Url;

use crate::config::ResilienceConfig;
use crate::outcome::{ErrorKind, Outcome};
use crate::resilience::{Pipeline, RetryListener};
use crate::transport::{CallRequest, HyperTransport};

#[derive(Debug, Clone, Serialize)]
pub struct CallReport {
    pub url: String,
    pub layers: Vec<&'static str>,
    pub attempts: usize,
    pub retries: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_kind: Option<ErrorKind>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub elapsed_ms: u64,
}

/// Issue one GET to `url` through the pipeline described by `config`.
pub async fn call_report(config: &ResilienceConfig, url: Url) -> CallReport {
    let retries = Arc::new(AtomicUsize::new(0));
    let counter = retries.clone();
    let listener: RetryListener = Arc::new(move |_outcome: &Outcome, _delay: Duration| {
        counter.fetch_add(1, Ordering::SeqCst);
    });

    let transport = Arc::new(HyperTransport::new(&config.transport));
    let pipeline = Pipeline::from_config(config, transport, Some(listener));

    let request = CallRequest::get(url.clone());
    let start = Instant::now();
    let outcome = pipeline.execute(&request).await;
    let elapsed_ms = start.elapsed().as_millis() as u64;

    let retries = retries.load(Ordering::SeqCst);
    let mut report = CallReport {
        url: url.to_string(),
        layers: pipeline.layers(),
        attempts: retries + 1,
        retries,
        status: None,
        error_kind: None,
        error: None,
        elapsed_ms,
    };

    match outcome {
        Outcome::Response(response) => report.status = Some(response.status.as_u16()),
        Outcome::Failure(failure) => {
            report.error_kind = Some(failure.kind());
            report.error = Some(failure.to_string());
        }
    }

    report
}
