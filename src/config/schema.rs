//! Configuration schema definitions.
//!
//! All types derive Serde traits for deserialization from config files.

use std::time::Duration;

use hyper::StatusCode;
use serde::{Deserialize, Serialize};

use crate::outcome::ErrorKind;
use crate::resilience::{BackoffSchedule, TransientClassifier};

/// Root configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ResilienceConfig {
    /// Retry policy settings.
    pub retry: RetryConfig,

    /// Per-attempt timeout settings.
    pub timeout: TimeoutConfig,

    /// HTTP transport settings.
    pub transport: TransportConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,

    /// Demo fixture server settings.
    pub demo: DemoConfig,
}

/// Retry configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Enable retries.
    pub enabled: bool,

    /// Waits between attempts, in milliseconds. The length is the retry budget.
    pub backoff_ms: Vec<u64>,

    /// Failure kinds treated as transient on top of transport failures
    /// (e.g. "timeout").
    pub transient_kinds: Vec<ErrorKind>,

    /// Application error tags treated as transient.
    pub transient_application_errors: Vec<String>,

    /// Extra status codes treated as transient on top of 5xx and 408.
    pub transient_statuses: Vec<u16>,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            backoff_ms: vec![1000, 1500, 2000],
            transient_kinds: Vec::new(),
            transient_application_errors: Vec::new(),
            transient_statuses: Vec::new(),
        }
    }
}

impl RetryConfig {
    pub fn schedule(&self) -> BackoffSchedule {
        BackoffSchedule::from_millis(&self.backoff_ms)
    }

    pub fn classifier(&self) -> TransientClassifier {
        let mut builder = TransientClassifier::builder();
        for kind in &self.transient_kinds {
            builder = builder.or_kind(*kind);
        }
        for tag in &self.transient_application_errors {
            builder = builder.or_application(tag.clone());
        }
        for code in &self.transient_statuses {
            match StatusCode::from_u16(*code) {
                Ok(status) => builder = builder.or_status(status),
                Err(_) => tracing::warn!(status = code, "Ignoring invalid transient status"),
            }
        }
        builder.build()
    }
}

/// Timeout configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Deadline for each individual attempt in milliseconds. No timeout policy when absent.
    pub attempt_ms: Option<u64>,
}

impl TimeoutConfig {
    pub fn attempt_deadline(&self) -> Option<Duration> {
        self.attempt_ms.map(Duration::from_millis)
    }
}

/// Transport configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TransportConfig {
    /// TCP connect timeout in milliseconds.
    pub connect_timeout_ms: Option<u64>,

    /// Maximum response body size buffered per attempt.
    pub max_body_bytes: usize,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            connect_timeout_ms: Some(5000),
            max_body_bytes: 2 * 1024 * 1024, // 2MB
        }
    }
}

impl TransportConfig {
    pub fn connect_timeout(&self) -> Option<Duration> {
        self.connect_timeout_ms.map(Duration::from_millis)
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: false,
            metrics_address: "127.0.0.1:9090".to_string(),
        }
    }
}

/// Demo fixture server configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct DemoConfig {
    /// Bind address (e.g., "127.0.0.1:5282").
    pub bind_address: String,

    /// Delay before `/slow` answers, in milliseconds.
    pub slow_delay_ms: u64,

    /// Delay before `/transientError` and `/timeout` answer, in milliseconds.
    pub error_delay_ms: u64,
}

impl Default for DemoConfig {
    fn default() -> Self {
        Self {
            bind_address: "127.0.0.1:5282".to_string(),
            slow_delay_ms: 5000,
            error_delay_ms: 500,
        }
    }
}

impl DemoConfig {
    pub fn slow_delay(&self) -> Duration {
        Duration::from_millis(self.slow_delay_ms)
    }

    pub fn error_delay(&self) -> Duration {
        Duration::from_millis(self.error_delay_ms)
    }
}
