//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (deadlines > 0, statuses in range)
//! - Reject classifier settings that can never take effect
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: ResilienceConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::net::SocketAddr;

use crate::config::schema::ResilienceConfig;
use crate::outcome::ErrorKind;

const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

/// A single semantic problem in a configuration.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("timeout.attempt_ms must be greater than zero")]
    ZeroDeadline,

    #[error("transport.max_body_bytes must be greater than zero")]
    ZeroBodyLimit,

    #[error("retry.transient_kinds must not contain 'cancelled'")]
    CancelledIsTransient,

    #[error("retry.transient_statuses contains invalid status {0}")]
    InvalidStatus(u16),

    #[error("retry.transient_application_errors contains an empty tag")]
    EmptyApplicationTag,

    #[error("{field} is not a valid socket address: '{value}'")]
    InvalidAddress { field: &'static str, value: String },

    #[error("observability.log_level '{0}' is not one of trace, debug, info, warn, error")]
    UnknownLogLevel(String),
}

pub fn validate_config(config: &ResilienceConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.timeout.attempt_ms == Some(0) {
        errors.push(ValidationError::ZeroDeadline);
    }

    if config.transport.max_body_bytes == 0 {
        errors.push(ValidationError::ZeroBodyLimit);
    }

    if config.retry.transient_kinds.contains(&ErrorKind::Cancelled) {
        errors.push(ValidationError::CancelledIsTransient);
    }

    for status in &config.retry.transient_statuses {
        if !(100..=599).contains(status) {
            errors.push(ValidationError::InvalidStatus(*status));
        }
    }

    if config
        .retry
        .transient_application_errors
        .iter()
        .any(|tag| tag.trim().is_empty())
    {
        errors.push(ValidationError::EmptyApplicationTag);
    }

    check_address(&mut errors, "demo.bind_address", &config.demo.bind_address);
    if config.observability.metrics_enabled {
        check_address(
            &mut errors,
            "observability.metrics_address",
            &config.observability.metrics_address,
        );
    }

    let level = config.observability.log_level.to_ascii_lowercase();
    if !LOG_LEVELS.contains(&level.as_str()) {
        errors.push(ValidationError::UnknownLogLevel(
            config.observability.log_level.clone(),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn check_address(errors: &mut Vec<ValidationError>, field: &'static str, value: &str) {
    if value.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::InvalidAddress {
            field,
            value: value.to_string(),
        });
    }
}
