//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Candidate locations must be absolute http(s) URLs
//! - Timeouts, intervals and attempt bounds must be non-zero
//! - The resend cooldown must fit inside the code lifetime
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: ClientConfig → Result<(), Vec<ValidationError>>

use thiserror::Error;
use url::Url;

use crate::config::schema::{CandidateConfig, ClientConfig};

/// A single semantic problem in the configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{field}: {reason}")]
pub struct ValidationError {
    pub field: String,
    pub reason: String,
}

impl ValidationError {
    fn new(field: &str, reason: impl Into<String>) -> Self {
        Self {
            field: field.to_string(),
            reason: reason.into(),
        }
    }
}

/// Validate a parsed configuration.
pub fn validate_config(config: &ClientConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    check_candidate("discovery.preferred", &config.discovery.preferred, &mut errors);
    check_candidate("discovery.fallback", &config.discovery.fallback, &mut errors);

    let workflow = &config.workflow;
    if workflow.request_timeout_ms == 0 {
        errors.push(ValidationError::new("workflow.request_timeout_ms", "must be greater than zero"));
    }
    if !(4..=10).contains(&workflow.code_length) {
        errors.push(ValidationError::new("workflow.code_length", "must be between 4 and 10"));
    }
    if workflow.code_expiry_secs == 0 {
        errors.push(ValidationError::new("workflow.code_expiry_secs", "must be greater than zero"));
    }
    if workflow.resend_cooldown_secs >= workflow.code_expiry_secs {
        errors.push(ValidationError::new(
            "workflow.resend_cooldown_secs",
            "must be shorter than code_expiry_secs",
        ));
    }
    if workflow.tick_interval_ms == 0 {
        errors.push(ValidationError::new("workflow.tick_interval_ms", "must be greater than zero"));
    }

    if config.polling.interval_ms == 0 {
        errors.push(ValidationError::new("polling.interval_ms", "must be greater than zero"));
    }
    if config.polling.max_attempts == 0 {
        errors.push(ValidationError::new("polling.max_attempts", "must be at least 1"));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn check_candidate(field: &str, candidate: &CandidateConfig, errors: &mut Vec<ValidationError>) {
    match Url::parse(&candidate.location) {
        Ok(url) if matches!(url.scheme(), "http" | "https") => {}
        Ok(url) => errors.push(ValidationError::new(
            field,
            format!("unsupported scheme '{}'", url.scheme()),
        )),
        Err(e) => errors.push(ValidationError::new(
            field,
            format!("invalid location '{}': {}", candidate.location, e),
        )),
    }
    if candidate.timeout_ms == 0 {
        errors.push(ValidationError::new(field, "timeout_ms must be greater than zero"));
    }
}
