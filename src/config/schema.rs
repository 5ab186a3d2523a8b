//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the client.
//! All types derive Serde traits for deserialization from config files.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Root configuration for the callback client.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ClientConfig {
    /// Candidate service locations and their probe timeouts.
    pub discovery: DiscoveryConfig,

    /// Verification workflow settings.
    pub workflow: WorkflowConfig,

    /// Completion polling settings.
    pub polling: PollingConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// The two discovery tiers.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct DiscoveryConfig {
    /// Local service, probed first.
    pub preferred: CandidateConfig,

    /// Remote service, probed when the preferred one is not healthy.
    pub fallback: CandidateConfig,
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            preferred: CandidateConfig {
                location: "http://localhost:8501".to_string(),
                timeout_ms: 3_000,
            },
            fallback: CandidateConfig {
                location: "https://callback.example.com".to_string(),
                timeout_ms: 4_000,
            },
        }
    }
}

/// A single candidate service location.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CandidateConfig {
    /// Base URL of the service (e.g., "http://localhost:8501").
    pub location: String,

    /// Health probe timeout in milliseconds.
    pub timeout_ms: u64,
}

impl CandidateConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

/// Verification workflow configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct WorkflowConfig {
    /// Deadline for every workflow call in milliseconds.
    pub request_timeout_ms: u64,

    /// Exact number of digits in a verification code.
    pub code_length: usize,

    /// Lifetime of a sent verification code in seconds.
    pub code_expiry_secs: u64,

    /// Window after a send during which resend is blocked, in seconds.
    pub resend_cooldown_secs: u64,

    /// Countdown notification period in milliseconds.
    pub tick_interval_ms: u64,
}

impl Default for WorkflowConfig {
    fn default() -> Self {
        Self {
            request_timeout_ms: 10_000,
            code_length: 6,
            code_expiry_secs: 600,
            resend_cooldown_secs: 30,
            tick_interval_ms: 1_000,
        }
    }
}

/// Completion polling configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct PollingConfig {
    /// Delay between status queries in milliseconds.
    pub interval_ms: u64,

    /// Upper bound on status queries per observation.
    pub max_attempts: u32,
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self {
            interval_ms: 3_000,
            max_attempts: 20,
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Human-readable or JSON log lines.
    pub log_format: LogFormat,

    /// Record counters through the `metrics` facade.
    pub metrics_enabled: bool,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
            metrics_enabled: true,
        }
    }
}
