//! Per-request workflow data.

use std::time::Duration;

use tokio::time::Instant;

use crate::config::WorkflowConfig;
use crate::flow::validation::ContactDetails;

/// Progress of a request past verification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestPhase {
    /// Accepted by the service, code not yet confirmed.
    Created,
    /// Code confirmed, no call placed yet.
    Verified,
    /// Call placement in flight.
    Placing,
    /// Call accepted by the service.
    CallPlaced,
    /// Completion polling in flight.
    Observing,
}

/// The request owned by the active workflow.
#[derive(Debug, Clone)]
pub struct CallbackRequest {
    pub request_id: String,
    pub contact: ContactDetails,
    pub phase: RequestPhase,
}

/// Deadlines of the verification step.
#[derive(Debug, Clone, Copy)]
pub struct VerificationSession {
    pub code_expires_at: Instant,
    pub resend_available_at: Instant,
}

impl VerificationSession {
    pub fn start(now: Instant, settings: &FlowSettings) -> Self {
        Self {
            code_expires_at: now + settings.code_expiry,
            resend_available_at: now + settings.resend_cooldown,
        }
    }

    pub fn is_expired(&self, now: Instant) -> bool {
        now >= self.code_expires_at
    }

    /// Time until resend is allowed, or `None` if it already is.
    pub fn cooldown_remaining(&self, now: Instant) -> Option<Duration> {
        (now < self.resend_available_at).then(|| self.resend_available_at - now)
    }
}

/// Workflow timings and limits.
#[derive(Debug, Clone)]
pub struct FlowSettings {
    pub request_timeout: Duration,
    pub code_length: usize,
    pub code_expiry: Duration,
    pub resend_cooldown: Duration,
    pub tick_interval: Duration,
}

impl From<&WorkflowConfig> for FlowSettings {
    fn from(config: &WorkflowConfig) -> Self {
        Self {
            request_timeout: Duration::from_millis(config.request_timeout_ms),
            code_length: config.code_length,
            code_expiry: Duration::from_secs(config.code_expiry_secs),
            resend_cooldown: Duration::from_secs(config.resend_cooldown_secs),
            tick_interval: Duration::from_millis(config.tick_interval_ms),
        }
    }
}

impl Default for FlowSettings {
    fn default() -> Self {
        Self::from(&WorkflowConfig::default())
    }
}
