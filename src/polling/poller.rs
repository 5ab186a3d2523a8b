//! Bounded fixed-interval status polling.

use std::time::Duration;

use tokio_util::sync::CancellationToken;
use url::Url;

use crate::config::PollingConfig;
use crate::observability::metrics;
use crate::remote::{CallbackService, RemoteStatus};
use crate::resilience::with_deadline;

const COMPLETED: &str = "Call completed successfully.";
const FAILED: &str = "The call could not be completed.";
const SMS_SENT: &str = "The business was notified by text message and will call you back.";
const STILL_PROCESSING: &str = "Your callback is still being processed. You will receive a call shortly.";

/// How an observation ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollOutcome {
    Completed(String),
    Failed(String),
    SmsSent(String),
    /// Attempts ran out before a terminal status; not an error.
    StillProcessing(String),
    Cancelled,
}

impl PollOutcome {
    pub fn message(&self) -> Option<&str> {
        match self {
            PollOutcome::Completed(m)
            | PollOutcome::Failed(m)
            | PollOutcome::SmsSent(m)
            | PollOutcome::StillProcessing(m) => Some(m),
            PollOutcome::Cancelled => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollReport {
    pub outcome: PollOutcome,
    /// Status queries issued, including failed ones.
    pub attempts: u32,
}

/// Polls remote completion state with a fixed interval and attempt bound.
#[derive(Debug, Clone)]
pub struct StatusPoller {
    interval: Duration,
    max_attempts: u32,
    request_timeout: Duration,
}

impl StatusPoller {
    pub fn new(interval: Duration, max_attempts: u32, request_timeout: Duration) -> Self {
        Self {
            interval,
            max_attempts,
            request_timeout,
        }
    }

    pub fn from_config(config: &PollingConfig, request_timeout: Duration) -> Self {
        Self::new(
            Duration::from_millis(config.interval_ms),
            config.max_attempts,
            request_timeout,
        )
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Poll until a terminal status, attempt exhaustion or cancellation.
    pub async fn run(
        &self,
        service: &dyn CallbackService,
        location: &Url,
        request_id: &str,
        cancel: &CancellationToken,
    ) -> PollReport {
        let mut attempts = 0;

        while attempts < self.max_attempts {
            if attempts > 0 {
                tokio::select! {
                    _ = cancel.cancelled() => return self.cancelled(attempts),
                    _ = tokio::time::sleep(self.interval) => {}
                }
            }
            attempts += 1;

            let query = with_deadline(self.request_timeout, service.poll_status(location, request_id));
            let result = tokio::select! {
                _ = cancel.cancelled() => return self.cancelled(attempts),
                result = query => result,
            };

            let report = match result {
                Ok(report) => report,
                Err(e) => {
                    metrics::record_poll_attempt("transport_error");
                    tracing::warn!(request_id, attempt = attempts, error = %e, "Status query failed");
                    continue;
                }
            };

            tracing::debug!(request_id, attempt = attempts, status = ?report.status, "Status received");
            let message = report.message;
            let outcome = match report.status {
                RemoteStatus::Completed => PollOutcome::Completed(message.unwrap_or_else(|| COMPLETED.to_string())),
                RemoteStatus::Failed => PollOutcome::Failed(message.unwrap_or_else(|| FAILED.to_string())),
                RemoteStatus::SmsSent => PollOutcome::SmsSent(message.unwrap_or_else(|| SMS_SENT.to_string())),
                RemoteStatus::Pending | RemoteStatus::Calling | RemoteStatus::Unknown => {
                    metrics::record_poll_attempt("pending");
                    continue;
                }
            };

            metrics::record_poll_attempt("terminal");
            tracing::info!(request_id, attempts, "Callback reached a final status");
            return PollReport { outcome, attempts };
        }

        tracing::info!(request_id, attempts, "Polling attempts exhausted without a final status");
        PollReport {
            outcome: PollOutcome::StillProcessing(STILL_PROCESSING.to_string()),
            attempts,
        }
    }

    fn cancelled(&self, attempts: u32) -> PollReport {
        tracing::debug!(attempts, "Polling cancelled");
        PollReport {
            outcome: PollOutcome::Cancelled,
            attempts,
        }
    }
}
