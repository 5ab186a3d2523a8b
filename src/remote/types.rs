//! Wire payloads exchanged with the callback service.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Health probe verdict.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Healthy,
    Unhealthy,
}

/// `GET /health` response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthReport {
    pub status: HealthStatus,
    #[serde(default)]
    pub timestamp: Option<String>,
    /// Whether the service can actually place calls.
    #[serde(default, alias = "twilio_configured")]
    pub telephony_configured: Option<bool>,
}

impl HealthReport {
    pub fn is_healthy(&self) -> bool {
        self.status == HealthStatus::Healthy
    }
}

/// `POST /request_callback` body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmitPayload {
    pub name: String,
    pub email: String,
    #[serde(rename = "visitor_number")]
    pub phone: String,
    #[serde(rename = "recaptcha_token")]
    pub challenge_token: String,
}

/// `POST /request_callback` response.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SubmitResponse {
    pub success: bool,
    #[serde(default)]
    pub request_id: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub context: Option<String>,
    #[serde(default)]
    pub next_step: Option<String>,
}

/// Response shared by send-verification, verify-code and initiate-callback.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Ack {
    pub success: bool,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub context: Option<String>,
    #[serde(default)]
    pub next_step: Option<String>,
}

impl Ack {
    pub fn ok() -> Self {
        Self {
            success: true,
            ..Default::default()
        }
    }

    pub fn rejected(error: &str) -> Self {
        Self {
            success: false,
            error: Some(error.to_string()),
            ..Default::default()
        }
    }

    /// Split into success or the collaborator's rejection.
    pub fn into_result(self) -> Result<Option<String>, RemoteRejection> {
        if self.success {
            Ok(self.message)
        } else {
            Err(RemoteRejection::from_parts(self.error, self.context, self.next_step))
        }
    }
}

/// Completion state reported by the collaborator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RemoteStatus {
    Pending,
    Calling,
    Completed,
    Failed,
    SmsSent,
    #[serde(other)]
    Unknown,
}

impl RemoteStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Failed | Self::SmsSent)
    }
}

/// `GET /status/{request_id}` response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusReport {
    pub status: RemoteStatus,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
}

/// An explicit failure payload from the collaborator.
///
/// Displayed verbatim: the error line, then context and next step when given.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{}", self.render())]
pub struct RemoteRejection {
    pub error: String,
    pub context: Option<String>,
    pub next_step: Option<String>,
}

impl RemoteRejection {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            context: None,
            next_step: None,
        }
    }

    pub fn from_parts(error: Option<String>, context: Option<String>, next_step: Option<String>) -> Self {
        Self {
            error: error.unwrap_or_else(|| "The request was declined.".to_string()),
            context,
            next_step,
        }
    }

    fn render(&self) -> String {
        let mut lines = vec![self.error.as_str()];
        lines.extend(self.context.as_deref());
        lines.extend(self.next_step.as_deref());
        lines.join("\n")
    }
}
