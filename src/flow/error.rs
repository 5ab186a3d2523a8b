//! Workflow error taxonomy.

use thiserror::Error;

use crate::discovery::ResolveError;
use crate::flow::state::{AppState, Event};
use crate::flow::validation::ValidationError;
use crate::remote::{RemoteRejection, TransportError};

/// Who has to act on a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorTier {
    /// The person using the client can fix it.
    User,
    /// Infrastructure trouble; retrying may help.
    System,
    /// A UI race or logic bug.
    Operator,
}

impl ErrorTier {
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorTier::User => "user",
            ErrorTier::System => "system",
            ErrorTier::Operator => "operator",
        }
    }
}

/// Every way a workflow operation can fail.
#[derive(Debug, Clone, Error)]
pub enum FlowError {
    #[error("invalid input: {0}")]
    Validation(#[from] ValidationError),

    #[error("resend blocked for another {remaining_secs}s")]
    Cooldown { remaining_secs: u64 },

    #[error("verification code expired")]
    Expired,

    #[error("transport failure: {0}")]
    Transport(#[from] TransportError),

    #[error("{0}")]
    Unavailable(#[from] ResolveError),

    #[error("rejected by service: {0}")]
    Rejected(#[from] RemoteRejection),

    #[error("'{action}' is not allowed while {state}")]
    StateViolation { action: Event, state: AppState },

    #[error("response arrived for a session that no longer exists")]
    Stale,
}

impl FlowError {
    pub fn tier(&self) -> ErrorTier {
        match self {
            FlowError::Validation(_) | FlowError::Cooldown { .. } | FlowError::Expired | FlowError::Rejected(_) => {
                ErrorTier::User
            }
            FlowError::Transport(_) | FlowError::Unavailable(_) => ErrorTier::System,
            FlowError::StateViolation { .. } | FlowError::Stale => ErrorTier::Operator,
        }
    }

    /// The one actionable sentence shown to the person.
    pub fn user_message(&self) -> String {
        match self {
            FlowError::Validation(e) => e.user_message(),
            FlowError::Cooldown { remaining_secs } => {
                format!("Please wait {remaining_secs} seconds before requesting another code.")
            }
            FlowError::Expired => {
                "Your verification code has expired. Start a new request to get a fresh code.".to_string()
            }
            FlowError::Transport(TransportError::Timeout(_)) => {
                "The callback service took too long to respond. Please try again.".to_string()
            }
            FlowError::Transport(_) => {
                "We couldn't reach the callback service. Check your connection and try again.".to_string()
            }
            FlowError::Unavailable(_) => {
                "The callback service is not available right now. Please try again in a moment.".to_string()
            }
            FlowError::Rejected(rejection) => rejection.to_string(),
            FlowError::StateViolation { .. } => "That action isn't available right now.".to_string(),
            FlowError::Stale => "This request was cancelled.".to_string(),
        }
    }
}
