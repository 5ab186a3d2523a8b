//! The callback service contract.

use async_trait::async_trait;
use thiserror::Error;
use url::Url;

use crate::remote::types::{Ack, HealthReport, StatusReport, SubmitPayload, SubmitResponse};

/// Errors that occur before the collaborator gives an answer.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    /// No response within the deadline.
    #[error("request timed out after {0} ms")]
    Timeout(u64),

    /// Connection could not be established or was dropped.
    #[error("service unreachable: {0}")]
    Unreachable(String),

    /// Non-success status without a decodable payload.
    #[error("unexpected HTTP status {0}")]
    Status(u16),

    /// Response body did not match the contract.
    #[error("malformed response: {0}")]
    Malformed(String),
}

pub type TransportResult<T> = Result<T, TransportError>;

/// Operations the orchestrator consumes from the remote collaborator.
///
/// Every method takes the base location chosen by discovery so one client
/// can serve either tier.
#[async_trait]
pub trait CallbackService: Send + Sync {
    async fn health(&self, location: &Url) -> TransportResult<HealthReport>;

    async fn submit_request(&self, location: &Url, payload: &SubmitPayload) -> TransportResult<SubmitResponse>;

    async fn send_verification(&self, location: &Url, request_id: &str) -> TransportResult<Ack>;

    async fn verify_code(&self, location: &Url, request_id: &str, code: &str) -> TransportResult<Ack>;

    async fn initiate_callback(&self, location: &Url, request_id: &str) -> TransportResult<Ack>;

    async fn poll_status(&self, location: &Url, request_id: &str) -> TransportResult<StatusReport>;
}
