//! Timeout enforcement.
//!
//! # Responsibilities
//! - Wrap collaborator calls with a deadline
//! - Fold expiry into the transport error taxonomy
//! - Drop the pending future on expiry so its slot is freed

use std::future::Future;
use std::time::Duration;

use tokio::time::timeout;

use crate::remote::{TransportError, TransportResult};

/// Run `call`, failing with [`TransportError::Timeout`] once `deadline` elapses.
pub async fn with_deadline<T, F>(deadline: Duration, call: F) -> TransportResult<T>
where
    F: Future<Output = TransportResult<T>>,
{
    match timeout(deadline, call).await {
        Ok(result) => result,
        Err(_) => Err(TransportError::Timeout(deadline.as_millis() as u64)),
    }
}
