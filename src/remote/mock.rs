//! Scripted in-memory callback service for unit tests.

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use url::Url;

use crate::remote::service::{CallbackService, TransportError, TransportResult};
use crate::remote::types::{
    Ack, HealthReport, HealthStatus, RemoteStatus, StatusReport, SubmitPayload, SubmitResponse,
};

/// How a location answers health probes.
#[derive(Debug, Clone)]
pub enum ProbeScript {
    Healthy,
    Unhealthy,
    Malformed,
    Refused,
    /// Answer healthy after the given delay.
    Slow(Duration),
}

/// Replays queued answers per operation and counts every call.
///
/// Operations with an empty queue fall back to a successful answer
/// (`pending` for status queries).
#[derive(Default)]
pub struct ScriptedService {
    calls: Mutex<HashMap<&'static str, usize>>,
    latency: Mutex<HashMap<&'static str, Duration>>,
    probes: Mutex<HashMap<String, ProbeScript>>,
    submits: Mutex<VecDeque<TransportResult<SubmitResponse>>>,
    sends: Mutex<VecDeque<TransportResult<Ack>>>,
    verifies: Mutex<VecDeque<TransportResult<Ack>>>,
    initiates: Mutex<VecDeque<TransportResult<Ack>>>,
    statuses: Mutex<VecDeque<TransportResult<StatusReport>>>,
}

impl ScriptedService {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn probe(self, location: &str, script: ProbeScript) -> Self {
        self.probes
            .lock()
            .unwrap()
            .insert(Url::parse(location).unwrap().to_string(), script);
        self
    }

    pub fn latency(self, operation: &'static str, delay: Duration) -> Self {
        self.latency.lock().unwrap().insert(operation, delay);
        self
    }

    pub fn submit(self, answer: TransportResult<SubmitResponse>) -> Self {
        self.submits.lock().unwrap().push_back(answer);
        self
    }

    pub fn send(self, answer: TransportResult<Ack>) -> Self {
        self.sends.lock().unwrap().push_back(answer);
        self
    }

    pub fn verify(self, answer: TransportResult<Ack>) -> Self {
        self.verifies.lock().unwrap().push_back(answer);
        self
    }

    pub fn initiate(self, answer: TransportResult<Ack>) -> Self {
        self.initiates.lock().unwrap().push_back(answer);
        self
    }

    pub fn status(self, status: RemoteStatus, message: Option<&str>) -> Self {
        self.statuses.lock().unwrap().push_back(Ok(StatusReport {
            status,
            message: message.map(str::to_string),
            updated_at: None,
        }));
        self
    }

    pub fn status_error(self, error: TransportError) -> Self {
        self.statuses.lock().unwrap().push_back(Err(error));
        self
    }

    /// Number of calls made to `operation` so far.
    pub fn calls(&self, operation: &str) -> usize {
        self.calls.lock().unwrap().get(operation).copied().unwrap_or(0)
    }

    pub fn total_calls(&self) -> usize {
        self.calls.lock().unwrap().values().sum()
    }

    async fn enter(&self, operation: &'static str) {
        *self.calls.lock().unwrap().entry(operation).or_insert(0) += 1;
        let delay = self.latency.lock().unwrap().get(operation).copied();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
    }
}

fn next<T>(queue: &Mutex<VecDeque<TransportResult<T>>>, fallback: impl FnOnce() -> T) -> TransportResult<T> {
    queue.lock().unwrap().pop_front().unwrap_or_else(|| Ok(fallback()))
}

#[async_trait]
impl CallbackService for ScriptedService {
    async fn health(&self, location: &Url) -> TransportResult<HealthReport> {
        self.enter("health").await;
        let script = self.probes.lock().unwrap().get(location.as_str()).cloned();
        let report = |status| HealthReport {
            status,
            timestamp: None,
            telephony_configured: Some(true),
        };
        match script.unwrap_or(ProbeScript::Refused) {
            ProbeScript::Healthy => Ok(report(HealthStatus::Healthy)),
            ProbeScript::Unhealthy => Ok(report(HealthStatus::Unhealthy)),
            ProbeScript::Malformed => Err(TransportError::Malformed("expected value at line 1".into())),
            ProbeScript::Refused => Err(TransportError::Unreachable("connection refused".into())),
            ProbeScript::Slow(delay) => {
                tokio::time::sleep(delay).await;
                Ok(report(HealthStatus::Healthy))
            }
        }
    }

    async fn submit_request(&self, _location: &Url, _payload: &SubmitPayload) -> TransportResult<SubmitResponse> {
        self.enter("submit_request").await;
        next(&self.submits, || SubmitResponse {
            success: true,
            request_id: Some("req-1".to_string()),
            ..Default::default()
        })
    }

    async fn send_verification(&self, _location: &Url, _request_id: &str) -> TransportResult<Ack> {
        self.enter("send_verification").await;
        next(&self.sends, Ack::ok)
    }

    async fn verify_code(&self, _location: &Url, _request_id: &str, _code: &str) -> TransportResult<Ack> {
        self.enter("verify_code").await;
        next(&self.verifies, Ack::ok)
    }

    async fn initiate_callback(&self, _location: &Url, _request_id: &str) -> TransportResult<Ack> {
        self.enter("initiate_callback").await;
        next(&self.initiates, Ack::ok)
    }

    async fn poll_status(&self, _location: &Url, _request_id: &str) -> TransportResult<StatusReport> {
        self.enter("poll_status").await;
        next(&self.statuses, || StatusReport {
            status: RemoteStatus::Pending,
            message: None,
            updated_at: None,
        })
    }
}
