//! HTTP binding of the callback service contract.
//!
//! # Routes
//! - `GET  /health`
//! - `POST /request_callback`
//! - `POST /send_verification`
//! - `POST /verify_code`
//! - `POST /initiate_callback`
//! - `GET  /status/{request_id}`
//!
//! # Design Decisions
//! - Rejections arrive with 4xx/5xx and a JSON body, so the body is decoded
//!   before the status code is consulted
//! - Every request carries the client-wide timeout and a fresh `x-request-id`

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use serde_json::json;
use url::Url;
use uuid::Uuid;

use crate::remote::service::{CallbackService, TransportError, TransportResult};
use crate::remote::types::{Ack, HealthReport, StatusReport, SubmitPayload, SubmitResponse};

/// reqwest-backed callback service client.
#[derive(Debug, Clone)]
pub struct HttpCallbackService {
    client: Client,
    timeout: Duration,
}

impl HttpCallbackService {
    /// Create a client whose requests give up after `timeout`.
    pub fn new(timeout: Duration) -> TransportResult<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("callback-client/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| TransportError::Unreachable(e.to_string()))?;
        Ok(Self { client, timeout })
    }

    fn url(&self, location: &Url, segments: &[&str]) -> TransportResult<Url> {
        let mut url = location.clone();
        url.path_segments_mut()
            .map_err(|_| TransportError::Malformed(format!("'{}' cannot be a base URL", location)))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> TransportResult<T> {
        let call_id = Uuid::new_v4().to_string();
        let response = request
            .header("x-request-id", &call_id)
            .send()
            .await
            .map_err(|e| self.map_error(e))?;
        let status = response.status();
        tracing::trace!(call_id = %call_id, status = %status, url = %response.url(), "Response received");
        let body = response.text().await.map_err(|e| self.map_error(e))?;

        match serde_json::from_str::<T>(&body) {
            Ok(payload) => Ok(payload),
            Err(_) if !status.is_success() => Err(TransportError::Status(status.as_u16())),
            Err(e) => Err(TransportError::Malformed(e.to_string())),
        }
    }

    fn map_error(&self, error: reqwest::Error) -> TransportError {
        if error.is_timeout() {
            TransportError::Timeout(self.timeout.as_millis() as u64)
        } else {
            TransportError::Unreachable(error.to_string())
        }
    }
}

#[async_trait]
impl CallbackService for HttpCallbackService {
    async fn health(&self, location: &Url) -> TransportResult<HealthReport> {
        let url = self.url(location, &["health"])?;
        self.send(self.client.get(url)).await
    }

    async fn submit_request(&self, location: &Url, payload: &SubmitPayload) -> TransportResult<SubmitResponse> {
        let url = self.url(location, &["request_callback"])?;
        self.send(self.client.post(url).json(payload)).await
    }

    async fn send_verification(&self, location: &Url, request_id: &str) -> TransportResult<Ack> {
        let url = self.url(location, &["send_verification"])?;
        self.send(self.client.post(url).json(&json!({ "request_id": request_id })))
            .await
    }

    async fn verify_code(&self, location: &Url, request_id: &str, code: &str) -> TransportResult<Ack> {
        let url = self.url(location, &["verify_code"])?;
        self.send(
            self.client
                .post(url)
                .json(&json!({ "request_id": request_id, "code": code })),
        )
        .await
    }

    async fn initiate_callback(&self, location: &Url, request_id: &str) -> TransportResult<Ack> {
        let url = self.url(location, &["initiate_callback"])?;
        self.send(self.client.post(url).json(&json!({ "request_id": request_id })))
            .await
    }

    async fn poll_status(&self, location: &Url, request_id: &str) -> TransportResult<StatusReport> {
        let url = self.url(location, &["status", request_id])?;
        self.send(self.client.get(url)).await
    }
}
