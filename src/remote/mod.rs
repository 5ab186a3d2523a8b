//! Remote collaborator subsystem.
//!
//! # Data Flow
//! ```text
//! Orchestrator / resolver / poller
//!     → service.rs (CallbackService trait, TransportError)
//!     → http.rs (reqwest implementation)
//!     → types.rs (JSON payloads, RemoteRejection)
//! ```
//!
//! # Design Decisions
//! - The core only sees the trait; tests substitute in-memory doubles
//! - A decoded `success: false` payload is an answer, not a transport failure

pub mod http;
#[cfg(test)]
pub mod mock;
pub mod service;
pub mod types;

pub use http::HttpCallbackService;
pub use service::{CallbackService, TransportError, TransportResult};
pub use types::{Ack, HealthReport, HealthStatus, RemoteRejection, RemoteStatus, StatusReport, SubmitPayload, SubmitResponse};
