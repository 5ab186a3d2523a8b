//! Completion polling.
//!
//! # Data Flow
//! ```text
//! Call placed
//!     → poller.rs queries status (attempt 1 immediately, then every interval)
//!     → terminal status: stop with its message
//!     → transport failure: attempt consumed, keep going
//!     → attempts exhausted: stop with "still processing" (not an error)
//! ```

pub mod poller;

pub use poller::{PollOutcome, PollReport, StatusPoller};
