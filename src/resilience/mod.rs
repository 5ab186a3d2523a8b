//! Resilience subsystem.
//!
//! # Data Flow
//! ```text
//! Probe or workflow call:
//!     → timeouts.rs (enforce a deadline)
//!     → On expiry: TransportError::Timeout, slot released
//! ```
//!
//! # Design Decisions
//! - Timeouts are non-negotiable; every external call has a deadline
//! - No automatic retries: a rejection waits for the user, a transport
//!   failure hands the retry affordance back to the caller

pub mod timeouts;

pub use timeouts::with_deadline;
