//! Service discovery subsystem.
//!
//! # Data Flow
//! ```text
//! resolve():
//!     Probe preferred location (short timeout)
//!     → healthy: Endpoint { tier: Preferred }
//!     → otherwise probe fallback location (longer timeout)
//!     → healthy: Endpoint { tier: Fallback }
//!     → otherwise ResolveError::Unavailable
//! ```
//!
//! # Design Decisions
//! - Timeout, refusal, malformed body and "unhealthy" are one failure class
//! - Unavailability is surfaced, never replaced by a default location
//! - The caller decides when to resolve again

pub mod endpoint;
pub mod resolver;

pub use endpoint::{Candidate, Endpoint, Tier};
pub use resolver::{EndpointResolver, ResolveError};
