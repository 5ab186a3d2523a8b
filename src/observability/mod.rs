//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Resolver, poller and orchestrator produce:
//!     → logging.rs (structured log events via tracing)
//!     → metrics.rs (counters via the metrics facade)
//!
//! Consumers:
//!     → stdout (pretty or JSON lines)
//!     → whatever recorder the embedding application installs
//! ```
//!
//! # Design Decisions
//! - Structured fields rather than formatted strings
//! - The library never installs a metrics recorder itself

pub mod logging;
pub mod metrics;
