//! Callback workflow subsystem.
//!
//! # Data Flow
//! ```text
//! UI action
//!     → orchestrator.rs (guard: state.rs transition table)
//!     → validation.rs (local checks, no network)
//!     → remote call with deadline
//!     → settled outcome applied if the epoch still matches
//!     → events.rs FlowEvent broadcast to subscribers
//! ```
//!
//! # Design Decisions
//! - "A call is in flight" is a state (`Verifying`) or a request phase, never a flag
//! - Local failures never touch the network
//! - Users see `FlowError::user_message()`; logs see the full error

pub mod error;
pub mod events;
pub mod orchestrator;
pub mod session;
pub mod state;
pub mod validation;

pub use error::{ErrorTier, FlowError};
pub use events::{FlowEvent, TimerKind};
pub use orchestrator::CallbackOrchestrator;
pub use session::{CallbackRequest, FlowSettings, RequestPhase, VerificationSession};
pub use state::{transition, AppState, Event};
pub use validation::{check_code, normalize_phone, ContactDetails, ValidationError};
