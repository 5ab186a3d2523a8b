//! Workflow states and the transition table.
//!
//! # States
//! ```text
//! Ready → Submitting → AwaitingVerification → Verifying → Calling → Connected
//!                 ↘ (fault)        ↘ (expired)    ↘ (expired)  ↘ (failed)
//!                                        Error
//! ```
//!
//! Every input, user action or settled outcome, is looked up in one table.
//! A missing entry is a rejection and the state stays where it was.

use std::fmt;

/// Where the workflow currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AppState {
    Ready,
    Submitting,
    AwaitingVerification,
    /// A verification call is in flight; doubles as the submission lock.
    Verifying,
    Calling,
    Connected,
    Error,
}

impl AppState {
    pub const ALL: [AppState; 7] = [
        AppState::Ready,
        AppState::Submitting,
        AppState::AwaitingVerification,
        AppState::Verifying,
        AppState::Calling,
        AppState::Connected,
        AppState::Error,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            AppState::Ready => "ready",
            AppState::Submitting => "submitting",
            AppState::AwaitingVerification => "awaiting_verification",
            AppState::Verifying => "verifying",
            AppState::Calling => "calling",
            AppState::Connected => "connected",
            AppState::Error => "error",
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, AppState::Connected | AppState::Error)
    }
}

impl fmt::Display for AppState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Inputs to the machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Event {
    // User actions.
    Discover,
    Submit,
    Verify,
    Resend,
    Cancel,
    RetryCall,
    Poll,
    Reset,
    Shutdown,
    // Settled outcomes.
    Submitted,
    SubmitFailed,
    Verified,
    VerifyFailed,
    CodeExpired,
    CallCompleted,
    CallFailed,
    Fault,
}

impl Event {
    pub const USER_ACTIONS: [Event; 9] = [
        Event::Discover,
        Event::Submit,
        Event::Verify,
        Event::Resend,
        Event::Cancel,
        Event::RetryCall,
        Event::Poll,
        Event::Reset,
        Event::Shutdown,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Event::Discover => "discover",
            Event::Submit => "submit_request",
            Event::Verify => "verify_code",
            Event::Resend => "resend_code",
            Event::Cancel => "cancel",
            Event::RetryCall => "retry_call",
            Event::Poll => "poll_status",
            Event::Reset => "reset",
            Event::Shutdown => "shutdown",
            Event::Submitted => "submitted",
            Event::SubmitFailed => "submit_failed",
            Event::Verified => "verified",
            Event::VerifyFailed => "verify_failed",
            Event::CodeExpired => "code_expired",
            Event::CallCompleted => "call_completed",
            Event::CallFailed => "call_failed",
            Event::Fault => "fault",
        }
    }

    pub fn is_user_action(self) -> bool {
        Self::USER_ACTIONS.contains(&self)
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Look up the state reached by `event` from `state`, or `None` if illegal.
pub fn transition(state: AppState, event: Event) -> Option<AppState> {
    use AppState::*;
    use Event::*;

    let next = match (state, event) {
        (_, Shutdown) => Ready,
        (Ready, Discover) => Ready,
        (Ready, Submit) => Submitting,
        (Submitting, Submitted) => AwaitingVerification,
        (Submitting, SubmitFailed) => Ready,
        (AwaitingVerification, Verify) => Verifying,
        (AwaitingVerification, Resend) => AwaitingVerification,
        (AwaitingVerification, Cancel) => Ready,
        (AwaitingVerification | Verifying, CodeExpired) => Error,
        (Verifying, Verified) => Calling,
        (Verifying, VerifyFailed) => AwaitingVerification,
        (Calling, RetryCall | Poll) => Calling,
        (Calling, CallCompleted) => Connected,
        (Calling, CallFailed) => Error,
        (Connected | Error, Reset) => Ready,
        (s, Fault) if !s.is_terminal() => Error,
        _ => return None,
    };
    Some(next)
}
