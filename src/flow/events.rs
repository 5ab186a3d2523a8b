//! Notifications published to the presentation layer.

use std::time::Duration;

use crate::discovery::Endpoint;
use crate::flow::state::AppState;

/// Which countdown a tick belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerKind {
    CodeExpiry,
    ResendCooldown,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FlowEvent {
    /// The state moved; `message` is what to tell the person.
    StateChanged {
        from: AppState,
        to: AppState,
        message: String,
    },
    /// Something worth telling the person without a state change.
    Notice { state: AppState, message: String },
    Countdown { timer: TimerKind, remaining: Duration },
    EndpointSelected(Endpoint),
}

impl FlowEvent {
    pub fn message(&self) -> Option<&str> {
        match self {
            FlowEvent::StateChanged { message, .. } | FlowEvent::Notice { message, .. } => Some(message),
            FlowEvent::Countdown { .. } | FlowEvent::EndpointSelected(_) => None,
        }
    }
}
