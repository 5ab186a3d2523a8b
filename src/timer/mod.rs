//! Countdown timers.
//!
//! # Design Decisions
//! - One tokio task and one cancellation token per running countdown
//! - Instances share nothing, so cancelling one never touches another
//! - Callbacks run on the timer task; they must not block

pub mod cooldown;

pub use cooldown::CooldownTimer;
