//! Cancellable countdown with periodic ticks.

use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{interval_at, sleep_until, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

struct Run {
    token: CancellationToken,
    deadline: Instant,
    _task: JoinHandle<()>,
}

/// A countdown that reports remaining time and fires once at zero.
///
/// Restarting replaces the running countdown. Dropping the timer cancels it.
pub struct CooldownTimer {
    name: &'static str,
    run: Option<Run>,
}

impl CooldownTimer {
    pub fn new(name: &'static str) -> Self {
        Self { name, run: None }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Start counting down from `duration`.
    ///
    /// `on_tick` receives the remaining time every `tick`; `on_expire` runs
    /// once when the deadline passes, unless the timer was cancelled first.
    pub fn start<T, E>(&mut self, duration: Duration, tick: Duration, mut on_tick: T, on_expire: E)
    where
        T: FnMut(Duration) + Send + 'static,
        E: FnOnce() + Send + 'static,
    {
        self.cancel();

        let token = CancellationToken::new();
        let deadline = Instant::now() + duration;
        let run_token = token.clone();
        let name = self.name;

        let task = tokio::spawn(async move {
            let mut ticker = interval_at(Instant::now() + tick, tick);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    biased;
                    _ = run_token.cancelled() => {
                        tracing::trace!(timer = name, "Countdown cancelled");
                        return;
                    }
                    _ = sleep_until(deadline) => break,
                    _ = ticker.tick() => {
                        on_tick(deadline.saturating_duration_since(Instant::now()));
                    }
                }
            }

            if run_token.is_cancelled() {
                return;
            }
            run_token.cancel();
            tracing::debug!(timer = name, "Countdown expired");
            on_expire();
        });

        tracing::debug!(timer = name, duration_secs = duration.as_secs(), "Countdown started");
        self.run = Some(Run {
            token,
            deadline,
            _task: task,
        });
    }

    /// Stop the countdown. Cancelling a stopped timer is a no-op.
    pub fn cancel(&mut self) {
        if let Some(run) = self.run.take() {
            if !run.token.is_cancelled() {
                tracing::debug!(timer = self.name, "Countdown stopped");
            }
            run.token.cancel();
        }
    }

    pub fn is_running(&self) -> bool {
        self.run
            .as_ref()
            .is_some_and(|run| !run.token.is_cancelled() && Instant::now() < run.deadline)
    }

    /// Time left, or `None` when stopped.
    pub fn remaining(&self) -> Option<Duration> {
        if !self.is_running() {
            return None;
        }
        self.run
            .as_ref()
            .map(|run| run.deadline.saturating_duration_since(Instant::now()))
    }
}

impl Drop for CooldownTimer {
    fn drop(&mut self) {
        self.cancel();
    }
}

impl std::fmt::Debug for CooldownTimer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CooldownTimer")
            .field("name", &self.name)
            .field("remaining", &self.remaining())
            .finish()
    }
}
