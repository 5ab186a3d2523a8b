//! The callback workflow state machine.
//!
//! # Responsibilities
//! - Sequence submit → verify → place call → observe
//! - Own the chosen endpoint, the active request and both countdowns
//! - Reject actions that are illegal in the current state without side effects
//! - Publish every transition and notice on a broadcast stream
//!
//! # Design Decisions
//! - All mutable data sits in one `Inner` behind a std mutex that is never
//!   held across an `.await`; a check and its transition happen under one lock
//! - Every asynchronous step captures the epoch it started in; cancel, reset
//!   and shutdown advance the epoch so late results are dropped
//! - Network calls are allowed to finish after cancellation; only their
//!   results are discarded
//! - Timer callbacks hold a weak reference so a dropped orchestrator stops them

use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::time::Duration;

use tokio::sync::broadcast;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use url::Url;

use crate::config::ClientConfig;
use crate::discovery::{Endpoint, EndpointResolver, ResolveError};
use crate::flow::error::{ErrorTier, FlowError};
use crate::flow::events::{FlowEvent, TimerKind};
use crate::flow::session::{CallbackRequest, FlowSettings, RequestPhase, VerificationSession};
use crate::flow::state::{transition, AppState, Event};
use crate::flow::validation::{check_code, ContactDetails, ValidationError};
use crate::observability::metrics;
use crate::polling::{PollOutcome, StatusPoller};
use crate::remote::{Ack, CallbackService, RemoteRejection, SubmitPayload, TransportError, TransportResult};
use crate::resilience::with_deadline;
use crate::timer::CooldownTimer;

const EVENT_CAPACITY: usize = 256;

const READY: &str = "Enter your details to request a callback.";
const DISCOVERING: &str = "Looking for the callback service...";
const SUBMITTING: &str = "Submitting your request...";
const CODE_SENT: &str = "Verification code sent by text message.";
const RESEND_READY: &str = "You can request a new code now.";
const RESENDING: &str = "Sending a new code...";
const VERIFYING: &str = "Checking your code...";
const VERIFIED: &str = "Code confirmed. Placing your call...";
const CALL_PLACED: &str = "Your call is being placed. Answer your phone when it rings.";
const RETRYING_CALL: &str = "Trying to place your call again...";
const POLLING: &str = "Checking on your call...";
const CANCELLED: &str = "Request cancelled.";
const RESET: &str = "Ready for a new request.";
const STOPPED: &str = "Stopped.";

struct Inner {
    state: AppState,
    epoch: u64,
    cancel: CancellationToken,
    endpoint: Option<Endpoint>,
    request: Option<CallbackRequest>,
    verification: Option<VerificationSession>,
    expiry_timer: CooldownTimer,
    resend_timer: CooldownTimer,
    last_message: String,
    last_action: Option<Event>,
}

struct Shared {
    service: Arc<dyn CallbackService>,
    resolver: EndpointResolver,
    poller: StatusPoller,
    settings: FlowSettings,
    events: broadcast::Sender<FlowEvent>,
    inner: Mutex<Inner>,
}

/// Where a started step should send its call.
struct Target {
    epoch: u64,
    location: Url,
    request_id: String,
}

/// Handle to one callback workflow. Clones share the same workflow.
#[derive(Clone)]
pub struct CallbackOrchestrator {
    shared: Arc<Shared>,
}

impl CallbackOrchestrator {
    pub fn new(
        service: Arc<dyn CallbackService>,
        resolver: EndpointResolver,
        poller: StatusPoller,
        settings: FlowSettings,
    ) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        let inner = Inner {
            state: AppState::Ready,
            epoch: 0,
            cancel: CancellationToken::new(),
            endpoint: None,
            request: None,
            verification: None,
            expiry_timer: CooldownTimer::new("code_expiry"),
            resend_timer: CooldownTimer::new("resend_cooldown"),
            last_message: READY.to_string(),
            last_action: None,
        };
        Self {
            shared: Arc::new(Shared {
                service,
                resolver,
                poller,
                settings,
                events,
                inner: Mutex::new(inner),
            }),
        }
    }

    pub fn from_config(service: Arc<dyn CallbackService>, config: &ClientConfig) -> Result<Self, ResolveError> {
        let resolver = EndpointResolver::from_config(service.clone(), &config.discovery)?;
        let settings = FlowSettings::from(&config.workflow);
        let poller = StatusPoller::from_config(&config.polling, settings.request_timeout);
        Ok(Self::new(service, resolver, poller, settings))
    }

    /// Subscribe to transitions, notices and countdown ticks.
    pub fn subscribe(&self) -> broadcast::Receiver<FlowEvent> {
        self.shared.events.subscribe()
    }

    pub fn state(&self) -> AppState {
        self.lock().state
    }

    /// The message that accompanied the latest transition or notice.
    pub fn last_message(&self) -> String {
        self.lock().last_message.clone()
    }

    /// The latest user action that was accepted.
    pub fn last_action(&self) -> Option<Event> {
        self.lock().last_action
    }

    pub fn endpoint(&self) -> Option<Endpoint> {
        self.lock().endpoint.clone()
    }

    pub fn request_id(&self) -> Option<String> {
        self.lock().request.as_ref().map(|r| r.request_id.clone())
    }

    pub fn request_phase(&self) -> Option<RequestPhase> {
        self.lock().request.as_ref().map(|r| r.phase)
    }

    /// Time until the verification code expires, if a countdown is running.
    pub fn code_expires_in(&self) -> Option<Duration> {
        self.lock().expiry_timer.remaining()
    }

    /// Time until another code may be requested, if a cooldown is running.
    pub fn resend_available_in(&self) -> Option<Duration> {
        self.lock().resend_timer.remaining()
    }

    /// Choose a service location. Legal from `Ready` only.
    pub async fn discover(&self) -> Result<Endpoint, FlowError> {
        let epoch = {
            let mut inner = self.lock();
            self.apply(&mut inner, Event::Discover, DISCOVERING)?;
            inner.epoch
        };
        self.resolve(epoch, AppState::Ready).await
    }

    /// Submit contact details; returns the request identifier.
    ///
    /// Resolves an endpoint first if none has been chosen yet.
    pub async fn submit_request(&self, contact: ContactDetails, challenge_token: &str) -> Result<String, FlowError> {
        let (epoch, endpoint, contact) = {
            let mut inner = self.lock();
            self.check(&inner, Event::Submit)?;
            let contact = match contact.normalized() {
                Ok(contact) => contact,
                Err(e) => return Err(self.fail(&mut inner, e.into())),
            };
            if challenge_token.trim().is_empty() {
                return Err(self.fail(&mut inner, ValidationError::MissingChallenge.into()));
            }
            self.apply(&mut inner, Event::Submit, SUBMITTING)?;
            (inner.epoch, inner.endpoint.clone(), contact)
        };

        let location = match endpoint {
            Some(endpoint) => endpoint.location,
            None => match self.resolve(epoch, AppState::Submitting).await {
                Ok(endpoint) => endpoint.location,
                Err(FlowError::Stale) => return Err(FlowError::Stale),
                Err(err) => return Err(self.settle_submit_failure(epoch, err)),
            },
        };

        let payload = SubmitPayload {
            name: contact.name.clone(),
            email: contact.email.clone(),
            phone: contact.phone.clone(),
            challenge_token: challenge_token.trim().to_string(),
        };
        let result = self
            .remote("submit_request", self.shared.service.submit_request(&location, &payload))
            .await;

        let target = {
            let mut inner = self.lock();
            if !self.is_current(&inner, epoch, &[AppState::Submitting]) {
                return Err(FlowError::Stale);
            }
            let response = match result {
                Ok(response) => response,
                Err(e) => {
                    drop(inner);
                    return Err(self.settle_submit_failure(epoch, e.into()));
                }
            };
            if !response.success {
                let rejection = RemoteRejection::from_parts(response.error, response.context, response.next_step);
                drop(inner);
                return Err(self.settle_submit_failure(epoch, rejection.into()));
            }
            let Some(request_id) = response.request_id else {
                let err = FlowError::Transport(TransportError::Malformed(
                    "submission accepted without a request id".to_string(),
                ));
                tracing::error!(error = %err, "Submission response is unusable");
                self.apply(&mut inner, Event::Fault, err.user_message())?;
                return Err(err);
            };

            tracing::info!(request_id = %request_id, "Callback request created");
            let message = format!("We're sending a verification code to {}. Enter it below.", contact.phone);
            inner.request = Some(CallbackRequest {
                request_id: request_id.clone(),
                contact,
                phase: RequestPhase::Created,
            });
            self.start_countdowns(&mut inner);
            self.apply(&mut inner, Event::Submitted, message)?;
            Target {
                epoch,
                location,
                request_id,
            }
        };

        let request_id = target.request_id.clone();
        self.dispatch_code(target);
        Ok(request_id)
    }

    /// Confirm the one-time code. Legal from `AwaitingVerification`.
    ///
    /// On success the call is placed before this returns; completion is
    /// observed in the background.
    pub async fn verify_code(&self, code: &str) -> Result<(), FlowError> {
        let (target, code) = {
            let mut inner = self.lock();
            if inner.state == AppState::Verifying {
                tracing::debug!("Verification already in flight, ignoring duplicate");
                return Err(FlowError::StateViolation {
                    action: Event::Verify,
                    state: AppState::Verifying,
                });
            }
            self.check(&inner, Event::Verify)?;
            let code = match check_code(code, self.shared.settings.code_length) {
                Ok(code) => code,
                Err(e) => return Err(self.fail(&mut inner, e.into())),
            };
            if inner.verification.is_some_and(|v| v.is_expired(Instant::now())) {
                return Err(self.expire(&mut inner));
            }
            let target = self.target(&inner)?;
            self.apply(&mut inner, Event::Verify, VERIFYING)?;
            (target, code)
        };

        let result = self
            .remote(
                "verify_code",
                self.shared
                    .service
                    .verify_code(&target.location, &target.request_id, &code),
            )
            .await;

        let placement = {
            let mut inner = self.lock();
            if !self.is_current(&inner, target.epoch, &[AppState::Verifying]) {
                return Err(FlowError::Stale);
            }
            match answer(result) {
                Ok(_) => {
                    tracing::info!(request_id = %target.request_id, "Verification code accepted");
                    self.stop_countdowns(&mut inner);
                    inner.verification = None;
                    self.apply(&mut inner, Event::Verified, VERIFIED)?;
                    self.begin_placement(&mut inner, target)
                }
                Err(err) => {
                    if inner.verification.is_some_and(|v| v.is_expired(Instant::now())) {
                        return Err(self.expire(&mut inner));
                    }
                    self.apply(&mut inner, Event::VerifyFailed, err.user_message())?;
                    return Err(err);
                }
            }
        };

        self.place_call(placement).await
    }

    /// Auto-submit gate for code entry.
    ///
    /// Returns `Ok(false)` while the input is shorter than the code length;
    /// a complete code goes through [`verify_code`](Self::verify_code).
    pub async fn input_code(&self, partial: &str) -> Result<bool, FlowError> {
        if partial.trim().chars().count() < self.shared.settings.code_length {
            return Ok(false);
        }
        self.verify_code(partial).await.map(|_| true)
    }

    /// Request a fresh code. Legal from `AwaitingVerification` outside the cooldown.
    pub fn resend_code(&self) -> Result<(), FlowError> {
        let target = {
            let mut inner = self.lock();
            self.check(&inner, Event::Resend)?;
            let now = Instant::now();
            let Some(session) = inner.verification else {
                return Err(FlowError::Stale);
            };
            if session.is_expired(now) {
                return Err(self.expire(&mut inner));
            }
            if let Some(remaining) = session.cooldown_remaining(now) {
                let remaining_secs = remaining.as_secs() + u64::from(remaining.subsec_nanos() > 0);
                return Err(self.fail(&mut inner, FlowError::Cooldown { remaining_secs }));
            }
            let target = self.target(&inner)?;
            self.start_countdowns(&mut inner);
            self.apply(&mut inner, Event::Resend, RESENDING)?;
            target
        };

        self.dispatch_code(target);
        Ok(())
    }

    /// Abandon the pending verification. Legal from `AwaitingVerification`.
    pub fn cancel(&self) -> Result<(), FlowError> {
        let mut inner = self.lock();
        self.check(&inner, Event::Cancel)?;
        self.abandon(&mut inner);
        self.apply(&mut inner, Event::Cancel, CANCELLED)?;
        Ok(())
    }

    /// Place the call again after a transport failure. Legal from `Calling`
    /// while no placement has been accepted.
    pub async fn retry_call(&self) -> Result<(), FlowError> {
        let placement = {
            let mut inner = self.lock();
            self.check(&inner, Event::RetryCall)?;
            if inner.request.as_ref().map(|r| r.phase) != Some(RequestPhase::Verified) {
                return Err(self.violation(Event::RetryCall, inner.state));
            }
            let target = self.target(&inner)?;
            self.apply(&mut inner, Event::RetryCall, RETRYING_CALL)?;
            self.begin_placement(&mut inner, target)
        };
        self.place_call(placement).await
    }

    /// Observe call completion again after an indeterminate finish.
    pub async fn poll_status(&self) -> Result<PollOutcome, FlowError> {
        let (target, cancel) = {
            let mut inner = self.lock();
            self.check(&inner, Event::Poll)?;
            if inner.request.as_ref().map(|r| r.phase) != Some(RequestPhase::CallPlaced) {
                return Err(self.violation(Event::Poll, inner.state));
            }
            let target = self.target(&inner)?;
            self.apply(&mut inner, Event::Poll, POLLING)?;
            self.set_phase(&mut inner, RequestPhase::Observing);
            (target, inner.cancel.clone())
        };
        self.observe(target, cancel).await
    }

    /// Start over after a finished or failed workflow.
    pub fn reset(&self) -> Result<(), FlowError> {
        let mut inner = self.lock();
        self.check(&inner, Event::Reset)?;
        self.abandon(&mut inner);
        self.apply(&mut inner, Event::Reset, RESET)?;
        Ok(())
    }

    /// Stop timers and background work and return to `Ready`. Always legal.
    pub fn shutdown(&self) {
        let mut inner = self.lock();
        self.abandon(&mut inner);
        if let Err(e) = self.apply(&mut inner, Event::Shutdown, STOPPED) {
            tracing::error!(error = %e, "Shutdown rejected by transition table");
        }
        tracing::info!(epoch = inner.epoch, "Orchestrator stopped");
    }

    #[cfg(test)]
    pub(crate) fn force_state(&self, state: AppState) {
        self.lock().state = state;
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.shared.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn emit(&self, event: FlowEvent) {
        // No subscribers is fine.
        let _ = self.shared.events.send(event);
    }

    fn violation(&self, action: Event, state: AppState) -> FlowError {
        tracing::warn!(action = %action, state = %state, "Action not allowed in current state");
        FlowError::StateViolation { action, state }
    }

    fn check(&self, inner: &Inner, event: Event) -> Result<AppState, FlowError> {
        transition(inner.state, event).ok_or_else(|| self.violation(event, inner.state))
    }

    /// Move the machine and publish the move.
    fn apply(&self, inner: &mut Inner, event: Event, message: impl Into<String>) -> Result<AppState, FlowError> {
        let from = inner.state;
        let to = self.check(inner, event)?;
        let message = message.into();

        inner.state = to;
        inner.last_message = message.clone();
        if event.is_user_action() {
            inner.last_action = Some(event);
        }

        if from == to {
            self.emit(FlowEvent::Notice { state: to, message });
        } else {
            metrics::record_transition(from.as_str(), to.as_str());
            tracing::info!(from = %from, to = %to, event = %event, "State transition");
            self.emit(FlowEvent::StateChanged { from, to, message });
        }
        Ok(to)
    }

    fn notice(&self, inner: &mut Inner, message: impl Into<String>) {
        let message = message.into();
        inner.last_message = message.clone();
        self.emit(FlowEvent::Notice {
            state: inner.state,
            message,
        });
    }

    /// Surface a failure that leaves the state untouched.
    fn fail(&self, inner: &mut Inner, error: FlowError) -> FlowError {
        match error.tier() {
            ErrorTier::User => tracing::debug!(state = %inner.state, error = %error, "Action rejected"),
            ErrorTier::System | ErrorTier::Operator => {
                tracing::warn!(state = %inner.state, error = %error, "Action failed")
            }
        }
        self.notice(inner, error.user_message());
        error
    }

    fn is_current(&self, inner: &Inner, epoch: u64, states: &[AppState]) -> bool {
        let current = inner.epoch == epoch && states.contains(&inner.state);
        if !current {
            tracing::debug!(
                epoch,
                current_epoch = inner.epoch,
                state = %inner.state,
                "Discarding result for an abandoned step"
            );
        }
        current
    }

    fn target(&self, inner: &Inner) -> Result<Target, FlowError> {
        match (&inner.endpoint, &inner.request) {
            (Some(endpoint), Some(request)) => Ok(Target {
                epoch: inner.epoch,
                location: endpoint.location.clone(),
                request_id: request.request_id.clone(),
            }),
            _ => Err(FlowError::Stale),
        }
    }

    fn set_phase(&self, inner: &mut Inner, phase: RequestPhase) {
        if let Some(request) = inner.request.as_mut() {
            tracing::debug!(request_id = %request.request_id, from = ?request.phase, to = ?phase, "Request phase");
            request.phase = phase;
        }
    }

    /// Drop the session: new epoch, background work cancelled, request gone.
    /// The endpoint is kept.
    fn abandon(&self, inner: &mut Inner) {
        inner.epoch += 1;
        std::mem::replace(&mut inner.cancel, CancellationToken::new()).cancel();
        self.stop_countdowns(inner);
        inner.verification = None;
        if let Some(request) = inner.request.take() {
            tracing::debug!(request_id = %request.request_id, "Request discarded");
        }
    }

    fn expire(&self, inner: &mut Inner) -> FlowError {
        let error = FlowError::Expired;
        self.stop_countdowns(inner);
        inner.verification = None;
        inner.request = None;
        tracing::info!(epoch = inner.epoch, "Verification code expired");
        if let Err(e) = self.apply(inner, Event::CodeExpired, error.user_message()) {
            tracing::error!(error = %e, "Expiry rejected by transition table");
        }
        error
    }

    async fn remote<T, F>(&self, operation: &'static str, call: F) -> TransportResult<T>
    where
        F: std::future::Future<Output = TransportResult<T>>,
    {
        let result = with_deadline(self.shared.settings.request_timeout, call).await;
        match &result {
            Ok(_) => metrics::record_remote_call(operation, "answered"),
            Err(e) => {
                metrics::record_remote_call(operation, "transport_error");
                tracing::warn!(operation, error = %e, "Remote call failed");
            }
        }
        result
    }

    async fn resolve(&self, epoch: u64, expected: AppState) -> Result<Endpoint, FlowError> {
        let result = self.shared.resolver.resolve().await;

        let mut inner = self.lock();
        if !self.is_current(&inner, epoch, &[expected]) {
            return Err(FlowError::Stale);
        }
        match result {
            Ok(endpoint) => {
                inner.endpoint = Some(endpoint.clone());
                self.emit(FlowEvent::EndpointSelected(endpoint.clone()));
                self.notice(&mut inner, endpoint.describe());
                Ok(endpoint)
            }
            Err(e) => {
                inner.endpoint = None;
                let err = FlowError::from(e);
                if expected == AppState::Ready {
                    return Err(self.fail(&mut inner, err));
                }
                Err(err)
            }
        }
    }

    fn settle_submit_failure(&self, epoch: u64, err: FlowError) -> FlowError {
        let mut inner = self.lock();
        if !self.is_current(&inner, epoch, &[AppState::Submitting]) {
            return FlowError::Stale;
        }
        tracing::warn!(error = %err, "Submission failed");
        if let Err(e) = self.apply(&mut inner, Event::SubmitFailed, err.user_message()) {
            return e;
        }
        err
    }

    /// Start or restart the code-expiry and resend-cooldown countdowns.
    fn start_countdowns(&self, inner: &mut Inner) {
        let settings = &self.shared.settings;
        inner.verification = Some(VerificationSession::start(Instant::now(), settings));
        let epoch = inner.epoch;

        let events = self.shared.events.clone();
        let weak = Arc::downgrade(&self.shared);
        inner.expiry_timer.start(
            settings.code_expiry,
            settings.tick_interval,
            move |remaining| {
                let _ = events.send(FlowEvent::Countdown {
                    timer: TimerKind::CodeExpiry,
                    remaining,
                });
            },
            move || {
                if let Some(orchestrator) = upgrade(&weak) {
                    orchestrator.code_expired(epoch);
                }
            },
        );

        let events = self.shared.events.clone();
        let weak = Arc::downgrade(&self.shared);
        inner.resend_timer.start(
            settings.resend_cooldown,
            settings.tick_interval,
            move |remaining| {
                let _ = events.send(FlowEvent::Countdown {
                    timer: TimerKind::ResendCooldown,
                    remaining,
                });
            },
            move || {
                if let Some(orchestrator) = upgrade(&weak) {
                    orchestrator.cooldown_over(epoch);
                }
            },
        );
    }

    fn stop_countdowns(&self, inner: &mut Inner) {
        inner.expiry_timer.cancel();
        inner.resend_timer.cancel();
    }

    fn code_expired(&self, epoch: u64) {
        let mut inner = self.lock();
        if inner.epoch != epoch {
            return;
        }
        match inner.state {
            AppState::AwaitingVerification => {
                self.expire(&mut inner);
            }
            // The in-flight verification result decides.
            AppState::Verifying => tracing::debug!("Code deadline passed during verification"),
            _ => {}
        }
    }

    fn cooldown_over(&self, epoch: u64) {
        let mut inner = self.lock();
        if inner.epoch == epoch && inner.state == AppState::AwaitingVerification {
            self.notice(&mut inner, RESEND_READY);
        }
    }

    /// Send the verification code in the background.
    fn dispatch_code(&self, target: Target) {
        let orchestrator = self.clone();
        tokio::spawn(async move {
            let result = orchestrator
                .remote(
                    "send_verification",
                    orchestrator
                        .shared
                        .service
                        .send_verification(&target.location, &target.request_id),
                )
                .await;
            orchestrator.code_dispatched(target.epoch, result);
        });
    }

    fn code_dispatched(&self, epoch: u64, result: TransportResult<Ack>) {
        let mut inner = self.lock();
        if !self.is_current(&inner, epoch, &[AppState::AwaitingVerification, AppState::Verifying]) {
            return;
        }
        match answer(result) {
            Ok(message) => self.notice(&mut inner, message.unwrap_or_else(|| CODE_SENT.to_string())),
            Err(err) => {
                tracing::warn!(error = %err, "Verification code was not sent");
                inner.resend_timer.cancel();
                if let Some(session) = inner.verification.as_mut() {
                    session.resend_available_at = Instant::now();
                }
                self.notice(&mut inner, err.user_message());
                self.notice(&mut inner, RESEND_READY);
            }
        }
    }

    fn begin_placement(&self, inner: &mut Inner, target: Target) -> Target {
        self.set_phase(inner, RequestPhase::Placing);
        target
    }

    async fn place_call(&self, target: Target) -> Result<(), FlowError> {
        let result = self
            .remote(
                "initiate_callback",
                self.shared.service.initiate_callback(&target.location, &target.request_id),
            )
            .await;

        let cancel = {
            let mut inner = self.lock();
            if !self.is_current(&inner, target.epoch, &[AppState::Calling]) {
                return Err(FlowError::Stale);
            }
            match result.map_err(FlowError::from) {
                Err(err) => {
                    self.set_phase(&mut inner, RequestPhase::Verified);
                    self.notice(&mut inner, format!("{} Retry to place the call.", err.user_message()));
                    return Err(err);
                }
                Ok(ack) => match ack.into_result() {
                    Err(rejection) => {
                        tracing::warn!(request_id = %target.request_id, error = %rejection, "Call placement rejected");
                        inner.request = None;
                        self.apply(&mut inner, Event::CallFailed, rejection.to_string())?;
                        return Err(rejection.into());
                    }
                    Ok(message) => {
                        tracing::info!(request_id = %target.request_id, "Call placed");
                        self.notice(&mut inner, message.unwrap_or_else(|| CALL_PLACED.to_string()));
                        self.set_phase(&mut inner, RequestPhase::Observing);
                        inner.cancel.clone()
                    }
                },
            }
        };

        let orchestrator = self.clone();
        tokio::spawn(async move {
            if let Err(e) = orchestrator.observe(target, cancel).await {
                tracing::debug!(error = %e, "Observation ended without a result");
            }
        });
        Ok(())
    }

    async fn observe(&self, target: Target, cancel: CancellationToken) -> Result<PollOutcome, FlowError> {
        let report = self
            .shared
            .poller
            .run(self.shared.service.as_ref(), &target.location, &target.request_id, &cancel)
            .await;

        let mut inner = self.lock();
        if report.outcome == PollOutcome::Cancelled || !self.is_current(&inner, target.epoch, &[AppState::Calling]) {
            return Err(FlowError::Stale);
        }
        match &report.outcome {
            PollOutcome::Completed(message) | PollOutcome::SmsSent(message) => {
                inner.request = None;
                self.apply(&mut inner, Event::CallCompleted, message.clone())?;
            }
            PollOutcome::Failed(message) => {
                inner.request = None;
                self.apply(&mut inner, Event::CallFailed, message.clone())?;
            }
            PollOutcome::StillProcessing(message) => {
                self.set_phase(&mut inner, RequestPhase::CallPlaced);
                self.notice(&mut inner, message.clone());
            }
            PollOutcome::Cancelled => {}
        }
        Ok(report.outcome)
    }
}

impl std::fmt::Debug for CallbackOrchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = self.lock();
        f.debug_struct("CallbackOrchestrator")
            .field("state", &inner.state)
            .field("epoch", &inner.epoch)
            .field("endpoint", &inner.endpoint)
            .field("request", &inner.request)
            .finish()
    }
}

fn upgrade(weak: &Weak<Shared>) -> Option<CallbackOrchestrator> {
    weak.upgrade().map(|shared| CallbackOrchestrator { shared })
}

/// Fold transport failure and rejection into one result.
fn answer(result: TransportResult<Ack>) -> Result<Option<String>, FlowError> {
    Ok(result?.into_result()?)
}
