//! callback-cli
//!
//! Terminal front-end for the callback workflow. It renders orchestrator
//! events and forwards typed commands; all workflow rules live in the library.
//!
//! # Session
//!
//! ```text
//! discover → submit (from flags) → read stdin:
//!     <code>   verify the one-time code
//!     resend   request a new code
//!     cancel   abandon the request
//!     retry    place the call again after a connection failure
//!     status   check on the call again after "still processing"
//! ```

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::broadcast;
use uuid::Uuid;

use callback_client::config::{load_config, ClientConfig};
use callback_client::flow::{AppState, ContactDetails, ErrorTier, FlowError, FlowEvent, TimerKind};
use callback_client::observability::{logging, metrics};
use callback_client::{CallbackOrchestrator, HttpCallbackService};

#[derive(Parser)]
#[command(name = "callback-cli")]
#[command(about = "Request a telephone callback", long_about = None)]
struct Cli {
    /// TOML configuration file; built-in defaults are used when omitted
    #[arg(short, long)]
    config: Option<PathBuf>,

    #[arg(long, default_value = "")]
    name: String,

    #[arg(long, default_value = "")]
    email: String,

    /// Number to call back, e.g. "(321) 704-7403" or "+44 20 7946 0958"
    #[arg(long)]
    phone: String,

    /// Token from the human-verification challenge
    #[arg(long)]
    challenge_token: String,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => load_config(path)?,
        None => ClientConfig::default(),
    };
    logging::init_tracing(&config.observability);
    metrics::set_enabled(config.observability.metrics_enabled);

    let session = Uuid::new_v4();
    tracing::info!(
        session = %session,
        preferred = %config.discovery.preferred.location,
        fallback = %config.discovery.fallback.location,
        "callback-cli v{} starting",
        env!("CARGO_PKG_VERSION")
    );

    let service = HttpCallbackService::new(Duration::from_millis(config.workflow.request_timeout_ms))?;
    let orchestrator = CallbackOrchestrator::from_config(Arc::new(service), &config)?;
    let printer = tokio::spawn(print_events(orchestrator.subscribe()));

    let result = tokio::select! {
        result = run(&orchestrator, &cli) => result,
        _ = tokio::signal::ctrl_c() => {
            tracing::info!(session = %session, "Interrupted");
            Ok(())
        }
    };

    orchestrator.shutdown();
    printer.abort();
    tracing::info!(session = %session, state = %orchestrator.state(), "Session finished");
    result
}

async fn run(orchestrator: &CallbackOrchestrator, cli: &Cli) -> Result<(), Box<dyn std::error::Error>> {
    orchestrator.discover().await.inspect_err(report)?;

    let contact = ContactDetails::new(cli.name.as_str(), cli.email.as_str(), cli.phone.as_str());
    orchestrator
        .submit_request(contact, &cli.challenge_token)
        .await
        .inspect_err(report)?;

    println!("Commands: <code>, resend, cancel, retry, status");
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut changes = orchestrator.subscribe();

    loop {
        match orchestrator.state() {
            AppState::Connected | AppState::Ready => return Ok(()),
            AppState::Error => return Err(orchestrator.last_message().into()),
            _ => {}
        }

        let line = tokio::select! {
            line = lines.next_line() => line?,
            // Any event may have moved the state; look again.
            _ = changes.recv() => continue,
        };
        let Some(line) = line else {
            return Ok(());
        };

        let result = match line.trim() {
            "" => Ok(()),
            "resend" => orchestrator.resend_code(),
            "cancel" => orchestrator.cancel(),
            "retry" => orchestrator.retry_call().await,
            "status" => orchestrator.poll_status().await.map(|_| ()),
            code => orchestrator.verify_code(code).await,
        };
        if let Err(e) = result {
            report(&e);
        }
    }
}

/// Log by tier; events already carry the user-facing text except for
/// operator-tier failures.
fn report(error: &FlowError) {
    match error.tier() {
        ErrorTier::User => tracing::debug!(error = %error, "Request not accepted"),
        ErrorTier::System => tracing::warn!(error = %error, "Callback service problem"),
        ErrorTier::Operator => {
            tracing::warn!(error = %error, "Action out of sequence");
            eprintln!("{}", error.user_message());
        }
    }
}

async fn print_events(mut events: broadcast::Receiver<FlowEvent>) {
    loop {
        match events.recv().await {
            Ok(FlowEvent::StateChanged { message, .. }) | Ok(FlowEvent::Notice { message, .. }) => {
                println!("{message}");
            }
            Ok(FlowEvent::Countdown {
                timer: TimerKind::CodeExpiry,
                remaining,
            }) => {
                let secs = remaining.as_secs();
                if secs > 0 && (secs % 60 == 0 || secs <= 10) {
                    println!("Code expires in {secs}s");
                }
            }
            Ok(FlowEvent::Countdown { .. }) | Ok(FlowEvent::EndpointSelected(_)) => {}
            Err(broadcast::error::RecvError::Lagged(skipped)) => {
                tracing::debug!(skipped, "Event printer fell behind");
            }
            Err(broadcast::error::RecvError::Closed) => return,
        }
    }
}
