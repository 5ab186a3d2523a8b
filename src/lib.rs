//! Callback request client library.

pub mod config;
pub mod discovery;
pub mod flow;
pub mod observability;
pub mod polling;
pub mod remote;
pub mod resilience;
pub mod timer;

pub use config::schema::ClientConfig;
pub use flow::CallbackOrchestrator;
pub use remote::HttpCallbackService;
