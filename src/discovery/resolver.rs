//! Two-tier endpoint resolution.
//!
//! # Responsibilities
//! - Probe the preferred location, then the fallback location
//! - Bound every probe by its tier's timeout
//! - Report which tier won, or why both failed

use std::sync::Arc;

use thiserror::Error;

use crate::config::{CandidateConfig, DiscoveryConfig};
use crate::discovery::endpoint::{Candidate, Endpoint, Tier};
use crate::observability::metrics;
use crate::remote::{CallbackService, HealthStatus, TransportError};
use crate::resilience::with_deadline;

/// Errors that can occur during discovery.
#[derive(Debug, Clone, Error)]
pub enum ResolveError {
    /// Every candidate failed its probe.
    #[error("no healthy callback service ({})", summarize(.failures))]
    Unavailable { failures: Vec<(Tier, String)> },

    /// A configured location is not a URL.
    #[error("invalid {tier} location: {reason}")]
    InvalidLocation { tier: Tier, reason: String },
}

fn summarize(failures: &[(Tier, String)]) -> String {
    failures
        .iter()
        .map(|(tier, reason)| format!("{}: {}", tier, reason))
        .collect::<Vec<_>>()
        .join("; ")
}

/// Selects the first healthy service location.
#[derive(Clone)]
pub struct EndpointResolver {
    service: Arc<dyn CallbackService>,
    candidates: Vec<Candidate>,
}

impl EndpointResolver {
    pub fn new(service: Arc<dyn CallbackService>, preferred: Candidate, fallback: Candidate) -> Self {
        Self {
            service,
            candidates: vec![preferred, fallback],
        }
    }

    pub fn from_config(service: Arc<dyn CallbackService>, config: &DiscoveryConfig) -> Result<Self, ResolveError> {
        let candidate = |tier: Tier, c: &CandidateConfig| {
            Candidate::from_config(c, tier).map_err(|e| ResolveError::InvalidLocation {
                tier,
                reason: e.to_string(),
            })
        };
        Ok(Self::new(
            service,
            candidate(Tier::Preferred, &config.preferred)?,
            candidate(Tier::Fallback, &config.fallback)?,
        ))
    }

    pub fn candidates(&self) -> &[Candidate] {
        &self.candidates
    }

    /// Probe candidates in tier order; the first healthy one wins.
    pub async fn resolve(&self) -> Result<Endpoint, ResolveError> {
        let mut failures = Vec::with_capacity(self.candidates.len());

        for candidate in &self.candidates {
            match self.probe(candidate).await {
                Ok(endpoint) => {
                    metrics::record_probe(candidate.tier.as_str(), true);
                    tracing::info!(
                        tier = %candidate.tier,
                        location = %candidate.location,
                        "Endpoint selected"
                    );
                    return Ok(endpoint);
                }
                Err(reason) => {
                    metrics::record_probe(candidate.tier.as_str(), false);
                    tracing::warn!(
                        tier = %candidate.tier,
                        location = %candidate.location,
                        reason = %reason,
                        "Probe failed, trying next tier"
                    );
                    failures.push((candidate.tier, reason));
                }
            }
        }

        tracing::error!(attempts = failures.len(), "No healthy callback service");
        Err(ResolveError::Unavailable { failures })
    }

    async fn probe(&self, candidate: &Candidate) -> Result<Endpoint, String> {
        let report = with_deadline(candidate.timeout, self.service.health(&candidate.location))
            .await
            .map_err(|e: TransportError| e.to_string())?;

        match report.status {
            HealthStatus::Healthy => Ok(Endpoint {
                location: candidate.location.clone(),
                tier: candidate.tier,
                health: report.status,
            }),
            HealthStatus::Unhealthy => Err("service reported unhealthy".to_string()),
        }
    }
}

impl std::fmt::Debug for EndpointResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EndpointResolver")
            .field("candidates", &self.candidates)
            .finish()
    }
}
