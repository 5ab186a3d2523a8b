//! Endpoint descriptors.

use std::fmt;
use std::time::Duration;

use url::Url;

use crate::config::CandidateConfig;
use crate::remote::HealthStatus;

/// Discovery tier of a location.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Tier {
    Preferred,
    Fallback,
}

impl Tier {
    pub fn as_str(self) -> &'static str {
        match self {
            Tier::Preferred => "preferred",
            Tier::Fallback => "fallback",
        }
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A location to probe and how long to wait for it.
#[derive(Debug, Clone)]
pub struct Candidate {
    pub location: Url,
    pub tier: Tier,
    pub timeout: Duration,
}

impl Candidate {
    pub fn new(location: Url, tier: Tier, timeout: Duration) -> Self {
        Self { location, tier, timeout }
    }

    pub fn from_config(config: &CandidateConfig, tier: Tier) -> Result<Self, url::ParseError> {
        Ok(Self::new(Url::parse(&config.location)?, tier, config.timeout()))
    }
}

/// The location chosen for a session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    pub location: Url,
    pub tier: Tier,
    pub health: HealthStatus,
}

impl Endpoint {
    /// Short description for status lines.
    pub fn describe(&self) -> String {
        match self.tier {
            Tier::Preferred => format!("Connected to local service at {}", self.location),
            Tier::Fallback => format!("Connected to remote service at {}", self.location),
        }
    }
}
