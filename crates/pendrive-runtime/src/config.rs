//! Runtime configuration shared by every context.

use std::time::Duration;

use pendrive_client::{DEFAULT_HOST_URL, DEFAULT_REQUEST_TIMEOUT_MS};
use pendrive_core::DomainMatch;
use pendrive_core::availability::{BACKSTOP_INTERVAL_SECS, FAST_POLL_INTERVAL_MS};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuntimeConfig {
    pub host_url: String,
    /// Fast poll cadence while a UI surface is open.
    pub poll_interval: Duration,
    /// Recovery wake for a suspended background.
    pub backstop_interval: Duration,
    pub request_timeout: Duration,
    pub domain_match: DomainMatch,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            host_url: DEFAULT_HOST_URL.to_string(),
            poll_interval: Duration::from_millis(FAST_POLL_INTERVAL_MS),
            backstop_interval: Duration::from_secs(BACKSTOP_INTERVAL_SECS),
            request_timeout: Duration::from_millis(DEFAULT_REQUEST_TIMEOUT_MS),
            domain_match: DomainMatch::default(),
        }
    }
}

impl RuntimeConfig {
    /// Clamp intervals to sane minimums so a typo cannot spin the probe loop.
    #[must_use]
    pub fn normalized(mut self) -> Self {
        self.poll_interval = self.poll_interval.max(Duration::from_millis(100));
        self.backstop_interval = self.backstop_interval.max(self.poll_interval);
        self.request_timeout = self.request_timeout.max(Duration::from_millis(50));
        self
    }
}
