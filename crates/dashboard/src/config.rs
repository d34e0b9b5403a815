//! Dashboard configuration from environment variables

use std::env;
use std::time::Duration;

use crate::orchestrator::PollPolicy;

#[derive(Clone, Debug)]
pub struct DashboardConfig {
    /// Base URL of the analysis backend
    pub api_url: String,

    /// Player whose games are shown on startup
    pub username: String,

    /// Delay between completion polls
    pub poll_interval: Duration,

    /// Growth factor over the initial count that also ends polling
    pub overshoot_factor: f64,

    /// Consecutive failed polls tolerated before giving up
    pub max_poll_errors: u32,

    /// Largest batch a single analysis request may ask for
    pub max_batch: u32,

    /// Per-request HTTP timeout
    pub http_timeout: Duration,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self::from_lookup(|_| None)
    }
}

impl DashboardConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build from any key lookup; unset or unparseable values fall back to defaults.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let parsed = |key: &str| lookup(key).and_then(|v| v.trim().parse::<f64>().ok());

        Self {
            api_url: lookup("DASHBOARD_API_URL")
                .unwrap_or_else(|| "http://localhost:8000".to_string()),
            username: lookup("DASHBOARD_USERNAME").unwrap_or_default(),
            poll_interval: parsed("POLL_INTERVAL_SECS")
                .and_then(|v| Duration::try_from_secs_f64(v).ok())
                .unwrap_or(Duration::from_secs(5)),
            overshoot_factor: parsed("POLL_OVERSHOOT_FACTOR")
                .filter(|v| v.is_finite() && *v >= 1.0)
                .unwrap_or(1.5),
            max_poll_errors: lookup("POLL_MAX_ERRORS")
                .and_then(|v| v.trim().parse().ok())
                .filter(|v| *v > 0)
                .unwrap_or(5),
            max_batch: lookup("MAX_BATCH")
                .and_then(|v| v.trim().parse().ok())
                .filter(|v| *v > 0)
                .unwrap_or(20),
            http_timeout: lookup("HTTP_TIMEOUT_SECS")
                .and_then(|v| v.trim().parse().ok())
                .filter(|v| *v > 0)
                .map(Duration::from_secs)
                .unwrap_or(Duration::from_secs(30)),
        }
    }

    pub fn poll_policy(&self) -> PollPolicy {
        PollPolicy {
            interval: self.poll_interval,
            overshoot_factor: self.overshoot_factor,
            max_consecutive_errors: self.max_poll_errors,
        }
    }
}
