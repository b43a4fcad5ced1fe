use std::time::Duration;

use crate::OptionsError;

/// Upper bound for the per-attempt timeout.
pub const MAX_TIMEOUT: Duration = Duration::from_secs(300);

/// Configures engine timeout and retry schedule.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct EngineOptions {
    /// Per-attempt timeout; zero means "use `max_timeout`".
    pub timeout: Duration,
    /// Ceiling the effective timeout is clamped to.
    pub max_timeout: Duration,
    /// Pause after each failed attempt; its length is the attempt count.
    /// Empty means exactly one attempt.
    pub retry_delays: Vec<Duration>,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            max_timeout: MAX_TIMEOUT,
            retry_delays: Vec::new(),
        }
    }
}

impl EngineOptions {
    pub fn new(timeout: Duration, retry_delays: impl Into<Vec<Duration>>) -> Self {
        Self {
            timeout,
            retry_delays: retry_delays.into(),
            ..Self::default()
        }
    }

    /// Reads options from the environment, falling back to defaults.
    ///
    /// Reads:
    /// - `DEMAND_TIMEOUT_MS`: per-attempt timeout in milliseconds
    /// - `DEMAND_MAX_TIMEOUT_MS`: timeout ceiling in milliseconds
    /// - `DEMAND_RETRY_DELAYS_MS`: comma-separated pauses, e.g. `100,500,1000`
    pub fn from_env() -> Result<Self, OptionsError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, OptionsError> {
        let mut options = Self::default();

        if let Some(value) = lookup("DEMAND_TIMEOUT_MS") {
            options.timeout = parse_millis("DEMAND_TIMEOUT_MS", &value)?;
        }
        if let Some(value) = lookup("DEMAND_MAX_TIMEOUT_MS") {
            options.max_timeout = parse_millis("DEMAND_MAX_TIMEOUT_MS", &value)?;
        }
        if let Some(value) = lookup("DEMAND_RETRY_DELAYS_MS") {
            options.retry_delays = value
                .split(',')
                .map(str::trim)
                .filter(|item| !item.is_empty())
                .map(|item| parse_millis("DEMAND_RETRY_DELAYS_MS", item))
                .collect::<Result<_, _>>()?;
        }

        Ok(options)
    }

    /// Timeout actually applied to each attempt.
    pub fn effective_timeout(&self) -> Duration {
        if self.timeout.is_zero() {
            self.max_timeout
        } else {
            self.timeout.min(self.max_timeout)
        }
    }
}

fn parse_millis(name: &'static str, value: &str) -> Result<Duration, OptionsError> {
    value
        .trim()
        .parse::<u64>()
        .map(Duration::from_millis)
        .map_err(|_| OptionsError::InvalidMillis {
            name,
            value: value.to_owned(),
        })
}
