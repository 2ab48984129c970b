// Client configuration shared by the CLI and the local bridge

use crate::paiza::{DEFAULT_API_BASE, DEFAULT_API_KEY};
use std::time::Duration;

pub const DEFAULT_MAX_WAIT_MS: u64 = 30_000;
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 500;

/// Timing for one run-and-wait cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunOptions {
    pub max_wait: Duration,
    pub poll_interval: Duration,
}

impl RunOptions {
    pub fn from_millis(max_wait_ms: u64, poll_interval_ms: u64) -> Self {
        Self {
            max_wait: Duration::from_millis(max_wait_ms),
            poll_interval: Duration::from_millis(poll_interval_ms),
        }
    }

    /// Apply caller overrides on top of these options
    pub fn with_overrides(self, max_wait_ms: Option<u64>, poll_interval_ms: Option<u64>) -> Self {
        Self {
            max_wait: max_wait_ms.map(Duration::from_millis).unwrap_or(self.max_wait),
            poll_interval: poll_interval_ms
                .map(Duration::from_millis)
                .unwrap_or(self.poll_interval),
        }
    }
}

impl Default for RunOptions {
    fn default() -> Self {
        Self::from_millis(DEFAULT_MAX_WAIT_MS, DEFAULT_POLL_INTERVAL_MS)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    pub api_base: String,
    pub api_key: String,
    pub run: RunOptions,
}

impl ClientConfig {
    /// Read from PAIZA_API_BASE, PAIZA_API_KEY, PAIZA_MAX_WAIT_MS and
    /// PAIZA_POLL_INTERVAL_MS, falling back to the public guest endpoint.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let millis = |key: &str, default: u64| {
            lookup(key)
                .and_then(|v| v.trim().parse::<u64>().ok())
                .unwrap_or(default)
        };

        Self {
            api_base: lookup("PAIZA_API_BASE").unwrap_or_else(|| DEFAULT_API_BASE.to_string()),
            api_key: lookup("PAIZA_API_KEY").unwrap_or_else(|| DEFAULT_API_KEY.to_string()),
            run: RunOptions::from_millis(
                millis("PAIZA_MAX_WAIT_MS", DEFAULT_MAX_WAIT_MS),
                millis("PAIZA_POLL_INTERVAL_MS", DEFAULT_POLL_INTERVAL_MS),
            ),
        }
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_base: DEFAULT_API_BASE.to_string(),
            api_key: DEFAULT_API_KEY.to_string(),
            run: RunOptions::default(),
        }
    }
}
