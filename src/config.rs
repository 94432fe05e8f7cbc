//! Client configuration from the environment

use crate::reveal::DEFAULT_REVEAL_DELAY;
use std::time::Duration;

pub const DEFAULT_ORACLE_URL: &str = "http://127.0.0.1:5000";

#[derive(Debug, Clone, PartialEq)]
pub struct ClientConfig {
    /// Base URL of the oracle, without trailing slash
    pub oracle_base_url: String,
    /// Per-request timeout; `None` waits indefinitely
    pub request_timeout: Option<Duration>,
    /// Delay between revealed characters
    pub reveal_delay: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            oracle_base_url: DEFAULT_ORACLE_URL.to_string(),
            request_timeout: None,
            reveal_delay: DEFAULT_REVEAL_DELAY,
        }
    }
}

impl ClientConfig {
    /// Read `ORACLE_BASE_URL`, `ORACLE_TIMEOUT_SECS` and `REVEAL_DELAY_MS`
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup. Unparseable values fall back to defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();

        let oracle_base_url = lookup("ORACLE_BASE_URL")
            .map(|url| url.trim().to_string())
            .filter(|url| !url.is_empty())
            .unwrap_or(defaults.oracle_base_url);

        let request_timeout = lookup("ORACLE_TIMEOUT_SECS")
            .and_then(|raw| parse_u64("ORACLE_TIMEOUT_SECS", &raw))
            .filter(|secs| *secs > 0)
            .map(Duration::from_secs);

        let reveal_delay = lookup("REVEAL_DELAY_MS")
            .and_then(|raw| parse_u64("REVEAL_DELAY_MS", &raw))
            .map_or(defaults.reveal_delay, Duration::from_millis);

        Self {
            oracle_base_url,
            request_timeout,
            reveal_delay,
        }
    }
}

fn parse_u64(key: &str, raw: &str) -> Option<u64> {
    match raw.trim().parse() {
        Ok(value) => Some(value),
        Err(e) => {
            tracing::warn!(key, value = %raw, error = %e, "Ignoring invalid setting");
            None
        }
    }
}
