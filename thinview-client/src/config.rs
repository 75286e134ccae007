//! Client configuration: defaults, overridable per deployment via env vars.

use std::str::FromStr;
use std::time::Duration;

use serde::Deserialize;
use tracing::warn;

pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:8080/services/mobile";
pub const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 30_000;
pub const DEFAULT_REPLAY_TTL_SECS: u64 = 300;
pub const DEFAULT_REPLAY_CAPACITY: usize = 256;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ClientConfig {
    pub base_url: String,
    pub request_timeout_ms: u64,
    pub replay_ttl_secs: u64,
    pub replay_capacity: usize,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            request_timeout_ms: DEFAULT_REQUEST_TIMEOUT_MS,
            replay_ttl_secs: DEFAULT_REPLAY_TTL_SECS,
            replay_capacity: DEFAULT_REPLAY_CAPACITY,
        }
    }
}

impl ClientConfig {
    /// Defaults overridden by `THINVIEW_*` environment variables.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`ClientConfig::from_env`] but reads from any key lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        Self {
            base_url: lookup("THINVIEW_BASE_URL").unwrap_or(defaults.base_url),
            request_timeout_ms: numeric(
                &lookup,
                "THINVIEW_REQUEST_TIMEOUT_MS",
                defaults.request_timeout_ms,
            ),
            replay_ttl_secs: numeric(&lookup, "THINVIEW_REPLAY_TTL_SECS", defaults.replay_ttl_secs),
            replay_capacity: numeric(&lookup, "THINVIEW_REPLAY_CAPACITY", defaults.replay_capacity),
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    pub fn replay_ttl(&self) -> Duration {
        Duration::from_secs(self.replay_ttl_secs)
    }
}

fn numeric<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> T
where
    T: FromStr + Copy + std::fmt::Display,
{
    let Some(raw) = lookup(key) else {
        return default;
    };
    match raw.trim().parse() {
        Ok(value) => value,
        Err(_) => {
            warn!(key, value = %raw, %default, "ignoring invalid config value");
            default
        }
    }
}
