//! Client configuration from the environment.
//!
//! | Variable             | Default  | Meaning                                   |
//! |----------------------|----------|-------------------------------------------|
//! | `TALLY_API_URL`      | required | Backend base URL, e.g. `https://host/api` |
//! | `TALLY_TIMEOUT_SECS` | `30`     | Per-request timeout                       |
//! | `TALLY_TIMEZONE`     | `UTC`    | IANA zone used to stamp new expenses      |

use std::time::Duration;

use chrono_tz::Tz;
use tally_engine::parse_timezone;

use crate::error::{ClientError, Result};

pub const ENV_API_URL: &str = "TALLY_API_URL";
pub const ENV_TIMEOUT_SECS: &str = "TALLY_TIMEOUT_SECS";
pub const ENV_TIMEZONE: &str = "TALLY_TIMEZONE";

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub base_url: String,
    pub timeout: Duration,
    pub timezone: Tz,
}

impl ClientConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            timeout: DEFAULT_TIMEOUT,
            timezone: Tz::UTC,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_timezone(mut self, timezone: Tz) -> Self {
        self.timezone = timezone;
        self
    }

    /// Read the configuration from process environment variables.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Config`] when `TALLY_API_URL` is missing or a
    /// value does not parse.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`from_env`](Self::from_env) with an injectable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let base_url = get(ENV_API_URL)
            .ok_or_else(|| ClientError::Config(format!("{ENV_API_URL} is not set")))?;
        if !base_url.starts_with("http://") && !base_url.starts_with("https://") {
            return Err(ClientError::Config(format!(
                "{ENV_API_URL} must be an http(s) URL, got '{base_url}'"
            )));
        }
        let mut config = Self::new(base_url);

        if let Some(raw) = get(ENV_TIMEOUT_SECS) {
            let secs: u64 = raw.parse().map_err(|_| {
                ClientError::Config(format!("{ENV_TIMEOUT_SECS} must be whole seconds, got '{raw}'"))
            })?;
            config.timeout = Duration::from_secs(secs);
        }
        config.timezone = Self::timezone_from_lookup(&lookup)?;
        Ok(config)
    }

    /// The `TALLY_TIMEZONE` part of [`from_lookup`](Self::from_lookup) alone,
    /// for callers that need "today" without a backend URL. Defaults to UTC.
    pub fn timezone_from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Tz> {
        match lookup(ENV_TIMEZONE).map(|v| v.trim().to_string()) {
            Some(raw) if !raw.is_empty() => Ok(parse_timezone(&raw)?),
            _ => Ok(Tz::UTC),
        }
    }
}
