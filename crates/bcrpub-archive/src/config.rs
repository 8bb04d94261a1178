//! Download configuration.
//!
//! Retry and redirect settings are process-wide in practice, but they are
//! always passed to the downloader explicitly through [`FetchConfig`]. The
//! environment is read in exactly one place, [`FetchConfig::from_env`].
//!
//! # Environment variables
//!
//! - `BACKOFF_DELAY_FACTOR`: base backoff delay in milliseconds (default 10000)
//! - `INTEGRATION_TESTING`: when non-empty, redirect every download to
//!   `INTEGRATION_TEST_ENDPOINT` (`scheme://host:port`), keeping the path

use std::time::Duration;

use url::Url;

use crate::{ArchiveError, Result};

pub const BACKOFF_DELAY_FACTOR_ENV: &str = "BACKOFF_DELAY_FACTOR";
pub const INTEGRATION_TESTING_ENV: &str = "INTEGRATION_TESTING";
pub const INTEGRATION_TEST_ENDPOINT_ENV: &str = "INTEGRATION_TEST_ENDPOINT";

const DEFAULT_USER_AGENT: &str = concat!("bcrpub/", env!("CARGO_PKG_VERSION"));
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(300);
const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
const DEFAULT_MAX_RETRIES: u32 = 3;
const DEFAULT_BACKOFF_FACTOR: Duration = Duration::from_millis(10_000);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchConfig {
    /// Attempts made after the first one.
    pub max_retries: u32,
    /// Base unit of the exponential backoff.
    pub backoff_factor: Duration,
    /// Per-attempt timeout, restarted on every retry.
    pub timeout: Duration,
    pub connect_timeout: Duration,
    pub user_agent: String,
    /// Stand-in server every request is sent to instead of the URL's own host.
    pub redirect: Option<Url>,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            max_retries: DEFAULT_MAX_RETRIES,
            backoff_factor: DEFAULT_BACKOFF_FACTOR,
            timeout: DEFAULT_TIMEOUT,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            redirect: None,
        }
    }
}

impl FetchConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a configuration from the process environment.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a configuration from an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(raw) = lookup(BACKOFF_DELAY_FACTOR_ENV).filter(|v| !v.trim().is_empty()) {
            let millis: u64 = raw.trim().parse().map_err(|_| {
                ArchiveError::Config(format!(
                    "{} must be a number of milliseconds, got '{}'",
                    BACKOFF_DELAY_FACTOR_ENV, raw
                ))
            })?;
            config.backoff_factor = Duration::from_millis(millis);
        }

        if lookup(INTEGRATION_TESTING_ENV).is_some_and(|v| !v.is_empty()) {
            let endpoint = lookup(INTEGRATION_TEST_ENDPOINT_ENV)
                .filter(|v| !v.is_empty())
                .ok_or_else(|| {
                    ArchiveError::Config(format!(
                        "{} is set but {} is missing",
                        INTEGRATION_TESTING_ENV, INTEGRATION_TEST_ENDPOINT_ENV
                    ))
                })?;
            config.redirect = Some(parse_endpoint(&endpoint)?);
        }

        Ok(config)
    }

    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    pub fn with_backoff_factor(mut self, backoff_factor: Duration) -> Self {
        self.backoff_factor = backoff_factor;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_connect_timeout(mut self, connect_timeout: Duration) -> Self {
        self.connect_timeout = connect_timeout;
        self
    }

    pub fn with_user_agent(mut self, user_agent: String) -> Self {
        self.user_agent = user_agent;
        self
    }

    pub fn with_redirect(mut self, endpoint: Url) -> Self {
        self.redirect = Some(endpoint);
        self
    }

    /// Delay to wait before retry number `retry` (1-based).
    pub fn backoff_delay(&self, retry: u32) -> Duration {
        self.backoff_factor
            .saturating_mul(2_u32.saturating_pow(retry))
    }
}

fn parse_endpoint(raw: &str) -> Result<Url> {
    let endpoint = Url::parse(raw).map_err(|e| {
        ArchiveError::Config(format!(
            "{} is not a valid URL ('{}'): {}",
            INTEGRATION_TEST_ENDPOINT_ENV, raw, e
        ))
    })?;
    if endpoint.host_str().is_none() {
        return Err(ArchiveError::Config(format!(
            "{} must include a host, got '{}'",
            INTEGRATION_TEST_ENDPOINT_ENV, raw
        )));
    }
    Ok(endpoint)
}
