use crate::service::options::{
    ensure_http_url, DEFAULT_API_BASE_URL, DEFAULT_PROGRESS_BASE_URL, DEFAULT_USER_AGENT,
};
use anyhow::{bail, Context, Result};
use std::env;
use std::str::FromStr;
use std::time::Duration;

pub const DEFAULT_POLL_MAX_ATTEMPTS: usize = 100;
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(1_500);
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

pub const ENV_API_URL: &str = "TUBEBATCH_API_URL";
pub const ENV_PROGRESS_URL: &str = "TUBEBATCH_PROGRESS_URL";
pub const ENV_POLL_ATTEMPTS: &str = "TUBEBATCH_POLL_ATTEMPTS";
pub const ENV_POLL_INTERVAL_MS: &str = "TUBEBATCH_POLL_INTERVAL_MS";
pub const ENV_REQUEST_TIMEOUT_SECS: &str = "TUBEBATCH_REQUEST_TIMEOUT_SECS";
pub const ENV_USER_AGENT: &str = "TUBEBATCH_USER_AGENT";

/// Runtime configuration for a batch run.
///
/// All instances must be constructed via [`BatchConfig::builder`] or [`BatchConfig::new`]
/// so invariants are validated before any consumer observes the values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchConfig {
    api_base_url: String,
    progress_base_url: String,
    poll_max_attempts: usize,
    poll_interval: Duration,
    request_timeout: Duration,
    user_agent: String,
}

pub struct BatchConfigParams {
    pub api_base_url: String,
    pub progress_base_url: String,
    pub poll_max_attempts: usize,
    pub poll_interval: Duration,
    pub request_timeout: Duration,
    pub user_agent: String,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.to_owned(),
            progress_base_url: DEFAULT_PROGRESS_BASE_URL.to_owned(),
            poll_max_attempts: DEFAULT_POLL_MAX_ATTEMPTS,
            poll_interval: DEFAULT_POLL_INTERVAL,
            request_timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
            user_agent: DEFAULT_USER_AGENT.to_owned(),
        }
    }
}

impl BatchConfig {
    /// Returns a builder to incrementally construct and validate a configuration.
    pub fn builder() -> BatchConfigBuilder {
        BatchConfigBuilder::default()
    }

    /// Constructs a configuration directly from the provided values.
    pub fn new(params: BatchConfigParams) -> Result<Self> {
        let BatchConfigParams {
            api_base_url,
            progress_base_url,
            poll_max_attempts,
            poll_interval,
            request_timeout,
            user_agent,
        } = params;

        let config = Self {
            api_base_url: trimmed_string(api_base_url),
            progress_base_url: trimmed_string(progress_base_url),
            poll_max_attempts,
            poll_interval,
            request_timeout,
            user_agent: trimmed_string(user_agent),
        };

        config.validate()?;
        Ok(config)
    }

    /// Builds a configuration from `TUBEBATCH_*` environment variables, falling back to
    /// the defaults for anything unset.
    pub fn from_env() -> Result<Self> {
        let mut builder = Self::builder();

        if let Some(url) = read_env(ENV_API_URL) {
            builder = builder.api_base_url(url);
        }
        if let Some(url) = read_env(ENV_PROGRESS_URL) {
            builder = builder.progress_base_url(url);
        }
        if let Some(attempts) = parse_env::<usize>(ENV_POLL_ATTEMPTS)? {
            builder = builder.poll_max_attempts(attempts);
        }
        if let Some(millis) = parse_env::<u64>(ENV_POLL_INTERVAL_MS)? {
            builder = builder.poll_interval(Duration::from_millis(millis));
        }
        if let Some(secs) = parse_env::<u64>(ENV_REQUEST_TIMEOUT_SECS)? {
            builder = builder.request_timeout(Duration::from_secs(secs));
        }
        if let Some(agent) = read_env(ENV_USER_AGENT) {
            builder = builder.user_agent(agent);
        }

        builder.build()
    }

    /// Base URL of the submission and playlist endpoints.
    pub fn api_base_url(&self) -> &str {
        &self.api_base_url
    }

    /// Base URL of the progress endpoint.
    pub fn progress_base_url(&self) -> &str {
        &self.progress_base_url
    }

    /// Total progress requests issued per job before it is given up.
    pub fn poll_max_attempts(&self) -> usize {
        self.poll_max_attempts
    }

    /// Fixed delay between two progress requests for the same job.
    pub fn poll_interval(&self) -> Duration {
        self.poll_interval
    }

    /// Timeout applied to each JSON request against the service.
    pub fn request_timeout(&self) -> Duration {
        self.request_timeout
    }

    pub fn user_agent(&self) -> &str {
        &self.user_agent
    }

    /// Performs validation on an existing configuration instance.
    pub fn validate(&self) -> Result<()> {
        ensure_http_url(&self.api_base_url, "api_base_url")?;
        ensure_http_url(&self.progress_base_url, "progress_base_url")?;

        if self.poll_max_attempts == 0 {
            bail!("poll_max_attempts must be greater than 0");
        }

        if self.poll_interval.is_zero() {
            bail!("poll_interval must be greater than 0");
        }

        if self.request_timeout.is_zero() {
            bail!("request_timeout must be greater than 0");
        }

        if self.user_agent.is_empty() {
            bail!("user_agent cannot be empty");
        }

        Ok(())
    }
}

#[derive(Debug, Default, Clone)]
pub struct BatchConfigBuilder {
    api_base_url: Option<String>,
    progress_base_url: Option<String>,
    poll_max_attempts: Option<usize>,
    poll_interval: Option<Duration>,
    request_timeout: Option<Duration>,
    user_agent: Option<String>,
}

impl BatchConfigBuilder {
    pub fn api_base_url(mut self, url: impl Into<String>) -> Self {
        self.api_base_url = Some(url.into());
        self
    }

    pub fn progress_base_url(mut self, url: impl Into<String>) -> Self {
        self.progress_base_url = Some(url.into());
        self
    }

    pub fn poll_max_attempts(mut self, attempts: usize) -> Self {
        self.poll_max_attempts = Some(attempts);
        self
    }

    pub fn poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = Some(interval);
        self
    }

    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = Some(timeout);
        self
    }

    pub fn user_agent(mut self, agent: impl Into<String>) -> Self {
        self.user_agent = Some(agent.into());
        self
    }

    pub fn build(self) -> Result<BatchConfig> {
        let defaults = BatchConfig::default();
        let params = BatchConfigParams {
            api_base_url: self.api_base_url.unwrap_or(defaults.api_base_url),
            progress_base_url: self.progress_base_url.unwrap_or(defaults.progress_base_url),
            poll_max_attempts: self.poll_max_attempts.unwrap_or(defaults.poll_max_attempts),
            poll_interval: self.poll_interval.unwrap_or(defaults.poll_interval),
            request_timeout: self.request_timeout.unwrap_or(defaults.request_timeout),
            user_agent: self.user_agent.unwrap_or(defaults.user_agent),
        };

        BatchConfig::new(params)
    }
}

fn trimmed_string(value: String) -> String {
    value.trim().to_owned()
}

fn read_env(key: &str) -> Option<String> {
    env::var(key)
        .ok()
        .map(|value| value.trim().to_owned())
        .filter(|value| !value.is_empty())
}

fn parse_env<T>(key: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    read_env(key)
        .map(|raw| {
            raw.parse::<T>()
                .with_context(|| format!("{key} must be a valid number, got {raw:?}"))
        })
        .transpose()
}
