//! Configurable knobs for the conversion service client along with validation
//! helpers so callers can reason about endpoints, timeouts, and identification.

use anyhow::{bail, Result};
use std::time::Duration;

pub const DEFAULT_API_BASE_URL: &str = "https://loader.to";
pub const DEFAULT_PROGRESS_BASE_URL: &str = "https://p.oceansaver.in";
pub const DEFAULT_USER_AGENT: &str = concat!("tubebatch/", env!("CARGO_PKG_VERSION"));
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Clone)]
pub struct ServiceOptions {
    pub api_base_url: String,
    pub progress_base_url: String,
    pub request_timeout: Duration,
    pub user_agent: String,
}

impl Default for ServiceOptions {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.to_owned(),
            progress_base_url: DEFAULT_PROGRESS_BASE_URL.to_owned(),
            request_timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
            user_agent: DEFAULT_USER_AGENT.to_owned(),
        }
    }
}

impl ServiceOptions {
    pub(crate) fn validate(&self) -> Result<()> {
        ensure_http_url(&self.api_base_url, "api_base_url")?;
        ensure_http_url(&self.progress_base_url, "progress_base_url")?;
        if self.request_timeout.is_zero() {
            bail!("request_timeout must be greater than 0");
        }
        if self.user_agent.trim().is_empty() {
            bail!("user_agent cannot be empty");
        }
        Ok(())
    }
}

pub(crate) fn ensure_http_url(url: &str, field: &str) -> Result<()> {
    let url = url.trim();
    if !(url.starts_with("http://") || url.starts_with("https://")) {
        bail!("{field} must start with http:// or https://");
    }
    Ok(())
}
