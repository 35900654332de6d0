//! HTTP client for the remote conversion service. Houses the `LoaderClient`,
//! the `ServiceError` taxonomy, and the `ConversionApi` trait consumed by the
//! pipeline stages.

use crate::runtime::config::BatchConfig;
use crate::service::metrics::{ServiceMetrics, ServiceMetricsSnapshot};
use crate::service::options::ServiceOptions;
use crate::service::payload::{
    endpoint_url, PlaylistResponse, ProgressResponse, SubmitResponse, PLAYLIST_PATH,
    PROGRESS_PATH, SUBMIT_PATH,
};
use anyhow::{Context, Result};
use futures::future::BoxFuture;
use reqwest::header::CACHE_CONTROL;
use serde::de::DeserializeOwned;
use std::{fmt, sync::Arc};
use tokio::time::Instant;
use url::Url;

const SUBMIT_ENDPOINT: &str = "submit";
const PROGRESS_ENDPOINT: &str = "progress";
const PLAYLIST_ENDPOINT: &str = "playlist";

#[derive(Debug)]
pub enum ServiceError {
    InvalidUrl {
        endpoint: &'static str,
        source: url::ParseError,
    },
    Transport {
        endpoint: &'static str,
        source: reqwest::Error,
    },
    Timeout {
        endpoint: &'static str,
    },
    Status {
        endpoint: &'static str,
        status: u16,
    },
    Decode {
        endpoint: &'static str,
        source: serde_json::Error,
    },
}

impl ServiceError {
    pub fn endpoint(&self) -> &'static str {
        match self {
            ServiceError::InvalidUrl { endpoint, .. }
            | ServiceError::Transport { endpoint, .. }
            | ServiceError::Timeout { endpoint }
            | ServiceError::Status { endpoint, .. }
            | ServiceError::Decode { endpoint, .. } => endpoint,
        }
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            ServiceError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Whether repeating the same request can reasonably succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            ServiceError::InvalidUrl { .. } => false,
            ServiceError::Transport { .. }
            | ServiceError::Timeout { .. }
            | ServiceError::Decode { .. } => true,
            ServiceError::Status { status, .. } => {
                *status >= 500 || *status == 408 || *status == 429
            }
        }
    }
}

impl fmt::Display for ServiceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ServiceError::InvalidUrl { endpoint, source } => {
                write!(f, "{endpoint} request URL is invalid: {source}")
            }
            ServiceError::Transport { endpoint, source } => {
                write!(f, "{endpoint} request failed: {source}")
            }
            ServiceError::Timeout { endpoint } => write!(f, "{endpoint} request timed out"),
            ServiceError::Status { endpoint, status } => {
                write!(f, "{endpoint} request returned HTTP status {status}")
            }
            ServiceError::Decode { endpoint, source } => {
                write!(f, "{endpoint} response could not be decoded: {source}")
            }
        }
    }
}

impl std::error::Error for ServiceError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ServiceError::InvalidUrl { source, .. } => Some(source),
            ServiceError::Transport { source, .. } => Some(source),
            ServiceError::Decode { source, .. } => Some(source),
            ServiceError::Timeout { .. } | ServiceError::Status { .. } => None,
        }
    }
}

/// Remote conversion service as seen by the pipeline.
pub trait ConversionApi: Send + Sync {
    /// Submits one link for conversion into `format`.
    fn submit<'a>(
        &'a self,
        link: &'a str,
        format: &'a str,
    ) -> BoxFuture<'a, Result<SubmitResponse, ServiceError>>;

    /// Queries the status of a previously submitted job.
    fn progress<'a>(&'a self, job_id: &'a str)
        -> BoxFuture<'a, Result<ProgressResponse, ServiceError>>;

    /// Lists the entries of a playlist link.
    fn playlist<'a>(
        &'a self,
        link: &'a str,
        format: &'a str,
    ) -> BoxFuture<'a, Result<PlaylistResponse, ServiceError>>;
}

#[derive(Debug, Clone)]
pub struct LoaderClient {
    http: reqwest::Client,
    options: Arc<ServiceOptions>,
    metrics: Arc<ServiceMetrics>,
}

impl ConversionApi for LoaderClient {
    fn submit<'a>(
        &'a self,
        link: &'a str,
        format: &'a str,
    ) -> BoxFuture<'a, Result<SubmitResponse, ServiceError>> {
        Box::pin(self.submit(link, format))
    }

    fn progress<'a>(
        &'a self,
        job_id: &'a str,
    ) -> BoxFuture<'a, Result<ProgressResponse, ServiceError>> {
        Box::pin(self.progress(job_id))
    }

    fn playlist<'a>(
        &'a self,
        link: &'a str,
        format: &'a str,
    ) -> BoxFuture<'a, Result<PlaylistResponse, ServiceError>> {
        Box::pin(self.playlist(link, format))
    }
}

impl LoaderClient {
    pub fn new() -> Result<Self> {
        Self::with_options(ServiceOptions::default())
    }

    pub fn with_options(options: ServiceOptions) -> Result<Self> {
        options.validate()?;

        let http = reqwest::Client::builder()
            .user_agent(options.user_agent.clone())
            .build()
            .context("failed to build HTTP client")?;

        Ok(Self {
            http,
            options: Arc::new(options),
            metrics: Arc::new(ServiceMetrics::default()),
        })
    }

    pub fn from_config(config: &BatchConfig) -> Result<Self> {
        config.validate()?;
        let options = ServiceOptions {
            api_base_url: config.api_base_url().to_owned(),
            progress_base_url: config.progress_base_url().to_owned(),
            request_timeout: config.request_timeout(),
            user_agent: config.user_agent().to_owned(),
        };
        Self::with_options(options)
    }

    /// Underlying HTTP client, shared with the file fetcher so downloads reuse
    /// the same connection pool and user agent.
    pub fn http(&self) -> &reqwest::Client {
        &self.http
    }

    pub fn options(&self) -> &ServiceOptions {
        &self.options
    }

    pub fn metrics(&self) -> ServiceMetricsSnapshot {
        self.metrics.snapshot()
    }

    pub async fn submit(&self, link: &str, format: &str) -> Result<SubmitResponse, ServiceError> {
        let url = self.url_for(
            SUBMIT_ENDPOINT,
            &self.options.api_base_url,
            SUBMIT_PATH,
            &[("format", format), ("url", link)],
        )?;
        self.get_json(SUBMIT_ENDPOINT, url).await
    }

    pub async fn progress(&self, job_id: &str) -> Result<ProgressResponse, ServiceError> {
        let url = self.url_for(
            PROGRESS_ENDPOINT,
            &self.options.progress_base_url,
            PROGRESS_PATH,
            &[("id", job_id)],
        )?;
        self.get_json(PROGRESS_ENDPOINT, url).await
    }

    pub async fn playlist(
        &self,
        link: &str,
        format: &str,
    ) -> Result<PlaylistResponse, ServiceError> {
        let url = self.url_for(
            PLAYLIST_ENDPOINT,
            &self.options.api_base_url,
            PLAYLIST_PATH,
            &[("format", format), ("url", link)],
        )?;
        self.get_json(PLAYLIST_ENDPOINT, url).await
    }

    fn url_for(
        &self,
        endpoint: &'static str,
        base: &str,
        path: &str,
        query: &[(&str, &str)],
    ) -> Result<Url, ServiceError> {
        endpoint_url(base, path, query)
            .map_err(|source| ServiceError::InvalidUrl { endpoint, source })
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        endpoint: &'static str,
        url: Url,
    ) -> Result<T, ServiceError> {
        tracing::trace!(endpoint, url = %url, "sending service request");
        let started = Instant::now();
        let result = self.perform(endpoint, url).await;
        let latency = started.elapsed();

        match &result {
            Ok(_) => self.metrics.record_success(latency),
            Err(ServiceError::Timeout { .. }) => self.metrics.record_timeout(latency),
            Err(err) => {
                tracing::debug!(endpoint, error = %err, "service request failed");
                self.metrics.record_failure(latency);
            }
        }

        result
    }

    async fn perform<T: DeserializeOwned>(
        &self,
        endpoint: &'static str,
        url: Url,
    ) -> Result<T, ServiceError> {
        let response = self
            .http
            .get(url)
            .header(CACHE_CONTROL, "no-store")
            .timeout(self.options.request_timeout)
            .send()
            .await
            .map_err(|source| transport_error(endpoint, source))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ServiceError::Status {
                endpoint,
                status: status.as_u16(),
            });
        }

        let body = response
            .bytes()
            .await
            .map_err(|source| transport_error(endpoint, source))?;

        serde_json::from_slice(&body).map_err(|source| ServiceError::Decode { endpoint, source })
    }
}

fn transport_error(endpoint: &'static str, source: reqwest::Error) -> ServiceError {
    if source.is_timeout() {
        ServiceError::Timeout { endpoint }
    } else {
        ServiceError::Transport { endpoint, source }
    }
}
