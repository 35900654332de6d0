//! File Fetcher: streams a finished conversion to local storage chunk by chunk.

use crate::runtime::telemetry::Telemetry;
use futures::StreamExt;
use std::fmt;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::fs::File;
use tokio::io::AsyncWriteExt;

#[derive(Debug)]
pub enum FetchError {
    Request {
        url: String,
        source: reqwest::Error,
    },
    Status {
        url: String,
        status: u16,
    },
    Read {
        url: String,
        source: reqwest::Error,
    },
    Write {
        path: PathBuf,
        source: io::Error,
    },
}

impl fmt::Display for FetchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FetchError::Request { url, source } => write!(f, "request for {url} failed: {source}"),
            FetchError::Status { url, status } => {
                write!(f, "download of {url} returned HTTP status {status}")
            }
            FetchError::Read { url, source } => {
                write!(f, "reading body of {url} failed: {source}")
            }
            FetchError::Write { path, source } => {
                write!(f, "writing {} failed: {source}", path.display())
            }
        }
    }
}

impl std::error::Error for FetchError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            FetchError::Request { source, .. } | FetchError::Read { source, .. } => Some(source),
            FetchError::Write { source, .. } => Some(source),
            FetchError::Status { .. } => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct FileFetcher {
    http: reqwest::Client,
    telemetry: Arc<Telemetry>,
}

impl FileFetcher {
    pub fn new(http: reqwest::Client, telemetry: Arc<Telemetry>) -> Self {
        Self { http, telemetry }
    }

    /// Streams `url` into `destination` and returns the number of bytes written.
    ///
    /// The file is created (or truncated) only once the server answered with a
    /// success status. After a failure mid-stream its contents are undefined.
    pub async fn fetch(&self, url: &str, destination: &Path) -> Result<u64, FetchError> {
        let result = self.perform(url, destination).await;
        match &result {
            Ok(bytes) => {
                self.telemetry.record_download(*bytes);
                tracing::info!(path = %destination.display(), bytes, "file saved");
            }
            Err(err) => {
                self.telemetry.record_download_failure();
                tracing::error!(path = %destination.display(), error = %err, "download failed");
            }
        }
        result
    }

    async fn perform(&self, url: &str, destination: &Path) -> Result<u64, FetchError> {
        let response = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|source| FetchError::Request {
                url: url.to_owned(),
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: url.to_owned(),
                status: status.as_u16(),
            });
        }

        let write_error = |source| FetchError::Write {
            path: destination.to_path_buf(),
            source,
        };

        let mut file = File::create(destination).await.map_err(write_error)?;
        let mut stream = response.bytes_stream();
        let mut written = 0u64;

        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(|source| FetchError::Read {
                url: url.to_owned(),
                source,
            })?;
            file.write_all(&chunk).await.map_err(write_error)?;
            written += chunk.len() as u64;
        }

        file.flush().await.map_err(write_error)?;
        Ok(written)
    }
}
