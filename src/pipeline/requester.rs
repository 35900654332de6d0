//! Conversion Requester: submits a single work item to the remote service and
//! turns the reply into a `JobHandle`.

use crate::pipeline::model::{JobHandle, WorkItem};
use crate::runtime::telemetry::Telemetry;
use crate::service::client::{ConversionApi, ServiceError};
use std::fmt;
use std::sync::Arc;

#[derive(Debug)]
pub enum SubmissionError {
    Service { title: String, source: ServiceError },
    Rejected { title: String },
}

impl SubmissionError {
    pub fn title(&self) -> &str {
        match self {
            SubmissionError::Service { title, .. } | SubmissionError::Rejected { title } => title,
        }
    }
}

impl fmt::Display for SubmissionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SubmissionError::Service { title, source } => {
                write!(f, "submission of {title} failed: {source}")
            }
            SubmissionError::Rejected { title } => {
                write!(f, "service did not accept {title} (no job id returned)")
            }
        }
    }
}

impl std::error::Error for SubmissionError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SubmissionError::Service { source, .. } => Some(source),
            SubmissionError::Rejected { .. } => None,
        }
    }
}

pub struct ConversionRequester<A: ConversionApi> {
    api: Arc<A>,
    telemetry: Arc<Telemetry>,
}

impl<A: ConversionApi> ConversionRequester<A> {
    pub fn new(api: Arc<A>, telemetry: Arc<Telemetry>) -> Self {
        Self { api, telemetry }
    }

    /// Submits `item` for conversion into `format`. One outbound request, never retried.
    pub async fn submit(
        &self,
        item: &WorkItem,
        format: &str,
    ) -> Result<JobHandle, SubmissionError> {
        let result = self.perform(item, format).await;
        self.telemetry.record_submission(result.is_ok());

        match &result {
            Ok(handle) => tracing::debug!(
                job_id = %handle.job_id,
                title = %handle.display_title,
                "conversion submitted"
            ),
            Err(err) => tracing::error!(
                link = %item.source_link,
                title = %item.display_title,
                error = %err,
                "conversion submission failed"
            ),
        }

        result
    }

    async fn perform(&self, item: &WorkItem, format: &str) -> Result<JobHandle, SubmissionError> {
        let response = self
            .api
            .submit(&item.source_link, format)
            .await
            .map_err(|source| SubmissionError::Service {
                title: item.display_title.clone(),
                source,
            })?;

        let job_id = response
            .job_id()
            .ok_or_else(|| SubmissionError::Rejected {
                title: item.display_title.clone(),
            })?
            .to_owned();

        let display_title = response
            .title()
            .map(str::to_owned)
            .unwrap_or_else(|| item.display_title.clone());

        Ok(JobHandle {
            job_id,
            display_title,
        })
    }
}
