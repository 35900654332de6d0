//! Progress Poller: queries a job's status at a fixed interval until the
//! service reports a result URL, a non-transient failure occurs, or the attempt
//! budget runs out.

use crate::pipeline::model::{ConversionResult, JobHandle};
use crate::runtime::config::BatchConfig;
use crate::runtime::hooks::{BatchHooks, NoopHooks};
use crate::runtime::progress::ProgressMilestones;
use crate::runtime::telemetry::Telemetry;
use crate::service::client::{ConversionApi, ServiceError};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;

#[derive(Debug)]
pub enum PollError {
    /// Every attempt ran without the job becoming ready.
    Exhausted {
        job_id: String,
        title: String,
        attempts: usize,
        last_error: Option<ServiceError>,
    },
    /// The service rejected the progress query in a way retrying cannot fix.
    Failed {
        job_id: String,
        title: String,
        source: ServiceError,
    },
}

impl PollError {
    pub fn job_id(&self) -> &str {
        match self {
            PollError::Exhausted { job_id, .. } | PollError::Failed { job_id, .. } => job_id,
        }
    }

    pub fn title(&self) -> &str {
        match self {
            PollError::Exhausted { title, .. } | PollError::Failed { title, .. } => title,
        }
    }
}

impl fmt::Display for PollError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PollError::Exhausted {
                job_id,
                title,
                attempts,
                last_error,
            } => {
                write!(
                    f,
                    "job {job_id} ({title}) not ready after {attempts} attempts"
                )?;
                if let Some(err) = last_error {
                    write!(f, "; last error: {err}")?;
                }
                Ok(())
            }
            PollError::Failed {
                job_id,
                title,
                source,
            } => write!(f, "polling job {job_id} ({title}) failed: {source}"),
        }
    }
}

impl std::error::Error for PollError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            PollError::Exhausted { last_error, .. } => last_error
                .as_ref()
                .map(|err| err as &(dyn std::error::Error + 'static)),
            PollError::Failed { source, .. } => Some(source),
        }
    }
}

/// Result of a single progress request.
enum AttemptOutcome {
    Pending(Option<ServiceError>),
    Ready(ConversionResult),
    Failed(ServiceError),
}

pub struct ProgressPoller<A: ConversionApi> {
    api: Arc<A>,
    telemetry: Arc<Telemetry>,
    hooks: Arc<dyn BatchHooks>,
    max_attempts: usize,
    interval: Duration,
}

impl<A: ConversionApi> ProgressPoller<A> {
    pub fn new(
        api: Arc<A>,
        telemetry: Arc<Telemetry>,
        max_attempts: usize,
        interval: Duration,
    ) -> Self {
        Self {
            api,
            telemetry,
            hooks: Arc::new(NoopHooks),
            max_attempts: max_attempts.max(1),
            interval,
        }
    }

    pub fn from_config(api: Arc<A>, telemetry: Arc<Telemetry>, config: &BatchConfig) -> Self {
        Self::new(
            api,
            telemetry,
            config.poll_max_attempts(),
            config.poll_interval(),
        )
    }

    pub fn with_hooks(mut self, hooks: Arc<dyn BatchHooks>) -> Self {
        self.hooks = hooks;
        self
    }

    pub fn max_attempts(&self) -> usize {
        self.max_attempts
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Polls `job` until it is ready. Issues at most `max_attempts` requests and
    /// sleeps `interval` between two of them.
    pub async fn poll(&self, job: &JobHandle) -> Result<ConversionResult, PollError> {
        let mut milestones = ProgressMilestones::new();
        let mut last_error = None;

        for attempt in 1..=self.max_attempts {
            match self.attempt(job, &mut milestones).await {
                AttemptOutcome::Ready(result) => {
                    tracing::info!(
                        job_id = %job.job_id,
                        title = %job.display_title,
                        attempt,
                        url = %result.result_url,
                        "conversion ready"
                    );
                    return Ok(result);
                }
                AttemptOutcome::Failed(source) => {
                    tracing::error!(
                        job_id = %job.job_id,
                        title = %job.display_title,
                        attempt,
                        error = %source,
                        "progress query rejected; giving up on job"
                    );
                    return Err(PollError::Failed {
                        job_id: job.job_id.clone(),
                        title: job.display_title.clone(),
                        source,
                    });
                }
                AttemptOutcome::Pending(error) => {
                    if let Some(err) = &error {
                        tracing::warn!(
                            job_id = %job.job_id,
                            attempt,
                            error = %err,
                            "progress query failed; retrying"
                        );
                    }
                    last_error = error;
                }
            }

            if attempt < self.max_attempts {
                sleep(self.interval).await;
            }
        }

        tracing::warn!(
            job_id = %job.job_id,
            title = %job.display_title,
            attempts = self.max_attempts,
            "max attempts reached; conversion not ready"
        );
        Err(PollError::Exhausted {
            job_id: job.job_id.clone(),
            title: job.display_title.clone(),
            attempts: self.max_attempts,
            last_error,
        })
    }

    async fn attempt(
        &self,
        job: &JobHandle,
        milestones: &mut ProgressMilestones,
    ) -> AttemptOutcome {
        self.telemetry.record_poll_attempt();

        let response = match self.api.progress(&job.job_id).await {
            Ok(response) => response,
            Err(err) => {
                self.telemetry.record_poll_error();
                return if err.is_transient() {
                    AttemptOutcome::Pending(Some(err))
                } else {
                    AttemptOutcome::Failed(err)
                };
            }
        };

        if let Some(percent) = milestones.advance(response.percent()) {
            tracing::info!(
                job_id = %job.job_id,
                title = %job.display_title,
                progress = percent,
                "conversion progress"
            );
            self.hooks.progress(job, percent);
        }

        match response.result_url() {
            Some(url) => AttemptOutcome::Ready(ConversionResult {
                result_url: url.to_owned(),
                display_title: job.display_title.clone(),
            }),
            None => AttemptOutcome::Pending(None),
        }
    }
}
