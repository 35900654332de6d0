//! Batch orchestration.
//!
//! `BatchOrchestrator` drives every work item through the requester, the
//! poller, and the fetcher. Each stage launches all of its operations together
//! on the current task and waits for every one of them to settle before the
//! next stage starts. A stage yields one `Result` per item; only the successes
//! feed the next stage, so a failing item never affects its siblings.

use crate::pipeline::fetcher::FileFetcher;
use crate::pipeline::model::{BatchOutcome, ConversionResult, JobHandle, WorkItem};
use crate::pipeline::poller::ProgressPoller;
use crate::pipeline::requester::ConversionRequester;
use crate::runtime::config::BatchConfig;
use crate::runtime::hooks::{BatchHooks, BatchStage, NoopHooks};
use crate::runtime::telemetry::Telemetry;
use crate::service::client::ConversionApi;
use futures::future::join_all;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

pub struct BatchOrchestrator<A: ConversionApi> {
    requester: ConversionRequester<A>,
    poller: ProgressPoller<A>,
    fetcher: FileFetcher,
    hooks: Arc<dyn BatchHooks>,
    telemetry: Arc<Telemetry>,
}

impl<A: ConversionApi> BatchOrchestrator<A> {
    pub fn new(
        api: Arc<A>,
        http: reqwest::Client,
        config: &BatchConfig,
        telemetry: Arc<Telemetry>,
    ) -> Self {
        Self {
            requester: ConversionRequester::new(api.clone(), telemetry.clone()),
            poller: ProgressPoller::from_config(api, telemetry.clone(), config),
            fetcher: FileFetcher::new(http, telemetry.clone()),
            hooks: Arc::new(NoopHooks),
            telemetry,
        }
    }

    /// Installs `hooks` on the orchestrator and on the poller it owns.
    pub fn with_hooks(mut self, hooks: Arc<dyn BatchHooks>) -> Self {
        self.poller = self.poller.with_hooks(hooks.clone());
        self.hooks = hooks;
        self
    }

    pub fn telemetry(&self) -> &Arc<Telemetry> {
        &self.telemetry
    }

    /// Runs the whole batch. Per-item failures are logged and dropped; the
    /// returned counts describe how far each item got.
    pub async fn run(&self, items: &[WorkItem], format: &str, destination: &Path) -> BatchOutcome {
        let mut outcome = BatchOutcome {
            submitted: items.len(),
            ..BatchOutcome::default()
        };

        let handles = self.submit_stage(items, format).await;
        outcome.succeeded_submission = handles.len();

        let results = self.poll_stage(&handles).await;
        outcome.ready = results.len();

        if let Err(err) = ensure_folder(destination).await {
            tracing::error!(
                folder = %destination.display(),
                error = %err,
                "cannot create destination folder; skipping downloads"
            );
            return outcome;
        }

        outcome.saved = self.fetch_stage(&results, format, destination).await;
        outcome.succeeded_download = outcome.saved.len();

        tracing::info!(
            submitted = outcome.submitted,
            succeeded_submission = outcome.succeeded_submission,
            ready = outcome.ready,
            downloaded = outcome.succeeded_download,
            "batch finished"
        );
        outcome
    }

    async fn submit_stage(&self, items: &[WorkItem], format: &str) -> Vec<JobHandle> {
        self.hooks.stage_started(BatchStage::Submit, items.len());

        let settled = join_all(items.iter().map(|item| async move {
            let result = self.requester.submit(item, format).await;
            self.hooks
                .item_settled(BatchStage::Submit, &item.display_title, result.is_ok());
            result
        }))
        .await;

        let (handles, failures) = partition_settled(settled);
        tracing::info!(
            total = items.len(),
            succeeded = handles.len(),
            failed = failures.len(),
            "submission stage settled"
        );
        handles
    }

    async fn poll_stage(&self, handles: &[JobHandle]) -> Vec<ConversionResult> {
        self.hooks.stage_started(BatchStage::Poll, handles.len());

        let settled = join_all(handles.iter().map(|handle| async move {
            let result = self.poller.poll(handle).await;
            self.hooks
                .item_settled(BatchStage::Poll, &handle.display_title, result.is_ok());
            result
        }))
        .await;

        let (results, failures) = partition_settled(settled);
        if !failures.is_empty() {
            tracing::warn!(
                dropped = failures.len(),
                "jobs dropped before download (not ready or failed)"
            );
        }
        results
    }

    async fn fetch_stage(
        &self,
        results: &[ConversionResult],
        format: &str,
        destination: &Path,
    ) -> Vec<PathBuf> {
        self.hooks.stage_started(BatchStage::Fetch, results.len());

        let settled = join_all(results.iter().map(|result| async move {
            let path = destination_path(destination, &result.display_title, format);
            let fetched = self
                .fetcher
                .fetch(&result.result_url, &path)
                .await
                .map(|_| path);
            self.hooks
                .item_settled(BatchStage::Fetch, &result.display_title, fetched.is_ok());
            fetched
        }))
        .await;

        let (saved, failures) = partition_settled(settled);
        if !failures.is_empty() {
            tracing::warn!(failed = failures.len(), "some downloads failed");
        }
        saved
    }
}

/// Splits settled stage results into successes and failures, keeping order.
pub fn partition_settled<T, E>(settled: Vec<Result<T, E>>) -> (Vec<T>, Vec<E>) {
    let mut successes = Vec::with_capacity(settled.len());
    let mut failures = Vec::new();
    for result in settled {
        match result {
            Ok(value) => successes.push(value),
            Err(err) => failures.push(err),
        }
    }
    (successes, failures)
}

/// Creates `folder` (and missing parents) unless it already exists.
pub async fn ensure_folder(folder: &Path) -> io::Result<()> {
    tokio::fs::create_dir_all(folder).await
}

/// `<folder>/<title>.<format>`, falling back to a millisecond timestamp when the
/// title is blank. Path separators and control characters become `_`.
pub fn destination_path(folder: &Path, title: &str, format: &str) -> PathBuf {
    let title = title.trim();
    let stem = if title.is_empty() {
        chrono::Utc::now().timestamp_millis().to_string()
    } else {
        sanitize_file_stem(title)
    };
    folder.join(format!("{stem}.{format}"))
}

fn sanitize_file_stem(title: &str) -> String {
    title
        .chars()
        .map(|c| {
            if c == '/' || c == '\\' || c.is_control() {
                '_'
            } else {
                c
            }
        })
        .collect()
}
