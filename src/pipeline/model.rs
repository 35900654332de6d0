//! Values flowing between the pipeline stages. Each one is owned by exactly one
//! item's pipeline instance and consumed by the next stage.

use std::path::PathBuf;

/// One playlist entry waiting to be submitted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkItem {
    pub source_link: String,
    pub display_title: String,
}

impl WorkItem {
    pub fn new(source_link: impl Into<String>, display_title: impl Into<String>) -> Self {
        Self {
            source_link: source_link.into(),
            display_title: display_title.into(),
        }
    }
}

/// A job accepted by the conversion service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobHandle {
    pub job_id: String,
    pub display_title: String,
}

/// A finished conversion ready to be downloaded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversionResult {
    pub result_url: String,
    pub display_title: String,
}

/// Aggregate counts of a batch run.
///
/// `succeeded_download <= ready <= succeeded_submission <= submitted` always holds.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchOutcome {
    pub submitted: usize,
    pub succeeded_submission: usize,
    pub ready: usize,
    pub succeeded_download: usize,
    pub saved: Vec<PathBuf>,
}

impl BatchOutcome {
    pub fn failed(&self) -> usize {
        self.submitted.saturating_sub(self.succeeded_download)
    }

    pub fn is_complete(&self) -> bool {
        self.succeeded_download == self.submitted
    }
}
