use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::Result;
use once_cell::sync::Lazy;
use tracing_subscriber::EnvFilter;
use tubebatch::{BatchConfig, BatchHooks, BatchStage, JobHandle};

static TRACING_SUBSCRIBER: Lazy<()> = Lazy::new(|| {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
});

pub fn init_tracing() {
    Lazy::force(&TRACING_SUBSCRIBER);
}

/// Points both service endpoints at `base_url` and polls on a short tick.
pub fn mock_config(base_url: &str, attempts: usize) -> Result<BatchConfig> {
    BatchConfig::builder()
        .api_base_url(base_url)
        .progress_base_url(base_url)
        .poll_max_attempts(attempts)
        .poll_interval(Duration::from_millis(5))
        .request_timeout(Duration::from_secs(5))
        .build()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HookEvent {
    StageStarted(BatchStage, usize),
    Settled(BatchStage, String, bool),
    Progress(String, u32),
}

#[derive(Default)]
pub struct RecordingHooks {
    events: Mutex<Vec<HookEvent>>,
}

impl RecordingHooks {
    pub fn shared() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn events(&self) -> Vec<HookEvent> {
        self.events.lock().expect("hooks poisoned").clone()
    }

    pub fn stages(&self) -> Vec<(BatchStage, usize)> {
        self.events()
            .into_iter()
            .filter_map(|event| match event {
                HookEvent::StageStarted(stage, total) => Some((stage, total)),
                _ => None,
            })
            .collect()
    }

    pub fn settled(&self, stage: BatchStage) -> Vec<(String, bool)> {
        self.events()
            .into_iter()
            .filter_map(|event| match event {
                HookEvent::Settled(s, title, ok) if s == stage => Some((title, ok)),
                _ => None,
            })
            .collect()
    }

    pub fn progress_for(&self, title: &str) -> Vec<u32> {
        self.events()
            .into_iter()
            .filter_map(|event| match event {
                HookEvent::Progress(t, percent) if t == title => Some(percent),
                _ => None,
            })
            .collect()
    }

    fn push(&self, event: HookEvent) {
        self.events.lock().expect("hooks poisoned").push(event);
    }
}

impl BatchHooks for RecordingHooks {
    fn stage_started(&self, stage: BatchStage, total: usize) {
        self.push(HookEvent::StageStarted(stage, total));
    }

    fn item_settled(&self, stage: BatchStage, title: &str, succeeded: bool) {
        self.push(HookEvent::Settled(stage, title.to_owned(), succeeded));
    }

    fn progress(&self, job: &JobHandle, percent: u32) {
        self.push(HookEvent::Progress(job.display_title.clone(), percent));
    }
}

/// Sorted names of the entries directly inside `folder`.
pub fn saved_files(folder: &Path) -> Result<Vec<String>> {
    let mut names = std::fs::read_dir(folder)?
        .map(|entry| Ok(entry?.file_name().to_string_lossy().into_owned()))
        .collect::<Result<Vec<_>>>()?;
    names.sort();
    Ok(names)
}
