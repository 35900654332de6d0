use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::OnceLock;
use tracing_subscriber::EnvFilter;

static TRACING_INIT: OnceLock<()> = OnceLock::new();

/// Installs a basic tracing subscriber (if one is not already active).
///
/// The subscriber honours `RUST_LOG` if it is present, otherwise it falls back to `info`.
/// Calling this function multiple times is harmless.
pub fn init_tracing() {
    if TRACING_INIT.get().is_some() {
        return;
    }

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();

    let _ = TRACING_INIT.set(());
}

/// Running counters shared by the pipeline stages of one batch.
#[derive(Default, Debug)]
pub struct Telemetry {
    submissions: AtomicU64,
    submission_failures: AtomicU64,
    poll_attempts: AtomicU64,
    poll_errors: AtomicU64,
    downloads: AtomicU64,
    download_failures: AtomicU64,
    bytes_written: AtomicU64,
}

impl Telemetry {
    pub fn record_submission(&self, succeeded: bool) {
        self.submissions.fetch_add(1, Ordering::Relaxed);
        if !succeeded {
            self.submission_failures.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn record_poll_attempt(&self) {
        self.poll_attempts.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_poll_error(&self) {
        self.poll_errors.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_download(&self, bytes: u64) {
        self.downloads.fetch_add(1, Ordering::Relaxed);
        self.bytes_written.fetch_add(bytes, Ordering::Relaxed);
    }

    pub fn record_download_failure(&self) {
        self.download_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> TelemetrySnapshot {
        TelemetrySnapshot {
            submissions: self.submissions.load(Ordering::Relaxed),
            submission_failures: self.submission_failures.load(Ordering::Relaxed),
            poll_attempts: self.poll_attempts.load(Ordering::Relaxed),
            poll_errors: self.poll_errors.load(Ordering::Relaxed),
            downloads: self.downloads.load(Ordering::Relaxed),
            download_failures: self.download_failures.load(Ordering::Relaxed),
            bytes_written: self.bytes_written.load(Ordering::Relaxed),
        }
    }

    pub fn poll_attempts(&self) -> u64 {
        self.poll_attempts.load(Ordering::Relaxed)
    }

    pub fn bytes_written(&self) -> u64 {
        self.bytes_written.load(Ordering::Relaxed)
    }

    /// Emits the current counters as a single structured event.
    pub fn log_snapshot(&self) {
        let snapshot = self.snapshot();
        tracing::info!(
            target: "tubebatch::metrics",
            submissions = snapshot.submissions,
            submission_failures = snapshot.submission_failures,
            poll_attempts = snapshot.poll_attempts,
            poll_errors = snapshot.poll_errors,
            downloads = snapshot.downloads,
            download_failures = snapshot.download_failures,
            bytes_written = snapshot.bytes_written,
            "batch telemetry snapshot"
        );
    }
}

#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub struct TelemetrySnapshot {
    pub submissions: u64,
    pub submission_failures: u64,
    pub poll_attempts: u64,
    pub poll_errors: u64,
    pub downloads: u64,
    pub download_failures: u64,
    pub bytes_written: u64,
}
