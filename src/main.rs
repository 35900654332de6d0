use std::env;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use tokio::io::{self, BufReader};
use tubebatch::runtime::input;
use tubebatch::{
    BatchConfig, BatchHooks, BatchOutcome, BatchStage, ExtractionError, InputError, JobHandle,
    RunReport, Runner,
};

const DEFAULT_LOG_DIRECTIVE: &str = "info";

#[tokio::main]
async fn main() -> Result<()> {
    init_cli_tracing();

    let mut stdin = BufReader::new(io::stdin());
    let mut stdout = io::stdout();
    let request = input::prompt(&mut stdin, &mut stdout).await?;

    let config = BatchConfig::from_env()?;
    let runner = Runner::new(config)?;
    let hooks = Arc::new(CliHooks::new(build_progress_bar()));

    match runner.run(&request, hooks.clone()).await {
        Ok(RunReport::Completed(outcome)) => {
            hooks.finish_with_message("done");
            print_summary(hooks.bar(), &outcome);
        }
        Ok(RunReport::SingleVideo { .. }) => {
            hooks.finish_with_message("single video");
            hooks.bar().println("Unable to download: the link is a single video, not a playlist.");
        }
        Err(err) if err.downcast_ref::<InputError>().is_some() => {
            hooks.bar().finish_and_clear();
            eprintln!("{err}");
        }
        Err(err) if err.downcast_ref::<ExtractionError>().is_some() => {
            hooks.finish_with_message("playlist unavailable");
            eprintln!("Error downloading playlist: {err}");
        }
        Err(err) => {
            hooks.finish_with_message("aborted");
            return Err(err);
        }
    }

    Ok(())
}

fn init_cli_tracing() {
    if env::var_os("RUST_LOG").is_none() {
        env::set_var("RUST_LOG", DEFAULT_LOG_DIRECTIVE);
    }
    tubebatch::init_tracing();
}

fn build_progress_bar() -> ProgressBar {
    let bar = ProgressBar::with_draw_target(Some(0), ProgressDrawTarget::stderr_with_hz(12));
    let style = ProgressStyle::with_template(
        "{spinner:.green} [{elapsed_precise}] {prefix:>6} [{bar:40.cyan/blue}] {pos}/{len} {msg}",
    )
    .expect("valid progress bar template")
    .progress_chars("=>-");
    bar.set_style(style);
    bar.enable_steady_tick(Duration::from_millis(120));
    bar
}

fn print_summary(bar: &ProgressBar, outcome: &BatchOutcome) {
    bar.println(format!(
        "Submitted {} / accepted {} / converted {} / downloaded {}",
        outcome.submitted, outcome.succeeded_submission, outcome.ready, outcome.succeeded_download
    ));
    for path in &outcome.saved {
        bar.println(format!("  saved {}", path.display()));
    }
    if !outcome.is_complete() {
        bar.println(format!("{} item(s) did not make it to disk", outcome.failed()));
    }
}

/// Renders stage progress on a single bar that is reset at every stage.
struct CliHooks {
    bar: ProgressBar,
}

impl CliHooks {
    fn new(bar: ProgressBar) -> Self {
        Self { bar }
    }

    fn bar(&self) -> &ProgressBar {
        &self.bar
    }

    fn finish_with_message(&self, message: &'static str) {
        self.bar.finish_with_message(message);
    }
}

impl BatchHooks for CliHooks {
    fn stage_started(&self, stage: BatchStage, total: usize) {
        self.bar.reset();
        self.bar.set_length(total as u64);
        self.bar.set_prefix(stage.to_string());
        self.bar.set_message("");
    }

    fn item_settled(&self, stage: BatchStage, title: &str, succeeded: bool) {
        if !succeeded {
            self.bar.println(format!("[{stage}] failed: {title}"));
        }
        self.bar.inc(1);
    }

    fn progress(&self, job: &JobHandle, percent: u32) {
        self.bar.set_message(format!("{} {percent}%", job.display_title));
    }
}
