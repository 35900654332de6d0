use crate::pipeline::model::BatchOutcome;
use crate::pipeline::orchestrator::BatchOrchestrator;
use crate::pipeline::playlist::{self, PlaylistListing};
use crate::runtime::config::BatchConfig;
use crate::runtime::hooks::BatchHooks;
use crate::runtime::input::UserInput;
use crate::runtime::telemetry::Telemetry;
use crate::service::client::LoaderClient;
use anyhow::Result;
use std::sync::Arc;

/// How a run ended when no error stopped it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunReport {
    Completed(BatchOutcome),
    /// The link named a single video, which is not downloaded.
    SingleVideo { video_id: Option<String> },
}

/// Validates one user request, lists the playlist, and drives the batch.
pub struct Runner {
    config: BatchConfig,
    client: Arc<LoaderClient>,
    telemetry: Arc<Telemetry>,
}

impl Runner {
    pub fn new(config: BatchConfig) -> Result<Self> {
        config.validate()?;
        let client = Arc::new(LoaderClient::from_config(&config)?);
        Ok(Self {
            config,
            client,
            telemetry: Arc::new(Telemetry::default()),
        })
    }

    pub fn config(&self) -> &BatchConfig {
        &self.config
    }

    pub fn client(&self) -> &LoaderClient {
        &self.client
    }

    pub fn telemetry(&self) -> &Arc<Telemetry> {
        &self.telemetry
    }

    /// Runs the request end to end.
    ///
    /// Invalid input fails with an [`InputError`](crate::runtime::input::InputError)
    /// before any request is sent; a failed listing fails with an
    /// [`ExtractionError`](crate::pipeline::playlist::ExtractionError). Per-item
    /// failures never surface here, they only lower the outcome counts.
    pub async fn run(&self, input: &UserInput, hooks: Arc<dyn BatchHooks>) -> Result<RunReport> {
        let input = input.validate()?;
        tracing::info!(
            playlist = input.playlist_url(),
            folder = %input.folder().display(),
            format = input.format(),
            "starting batch"
        );

        let listing =
            playlist::extract(self.client.as_ref(), input.playlist_url(), input.format()).await?;

        let items = match listing {
            PlaylistListing::Playlist(items) => items,
            PlaylistListing::SingleVideo { video_id } => {
                tracing::warn!(
                    video_id = video_id.as_deref().unwrap_or("unknown"),
                    "link is a single video; unable to download, nothing to do"
                );
                return Ok(RunReport::SingleVideo { video_id });
            }
        };
        tracing::info!(items = items.len(), "playlist listed");

        let orchestrator = BatchOrchestrator::new(
            self.client.clone(),
            self.client.http().clone(),
            &self.config,
            self.telemetry.clone(),
        )
        .with_hooks(hooks);

        let outcome = orchestrator
            .run(&items, input.format(), input.folder())
            .await;
        self.telemetry.log_snapshot();
        self.client.metrics().log();
        Ok(RunReport::Completed(outcome))
    }
}
