use std::sync::Arc;

use crate::support::{
    helpers::{init_tracing, mock_config, saved_files, RecordingHooks},
    mock_loader::{title_for, MockLoader, MockLoaderServer, VideoScript},
};
use anyhow::Result;
use tubebatch::service::watch_url;
use tubebatch::{BatchOrchestrator, BatchStage, LoaderClient, Telemetry, WorkItem};

fn items(ids: &[&str]) -> Vec<WorkItem> {
    ids.iter().map(|id| WorkItem::new(watch_url(id), *id)).collect()
}

fn orchestrator(
    base_url: &str,
    attempts: usize,
    telemetry: Arc<Telemetry>,
) -> Result<BatchOrchestrator<LoaderClient>> {
    let config = mock_config(base_url, attempts)?;
    let client = Arc::new(LoaderClient::from_config(&config)?);
    let http = client.http().clone();
    Ok(BatchOrchestrator::new(client, http, &config, telemetry))
}

#[tokio::test]
async fn downloads_every_item_of_a_healthy_batch() -> Result<()> {
    init_tracing();
    let loader = MockLoader::new()
        .with_video(
            "aaaaaaaaaa1",
            VideoScript::Ready {
                polls: 1,
                body: b"first".to_vec(),
            },
        )
        .with_video(
            "aaaaaaaaaa2",
            VideoScript::Ready {
                polls: 2,
                body: b"second".to_vec(),
            },
        )
        .with_video(
            "aaaaaaaaaa3",
            VideoScript::Ready {
                polls: 3,
                body: vec![7u8; 64 * 1024],
            },
        );
    let server = MockLoaderServer::start(loader.clone()).await?;
    let folder = tempfile::tempdir()?;
    let telemetry = Arc::new(Telemetry::default());

    let outcome = orchestrator(server.url(), 10, telemetry.clone())?
        .run(
            &items(&["aaaaaaaaaa1", "aaaaaaaaaa2", "aaaaaaaaaa3"]),
            "mp3",
            folder.path(),
        )
        .await;

    assert_eq!(outcome.submitted, 3);
    assert_eq!(outcome.succeeded_submission, 3);
    assert_eq!(outcome.ready, 3);
    assert_eq!(outcome.succeeded_download, 3);
    assert!(outcome.is_complete());

    let first = folder.path().join(format!("{}.mp3", title_for("aaaaaaaaaa1")));
    assert_eq!(std::fs::read(&first)?, b"first");
    let third = folder.path().join(format!("{}.mp3", title_for("aaaaaaaaaa3")));
    assert_eq!(std::fs::metadata(&third)?.len(), 64 * 1024);
    assert_eq!(
        saved_files(folder.path())?,
        vec![
            format!("{}.mp3", title_for("aaaaaaaaaa1")),
            format!("{}.mp3", title_for("aaaaaaaaaa2")),
            format!("{}.mp3", title_for("aaaaaaaaaa3")),
        ]
    );

    let snapshot = telemetry.snapshot();
    assert_eq!(snapshot.downloads, 3);
    assert_eq!(snapshot.bytes_written, 5 + 6 + 64 * 1024);
    assert_eq!(loader.poll_count("aaaaaaaaaa3"), 3);

    server.shutdown().await;
    Ok(())
}

#[tokio::test]
async fn failed_submission_is_isolated() -> Result<()> {
    init_tracing();
    let loader = MockLoader::new()
        .with_video(
            "bbbbbbbbbb1",
            VideoScript::Ready {
                polls: 1,
                body: b"one".to_vec(),
            },
        )
        .with_video("bbbbbbbbbb2", VideoScript::SubmitError);
    let server = MockLoaderServer::start(loader.clone()).await?;
    let folder = tempfile::tempdir()?;
    let hooks = RecordingHooks::shared();

    let outcome = orchestrator(server.url(), 5, Arc::new(Telemetry::default()))?
        .with_hooks(hooks.clone())
        .run(&items(&["bbbbbbbbbb1", "bbbbbbbbbb2"]), "mp3", folder.path())
        .await;

    assert_eq!(outcome.submitted, 2);
    assert_eq!(outcome.succeeded_submission, 1);
    assert_eq!(outcome.ready, 1);
    assert_eq!(outcome.succeeded_download, 1);
    assert_eq!(outcome.failed(), 1);
    assert_eq!(
        saved_files(folder.path())?,
        vec![format!("{}.mp3", title_for("bbbbbbbbbb1"))]
    );

    assert_eq!(
        hooks.stages(),
        vec![
            (BatchStage::Submit, 2),
            (BatchStage::Poll, 1),
            (BatchStage::Fetch, 1)
        ]
    );
    let submitted = hooks.settled(BatchStage::Submit);
    assert!(submitted.contains(&("bbbbbbbbbb2".to_owned(), false)));
    assert!(submitted.contains(&("bbbbbbbbbb1".to_owned(), true)));

    server.shutdown().await;
    Ok(())
}

#[tokio::test]
async fn never_ready_job_is_dropped_after_max_attempts() -> Result<()> {
    init_tracing();
    let loader = MockLoader::new()
        .with_video(
            "cccccccccc1",
            VideoScript::Ready {
                polls: 2,
                body: b"ok".to_vec(),
            },
        )
        .with_video("cccccccccc2", VideoScript::NeverReady)
        .with_video("cccccccccc3", VideoScript::Rejected);
    let server = MockLoaderServer::start(loader.clone()).await?;
    let folder = tempfile::tempdir()?;
    let hooks = RecordingHooks::shared();

    let outcome = orchestrator(server.url(), 4, Arc::new(Telemetry::default()))?
        .with_hooks(hooks.clone())
        .run(
            &items(&["cccccccccc1", "cccccccccc2", "cccccccccc3"]),
            "m4a",
            folder.path(),
        )
        .await;

    assert_eq!(outcome.submitted, 3);
    assert_eq!(outcome.succeeded_submission, 2);
    assert_eq!(outcome.ready, 1);
    assert_eq!(outcome.succeeded_download, 1);
    assert_eq!(loader.poll_count("cccccccccc2"), 4);
    assert_eq!(loader.poll_count("cccccccccc3"), 0);

    assert_eq!(hooks.progress_for(&title_for("cccccccccc1")), vec![10, 100]);
    assert!(folder
        .path()
        .join(format!("{}.m4a", title_for("cccccccccc1")))
        .is_file());

    server.shutdown().await;
    Ok(())
}

#[tokio::test]
async fn missing_result_file_only_fails_its_own_download() -> Result<()> {
    init_tracing();
    let loader = MockLoader::new()
        .with_video("dddddddddd1", VideoScript::MissingFile)
        .with_video(
            "dddddddddd2",
            VideoScript::Ready {
                polls: 1,
                body: b"fine".to_vec(),
            },
        );
    let server = MockLoaderServer::start(loader).await?;
    let root = tempfile::tempdir()?;
    let folder = root.path().join("fresh").join("folder");
    let telemetry = Arc::new(Telemetry::default());

    let outcome = orchestrator(server.url(), 3, telemetry.clone())?
        .run(&items(&["dddddddddd1", "dddddddddd2"]), "mp3", &folder)
        .await;

    assert_eq!(outcome.ready, 2);
    assert_eq!(outcome.succeeded_download, 1);
    assert_eq!(
        outcome.saved,
        vec![folder.join(format!("{}.mp3", title_for("dddddddddd2")))]
    );
    assert_eq!(telemetry.snapshot().download_failures, 1);

    server.shutdown().await;
    Ok(())
}
