use std::sync::Arc;

use crate::support::{
    helpers::init_tracing,
    mock_loader::{MockLoader, MockLoaderServer, VideoScript},
};
use anyhow::Result;
use tubebatch::pipeline::FileFetcher;
use tubebatch::{FetchError, Telemetry};

#[tokio::test]
async fn streams_body_to_disk() -> Result<()> {
    init_tracing();
    let body: Vec<u8> = (0..200_000u32).map(|n| (n % 251) as u8).collect();
    let loader = MockLoader::new().with_video(
        "eeeeeeeeee1",
        VideoScript::Ready {
            polls: 1,
            body: body.clone(),
        },
    );
    let server = MockLoaderServer::start(loader).await?;
    let folder = tempfile::tempdir()?;
    let destination = folder.path().join("song.mp3");
    let telemetry = Arc::new(Telemetry::default());
    let fetcher = FileFetcher::new(reqwest::Client::new(), telemetry.clone());

    let written = fetcher
        .fetch(&format!("{}/files/eeeeeeeeee1", server.url()), &destination)
        .await?;

    assert_eq!(written, body.len() as u64);
    assert_eq!(std::fs::read(&destination)?, body);
    assert_eq!(telemetry.bytes_written(), body.len() as u64);

    server.shutdown().await;
    Ok(())
}

#[tokio::test]
async fn error_status_leaves_no_file_behind() -> Result<()> {
    init_tracing();
    let server = MockLoaderServer::start(MockLoader::new()).await?;
    let folder = tempfile::tempdir()?;
    let destination = folder.path().join("missing.mp3");
    let telemetry = Arc::new(Telemetry::default());
    let fetcher = FileFetcher::new(reqwest::Client::new(), telemetry.clone());

    let err = fetcher
        .fetch(&format!("{}/files/unknown", server.url()), &destination)
        .await
        .unwrap_err();

    assert!(matches!(err, FetchError::Status { status: 404, .. }), "got {err:?}");
    assert!(!destination.exists());
    assert_eq!(telemetry.snapshot().download_failures, 1);

    server.shutdown().await;
    Ok(())
}

#[tokio::test]
async fn unwritable_destination_is_a_write_error() -> Result<()> {
    init_tracing();
    let loader = MockLoader::new().with_video(
        "eeeeeeeeee2",
        VideoScript::Ready {
            polls: 1,
            body: b"payload".to_vec(),
        },
    );
    let server = MockLoaderServer::start(loader).await?;
    let folder = tempfile::tempdir()?;
    let destination = folder.path().join("no-such-dir").join("song.mp3");
    let fetcher = FileFetcher::new(reqwest::Client::new(), Arc::new(Telemetry::default()));

    let err = fetcher
        .fetch(&format!("{}/files/eeeeeeeeee2", server.url()), &destination)
        .await
        .unwrap_err();

    assert!(matches!(err, FetchError::Write { .. }), "got {err:?}");

    server.shutdown().await;
    Ok(())
}
