use crate::support::{
    helpers::{init_tracing, mock_config},
    mock_loader::{job_id, title_for, MockLoader, MockLoaderServer, VideoScript},
};
use anyhow::Result;
use hyper::StatusCode;
use tubebatch::service::{extract_video_ids, watch_url};
use tubebatch::{LoaderClient, ServiceError};

#[tokio::test]
async fn talks_to_every_endpoint() -> Result<()> {
    init_tracing();
    let loader = MockLoader::new()
        .with_video(
            "ffffffffff1",
            VideoScript::Ready {
                polls: 1,
                body: Vec::new(),
            },
        )
        .with_video("ffffffffff2", VideoScript::NeverReady);
    let server = MockLoaderServer::start(loader).await?;
    let client = LoaderClient::from_config(&mock_config(server.url(), 1)?)?;

    let listing = client
        .playlist("https://www.youtube.com/playlist?list=PLmock", "mp3")
        .await?;
    assert!(listing.is_playlist);
    let ids = extract_video_ids(listing.html.as_deref().unwrap_or_default());
    assert_eq!(ids, vec!["ffffffffff1", "ffffffffff2"]);

    let submitted = client.submit(&watch_url("ffffffffff1"), "mp3").await?;
    assert_eq!(submitted.job_id(), Some(job_id("ffffffffff1").as_str()));
    assert_eq!(submitted.title(), Some(title_for("ffffffffff1").as_str()));

    let progress = client.progress(&job_id("ffffffffff1")).await?;
    assert_eq!(progress.percent(), 100);
    assert!(progress
        .result_url()
        .is_some_and(|url| url.ends_with("/files/ffffffffff1")));

    let pending = client.progress(&job_id("ffffffffff2")).await?;
    assert_eq!(pending.result_url(), None);
    assert_eq!(pending.percent(), 15);

    let metrics = client.metrics();
    assert_eq!(metrics.total_requests, 4);
    assert_eq!(metrics.total_errors, 0);

    server.shutdown().await;
    Ok(())
}

#[tokio::test]
async fn error_status_is_reported_with_its_endpoint() -> Result<()> {
    init_tracing();
    let loader = MockLoader::new().with_playlist_status(StatusCode::SERVICE_UNAVAILABLE);
    let server = MockLoaderServer::start(loader).await?;
    let client = LoaderClient::from_config(&mock_config(server.url(), 1)?)?;

    let err = client
        .playlist("https://www.youtube.com/playlist?list=PLmock", "mp3")
        .await
        .unwrap_err();

    assert!(
        matches!(
            err,
            ServiceError::Status {
                endpoint: "playlist",
                status: 503
            }
        ),
        "got {err:?}"
    );
    assert!(err.is_transient());
    assert_eq!(client.metrics().total_errors, 1);

    server.shutdown().await;
    Ok(())
}
