//! Playlist extraction: asks the service to list a playlist and turns the
//! returned markup into work items. Failures here end the whole run.

use crate::pipeline::model::WorkItem;
use crate::service::client::{ConversionApi, ServiceError};
use crate::service::markup::{extract_video_ids, parse_video_id, watch_url};
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlaylistListing {
    Playlist(Vec<WorkItem>),
    /// The link points at a single video; downloading those is not supported.
    SingleVideo { video_id: Option<String> },
}

#[derive(Debug)]
pub enum ExtractionError {
    Service(ServiceError),
    Malformed { reason: String },
}

impl fmt::Display for ExtractionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExtractionError::Service(source) => write!(f, "playlist extraction failed: {source}"),
            ExtractionError::Malformed { reason } => {
                write!(f, "malformed playlist response: {reason}")
            }
        }
    }
}

impl std::error::Error for ExtractionError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ExtractionError::Service(source) => Some(source),
            ExtractionError::Malformed { .. } => None,
        }
    }
}

impl From<ServiceError> for ExtractionError {
    fn from(source: ServiceError) -> Self {
        ExtractionError::Service(source)
    }
}

pub async fn extract<A>(
    api: &A,
    link: &str,
    format: &str,
) -> Result<PlaylistListing, ExtractionError>
where
    A: ConversionApi + ?Sized,
{
    let response = api.playlist(link, format).await?;

    if !response.is_playlist {
        return Ok(PlaylistListing::SingleVideo {
            video_id: parse_video_id(link),
        });
    }

    let html = response
        .html
        .as_deref()
        .ok_or_else(|| ExtractionError::Malformed {
            reason: "playlist flagged but no listing markup returned".to_owned(),
        })?;

    let items: Vec<WorkItem> = extract_video_ids(html)
        .into_iter()
        .map(|id| WorkItem::new(watch_url(&id), id))
        .collect();

    tracing::info!(link, items = items.len(), "playlist detected");
    Ok(PlaylistListing::Playlist(items))
}
