//! Scripted `ConversionApi` used by the unit tests of the pipeline stages.

use crate::service::client::{ConversionApi, ServiceError};
use crate::service::payload::{PlaylistResponse, ProgressResponse, SubmitResponse};
use futures::future::BoxFuture;
use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

type Script<T> = Mutex<HashMap<String, VecDeque<Result<T, ServiceError>>>>;

/// Replies are consumed in order per key. An unscripted submission or playlist
/// call times out; an unscripted progress call reports a pending job.
#[derive(Default)]
pub(crate) struct ScriptedApi {
    submits: Script<SubmitResponse>,
    progress: Script<ProgressResponse>,
    playlist: Mutex<Option<Result<PlaylistResponse, ServiceError>>>,
    submissions: Mutex<Vec<(String, String)>>,
    progress_calls: Mutex<HashMap<String, usize>>,
}

impl ScriptedApi {
    pub(crate) fn set_submit(&self, link: &str, reply: Result<SubmitResponse, ServiceError>) {
        self.submits
            .lock()
            .unwrap()
            .entry(link.to_owned())
            .or_default()
            .push_back(reply);
    }

    pub(crate) fn push_progress(
        &self,
        job_id: &str,
        reply: Result<ProgressResponse, ServiceError>,
    ) {
        self.progress
            .lock()
            .unwrap()
            .entry(job_id.to_owned())
            .or_default()
            .push_back(reply);
    }

    pub(crate) fn set_playlist(&self, reply: Result<PlaylistResponse, ServiceError>) {
        *self.playlist.lock().unwrap() = Some(reply);
    }

    pub(crate) fn submissions(&self) -> Vec<(String, String)> {
        self.submissions.lock().unwrap().clone()
    }

    pub(crate) fn progress_calls(&self, job_id: &str) -> usize {
        self.progress_calls
            .lock()
            .unwrap()
            .get(job_id)
            .copied()
            .unwrap_or(0)
    }
}

pub(crate) fn pending(progress: u32) -> ProgressResponse {
    ProgressResponse {
        success: false,
        progress,
        download_url: None,
        text: None,
    }
}

pub(crate) fn ready(url: &str) -> ProgressResponse {
    ProgressResponse {
        success: true,
        progress: 1000,
        download_url: Some(url.to_owned()),
        text: Some("Finished".to_owned()),
    }
}

impl ConversionApi for ScriptedApi {
    fn submit<'a>(
        &'a self,
        link: &'a str,
        format: &'a str,
    ) -> BoxFuture<'a, Result<SubmitResponse, ServiceError>> {
        Box::pin(async move {
            self.submissions
                .lock()
                .unwrap()
                .push((link.to_owned(), format.to_owned()));
            self.submits
                .lock()
                .unwrap()
                .get_mut(link)
                .and_then(VecDeque::pop_front)
                .unwrap_or(Err(ServiceError::Timeout { endpoint: "submit" }))
        })
    }

    fn progress<'a>(
        &'a self,
        job_id: &'a str,
    ) -> BoxFuture<'a, Result<ProgressResponse, ServiceError>> {
        Box::pin(async move {
            *self
                .progress_calls
                .lock()
                .unwrap()
                .entry(job_id.to_owned())
                .or_default() += 1;
            self.progress
                .lock()
                .unwrap()
                .get_mut(job_id)
                .and_then(VecDeque::pop_front)
                .unwrap_or_else(|| Ok(pending(0)))
        })
    }

    fn playlist<'a>(
        &'a self,
        _link: &'a str,
        _format: &'a str,
    ) -> BoxFuture<'a, Result<PlaylistResponse, ServiceError>> {
        Box::pin(async move {
            self.playlist
                .lock()
                .unwrap()
                .take()
                .unwrap_or(Err(ServiceError::Timeout {
                    endpoint: "playlist",
                }))
        })
    }
}
