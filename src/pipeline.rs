//! The three-stage batch pipeline: submit every item, poll every accepted job,
//! then fetch every finished file.

pub mod fetcher;
pub mod model;
pub mod orchestrator;
pub mod playlist;
pub mod poller;
pub mod requester;

#[cfg(test)]
mod testing;

pub use fetcher::{FetchError, FileFetcher};
pub use model::{BatchOutcome, ConversionResult, JobHandle, WorkItem};
pub use orchestrator::{destination_path, ensure_folder, BatchOrchestrator};
pub use playlist::{ExtractionError, PlaylistListing};
pub use poller::{PollError, ProgressPoller};
pub use requester::{ConversionRequester, SubmissionError};
