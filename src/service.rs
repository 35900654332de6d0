//! Conversion service plumbing: HTTP client, wire payloads, request options,
//! metrics, and playlist markup helpers.

pub mod client;
pub mod markup;
pub mod metrics;
pub mod options;
pub mod payload;

pub use client::{ConversionApi, LoaderClient, ServiceError};
pub use markup::{extract_video_ids, is_youtube, parse_video_id, watch_url};
pub use metrics::ServiceMetricsSnapshot;
pub use options::ServiceOptions;
pub use payload::{PlaylistResponse, ProgressResponse, SubmitResponse};
