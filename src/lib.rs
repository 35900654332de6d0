pub mod pipeline;
pub mod runtime;
pub mod service;

pub use pipeline::{
    BatchOrchestrator, BatchOutcome, ConversionResult, ExtractionError, FetchError, JobHandle,
    PlaylistListing, PollError, SubmissionError, WorkItem,
};
pub use runtime::config::{BatchConfig, BatchConfigBuilder, BatchConfigParams};
pub use runtime::hooks::{BatchHooks, BatchStage, NoopHooks};
pub use runtime::input::{InputError, UserInput, ValidatedInput};
pub use runtime::progress::ProgressMilestones;
pub use runtime::runner::{RunReport, Runner};
pub use runtime::split::{SplitError, SplitRequest, Splitter};
pub use runtime::telemetry::{init_tracing, Telemetry, TelemetrySnapshot};
pub use service::{ConversionApi, LoaderClient, ServiceError};
