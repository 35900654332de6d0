use crate::pipeline::model::JobHandle;
use std::fmt;

/// Enumerates the stages of a batch run, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BatchStage {
    Submit,
    Poll,
    Fetch,
}

impl fmt::Display for BatchStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            BatchStage::Submit => "submit",
            BatchStage::Poll => "poll",
            BatchStage::Fetch => "fetch",
        };
        f.write_str(label)
    }
}

/// Observer notified as a batch moves through its stages.
///
/// Every method defaults to a no-op so implementors only override what they display.
pub trait BatchHooks: Send + Sync {
    /// A stage is about to launch `total` operations.
    fn stage_started(&self, _stage: BatchStage, _total: usize) {}

    /// One operation of `stage` settled.
    fn item_settled(&self, _stage: BatchStage, _title: &str, _succeeded: bool) {}

    /// A polled job reached a new progress milestone.
    fn progress(&self, _job: &JobHandle, _percent: u32) {}
}

#[derive(Debug, Default, Clone, Copy)]
pub struct NoopHooks;

impl BatchHooks for NoopHooks {}
