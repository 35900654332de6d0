const STEP_PERCENT: u32 = 10;
const UNREPORTED: u32 = u32::MAX;

/// Tracks which whole-10% progress steps of a job were already reported so the
/// poll loop logs each milestone once.
#[derive(Debug)]
pub struct ProgressMilestones {
    last_step: u32,
}

impl Default for ProgressMilestones {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressMilestones {
    pub fn new() -> Self {
        Self {
            last_step: UNREPORTED,
        }
    }

    /// Returns the milestone (in percent) that `percent` reaches for the first time.
    pub fn advance(&mut self, percent: u32) -> Option<u32> {
        let step = percent.min(100) / STEP_PERCENT;
        if self.last_step != UNREPORTED && step <= self.last_step {
            return None;
        }
        self.last_step = step;
        Some(step * STEP_PERCENT)
    }

    pub fn last_reported(&self) -> Option<u32> {
        match self.last_step {
            UNREPORTED => None,
            step => Some(step * STEP_PERCENT),
        }
    }
}
