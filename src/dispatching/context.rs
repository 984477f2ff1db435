//! Evaluation context for dispatching rules.

use chrono::NaiveDate;

/// State passed to dispatching rules.
///
/// Deadlines are calendar dates on tasks; the context carries the epoch
/// needed to turn them into minute offsets comparable with window times.
#[derive(Debug, Clone, Default)]
pub struct DispatchContext {
    /// Planning epoch (minute 0).
    pub epoch: NaiveDate,
}

impl DispatchContext {
    pub fn new(epoch: NaiveDate) -> Self {
        Self { epoch }
    }
}
