//! Built-in dispatching rules.
//!
//! - **SPT**: shortest effort first
//! - **EDD**: earliest deadline first
//! - **PRIORITY**: highest priority level first
//!
//! # Score Convention
//! All rules return lower scores for higher priority tasks.
//!
//! # References
//! - Pinedo (2016), "Scheduling: Theory, Algorithms, and Systems", Ch. 4
//! - Haupt (1989), "A Survey of Priority Rule-Based Scheduling"

use super::{DispatchContext, DispatchingRule, RuleScore};
use crate::models::Task;

/// Shortest Processing Time.
///
/// Prioritizes tasks with smaller effort.
///
/// # Reference
/// Smith (1956), optimal for minimizing mean flow time on single machine.
#[derive(Debug, Clone, Copy)]
pub struct Spt;

impl DispatchingRule for Spt {
    fn name(&self) -> &'static str {
        "SPT"
    }

    fn evaluate(&self, task: &Task, _context: &DispatchContext) -> RuleScore {
        task.effort_minutes as f64
    }
}

/// Earliest Due Date.
///
/// Prioritizes tasks with the earliest deadline. Tasks without a
/// deadline go last.
///
/// # Reference
/// Jackson (1955), optimal for minimizing maximum lateness on single machine.
#[derive(Debug, Clone, Copy)]
pub struct Edd;

impl DispatchingRule for Edd {
    fn name(&self) -> &'static str {
        "EDD"
    }

    fn evaluate(&self, task: &Task, context: &DispatchContext) -> RuleScore {
        match task.deadline_minute(context.epoch) {
            Some(d) => d as f64,
            None => f64::MAX,
        }
    }
}

/// Priority level (highest first).
#[derive(Debug, Clone, Copy)]
pub struct Priority;

impl DispatchingRule for Priority {
    fn name(&self) -> &'static str {
        "PRIORITY"
    }

    fn evaluate(&self, task: &Task, _context: &DispatchContext) -> RuleScore {
        -(task.priority.rank() as f64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Priority as Level;
    use chrono::NaiveDate;

    fn epoch() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 5, 6).unwrap()
    }

    fn make_task(id: &str, effort: i64, due_offset_days: Option<u64>, priority: Level) -> Task {
        let mut t = Task::new(id, effort).with_priority(priority);
        t.deadline = due_offset_days.and_then(|d| epoch().checked_add_days(chrono::Days::new(d)));
        t
    }

    #[test]
    fn test_spt() {
        let ctx = DispatchContext::new(epoch());
        let short = make_task("s", 30, None, Level::Medium);
        let long = make_task("l", 300, None, Level::Medium);
        assert!(Spt.evaluate(&short, &ctx) < Spt.evaluate(&long, &ctx));
    }

    #[test]
    fn test_edd() {
        let ctx = DispatchContext::new(epoch());
        let early = make_task("e", 60, Some(0), Level::Medium);
        let late = make_task("l", 60, Some(3), Level::Medium);
        let none = make_task("n", 60, None, Level::Medium);
        assert!((Edd.evaluate(&early, &ctx) - 1440.0).abs() < 1e-10);
        assert!(Edd.evaluate(&early, &ctx) < Edd.evaluate(&late, &ctx));
        assert!(Edd.evaluate(&late, &ctx) < Edd.evaluate(&none, &ctx));
    }

    #[test]
    fn test_priority() {
        let ctx = DispatchContext::new(epoch());
        let high = make_task("high", 60, None, Level::Urgent);
        let low = make_task("low", 60, None, Level::Low);
        assert!(Priority.evaluate(&high, &ctx) < Priority.evaluate(&low, &ctx));
    }
}
