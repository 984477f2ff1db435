//! Task model.
//!
//! A task is an atomic unit of work: it requires a set of skills, carries
//! an effort estimate, and is assigned whole to one operator or left
//! unassigned.
//!
//! # Reference
//! Pinedo (2016), "Scheduling: Theory, Algorithms, and Systems", Ch. 1

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// Task priority, ordered `Low < Medium < High < Urgent`.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
    Urgent,
}

impl Priority {
    /// Objective weight of this priority level.
    pub fn weight(self) -> f64 {
        match self {
            Priority::Low => 1.0,
            Priority::Medium => 2.0,
            Priority::High => 3.0,
            Priority::Urgent => 4.0,
        }
    }

    /// Integer rank (higher = more important).
    pub fn rank(self) -> i32 {
        match self {
            Priority::Low => 1,
            Priority::Medium => 2,
            Priority::High => 3,
            Priority::Urgent => 4,
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Priority::Low => "low",
            Priority::Medium => "medium",
            Priority::High => "high",
            Priority::Urgent => "urgent",
        };
        f.write_str(s)
    }
}

/// A task to be assigned.
///
/// # Time Representation
/// Effort is in minutes. The deadline is a calendar date; it resolves to
/// the end of that day relative to the instance epoch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    /// Unique task identifier.
    pub id: String,
    /// Human-readable name.
    pub name: String,
    /// Skill IDs the assigned operator must hold (all of them).
    pub required_skills: BTreeSet<String>,
    /// Estimated effort (minutes, strictly positive).
    pub effort_minutes: i64,
    /// Priority level.
    pub priority: Priority,
    /// Due date. `None` = no deadline.
    pub deadline: Option<NaiveDate>,
}

impl Task {
    /// Creates a new task with the given ID and effort.
    pub fn new(id: impl Into<String>, effort_minutes: i64) -> Self {
        Self {
            id: id.into(),
            name: String::new(),
            required_skills: BTreeSet::new(),
            effort_minutes,
            priority: Priority::default(),
            deadline: None,
        }
    }

    /// Sets the task name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Adds a required skill.
    pub fn with_skill(mut self, skill_id: impl Into<String>) -> Self {
        self.required_skills.insert(skill_id.into());
        self
    }

    /// Adds several required skills.
    pub fn with_skills<I, S>(mut self, skill_ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.required_skills
            .extend(skill_ids.into_iter().map(Into::into));
        self
    }

    /// Sets the priority.
    pub fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = priority;
        self
    }

    /// Sets the deadline.
    pub fn with_deadline(mut self, deadline: NaiveDate) -> Self {
        self.deadline = Some(deadline);
        self
    }

    /// Deadline as an exclusive minute offset from `epoch` (end of the due day).
    pub fn deadline_minute(&self, epoch: NaiveDate) -> Option<i64> {
        self.deadline
            .map(|d| (d - epoch).num_days() * 24 * 60 + 24 * 60)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_task_builder() {
        let day = NaiveDate::from_ymd_opt(2024, 3, 4).unwrap();
        let task = Task::new("T1", 240)
            .with_name("Inspect pump")
            .with_skill("S1")
            .with_skills(["S2"])
            .with_priority(Priority::High)
            .with_deadline(day);

        assert_eq!(task.id, "T1");
        assert_eq!(task.effort_minutes, 240);
        assert_eq!(task.required_skills.len(), 2);
        assert_eq!(task.priority, Priority::High);
        assert_eq!(task.deadline, Some(day));
    }

    #[test]
    fn test_priority_order_and_weight() {
        assert!(Priority::Urgent > Priority::High);
        assert!(Priority::High > Priority::Medium);
        assert!(Priority::Medium > Priority::Low);
        assert!((Priority::High.weight() - 3.0).abs() < 1e-10);
        assert_eq!(Priority::default(), Priority::Medium);
        assert_eq!(Priority::Urgent.to_string(), "urgent");
    }

    #[test]
    fn test_deadline_minute() {
        let epoch = NaiveDate::from_ymd_opt(2024, 3, 4).unwrap();
        let same_day = Task::new("T", 10).with_deadline(epoch);
        assert_eq!(same_day.deadline_minute(epoch), Some(1440));

        let next_day = Task::new("T", 10).with_deadline(epoch.succ_opt().unwrap());
        assert_eq!(next_day.deadline_minute(epoch), Some(2880));

        assert_eq!(Task::new("T", 10).deadline_minute(epoch), None);
    }

    #[test]
    fn test_priority_serde() {
        let json = serde_json::to_string(&Priority::Urgent).unwrap();
        assert_eq!(json, "\"urgent\"");
        let p: Priority = serde_json::from_str("\"low\"").unwrap();
        assert_eq!(p, Priority::Low);
    }
}
