//! Operator model.
//!
//! Operators are the people (or stations) that perform tasks. Each holds a
//! set of skills and an ordered list of working windows.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use super::calendar::{earliest_completion, TimeWindow};

/// An operator that can be assigned tasks.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Operator {
    /// Unique operator identifier.
    pub id: String,
    /// Human-readable name.
    pub name: String,
    /// Skill IDs held (references into the skill master list).
    pub skills: BTreeSet<String>,
    /// Working windows, chronologically ordered and non-overlapping.
    pub windows: Vec<TimeWindow>,
}

impl Operator {
    /// Creates an operator with no skills and no availability.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: String::new(),
            skills: BTreeSet::new(),
            windows: Vec::new(),
        }
    }

    /// Sets the operator name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Adds a held skill.
    pub fn with_skill(mut self, skill_id: impl Into<String>) -> Self {
        self.skills.insert(skill_id.into());
        self
    }

    /// Adds several held skills.
    pub fn with_skills<I, S>(mut self, skill_ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.skills.extend(skill_ids.into_iter().map(Into::into));
        self
    }

    /// Appends a working window `[start_min, end_min)`.
    pub fn with_window(mut self, start_min: i64, end_min: i64) -> Self {
        self.windows.push(TimeWindow::new(start_min, end_min));
        self
    }

    /// Whether this operator holds a skill.
    pub fn has_skill(&self, skill_id: &str) -> bool {
        self.skills.contains(skill_id)
    }

    /// Whether this operator holds every skill in `required`.
    pub fn holds_all<'a, I>(&self, required: I) -> bool
    where
        I: IntoIterator<Item = &'a String>,
    {
        required.into_iter().all(|s| self.skills.contains(s))
    }

    /// Total available minutes across all windows.
    pub fn available_minutes(&self) -> i64 {
        self.windows.iter().map(TimeWindow::duration_min).sum()
    }

    /// Completion minute of `effort_min` packed from the first window.
    pub fn earliest_completion(&self, effort_min: i64) -> Option<i64> {
        earliest_completion(&self.windows, effort_min)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_operator_builder() {
        let op = Operator::new("A")
            .with_name("Alice")
            .with_skill("S1")
            .with_skills(["S2", "S3"])
            .with_window(540, 720)
            .with_window(780, 1020);

        assert_eq!(op.id, "A");
        assert_eq!(op.name, "Alice");
        assert!(op.has_skill("S2"));
        assert!(!op.has_skill("S9"));
        assert_eq!(op.available_minutes(), 180 + 240);
    }

    #[test]
    fn test_holds_all() {
        let op = Operator::new("A").with_skills(["S1", "S2"]);
        let req: BTreeSet<String> = ["S1".to_string()].into_iter().collect();
        assert!(op.holds_all(&req));
        let req2: BTreeSet<String> = ["S1".to_string(), "S3".to_string()].into_iter().collect();
        assert!(!op.holds_all(&req2));
        assert!(op.holds_all(&BTreeSet::new()));
    }

    #[test]
    fn test_no_windows_means_no_capacity() {
        let op = Operator::new("idle");
        assert_eq!(op.available_minutes(), 0);
        assert_eq!(op.earliest_completion(1), None);
    }
}
