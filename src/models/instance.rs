//! Problem instance: the per-run input collections.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::{Operator, Skill, Task};

/// Skills, operators, and tasks for one assignment run.
///
/// Minute 0 of every time window is 00:00 of `epoch`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Instance {
    /// Planning epoch (minute 0).
    pub epoch: NaiveDate,
    /// Skill master list.
    pub skills: Vec<Skill>,
    /// Operators.
    pub operators: Vec<Operator>,
    /// Tasks.
    pub tasks: Vec<Task>,
}

impl Instance {
    /// Creates an empty instance with the default epoch (1970-01-01).
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the planning epoch.
    pub fn with_epoch(mut self, epoch: NaiveDate) -> Self {
        self.epoch = epoch;
        self
    }

    /// Adds a skill to the master list.
    pub fn with_skill(mut self, skill: Skill) -> Self {
        self.skills.push(skill);
        self
    }

    /// Adds an operator.
    pub fn with_operator(mut self, operator: Operator) -> Self {
        self.operators.push(operator);
        self
    }

    /// Adds a task.
    pub fn with_task(mut self, task: Task) -> Self {
        self.tasks.push(task);
        self
    }

    /// Registers every skill referenced by operators or tasks that is not
    /// already in the master list.
    pub fn with_referenced_skills(mut self) -> Self {
        let mut ids: Vec<String> = self
            .operators
            .iter()
            .flat_map(|o| o.skills.iter())
            .chain(self.tasks.iter().flat_map(|t| t.required_skills.iter()))
            .cloned()
            .collect();
        ids.sort();
        ids.dedup();
        for id in ids {
            if !self.skills.iter().any(|s| s.id == id) {
                self.skills.push(Skill::new(id));
            }
        }
        self
    }

    /// Total available minutes across all operators.
    pub fn total_available_minutes(&self) -> i64 {
        self.operators.iter().map(Operator::available_minutes).sum()
    }

    /// Total effort across all tasks (minutes).
    pub fn total_effort_minutes(&self) -> i64 {
        self.tasks.iter().map(|t| t.effort_minutes).sum()
    }

    /// Deadline of `task` as an exclusive minute offset from the epoch.
    pub fn deadline_minute(&self, task: &Task) -> Option<i64> {
        task.deadline_minute(self.epoch)
    }

    /// Finds an operator by ID.
    pub fn operator(&self, id: &str) -> Option<&Operator> {
        self.operators.iter().find(|o| o.id == id)
    }

    /// Finds a task by ID.
    pub fn task(&self, id: &str) -> Option<&Task> {
        self.tasks.iter().find(|t| t.id == id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_instance_builder() {
        let inst = Instance::new()
            .with_operator(Operator::new("A").with_skill("S1").with_window(0, 480))
            .with_operator(Operator::new("B").with_skills(["S1", "S2"]).with_window(0, 240))
            .with_task(Task::new("T1", 240).with_skill("S1"))
            .with_task(Task::new("T2", 60).with_skill("S3"))
            .with_referenced_skills();

        assert_eq!(inst.skills.len(), 3);
        assert_eq!(inst.total_available_minutes(), 720);
        assert_eq!(inst.total_effort_minutes(), 300);
        assert!(inst.operator("B").is_some());
        assert!(inst.task("T9").is_none());
    }

    #[test]
    fn test_referenced_skills_keep_existing_entries() {
        let inst = Instance::new()
            .with_skill(Skill::new("S1").with_name("Welding"))
            .with_task(Task::new("T1", 10).with_skill("S1"))
            .with_referenced_skills();
        assert_eq!(inst.skills.len(), 1);
        assert_eq!(inst.skills[0].name, "Welding");
    }

    #[test]
    fn test_instance_json() {
        let inst = Instance::new()
            .with_epoch(NaiveDate::from_ymd_opt(2024, 1, 8).unwrap())
            .with_operator(Operator::new("A").with_window(0, 60));
        let json = serde_json::to_string(&inst).unwrap();
        let back: Instance = serde_json::from_str(&json).unwrap();
        assert_eq!(back.epoch, inst.epoch);
        assert_eq!(back.operators[0].available_minutes(), 60);
    }
}
