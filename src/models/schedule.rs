//! Schedule (solution) model.
//!
//! A schedule is the output of one strategy run: one assignment entry per
//! input task (assigned or explicitly unassigned), the producing strategy,
//! its status, the shared objective value, and the wall-clock solve time.
//!
//! # Reference
//! Pinedo (2016), "Scheduling: Theory, Algorithms, and Systems", Ch. 3

use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::time::Duration;

use super::{Instance, TimeWindow};
use crate::strategy::StrategyKind;

/// Outcome classification of a strategy run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SolveStatus {
    /// Search completed and proved the objective optimal.
    Optimal,
    /// A feasible schedule without an optimality proof.
    Feasible,
    /// Tasks exist but no feasible operator/task pair does.
    Infeasible,
    /// The time budget ran out before any feasible incumbent was produced.
    NoFeasibleSolutionWithinBudget,
    /// The strategy faulted; the run is recorded but carries no solution.
    StrategyFailed,
}

impl SolveStatus {
    /// Whether the schedule is a valid result.
    ///
    /// `Infeasible` counts: leaving every task unassigned is proven to be the
    /// only answer. It is not a success; see [`is_success`](Self::is_success).
    pub fn has_solution(self) -> bool {
        matches!(
            self,
            SolveStatus::Optimal | SolveStatus::Feasible | SolveStatus::Infeasible
        )
    }

    /// Whether the run produced an assignment (`Optimal` or `Feasible`).
    pub fn is_success(self) -> bool {
        matches!(self, SolveStatus::Optimal | SolveStatus::Feasible)
    }
}

impl fmt::Display for SolveStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SolveStatus::Optimal => "optimal",
            SolveStatus::Feasible => "feasible",
            SolveStatus::Infeasible => "infeasible",
            SolveStatus::NoFeasibleSolutionWithinBudget => "no_feasible_solution_within_budget",
            SolveStatus::StrategyFailed => "strategy_failed",
        };
        f.write_str(s)
    }
}

/// Strategy-specific search statistics.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SolveStats {
    /// Search nodes explored (constraint programming).
    pub nodes: Option<u64>,
    /// Generations evolved (evolutionary search).
    pub generations: Option<usize>,
    /// Proposal rounds (deferred acceptance).
    pub rounds: Option<usize>,
    /// Whether the matching has no blocking pair (deferred acceptance).
    pub stable: Option<bool>,
    /// Best known upper bound on the objective when optimality was not proven.
    pub bound: Option<f64>,
}

/// One task's outcome: assigned whole to an operator, or unassigned.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Assignment {
    /// Task ID.
    pub task_id: String,
    /// Assigned operator ID. `None` = unassigned.
    pub operator_id: Option<String>,
    /// Allocated working intervals, chronologically ordered. A task may
    /// span consecutive availability windows.
    pub intervals: Vec<TimeWindow>,
}

impl Assignment {
    /// Creates an assignment of a task to an operator.
    pub fn assigned(
        task_id: impl Into<String>,
        operator_id: impl Into<String>,
        intervals: Vec<TimeWindow>,
    ) -> Self {
        Self {
            task_id: task_id.into(),
            operator_id: Some(operator_id.into()),
            intervals,
        }
    }

    /// Creates an explicit "unassigned" entry.
    pub fn unassigned(task_id: impl Into<String>) -> Self {
        Self {
            task_id: task_id.into(),
            operator_id: None,
            intervals: Vec::new(),
        }
    }

    /// Whether the task received an operator.
    #[inline]
    pub fn is_assigned(&self) -> bool {
        self.operator_id.is_some()
    }

    /// Allocated minutes.
    pub fn allocated_minutes(&self) -> i64 {
        self.intervals.iter().map(TimeWindow::duration_min).sum()
    }

    /// Start of the first interval.
    pub fn start_min(&self) -> Option<i64> {
        self.intervals.first().map(|w| w.start_min)
    }

    /// End of the last interval.
    pub fn end_min(&self) -> Option<i64> {
        self.intervals.last().map(|w| w.end_min)
    }
}

/// A complete schedule produced by one strategy run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Schedule {
    /// Producing strategy.
    pub strategy: StrategyKind,
    /// Run status.
    pub status: SolveStatus,
    /// One entry per input task, in input order.
    pub assignments: Vec<Assignment>,
    /// Shared weighted objective (higher is better).
    pub objective: f64,
    /// Wall-clock solve time.
    pub solve_duration: Duration,
    /// Search statistics.
    pub stats: SolveStats,
    /// Diagnostic message (failures, timeouts).
    pub message: Option<String>,
}

/// A constraint violation found in a schedule.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Violation {
    /// Type of violation.
    pub violation_type: ViolationType,
    /// Related entity ID (task or operator).
    pub entity_id: String,
    /// Human-readable description.
    pub message: String,
    /// Severity (0-100, higher = worse).
    pub severity: i32,
}

/// Classification of constraint violations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ViolationType {
    /// Two intervals of one operator overlap.
    Overlap,
    /// Operator allocated beyond its available minutes.
    CapacityExceeded,
    /// Work placed outside the operator's availability windows.
    OutsideAvailability,
    /// Operator lacks a skill the task requires.
    SkillMismatch,
    /// Allocated minutes differ from the task's effort.
    EffortMismatch,
    /// Assignment references a task or operator not in the instance.
    UnknownReference,
    /// An input task has no entry, or more than one.
    MissingTask,
}

impl Violation {
    fn new(
        violation_type: ViolationType,
        entity_id: impl Into<String>,
        message: impl Into<String>,
        severity: i32,
    ) -> Self {
        Self {
            violation_type,
            entity_id: entity_id.into(),
            message: message.into(),
            severity,
        }
    }

    /// Creates an overlap violation.
    pub fn overlap(operator_id: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(ViolationType::Overlap, operator_id, message, 95)
    }

    /// Creates a capacity exceeded violation.
    pub fn capacity_exceeded(operator_id: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(ViolationType::CapacityExceeded, operator_id, message, 90)
    }
}

impl Schedule {
    /// Creates a schedule with no assignments.
    pub fn new(strategy: StrategyKind, status: SolveStatus) -> Self {
        Self {
            strategy,
            status,
            assignments: Vec::new(),
            objective: 0.0,
            solve_duration: Duration::ZERO,
            stats: SolveStats::default(),
            message: None,
        }
    }

    /// Creates a schedule in which every task of `instance` is unassigned.
    pub fn all_unassigned(strategy: StrategyKind, status: SolveStatus, instance: &Instance) -> Self {
        let mut s = Self::new(strategy, status);
        s.assignments = instance
            .tasks
            .iter()
            .map(|t| Assignment::unassigned(t.id.clone()))
            .collect();
        s
    }

    /// Sets the diagnostic message.
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    /// Whether the run proved optimality.
    pub fn is_optimal(&self) -> bool {
        self.status == SolveStatus::Optimal
    }

    /// Number of assigned tasks.
    pub fn assigned_count(&self) -> usize {
        self.assignments.iter().filter(|a| a.is_assigned()).count()
    }

    /// IDs of unassigned tasks, in input order.
    pub fn unassigned_task_ids(&self) -> Vec<&str> {
        self.assignments
            .iter()
            .filter(|a| !a.is_assigned())
            .map(|a| a.task_id.as_str())
            .collect()
    }

    /// Fraction of tasks assigned. `None` when there are no tasks.
    pub fn coverage_ratio(&self) -> Option<f64> {
        if self.assignments.is_empty() {
            return None;
        }
        Some(self.assigned_count() as f64 / self.assignments.len() as f64)
    }

    /// Finds the entry for a task.
    pub fn assignment_for_task(&self, task_id: &str) -> Option<&Assignment> {
        self.assignments.iter().find(|a| a.task_id == task_id)
    }

    /// Operator a task was assigned to.
    pub fn operator_of(&self, task_id: &str) -> Option<&str> {
        self.assignment_for_task(task_id)
            .and_then(|a| a.operator_id.as_deref())
    }

    /// All entries assigned to an operator.
    pub fn assignments_for_operator(&self, operator_id: &str) -> Vec<&Assignment> {
        self.assignments
            .iter()
            .filter(|a| a.operator_id.as_deref() == Some(operator_id))
            .collect()
    }

    /// Total minutes allocated to an operator.
    pub fn operator_load_minutes(&self, operator_id: &str) -> i64 {
        self.assignments_for_operator(operator_id)
            .iter()
            .map(|a| a.allocated_minutes())
            .sum()
    }

    /// Completion minute of a task (end of its last interval).
    pub fn task_completion_time(&self, task_id: &str) -> Option<i64> {
        self.assignment_for_task(task_id).and_then(Assignment::end_min)
    }

    /// Checks this schedule against the instance it was produced for.
    ///
    /// Reports fabricated references, missing or duplicated task entries,
    /// skill mismatches, effort mismatches, work outside availability,
    /// overlapping intervals, and over-capacity operators. Deadlines are
    /// soft and reported through metrics instead.
    pub fn violations(&self, instance: &Instance) -> Vec<Violation> {
        let mut out = Vec::new();
        let tasks: HashMap<&str, _> = instance.tasks.iter().map(|t| (t.id.as_str(), t)).collect();
        let operators: HashMap<&str, _> = instance
            .operators
            .iter()
            .map(|o| (o.id.as_str(), o))
            .collect();

        let mut seen: HashSet<&str> = HashSet::new();
        let mut per_operator: HashMap<&str, Vec<TimeWindow>> = HashMap::new();

        for a in &self.assignments {
            let Some(task) = tasks.get(a.task_id.as_str()) else {
                out.push(Violation::new(
                    ViolationType::UnknownReference,
                    &a.task_id,
                    format!("task '{}' is not part of the instance", a.task_id),
                    100,
                ));
                continue;
            };
            if !seen.insert(a.task_id.as_str()) {
                out.push(Violation::new(
                    ViolationType::MissingTask,
                    &a.task_id,
                    format!("task '{}' has more than one entry", a.task_id),
                    100,
                ));
            }
            let Some(op_id) = a.operator_id.as_deref() else {
                continue;
            };
            let Some(op) = operators.get(op_id) else {
                out.push(Violation::new(
                    ViolationType::UnknownReference,
                    op_id,
                    format!("operator '{}' is not part of the instance", op_id),
                    100,
                ));
                continue;
            };
            if !op.holds_all(&task.required_skills) {
                out.push(Violation::new(
                    ViolationType::SkillMismatch,
                    &a.task_id,
                    format!("operator '{}' lacks a skill required by '{}'", op_id, a.task_id),
                    90,
                ));
            }
            if a.allocated_minutes() != task.effort_minutes {
                out.push(Violation::new(
                    ViolationType::EffortMismatch,
                    &a.task_id,
                    format!(
                        "allocated {} min, effort is {} min",
                        a.allocated_minutes(),
                        task.effort_minutes
                    ),
                    70,
                ));
            }
            for iv in &a.intervals {
                if !op.windows.iter().any(|w| w.covers(iv)) {
                    out.push(Violation::new(
                        ViolationType::OutsideAvailability,
                        &a.task_id,
                        format!(
                            "interval [{}, {}) is outside the availability of '{}'",
                            iv.start_min, iv.end_min, op_id
                        ),
                        85,
                    ));
                }
            }
            per_operator
                .entry(op_id)
                .or_default()
                .extend(a.intervals.iter().copied());
        }

        for t in &instance.tasks {
            if !seen.contains(t.id.as_str()) {
                out.push(Violation::new(
                    ViolationType::MissingTask,
                    &t.id,
                    format!("task '{}' has no entry", t.id),
                    100,
                ));
            }
        }

        let mut op_ids: Vec<&str> = per_operator.keys().copied().collect();
        op_ids.sort_unstable();
        for op_id in op_ids {
            let mut intervals = per_operator.remove(op_id).unwrap_or_default();
            intervals.sort_by_key(|w| (w.start_min, w.end_min));
            if intervals.windows(2).any(|p| p[0].overlaps(&p[1])) {
                out.push(Violation::overlap(
                    op_id,
                    format!("operator '{}' has overlapping intervals", op_id),
                ));
            }
            let load: i64 = intervals.iter().map(TimeWindow::duration_min).sum();
            let available = operators
                .get(op_id)
                .map(|o| o.available_minutes())
                .unwrap_or(0);
            if load > available {
                out.push(Violation::capacity_exceeded(
                    op_id,
                    format!("{} min allocated, {} min available", load, available),
                ));
            }
        }

        out
    }

    /// Whether [`violations`](Self::violations) is empty.
    pub fn is_valid(&self, instance: &Instance) -> bool {
        self.violations(instance).is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Operator, Task};

    fn instance() -> Instance {
        Instance::new()
            .with_operator(Operator::new("A").with_skill("S1").with_window(0, 480))
            .with_operator(Operator::new("B").with_skill("S2").with_window(0, 240))
            .with_task(Task::new("T1", 240).with_skill("S1"))
            .with_task(Task::new("T2", 120).with_skill("S2"))
    }

    fn sample_schedule() -> Schedule {
        let mut s = Schedule::new(StrategyKind::Greedy, SolveStatus::Feasible);
        s.assignments
            .push(Assignment::assigned("T1", "A", vec![TimeWindow::new(0, 240)]));
        s.assignments.push(Assignment::unassigned("T2"));
        s
    }

    #[test]
    fn test_assignment_basics() {
        let a = Assignment::assigned(
            "T1",
            "A",
            vec![TimeWindow::new(0, 60), TimeWindow::new(120, 180)],
        );
        assert!(a.is_assigned());
        assert_eq!(a.allocated_minutes(), 120);
        assert_eq!(a.start_min(), Some(0));
        assert_eq!(a.end_min(), Some(180));

        let u = Assignment::unassigned("T2");
        assert!(!u.is_assigned());
        assert_eq!(u.allocated_minutes(), 0);
        assert_eq!(u.end_min(), None);
    }

    #[test]
    fn test_schedule_queries() {
        let s = sample_schedule();
        assert_eq!(s.assigned_count(), 1);
        assert_eq!(s.unassigned_task_ids(), vec!["T2"]);
        assert!((s.coverage_ratio().unwrap() - 0.5).abs() < 1e-10);
        assert_eq!(s.operator_of("T1"), Some("A"));
        assert_eq!(s.operator_of("T2"), None);
        assert_eq!(s.operator_load_minutes("A"), 240);
        assert_eq!(s.operator_load_minutes("B"), 0);
        assert_eq!(s.task_completion_time("T1"), Some(240));
        assert_eq!(s.task_completion_time("T9"), None);
    }

    #[test]
    fn test_empty_schedule_has_no_coverage() {
        let s = Schedule::new(StrategyKind::Greedy, SolveStatus::Feasible);
        assert_eq!(s.coverage_ratio(), None);
        assert_eq!(s.assigned_count(), 0);
    }

    #[test]
    fn test_all_unassigned() {
        let inst = instance();
        let s = Schedule::all_unassigned(StrategyKind::Evolutionary, SolveStatus::Infeasible, &inst);
        assert_eq!(s.assignments.len(), 2);
        assert_eq!(s.assigned_count(), 0);
        assert!(s.is_valid(&inst));
    }

    #[test]
    fn test_valid_schedule() {
        assert!(sample_schedule().is_valid(&instance()));
    }

    #[test]
    fn test_detects_overlap_and_skill_mismatch() {
        let inst = instance()
            .with_task(Task::new("T3", 100).with_skill("S1"));
        let mut s = Schedule::new(StrategyKind::Greedy, SolveStatus::Feasible);
        s.assignments
            .push(Assignment::assigned("T1", "A", vec![TimeWindow::new(0, 240)]));
        s.assignments
            .push(Assignment::assigned("T2", "A", vec![TimeWindow::new(300, 420)]));
        s.assignments
            .push(Assignment::assigned("T3", "A", vec![TimeWindow::new(200, 300)]));

        let v = s.violations(&inst);
        assert!(v.iter().any(|x| x.violation_type == ViolationType::Overlap));
        assert!(v
            .iter()
            .any(|x| x.violation_type == ViolationType::SkillMismatch && x.entity_id == "T2"));
    }

    #[test]
    fn test_detects_fabricated_ids_and_missing_tasks() {
        let mut s = Schedule::new(StrategyKind::Greedy, SolveStatus::Feasible);
        s.assignments
            .push(Assignment::assigned("T1", "Z", vec![TimeWindow::new(0, 240)]));
        s.assignments.push(Assignment::unassigned("T9"));

        let v = s.violations(&instance());
        let unknown = v
            .iter()
            .filter(|x| x.violation_type == ViolationType::UnknownReference)
            .count();
        assert_eq!(unknown, 2);
        assert!(v
            .iter()
            .any(|x| x.violation_type == ViolationType::MissingTask && x.entity_id == "T2"));
    }

    #[test]
    fn test_detects_outside_availability_and_capacity() {
        let mut s = Schedule::new(StrategyKind::Greedy, SolveStatus::Feasible);
        s.assignments.push(Assignment::unassigned("T1"));
        s.assignments.push(Assignment::assigned(
            "T2",
            "B",
            vec![TimeWindow::new(200, 320)],
        ));
        let v = s.violations(&instance());
        assert!(v
            .iter()
            .any(|x| x.violation_type == ViolationType::OutsideAvailability));
        assert!(!v
            .iter()
            .any(|x| x.violation_type == ViolationType::CapacityExceeded));
    }

    #[test]
    fn test_status_display_and_solution_flag() {
        assert_eq!(SolveStatus::StrategyFailed.to_string(), "strategy_failed");
        assert!(SolveStatus::Infeasible.has_solution());
        assert!(!SolveStatus::Infeasible.is_success());
        assert!(SolveStatus::Feasible.is_success());
        assert!(!SolveStatus::NoFeasibleSolutionWithinBudget.has_solution());
    }

    #[test]
    fn test_schedule_serializes() {
        let s = sample_schedule();
        let json = serde_json::to_string(&s).unwrap();
        assert!(json.contains("\"status\":\"feasible\""));
        let back: Schedule = serde_json::from_str(&json).unwrap();
        assert_eq!(back.assignments, s.assignments);
    }
}
