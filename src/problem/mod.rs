//! Indexed assignment problem.
//!
//! Built once per run from a validated [`Instance`] and shared read-only by
//! every strategy. Tasks and operators are addressed by position; a
//! *decision* holds one `Option<operator index>` per task.
//!
//! # Feasible Pair
//! Operator `i` can take task `j` when it holds every required skill, the
//! task's effort fits its total available minutes, and (with
//! `enforce_deadlines`) the effort packed from its first window completes
//! by the deadline.
//!
//! # Feasible Decision
//! Every chosen pair is feasible and no operator's assigned effort exceeds
//! its available minutes.

mod objective;
pub mod placement;

pub use objective::{Objective, ObjectiveBreakdown};

use std::cmp::Reverse;

use crate::config::SolverConfig;
use crate::error::StrategyError;
use crate::models::{Assignment, Instance, Operator, Schedule, SolveStatus, Task, TimeWindow};
use crate::strategy::{Budget, StrategyKind};

/// One operator index (or none) per task.
pub type Decision = Vec<Option<usize>>;

/// Indexed, read-only view of an instance.
#[derive(Debug, Clone)]
pub struct AssignmentProblem {
    instance: Instance,
    available: Vec<i64>,
    deadlines: Vec<Option<i64>>,
    /// Per task: feasible operator indices, ascending.
    eligible: Vec<Vec<usize>>,
    /// `feasible[j][i]`: whether operator `i` can take task `j`.
    feasible: Vec<Vec<bool>>,
    objective: Objective,
    enforce_deadlines: bool,
}

impl AssignmentProblem {
    /// Indexes `instance` under `config`.
    pub fn new(instance: &Instance, config: &SolverConfig) -> Self {
        let instance = instance.clone();
        let available: Vec<i64> = instance
            .operators
            .iter()
            .map(Operator::available_minutes)
            .collect();
        let deadlines: Vec<Option<i64>> = instance
            .tasks
            .iter()
            .map(|t| instance.deadline_minute(t))
            .collect();

        let mut feasible = Vec::with_capacity(instance.tasks.len());
        let mut eligible = Vec::with_capacity(instance.tasks.len());
        for (j, task) in instance.tasks.iter().enumerate() {
            let row: Vec<bool> = instance
                .operators
                .iter()
                .enumerate()
                .map(|(i, op)| {
                    pair_feasible(
                        op,
                        available[i],
                        task,
                        deadlines[j],
                        config.enforce_deadlines,
                    )
                })
                .collect();
            eligible.push(
                row.iter()
                    .enumerate()
                    .filter(|(_, ok)| **ok)
                    .map(|(i, _)| i)
                    .collect(),
            );
            feasible.push(row);
        }

        let objective = Objective::new(
            config.objective_weights,
            instance.tasks.iter().map(|t| t.effort_minutes).collect(),
            instance.tasks.iter().map(|t| t.priority.weight()).collect(),
            available.clone(),
        );

        Self {
            instance,
            available,
            deadlines,
            eligible,
            feasible,
            objective,
            enforce_deadlines: config.enforce_deadlines,
        }
    }

    /// The underlying instance.
    pub fn instance(&self) -> &Instance {
        &self.instance
    }

    pub fn num_tasks(&self) -> usize {
        self.instance.tasks.len()
    }

    pub fn num_operators(&self) -> usize {
        self.instance.operators.len()
    }

    pub fn task(&self, j: usize) -> &Task {
        &self.instance.tasks[j]
    }

    pub fn operator(&self, i: usize) -> &Operator {
        &self.instance.operators[i]
    }

    /// Effort of task `j` (minutes).
    #[inline]
    pub fn effort(&self, j: usize) -> i64 {
        self.instance.tasks[j].effort_minutes
    }

    /// Total available minutes of operator `i`.
    #[inline]
    pub fn available(&self, i: usize) -> i64 {
        self.available[i]
    }

    /// Deadline of task `j` as a minute offset.
    pub fn deadline(&self, j: usize) -> Option<i64> {
        self.deadlines[j]
    }

    /// Feasible operators for task `j`, ascending by index.
    pub fn eligible(&self, j: usize) -> &[usize] {
        &self.eligible[j]
    }

    /// Whether operator `i` can take task `j`.
    #[inline]
    pub fn is_feasible_pair(&self, j: usize, i: usize) -> bool {
        self.feasible[j][i]
    }

    /// Whether any task has any feasible operator.
    pub fn has_feasible_pair(&self) -> bool {
        self.eligible.iter().any(|e| !e.is_empty())
    }

    /// Number of task skills operator `i` holds.
    pub fn skill_match(&self, j: usize, i: usize) -> usize {
        let op = &self.instance.operators[i];
        self.instance.tasks[j]
            .required_skills
            .iter()
            .filter(|s| op.has_skill(s))
            .count()
    }

    /// Skills operator `i` holds beyond those task `j` requires.
    pub fn surplus_skills(&self, j: usize, i: usize) -> usize {
        let op = &self.instance.operators[i];
        op.skills.len() - self.skill_match(j, i)
    }

    /// Whether pairs violating deadlines were excluded.
    pub fn enforces_deadlines(&self) -> bool {
        self.enforce_deadlines
    }

    /// The shared objective.
    pub fn objective(&self) -> &Objective {
        &self.objective
    }

    /// Score of a decision.
    pub fn evaluate(&self, decision: &[Option<usize>]) -> f64 {
        self.objective.evaluate(decision)
    }

    /// Per-operator loads of a decision.
    pub fn loads(&self, decision: &[Option<usize>]) -> Vec<i64> {
        self.objective.loads(decision)
    }

    /// Minutes by which operators are overallocated in total.
    pub fn overallocation(&self, decision: &[Option<usize>]) -> i64 {
        self.loads(decision)
            .iter()
            .zip(&self.available)
            .map(|(load, avail)| (load - avail).max(0))
            .sum()
    }

    /// Whether a decision satisfies all hard constraints.
    pub fn is_feasible_decision(&self, decision: &[Option<usize>]) -> bool {
        if decision.len() != self.num_tasks() {
            return false;
        }
        let pairs_ok = decision.iter().enumerate().all(|(j, op)| match op {
            Some(i) => *i < self.num_operators() && self.feasible[j][*i],
            None => true,
        });
        pairs_ok && self.overallocation(decision) == 0
    }

    /// Decision with every task unassigned.
    pub fn empty_decision(&self) -> Decision {
        vec![None; self.num_tasks()]
    }

    /// Turns a feasible decision into a [`Schedule`].
    ///
    /// Each operator's tasks are ordered earliest deadline first (then
    /// priority descending, then ID) and packed into its windows. The
    /// objective is evaluated by the shared evaluator; the solve duration is
    /// the budget's elapsed time.
    pub fn build_schedule(
        &self,
        kind: StrategyKind,
        decision: &[Option<usize>],
        status: SolveStatus,
        budget: &Budget,
    ) -> Result<Schedule, StrategyError> {
        if !self.is_feasible_decision(decision) {
            return Err(StrategyError::internal(format!(
                "{} produced a decision that violates skill or capacity constraints",
                kind
            )));
        }

        let mut intervals: Vec<Vec<TimeWindow>> = vec![Vec::new(); self.num_tasks()];
        for i in 0..self.num_operators() {
            let mut mine: Vec<usize> = decision
                .iter()
                .enumerate()
                .filter(|(_, o)| **o == Some(i))
                .map(|(j, _)| j)
                .collect();
            if mine.is_empty() {
                continue;
            }
            mine.sort_by_key(|&j| {
                (
                    self.deadlines[j].unwrap_or(i64::MAX),
                    Reverse(self.task(j).priority),
                    self.task(j).id.clone(),
                )
            });
            let efforts: Vec<i64> = mine.iter().map(|&j| self.effort(j)).collect();
            let placed = placement::pack(&self.operator(i).windows, &efforts).ok_or_else(|| {
                StrategyError::internal(format!(
                    "operator '{}' windows cannot hold its assigned effort",
                    self.operator(i).id
                ))
            })?;
            for (j, ivs) in mine.into_iter().zip(placed) {
                intervals[j] = ivs;
            }
        }

        let mut schedule = Schedule::new(kind, status);
        schedule.assignments = decision
            .iter()
            .zip(intervals)
            .enumerate()
            .map(|(j, (op, ivs))| {
                let task_id = self.task(j).id.clone();
                match op {
                    Some(i) => Assignment::assigned(task_id, self.operator(*i).id.clone(), ivs),
                    None => Assignment::unassigned(task_id),
                }
            })
            .collect();
        schedule.objective = self.evaluate(decision);
        schedule.solve_duration = budget.elapsed();
        Ok(schedule)
    }

    /// Handles instances that need no search.
    ///
    /// With no tasks, returns an empty schedule (`Optimal` for exact
    /// strategies, `Feasible` otherwise). With tasks but no feasible pair
    /// (including zero operators), returns an all-unassigned schedule with
    /// status `Infeasible`. Otherwise `None`.
    pub fn trivial_schedule(
        &self,
        kind: StrategyKind,
        budget: &Budget,
    ) -> Result<Option<Schedule>, StrategyError> {
        if self.num_tasks() == 0 {
            let status = if kind.capabilities().guarantees_optimality {
                SolveStatus::Optimal
            } else {
                SolveStatus::Feasible
            };
            return self.build_schedule(kind, &[], status, budget).map(Some);
        }
        if !self.has_feasible_pair() {
            let schedule = self
                .build_schedule(kind, &self.empty_decision(), SolveStatus::Infeasible, budget)?
                .with_message("no operator can take any task");
            return Ok(Some(schedule));
        }
        Ok(None)
    }
}

fn pair_feasible(
    op: &Operator,
    available: i64,
    task: &Task,
    deadline: Option<i64>,
    enforce_deadlines: bool,
) -> bool {
    if !op.holds_all(&task.required_skills) || task.effort_minutes > available {
        return false;
    }
    if enforce_deadlines {
        if let Some(d) = deadline {
            return op
                .earliest_completion(task.effort_minutes)
                .is_some_and(|end| end <= d);
        }
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Priority, SolveStatus};
    use chrono::NaiveDate;
    use std::time::Duration;

    fn scenario() -> Instance {
        Instance::new()
            .with_operator(Operator::new("A").with_skill("S1").with_window(0, 480))
            .with_operator(Operator::new("B").with_skills(["S1", "S2"]).with_window(0, 240))
            .with_task(
                Task::new("T1", 240)
                    .with_skill("S1")
                    .with_priority(Priority::High),
            )
            .with_task(Task::new("T2", 240).with_skill("S2"))
            .with_referenced_skills()
    }

    fn budget() -> Budget {
        Budget::new(Duration::from_secs(5))
    }

    #[test]
    fn test_eligibility() {
        let p = AssignmentProblem::new(&scenario(), &SolverConfig::default());
        assert_eq!(p.eligible(0), &[0, 1]);
        assert_eq!(p.eligible(1), &[1]);
        assert!(p.has_feasible_pair());
        assert_eq!(p.skill_match(1, 1), 1);
        assert_eq!(p.surplus_skills(0, 1), 1);
        assert_eq!(p.surplus_skills(0, 0), 0);
    }

    #[test]
    fn test_effort_must_fit_capacity() {
        let inst = scenario().with_task(Task::new("T3", 300).with_skill("S1"));
        let p = AssignmentProblem::new(&inst, &SolverConfig::default());
        assert_eq!(p.eligible(2), &[0]);
    }

    #[test]
    fn test_enforced_deadlines_prune_pairs() {
        let epoch = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let inst = Instance::new()
            .with_epoch(epoch)
            .with_operator(Operator::new("early").with_window(0, 600))
            .with_operator(Operator::new("late").with_window(2000, 2600))
            .with_task(Task::new("T", 120).with_deadline(epoch));

        let loose = AssignmentProblem::new(&inst, &SolverConfig::default());
        assert_eq!(loose.eligible(0), &[0, 1]);

        let strict =
            AssignmentProblem::new(&inst, &SolverConfig::default().with_enforce_deadlines(true));
        assert_eq!(strict.eligible(0), &[0]);
        assert!(strict.enforces_deadlines());
    }

    #[test]
    fn test_feasible_decision() {
        let p = AssignmentProblem::new(&scenario(), &SolverConfig::default());
        assert!(p.is_feasible_decision(&[Some(0), Some(1)]));
        assert!(p.is_feasible_decision(&[None, None]));
        // B lacks nothing for T1, but T1 + T2 on B exceeds 240 min
        assert!(!p.is_feasible_decision(&[Some(1), Some(1)]));
        assert_eq!(p.overallocation(&[Some(1), Some(1)]), 240);
        // A lacks S2
        assert!(!p.is_feasible_decision(&[None, Some(0)]));
        // Wrong length
        assert!(!p.is_feasible_decision(&[None]));
    }

    #[test]
    fn test_build_schedule() {
        let p = AssignmentProblem::new(&scenario(), &SolverConfig::default());
        let s = p
            .build_schedule(
                StrategyKind::Greedy,
                &[Some(0), Some(1)],
                SolveStatus::Feasible,
                &budget(),
            )
            .unwrap();
        assert_eq!(s.assignments.len(), 2);
        assert_eq!(s.operator_of("T1"), Some("A"));
        assert_eq!(s.operator_of("T2"), Some("B"));
        assert_eq!(
            s.assignment_for_task("T1").unwrap().intervals,
            vec![TimeWindow::new(0, 240)]
        );
        assert!(s.is_valid(p.instance()));
        assert!((s.objective - p.evaluate(&[Some(0), Some(1)])).abs() < 1e-10);
    }

    #[test]
    fn test_build_schedule_orders_by_deadline() {
        let epoch = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let inst = Instance::new()
            .with_epoch(epoch)
            .with_operator(Operator::new("A").with_window(0, 600))
            .with_task(Task::new("later", 60).with_deadline(epoch.succ_opt().unwrap()))
            .with_task(Task::new("sooner", 60).with_deadline(epoch));
        let p = AssignmentProblem::new(&inst, &SolverConfig::default());
        let s = p
            .build_schedule(
                StrategyKind::Greedy,
                &[Some(0), Some(0)],
                SolveStatus::Feasible,
                &budget(),
            )
            .unwrap();
        assert_eq!(s.assignment_for_task("sooner").unwrap().start_min(), Some(0));
        assert_eq!(s.assignment_for_task("later").unwrap().start_min(), Some(60));
    }

    #[test]
    fn test_build_schedule_rejects_infeasible_decision() {
        let p = AssignmentProblem::new(&scenario(), &SolverConfig::default());
        let err = p.build_schedule(
            StrategyKind::Evolutionary,
            &[Some(1), Some(1)],
            SolveStatus::Feasible,
            &budget(),
        );
        assert!(matches!(err, Err(StrategyError::Internal(_))));
    }

    #[test]
    fn test_trivial_schedules() {
        let no_ops = Instance::new().with_task(Task::new("T1", 60));
        let p = AssignmentProblem::new(&no_ops, &SolverConfig::default());
        let s = p
            .trivial_schedule(StrategyKind::LinearProgramming, &budget())
            .unwrap()
            .unwrap();
        assert_eq!(s.status, SolveStatus::Infeasible);
        assert_eq!(s.unassigned_task_ids(), vec!["T1"]);

        let no_tasks = Instance::new().with_operator(Operator::new("A").with_window(0, 60));
        let p = AssignmentProblem::new(&no_tasks, &SolverConfig::default());
        let exact = p
            .trivial_schedule(StrategyKind::ConstraintProgramming, &budget())
            .unwrap()
            .unwrap();
        assert_eq!(exact.status, SolveStatus::Optimal);
        let heuristic = p
            .trivial_schedule(StrategyKind::Greedy, &budget())
            .unwrap()
            .unwrap();
        assert_eq!(heuristic.status, SolveStatus::Feasible);

        let normal = AssignmentProblem::new(&scenario(), &SolverConfig::default());
        assert!(normal
            .trivial_schedule(StrategyKind::Greedy, &budget())
            .unwrap()
            .is_none());
    }
}
