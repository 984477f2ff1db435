//! Greedy assignment heuristic.
//!
//! # Algorithm
//!
//! 1. Sort tasks with the rule engine (priority descending, earliest
//!    deadline, shortest effort, then ID).
//! 2. For each task, pick the feasible operator with the most remaining
//!    capacity; ties go to the lexicographically smallest operator ID.
//! 3. Tasks with no operator left become unassigned. Nothing is revisited.
//!
//! # Complexity
//! O(n log n + n * m) where n=tasks, m=operators.
//!
//! # Reference
//! Pinedo (2016), "Scheduling", Ch. 4: Priority Dispatching

use crate::config::SolverConfig;
use crate::dispatching::{self, DispatchContext, RuleEngine};
use crate::error::StrategyError;
use crate::models::{Schedule, SolveStatus};
use crate::problem::{AssignmentProblem, Decision};
use crate::strategy::{Budget, Strategy, StrategyKind};

/// Deterministic single-pass greedy strategy.
///
/// # Example
///
/// ```
/// use u_assign::models::{Instance, Operator, Task};
/// use u_assign::problem::AssignmentProblem;
/// use u_assign::scheduler::GreedyStrategy;
/// use u_assign::SolverConfig;
///
/// let instance = Instance::new()
///     .with_operator(Operator::new("A").with_skill("S1").with_window(0, 480))
///     .with_task(Task::new("T1", 120).with_skill("S1"))
///     .with_referenced_skills();
/// let problem = AssignmentProblem::new(&instance, &SolverConfig::default());
/// let decision = GreedyStrategy::new().decide(&problem);
/// assert_eq!(decision, vec![Some(0)]);
/// ```
#[derive(Debug, Clone)]
pub struct GreedyStrategy {
    rule_engine: RuleEngine,
}

impl GreedyStrategy {
    /// Creates a greedy strategy with the standard task order.
    pub fn new() -> Self {
        Self {
            rule_engine: dispatching::assignment_order(),
        }
    }

    /// Replaces the task-ordering rule engine.
    pub fn with_rule_engine(mut self, engine: RuleEngine) -> Self {
        self.rule_engine = engine;
        self
    }

    /// Task indices in processing order.
    pub fn task_order(&self, problem: &AssignmentProblem) -> Vec<usize> {
        let ctx = DispatchContext::new(problem.instance().epoch);
        self.rule_engine
            .sort_indices(&problem.instance().tasks, &ctx)
    }

    /// Builds the greedy decision.
    pub fn decide(&self, problem: &AssignmentProblem) -> Decision {
        construct(problem, &self.task_order(problem))
    }
}

impl Default for GreedyStrategy {
    fn default() -> Self {
        Self::new()
    }
}

/// Assigns tasks in `order`, each to the feasible operator with the most
/// remaining capacity (ties: smallest operator ID).
pub fn construct(problem: &AssignmentProblem, order: &[usize]) -> Decision {
    let mut remaining: Vec<i64> = (0..problem.num_operators())
        .map(|i| problem.available(i))
        .collect();
    let mut decision = problem.empty_decision();

    for &j in order {
        let effort = problem.effort(j);
        let best = problem
            .eligible(j)
            .iter()
            .copied()
            .filter(|&i| remaining[i] >= effort)
            .max_by(|&a, &b| {
                remaining[a]
                    .cmp(&remaining[b])
                    .then_with(|| problem.operator(b).id.cmp(&problem.operator(a).id))
            });
        if let Some(i) = best {
            remaining[i] -= effort;
            decision[j] = Some(i);
        }
    }

    decision
}

impl Strategy for GreedyStrategy {
    fn kind(&self) -> StrategyKind {
        StrategyKind::Greedy
    }

    #[tracing::instrument(level = "debug", name = "Greedy", skip_all)]
    fn solve(
        &self,
        problem: &AssignmentProblem,
        _config: &SolverConfig,
        budget: &Budget,
    ) -> Result<Schedule, StrategyError> {
        if let Some(s) = problem.trivial_schedule(self.kind(), budget)? {
            return Ok(s);
        }
        let decision = self.decide(problem);
        let schedule =
            problem.build_schedule(self.kind(), &decision, SolveStatus::Feasible, budget)?;
        tracing::debug!(
            "Greedy: assigned {}/{} tasks, objective {:.6}",
            schedule.assigned_count(),
            problem.num_tasks(),
            schedule.objective
        );
        Ok(schedule)
    }
}
