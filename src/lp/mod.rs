//! Mixed-integer programming strategy.
//!
//! # Model
//!
//! - `x[j,i] ∈ {0,1}` for every feasible (task, operator) pair
//! - `u_max, u_min ∈ [0,1]` bound the operator utilizations
//!
//! ```text
//! maximise   c0 + Σ v_j x[j,i] - w_fair (u_max - u_min) - w_mk u_max
//! subject to Σ_i x[j,i] ≤ 1                       (each task at most once)
//!            Σ_j e_j x[j,i] ≤ A_i                 (operator capacity)
//!            u_min ≤ Σ_j (e_j / A_i) x[j,i] ≤ u_max (utilization envelope)
//! ```
//!
//! `v_j` and `c0` come from the shared objective, so the model optimum is
//! the best achievable shared score. Deadline handling is done by pair
//! exclusion when the problem was built with `enforce_deadlines`.
//!
//! # Time Limit
//! The remaining budget is handed to the solver as its time limit, and the
//! greedy decision is passed in as the initial solution. A proven optimum is
//! reported as `Optimal`; a solve cut short by the limit returns the
//! solver's incumbent as `Feasible` with an upper bound in
//! [`SolveStats::bound`](crate::models::SolveStats). If the solver stops
//! before holding any incumbent, the greedy decision is returned instead.
//!
//! # Reference
//! Burkard, Dell'Amico & Martello (2012), "Assignment Problems", Ch. 7
//! (generalized assignment)

use std::time::Duration;

use good_lp::{
    microlp, variable, variables, Expression, ResolutionError, Solution, SolutionStatus,
    SolverModel, Variable, WithInitialSolution, WithTimeLimit,
};

use crate::config::SolverConfig;
use crate::error::StrategyError;
use crate::models::{Schedule, SolveStatus};
use crate::problem::{AssignmentProblem, Decision};
use crate::scheduler::GreedyStrategy;
use crate::strategy::{Budget, Strategy, StrategyKind};

/// Exact MIP strategy.
#[derive(Debug, Clone, Default)]
pub struct LpStrategy;

impl LpStrategy {
    pub fn new() -> Self {
        Self
    }
}

/// Flattened model data over the feasible pairs.
#[derive(Debug, Clone)]
struct MipModel {
    constant: f64,
    fairness: f64,
    makespan: f64,
    /// `(task, operator, value, effort)` per feasible pair.
    pairs: Vec<(usize, usize, f64, f64)>,
    num_tasks: usize,
    available: Vec<f64>,
}

#[derive(Debug)]
enum MipOutcome {
    Solved {
        chosen: Vec<(usize, usize)>,
        proven: bool,
    },
    /// Time limit hit before the solver held any incumbent.
    NoIncumbent,
    Infeasible,
    Failed(String),
}

impl MipModel {
    fn from_problem(problem: &AssignmentProblem) -> Self {
        let objective = problem.objective();
        let mut pairs = Vec::new();
        for j in 0..problem.num_tasks() {
            let value = objective.task_value(j);
            for &i in problem.eligible(j) {
                pairs.push((j, i, value, problem.effort(j) as f64));
            }
        }
        Self {
            constant: objective.constant(),
            fairness: objective.weights().fairness,
            makespan: objective.weights().makespan,
            pairs,
            num_tasks: problem.num_tasks(),
            available: (0..problem.num_operators())
                .map(|i| problem.available(i) as f64)
                .collect(),
        }
    }

    /// Utilization envelope `(u_max, u_min)` of a decision.
    fn envelope(&self, decision: &Decision) -> (f64, f64) {
        let mut load = vec![0.0; self.available.len()];
        for &(j, i, _, effort) in &self.pairs {
            if decision[j] == Some(i) {
                load[i] += effort;
            }
        }
        let utils: Vec<f64> = load
            .iter()
            .zip(&self.available)
            .filter(|(_, &avail)| avail > 0.0)
            .map(|(&l, &avail)| l / avail)
            .collect();
        if utils.is_empty() {
            return (0.0, 0.0);
        }
        let max = utils.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let min = utils.iter().copied().fold(f64::INFINITY, f64::min);
        (max, min)
    }

    fn solve(&self, warm_start: &Decision, time_limit: Duration) -> MipOutcome {
        let mut vars = variables!();
        let x: Vec<Variable> = self
            .pairs
            .iter()
            .map(|_| vars.add(variable().binary()))
            .collect();
        let u_max = vars.add(variable().min(0.0).max(1.0));
        let u_min = vars.add(variable().min(0.0).max(1.0));

        let objective = self
            .pairs
            .iter()
            .zip(&x)
            .fold(Expression::from(self.constant), |acc, (&(_, _, v, _), &var)| {
                acc + v * var
            })
            - (self.fairness + self.makespan) * u_max
            + self.fairness * u_min;

        let (hint_max, hint_min) = self.envelope(warm_start);
        let hint: Vec<(Variable, f64)> = self
            .pairs
            .iter()
            .zip(&x)
            .map(|(&(j, i, _, _), &var)| (var, if warm_start[j] == Some(i) { 1.0 } else { 0.0 }))
            .chain([(u_max, hint_max), (u_min, hint_min)])
            .collect();

        let mut prob = vars
            .maximise(objective)
            .using(microlp)
            .with_time_limit(time_limit.as_secs_f64())
            .with_initial_solution(hint);

        // Each task at most once
        let mut per_task: Vec<Expression> = vec![Expression::from(0.0); self.num_tasks];
        // Operator load in minutes
        let mut per_operator: Vec<Expression> = vec![Expression::from(0.0); self.available.len()];
        for (&(j, i, _, effort), &var) in self.pairs.iter().zip(&x) {
            per_task[j] += var;
            per_operator[i] += effort * var;
        }
        for sum in per_task {
            prob.add_constraint(sum.leq(1.0));
        }
        for (load, &avail) in per_operator.into_iter().zip(&self.available) {
            if avail <= 0.0 {
                continue;
            }
            let util = load.clone() * (1.0 / avail);
            prob.add_constraint(load.leq(avail));
            prob.add_constraint(util.clone().leq(u_max));
            prob.add_constraint(util.geq(u_min));
        }
        prob.add_constraint((u_min - u_max).leq(0.0));

        match prob.solve() {
            Ok(sol) => MipOutcome::Solved {
                proven: matches!(sol.status(), SolutionStatus::Optimal),
                chosen: self
                    .pairs
                    .iter()
                    .zip(&x)
                    .filter(|(_, &var)| sol.value(var) >= 0.5)
                    .map(|(&(j, i, _, _), _)| (j, i))
                    .collect(),
            },
            Err(ResolutionError::Infeasible) => MipOutcome::Infeasible,
            // Raised by the backend when the limit expires with nothing to return.
            Err(ResolutionError::Other(_)) => MipOutcome::NoIncumbent,
            Err(e) => MipOutcome::Failed(e.to_string()),
        }
    }

    /// Objective upper bound ignoring capacity and utilization penalties.
    fn relaxed_bound(&self, problem: &AssignmentProblem) -> f64 {
        let objective = problem.objective();
        self.constant
            + (0..problem.num_tasks())
                .filter(|&j| !problem.eligible(j).is_empty())
                .map(|j| objective.task_value(j))
                .sum::<f64>()
    }
}

impl LpStrategy {
    fn incumbent_schedule(
        &self,
        problem: &AssignmentProblem,
        incumbent: &Decision,
        bound: f64,
        budget: &Budget,
        message: &str,
    ) -> Result<Schedule, StrategyError> {
        let mut schedule =
            problem.build_schedule(self.kind(), incumbent, SolveStatus::Feasible, budget)?;
        schedule.stats.bound = Some(bound);
        Ok(schedule.with_message(message))
    }
}

impl Strategy for LpStrategy {
    fn kind(&self) -> StrategyKind {
        StrategyKind::LinearProgramming
    }

    #[tracing::instrument(level = "debug", name = "MIP", skip_all)]
    fn solve(
        &self,
        problem: &AssignmentProblem,
        _config: &SolverConfig,
        budget: &Budget,
    ) -> Result<Schedule, StrategyError> {
        if let Some(s) = problem.trivial_schedule(self.kind(), budget)? {
            return Ok(s);
        }

        let warm_start = GreedyStrategy::new().decide(problem);
        let model = MipModel::from_problem(problem);
        let bound = model.relaxed_bound(problem);

        if budget.is_exhausted() {
            tracing::warn!("MIP: budget exhausted before solving");
            return self.incumbent_schedule(
                problem,
                &warm_start,
                bound,
                budget,
                "time limit reached before the MIP started; returning warm-start incumbent",
            );
        }

        tracing::debug!(
            "MIP: {} binary variables over {} tasks and {} operators",
            model.pairs.len(),
            problem.num_tasks(),
            problem.num_operators()
        );

        match model.solve(&warm_start, budget.remaining()) {
            MipOutcome::Solved { chosen, proven } => {
                let mut decision = problem.empty_decision();
                for (j, i) in chosen {
                    decision[j] = Some(i);
                }
                if !problem.is_feasible_decision(&decision) {
                    tracing::warn!("MIP: solution violates constraints after rounding, using warm start");
                    return self.incumbent_schedule(
                        problem,
                        &warm_start,
                        bound,
                        budget,
                        "MIP solution failed the feasibility check; returning warm-start incumbent",
                    );
                }
                if proven {
                    let schedule =
                        problem.build_schedule(self.kind(), &decision, SolveStatus::Optimal, budget)?;
                    tracing::debug!("MIP: optimal objective {:.6}", schedule.objective);
                    return Ok(schedule);
                }
                // The backend never returns worse than its initial solution,
                // but rounding can; keep whichever scores higher.
                let best = if problem.evaluate(&decision) + 1e-9 >= problem.evaluate(&warm_start) {
                    decision
                } else {
                    warm_start
                };
                tracing::warn!("MIP: time limit reached, returning solver incumbent");
                self.incumbent_schedule(
                    problem,
                    &best,
                    bound,
                    budget,
                    "time limit reached before optimality was proven; returning best incumbent",
                )
            }
            MipOutcome::NoIncumbent => {
                tracing::warn!("MIP: time limit reached without a solver incumbent");
                self.incumbent_schedule(
                    problem,
                    &warm_start,
                    bound,
                    budget,
                    "time limit reached before the MIP found a solution; returning warm-start incumbent",
                )
            }
            MipOutcome::Infeasible => Ok(problem
                .build_schedule(
                    self.kind(),
                    &problem.empty_decision(),
                    SolveStatus::Infeasible,
                    budget,
                )?
                .with_message("MIP model reported infeasible")),
            MipOutcome::Failed(msg) => Err(StrategyError::solver(msg)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Instance, Operator, Priority, Task};

    fn solve(instance: &Instance, config: &SolverConfig) -> Schedule {
        let problem = AssignmentProblem::new(instance, config);
        LpStrategy::new()
            .solve(&problem, config, &Budget::from_config(config))
            .unwrap()
    }

    #[test]
    fn test_scenario_assigns_both() {
        let inst = Instance::new()
            .with_operator(Operator::new("A").with_skill("S1").with_window(0, 480))
            .with_operator(Operator::new("B").with_skills(["S1", "S2"]).with_window(0, 240))
            .with_task(
                Task::new("T1", 240)
                    .with_skill("S1")
                    .with_priority(Priority::High),
            )
            .with_task(Task::new("T2", 240).with_skill("S2"))
            .with_referenced_skills();
        let s = solve(&inst, &SolverConfig::default());
        assert_eq!(s.status, SolveStatus::Optimal);
        assert_eq!(s.operator_of("T1"), Some("A"));
        assert_eq!(s.operator_of("T2"), Some("B"));
        assert!(s.is_valid(&inst));
    }

    #[test]
    fn test_beats_greedy_on_packing() {
        // Greedy puts the big high-priority task on the bigger operator
        // first and strands two medium tasks; the MIP fits all three.
        let inst = Instance::new()
            .with_operator(Operator::new("A").with_window(0, 300))
            .with_operator(Operator::new("B").with_window(0, 200))
            .with_task(Task::new("big", 200).with_priority(Priority::High))
            .with_task(Task::new("m1", 150))
            .with_task(Task::new("m2", 150));
        let config = SolverConfig::default();
        let s = solve(&inst, &config);
        let problem = AssignmentProblem::new(&inst, &config);
        let greedy = problem.evaluate(&GreedyStrategy::new().decide(&problem));
        assert!(s.objective >= greedy - 1e-9);
        assert_eq!(s.assigned_count(), 3);
    }

    #[test]
    fn test_zero_budget_returns_incumbent() {
        let inst = Instance::new()
            .with_operator(Operator::new("A").with_window(0, 100))
            .with_task(Task::new("T1", 60));
        let config = SolverConfig::default().with_time_limit(Duration::ZERO);
        let s = solve(&inst, &config);
        assert_eq!(s.status, SolveStatus::Feasible);
        assert_eq!(s.operator_of("T1"), Some("A"));
        assert!(s.stats.bound.unwrap() >= s.objective - 1e-9);
        assert!(s.message.is_some());
    }

    #[test]
    fn test_time_limit_returns_feasible_incumbent() {
        // Heavily oversubscribed: 200 tasks competing for 10 operators.
        let mut inst = Instance::new();
        for i in 0..10 {
            inst = inst.with_operator(Operator::new(format!("OP{i:02}")).with_window(0, 600 + 37 * i));
        }
        let priorities = [Priority::Low, Priority::Medium, Priority::High, Priority::Urgent];
        for k in 0..200i64 {
            inst = inst.with_task(
                Task::new(format!("T{k:03}"), 37 + (k * 53) % 97)
                    .with_priority(priorities[(k % 4) as usize]),
            );
        }
        let limit = Duration::from_millis(100);
        let config = SolverConfig::default().with_time_limit(limit);
        let problem = AssignmentProblem::new(&inst, &config);

        let started = std::time::Instant::now();
        let s = LpStrategy::new()
            .solve(&problem, &config, &Budget::new(limit))
            .unwrap();
        let elapsed = started.elapsed();

        assert_eq!(s.status, SolveStatus::Feasible);
        assert!(s.is_valid(&inst));
        assert!(s.stats.bound.unwrap() >= s.objective - 1e-9);
        assert!(s.message.is_some());
        assert!(elapsed < limit + Duration::from_secs(2), "took {elapsed:?}");

        let greedy = problem.evaluate(&GreedyStrategy::new().decide(&problem));
        assert!(s.objective >= greedy - 1e-9);
    }

    #[test]
    fn test_no_operators_is_infeasible() {
        let inst = Instance::new().with_task(Task::new("T1", 60));
        let s = solve(&inst, &SolverConfig::default());
        assert_eq!(s.status, SolveStatus::Infeasible);
        assert_eq!(s.unassigned_task_ids(), vec!["T1"]);
    }
}
