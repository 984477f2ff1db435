//! Depth-first branch and bound with forward checking.
//!
//! Each task is a variable whose domain is "unassigned" plus the feasible
//! operators that still have room for it. Assigning a task shrinks the
//! remaining capacity (and cardinality) of its operator, which removes that
//! operator from every other task's domain it no longer fits. Tasks whose
//! domain becomes empty are fixed to "unassigned" without branching.
//!
//! # Bound
//! `constant + linear(assigned) + Σ value(open task with a non-empty
//! domain) - w_mk * current peak utilization`. The fairness penalty is
//! non-negative and peak utilization only grows, so this never
//! underestimates the best completion of a node.

use crate::config::Branching;
use crate::problem::{AssignmentProblem, Decision};
use crate::strategy::Budget;

const CLOCK_CHECK_INTERVAL: u64 = 256;
const EPS: f64 = 1e-12;

/// Result of a search run.
#[derive(Debug, Clone)]
pub(crate) struct SearchOutcome {
    pub decision: Decision,
    pub score: f64,
    pub nodes: u64,
    /// The tree was exhausted, so `decision` is optimal.
    pub complete: bool,
    pub root_bound: f64,
}

pub(crate) struct Search<'a> {
    problem: &'a AssignmentProblem,
    budget: &'a Budget,
    branching: Branching,
    max_per_operator: Option<usize>,
    values: Vec<f64>,
    remaining: Vec<i64>,
    counts: Vec<usize>,
    loads: Vec<i64>,
    current: Decision,
    decided: Vec<bool>,
    linear: f64,
    best: Decision,
    best_score: f64,
    nodes: u64,
    interrupted: bool,
    root_bound: Option<f64>,
}

impl<'a> Search<'a> {
    pub(crate) fn new(
        problem: &'a AssignmentProblem,
        budget: &'a Budget,
        branching: Branching,
        max_per_operator: Option<usize>,
    ) -> Self {
        let objective = problem.objective();
        let empty = problem.empty_decision();
        let empty_score = problem.evaluate(&empty);
        Self {
            problem,
            budget,
            branching,
            max_per_operator,
            values: (0..problem.num_tasks())
                .map(|j| objective.task_value(j))
                .collect(),
            remaining: (0..problem.num_operators())
                .map(|i| problem.available(i))
                .collect(),
            counts: vec![0; problem.num_operators()],
            loads: vec![0; problem.num_operators()],
            current: empty.clone(),
            decided: vec![false; problem.num_tasks()],
            linear: 0.0,
            best: empty,
            best_score: empty_score,
            nodes: 0,
            interrupted: false,
            root_bound: None,
        }
    }

    /// Offers a feasible starting incumbent. Ignored if it breaks a side
    /// constraint or is not better than the current one.
    pub(crate) fn with_incumbent(mut self, decision: Decision) -> Self {
        if self.respects_side_constraints(&decision) && self.problem.is_feasible_decision(&decision)
        {
            let score = self.problem.evaluate(&decision);
            if score > self.best_score + EPS {
                self.best = decision;
                self.best_score = score;
            }
        }
        self
    }

    pub(crate) fn run(mut self) -> SearchOutcome {
        self.dfs();
        let root_bound = self.root_bound.unwrap_or(self.best_score);
        SearchOutcome {
            complete: !self.interrupted,
            decision: self.best,
            score: self.best_score,
            nodes: self.nodes,
            root_bound: root_bound.max(self.best_score),
        }
    }

    fn respects_side_constraints(&self, decision: &[Option<usize>]) -> bool {
        let Some(limit) = self.max_per_operator else {
            return true;
        };
        let mut counts = vec![0usize; self.problem.num_operators()];
        for i in decision.iter().flatten() {
            counts[*i] += 1;
        }
        counts.iter().all(|&c| c <= limit)
    }

    fn fits(&self, j: usize, i: usize) -> bool {
        self.remaining[i] >= self.problem.effort(j)
            && self.max_per_operator.map_or(true, |limit| self.counts[i] < limit)
    }

    fn domain(&self, j: usize) -> Vec<usize> {
        self.problem
            .eligible(j)
            .iter()
            .copied()
            .filter(|&i| self.fits(j, i))
            .collect()
    }

    fn dfs(&mut self) {
        self.nodes += 1;
        if self.nodes % CLOCK_CHECK_INTERVAL == 0 && self.budget.is_exhausted() {
            self.interrupted = true;
        }
        if self.interrupted {
            return;
        }

        let mut optimistic = 0.0;
        let mut pick: Option<(usize, Vec<usize>)> = None;
        for j in 0..self.problem.num_tasks() {
            if self.decided[j] {
                continue;
            }
            let dom = self.domain(j);
            if !dom.is_empty() {
                optimistic += self.values[j];
            }
            let better = match (&pick, self.branching) {
                (None, _) => true,
                (Some((_, d)), Branching::MostConstrained) => dom.len() < d.len(),
                (Some(_), Branching::InputOrder) => false,
            };
            if better {
                pick = Some((j, dom));
            }
        }

        let objective = self.problem.objective();
        let Some((j, mut dom)) = pick else {
            let score = objective.evaluate_parts(self.linear, &self.loads);
            if score > self.best_score + EPS {
                self.best_score = score;
                self.best = self.current.clone();
            }
            return;
        };

        let (peak, _) = objective.utilization_range(&self.loads);
        let bound = objective.constant() + self.linear + optimistic
            - objective.weights().makespan * peak;
        if self.root_bound.is_none() {
            self.root_bound = Some(bound);
        }
        if bound <= self.best_score + EPS {
            return;
        }

        self.decided[j] = true;

        dom.sort_by(|&a, &b| {
            self.remaining[b]
                .cmp(&self.remaining[a])
                .then_with(|| self.problem.operator(a).id.cmp(&self.problem.operator(b).id))
        });
        let effort = self.problem.effort(j);
        for i in dom {
            self.assign(j, i, effort);
            self.dfs();
            self.unassign(j, i, effort);
            if self.interrupted {
                break;
            }
        }

        if !self.interrupted {
            self.dfs();
        }

        self.decided[j] = false;
    }

    fn assign(&mut self, j: usize, i: usize, effort: i64) {
        self.current[j] = Some(i);
        self.remaining[i] -= effort;
        self.loads[i] += effort;
        self.counts[i] += 1;
        self.linear += self.values[j];
    }

    fn unassign(&mut self, j: usize, i: usize, effort: i64) {
        self.current[j] = None;
        self.remaining[i] += effort;
        self.loads[i] -= effort;
        self.counts[i] -= 1;
        self.linear -= self.values[j];
    }
}
