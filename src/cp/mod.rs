//! Constraint programming strategy.
//!
//! Models the assignment as one finite-domain variable per task
//! (`operator index | unassigned`) and solves it by systematic search with
//! propagation. Unlike the MIP model, side constraints are checked
//! directly during search rather than linearized; the optional
//! per-operator task cardinality limit is one such constraint.
//!
//! # Search
//! - Variable order: most-constrained task first (smallest live domain),
//!   or input order.
//! - Value order: operators with the most remaining capacity first, then
//!   "unassigned".
//! - Pruning: branch and bound against an optimistic bound on the shared
//!   objective (see [`search`]).
//! - The greedy decision seeds the incumbent; the clock is polled every few
//!   hundred nodes.
//!
//! # Reference
//! - Baptiste et al. (2001), "Constraint-Based Scheduling"
//! - Rossi, van Beek & Walsh (2006), "Handbook of Constraint Programming", Ch. 4

mod search;

use crate::config::SolverConfig;
use crate::error::StrategyError;
use crate::models::{Schedule, SolveStatus};
use crate::problem::AssignmentProblem;
use crate::scheduler::GreedyStrategy;
use crate::strategy::{Budget, Strategy, StrategyKind};

use search::Search;

/// Branch-and-bound constraint search strategy.
#[derive(Debug, Clone, Default)]
pub struct CpStrategy;

impl CpStrategy {
    pub fn new() -> Self {
        Self
    }
}

impl Strategy for CpStrategy {
    fn kind(&self) -> StrategyKind {
        StrategyKind::ConstraintProgramming
    }

    #[tracing::instrument(level = "debug", name = "CP", skip_all)]
    fn solve(
        &self,
        problem: &AssignmentProblem,
        config: &SolverConfig,
        budget: &Budget,
    ) -> Result<Schedule, StrategyError> {
        if let Some(s) = problem.trivial_schedule(self.kind(), budget)? {
            return Ok(s);
        }

        let outcome = Search::new(
            problem,
            budget,
            config.cp.branching,
            config.cp.max_tasks_per_operator,
        )
        .with_incumbent(GreedyStrategy::new().decide(problem))
        .run();

        let status = if outcome.complete {
            SolveStatus::Optimal
        } else {
            tracing::warn!(
                "CP: time limit reached after {} nodes, returning incumbent",
                outcome.nodes
            );
            SolveStatus::Feasible
        };

        let mut schedule = problem.build_schedule(self.kind(), &outcome.decision, status, budget)?;
        schedule.stats.nodes = Some(outcome.nodes);
        if !outcome.complete {
            schedule.stats.bound = Some(outcome.root_bound);
            schedule = schedule.with_message("time limit reached before the search completed");
        }
        tracing::debug!(
            "CP: {} nodes, best {:.6}, root bound {:.6}, complete={}",
            outcome.nodes,
            outcome.score,
            outcome.root_bound,
            outcome.complete
        );
        Ok(schedule)
    }
}
