//! Strategy contract.
//!
//! Every solving approach implements [`Strategy`]: it receives the indexed
//! [`AssignmentProblem`], the shared [`SolverConfig`], and a [`Budget`],
//! and returns a [`Schedule`]. Strategies never mutate their inputs.
//!
//! # Time Budget
//! A [`Budget`] carries a monotonic start instant, the wall-clock limit,
//! and a shared stop flag the orchestrator raises when a strategy overruns.
//! Search loops poll [`Budget::is_exhausted`] at iteration boundaries and
//! return their best incumbent when it turns true.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::config::SolverConfig;
use crate::error::StrategyError;
use crate::models::Schedule;
use crate::problem::AssignmentProblem;

/// Identifier of a solving strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StrategyKind {
    LinearProgramming,
    ConstraintProgramming,
    Evolutionary,
    Greedy,
    StableMatching,
}

impl StrategyKind {
    /// Every strategy, in a fixed order.
    pub const ALL: [StrategyKind; 5] = [
        StrategyKind::LinearProgramming,
        StrategyKind::ConstraintProgramming,
        StrategyKind::Evolutionary,
        StrategyKind::Greedy,
        StrategyKind::StableMatching,
    ];

    /// Short identifier used in logs and comparison tables.
    pub fn name(self) -> &'static str {
        match self {
            StrategyKind::LinearProgramming => "linear_programming",
            StrategyKind::ConstraintProgramming => "constraint_programming",
            StrategyKind::Evolutionary => "evolutionary",
            StrategyKind::Greedy => "greedy",
            StrategyKind::StableMatching => "stable_matching",
        }
    }

    /// Static capability metadata.
    pub fn capabilities(self) -> Capabilities {
        match self {
            StrategyKind::LinearProgramming | StrategyKind::ConstraintProgramming => Capabilities {
                guarantees_optimality: true,
                deterministic: true,
                partial_results: true,
                optimizes_objective: true,
            },
            StrategyKind::Evolutionary => Capabilities {
                guarantees_optimality: false,
                deterministic: true,
                partial_results: true,
                optimizes_objective: true,
            },
            StrategyKind::Greedy | StrategyKind::StableMatching => Capabilities {
                guarantees_optimality: false,
                deterministic: true,
                partial_results: false,
                optimizes_objective: false,
            },
        }
    }

    /// Creates the strategy implementation.
    pub fn build(self) -> Box<dyn Strategy> {
        match self {
            StrategyKind::LinearProgramming => Box::new(crate::lp::LpStrategy::new()),
            StrategyKind::ConstraintProgramming => Box::new(crate::cp::CpStrategy::new()),
            StrategyKind::Evolutionary => Box::new(crate::ga::GaStrategy::new()),
            StrategyKind::Greedy => Box::new(crate::scheduler::GreedyStrategy::new()),
            StrategyKind::StableMatching => Box::new(crate::matching::MatchingStrategy::new()),
        }
    }
}

impl fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.name())
    }
}

/// What a strategy promises about its results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Capabilities {
    /// A completed run is provably optimal for the shared objective.
    pub guarantees_optimality: bool,
    /// Same input and config (including seed) give the same output.
    pub deterministic: bool,
    /// An interrupted run still returns a meaningful incumbent.
    pub partial_results: bool,
    /// The search is driven by the shared weighted objective.
    ///
    /// Rule-based and stability-based strategies report `false`; their
    /// objective value is computed for comparison only.
    pub optimizes_objective: bool,
}

/// Wall-clock budget with a cooperative stop flag.
#[derive(Debug, Clone)]
pub struct Budget {
    started: Instant,
    limit: Duration,
    stop: Arc<AtomicBool>,
}

impl Budget {
    /// Starts a budget of `limit` now.
    pub fn new(limit: Duration) -> Self {
        Self {
            started: Instant::now(),
            limit,
            stop: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Starts a budget from a config's time limit.
    pub fn from_config(config: &SolverConfig) -> Self {
        Self::new(config.time_limit())
    }

    /// Shares an external stop flag.
    pub fn with_stop_flag(mut self, stop: Arc<AtomicBool>) -> Self {
        self.stop = stop;
        self
    }

    /// Handle to the stop flag.
    pub fn stop_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.stop)
    }

    /// Asks the running strategy to return its incumbent.
    pub fn request_stop(&self) {
        self.stop.store(true, Ordering::Relaxed);
    }

    /// Whether a stop was requested.
    pub fn stop_requested(&self) -> bool {
        self.stop.load(Ordering::Relaxed)
    }

    /// Whether the strategy must stop now.
    #[inline]
    pub fn is_exhausted(&self) -> bool {
        self.stop_requested() || self.started.elapsed() >= self.limit
    }

    /// Time since the budget started.
    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    /// Time left (zero once exhausted).
    pub fn remaining(&self) -> Duration {
        self.limit.saturating_sub(self.started.elapsed())
    }

    /// The configured limit.
    pub fn limit(&self) -> Duration {
        self.limit
    }
}

/// A solving strategy.
pub trait Strategy: Send + Sync {
    /// Strategy identifier.
    fn kind(&self) -> StrategyKind;

    /// Capability metadata.
    fn capabilities(&self) -> Capabilities {
        self.kind().capabilities()
    }

    /// Solves the problem within `budget`.
    ///
    /// Returns the best feasible schedule found. `Err` is reserved for
    /// internal faults; an instance with no feasible pair yields an
    /// all-unassigned schedule with status `Infeasible`.
    fn solve(
        &self,
        problem: &AssignmentProblem,
        config: &SolverConfig,
        budget: &Budget,
    ) -> Result<Schedule, StrategyError>;
}
