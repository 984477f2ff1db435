//! Side-by-side comparison of strategy runs.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::models::{Schedule, SolveStatus};
use crate::strategy::StrategyKind;

/// Criterion for [`Comparison::best_by`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComparisonMetric {
    /// Highest shared objective.
    Objective,
    /// Highest coverage ratio.
    Coverage,
    /// Shortest solve duration.
    SolveTime,
}

/// One row per strategy run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComparisonRow {
    pub strategy: StrategyKind,
    pub status: SolveStatus,
    /// `None` when the run produced no solution.
    pub objective: Option<f64>,
    pub solve_duration: Duration,
    pub coverage_ratio: Option<f64>,
    /// The run proved its result optimal.
    pub optimality_guaranteed: bool,
    /// Whether the strategy searches on the shared objective at all.
    /// Greedy and stable matching do not; their objective is informative.
    pub optimizes_objective: bool,
    /// Stable-matching runs only: no blocking pair remains.
    pub stable: Option<bool>,
    pub message: Option<String>,
}

impl ComparisonRow {
    pub fn from_schedule(schedule: &Schedule) -> Self {
        let solved = schedule.status.has_solution();
        Self {
            strategy: schedule.strategy,
            status: schedule.status,
            objective: solved.then_some(schedule.objective),
            solve_duration: schedule.solve_duration,
            coverage_ratio: if solved { schedule.coverage_ratio() } else { None },
            optimality_guaranteed: schedule.is_optimal(),
            optimizes_objective: schedule.strategy.capabilities().optimizes_objective,
            stable: schedule.stats.stable,
            message: schedule.message.clone(),
        }
    }

    /// Whether the run produced an assignment.
    pub fn succeeded(&self) -> bool {
        self.status.is_success()
    }

    /// Whether the run faulted or ran out of time without a result.
    pub fn failed(&self) -> bool {
        !self.status.has_solution()
    }
}

/// Aggregates over the successful runs.
///
/// Runs that proved the instance infeasible are neither succeeded nor
/// failed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ComparisonSummary {
    pub best_objective: Option<StrategyKind>,
    pub fastest: Option<StrategyKind>,
    pub best_coverage: Option<StrategyKind>,
    pub succeeded: usize,
    pub infeasible: usize,
    pub failed: usize,
}

/// Comparison table keyed by strategy.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Comparison {
    pub rows: Vec<ComparisonRow>,
    pub summary: ComparisonSummary,
}

impl Comparison {
    /// Builds the table in the order of `schedules`.
    pub fn from_schedules(schedules: &[Schedule]) -> Self {
        let rows: Vec<ComparisonRow> = schedules.iter().map(ComparisonRow::from_schedule).collect();
        let mut comparison = Self {
            rows,
            summary: ComparisonSummary::default(),
        };
        comparison.summary = ComparisonSummary {
            best_objective: comparison.best_by(ComparisonMetric::Objective).map(|r| r.strategy),
            fastest: comparison.best_by(ComparisonMetric::SolveTime).map(|r| r.strategy),
            best_coverage: comparison.best_by(ComparisonMetric::Coverage).map(|r| r.strategy),
            succeeded: comparison.rows.iter().filter(|r| r.succeeded()).count(),
            infeasible: comparison
                .rows
                .iter()
                .filter(|r| r.status == SolveStatus::Infeasible)
                .count(),
            failed: comparison.rows.iter().filter(|r| r.failed()).count(),
        };
        comparison
    }

    /// Best successful row under `metric`. Ties keep the earlier row.
    pub fn best_by(&self, metric: ComparisonMetric) -> Option<&ComparisonRow> {
        let mut best: Option<&ComparisonRow> = None;
        for row in self.rows.iter().filter(|r| r.succeeded()) {
            let better = match best {
                None => true,
                Some(b) => match metric {
                    ComparisonMetric::Objective => {
                        row.objective.unwrap_or(f64::NEG_INFINITY)
                            > b.objective.unwrap_or(f64::NEG_INFINITY)
                    }
                    ComparisonMetric::Coverage => {
                        row.coverage_ratio.unwrap_or(0.0) > b.coverage_ratio.unwrap_or(0.0)
                    }
                    ComparisonMetric::SolveTime => row.solve_duration < b.solve_duration,
                },
            };
            if better {
                best = Some(row);
            }
        }
        best
    }

    /// Row for a strategy.
    pub fn row(&self, strategy: StrategyKind) -> Option<&ComparisonRow> {
        self.rows.iter().find(|r| r.strategy == strategy)
    }
}
