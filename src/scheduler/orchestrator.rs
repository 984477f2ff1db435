//! Multi-strategy orchestration.
//!
//! Validates the instance once, indexes it once, and runs every selected
//! strategy on its own worker thread against the shared read-only problem.
//!
//! # Failure Isolation
//! - `Err` from a strategy or a panic inside it becomes a
//!   `StrategyFailed` record with the error message.
//! - A strategy that has not reported by `time_limit + grace` gets its
//!   stop flag raised and one more grace period to return its incumbent;
//!   after that it is abandoned and recorded as
//!   `NoFeasibleSolutionWithinBudget`.
//!
//! Other strategies are unaffected in every case. Structural errors in the
//! instance or configuration abort before any strategy starts.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::mpsc;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};

use super::comparison::Comparison;
use crate::config::SolverConfig;
use crate::error::{AssignError, Result, StrategyError};
use crate::models::{Instance, Schedule, SolveStatus};
use crate::problem::AssignmentProblem;
use crate::strategy::{Budget, Strategy, StrategyKind};
use crate::validation::validate_instance;

const DEFAULT_GRACE: Duration = Duration::from_secs(1);

type SolveOutcome = thread::Result<std::result::Result<Schedule, StrategyError>>;

/// Result of an orchestrated run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    /// One schedule (or failure record) per requested strategy, in request
    /// order.
    pub schedules: Vec<Schedule>,
    pub comparison: Comparison,
}

impl RunReport {
    /// Schedule produced by a strategy.
    pub fn schedule(&self, strategy: StrategyKind) -> Option<&Schedule> {
        self.schedules.iter().find(|s| s.strategy == strategy)
    }
}

/// Runs several strategies on one instance and compares them.
///
/// # Example
///
/// ```
/// use std::time::Duration;
/// use u_assign::models::{Instance, Operator, Task};
/// use u_assign::scheduler::Orchestrator;
/// use u_assign::{SolverConfig, StrategyKind};
///
/// let instance = Instance::new()
///     .with_operator(Operator::new("A").with_window(0, 480))
///     .with_task(Task::new("T1", 120));
/// let config = SolverConfig::default().with_time_limit(Duration::from_secs(5));
/// let report = Orchestrator::new(config)
///     .with_strategies([StrategyKind::Greedy, StrategyKind::StableMatching])
///     .run(&instance)
///     .unwrap();
/// assert_eq!(report.schedules.len(), 2);
/// assert_eq!(report.comparison.summary.succeeded, 2);
/// ```
#[derive(Clone)]
pub struct Orchestrator {
    config: SolverConfig,
    strategies: Vec<Arc<dyn Strategy>>,
    grace: Duration,
}

impl std::fmt::Debug for Orchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Orchestrator")
            .field("config", &self.config)
            .field(
                "strategies",
                &self.strategies.iter().map(|s| s.kind()).collect::<Vec<_>>(),
            )
            .field("grace", &self.grace)
            .finish()
    }
}

impl Orchestrator {
    /// Creates an orchestrator with no strategies selected.
    pub fn new(config: SolverConfig) -> Self {
        Self {
            config,
            strategies: Vec::new(),
            grace: DEFAULT_GRACE,
        }
    }

    /// Selects built-in strategies.
    pub fn with_strategies<I: IntoIterator<Item = StrategyKind>>(mut self, kinds: I) -> Self {
        self.strategies
            .extend(kinds.into_iter().map(|k| Arc::<dyn Strategy>::from(k.build())));
        self
    }

    /// Selects every built-in strategy.
    pub fn with_all_strategies(self) -> Self {
        self.with_strategies(StrategyKind::ALL)
    }

    /// Adds a strategy implementation.
    pub fn with_strategy<S: Strategy + 'static>(mut self, strategy: S) -> Self {
        self.strategies.push(Arc::new(strategy));
        self
    }

    /// Sets the extra wait beyond the time limit before stopping a strategy.
    pub fn with_grace(mut self, grace: Duration) -> Self {
        self.grace = grace;
        self
    }

    pub fn config(&self) -> &SolverConfig {
        &self.config
    }

    /// Validates the instance and runs all selected strategies.
    #[tracing::instrument(level = "debug", name = "Orchestrator", skip_all)]
    pub fn run(&self, instance: &Instance) -> Result<RunReport> {
        if self.strategies.is_empty() {
            return Err(AssignError::NoStrategies);
        }
        self.config.validate()?;
        validate_instance(instance).map_err(AssignError::InvalidInstance)?;

        let problem = Arc::new(AssignmentProblem::new(instance, &self.config));
        let config = Arc::new(self.config.clone());
        tracing::info!(
            "running {} strategies on {} tasks / {} operators (parallel={})",
            self.strategies.len(),
            problem.num_tasks(),
            problem.num_operators(),
            self.config.parallel
        );

        let jobs: Vec<(usize, Arc<dyn Strategy>)> =
            self.strategies.iter().cloned().enumerate().collect();
        let mut results: Vec<(usize, Schedule)> = if self.config.parallel {
            self.run_batch(&problem, &config, &jobs)
        } else {
            jobs.iter()
                .flat_map(|job| self.run_batch(&problem, &config, std::slice::from_ref(job)))
                .collect()
        };
        results.sort_by_key(|(slot, _)| *slot);
        let schedules: Vec<Schedule> = results.into_iter().map(|(_, s)| s).collect();

        let comparison = Comparison::from_schedules(&schedules);
        tracing::info!(
            "run finished: {} succeeded, {} infeasible, {} failed, best objective {:?}",
            comparison.summary.succeeded,
            comparison.summary.infeasible,
            comparison.summary.failed,
            comparison.summary.best_objective
        );
        Ok(RunReport {
            schedules,
            comparison,
        })
    }

    /// Runs `jobs` concurrently under one watchdog.
    fn run_batch(
        &self,
        problem: &Arc<AssignmentProblem>,
        config: &Arc<SolverConfig>,
        jobs: &[(usize, Arc<dyn Strategy>)],
    ) -> Vec<(usize, Schedule)> {
        let limit = config.time_limit();
        let (tx, rx) = mpsc::channel::<(usize, SolveOutcome)>();
        let mut results = Vec::with_capacity(jobs.len());
        let mut pending: Vec<(usize, StrategyKind, Budget)> = Vec::with_capacity(jobs.len());

        for (slot, strategy) in jobs {
            let kind = strategy.kind();
            let budget = Budget::new(limit);
            let worker_budget = budget.clone();
            let worker_problem = Arc::clone(problem);
            let worker_config = Arc::clone(config);
            let worker_strategy = Arc::clone(strategy);
            let tx = tx.clone();
            let slot = *slot;
            let spawned = thread::Builder::new()
                .name(format!("u-assign-{}", kind.name()))
                .spawn(move || {
                    let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
                        worker_strategy.solve(&worker_problem, &worker_config, &worker_budget)
                    }));
                    // Receiver is gone if the watchdog abandoned this run.
                    let _ = tx.send((slot, outcome));
                });
            match spawned {
                Ok(_) => pending.push((slot, kind, budget)),
                Err(e) => {
                    tracing::warn!("{}: cannot spawn worker: {}", kind, e);
                    results.push((
                        slot,
                        failure(kind, problem.instance(), format!("cannot spawn worker: {e}")),
                    ));
                }
            }
        }
        drop(tx);

        let mut deadline = Instant::now() + limit + self.grace;
        let mut stop_raised = false;
        while !pending.is_empty() {
            let now = Instant::now();
            if now >= deadline {
                if stop_raised {
                    break;
                }
                for (_, kind, budget) in &pending {
                    tracing::warn!("{}: over time, requesting stop", kind);
                    budget.request_stop();
                }
                stop_raised = true;
                deadline = now + self.grace;
                continue;
            }
            match rx.recv_timeout(deadline - now) {
                Ok((slot, outcome)) => {
                    let Some(pos) = pending.iter().position(|(s, _, _)| *s == slot) else {
                        continue;
                    };
                    let (_, kind, budget) = pending.swap_remove(pos);
                    results.push((slot, record(kind, outcome, problem.instance(), &budget)));
                }
                Err(mpsc::RecvTimeoutError::Timeout) => {}
                Err(mpsc::RecvTimeoutError::Disconnected) => break,
            }
        }

        for (slot, kind, budget) in pending {
            tracing::warn!("{}: abandoned after {:?}", kind, budget.elapsed());
            let mut s = Schedule::all_unassigned(
                kind,
                SolveStatus::NoFeasibleSolutionWithinBudget,
                problem.instance(),
            )
            .with_message(format!("no result within {:?}", budget.elapsed()));
            s.solve_duration = budget.elapsed();
            results.push((slot, s));
        }
        results
    }
}

fn record(kind: StrategyKind, outcome: SolveOutcome, instance: &Instance, budget: &Budget) -> Schedule {
    match outcome {
        Ok(Ok(schedule)) => {
            tracing::debug!(
                "{}: {} in {:?}, objective {:.6}",
                kind,
                schedule.status,
                schedule.solve_duration,
                schedule.objective
            );
            schedule
        }
        Ok(Err(e)) => {
            tracing::warn!("{}: failed: {}", kind, e);
            let mut s = failure(kind, instance, e.to_string());
            s.solve_duration = budget.elapsed();
            s
        }
        Err(payload) => {
            let msg = panic_message(payload.as_ref());
            tracing::warn!("{}: panicked: {}", kind, msg);
            let mut s = failure(kind, instance, format!("panicked: {msg}"));
            s.solve_duration = budget.elapsed();
            s
        }
    }
}

fn failure(kind: StrategyKind, instance: &Instance, message: String) -> Schedule {
    Schedule::all_unassigned(kind, SolveStatus::StrategyFailed, instance).with_message(message)
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
