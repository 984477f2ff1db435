//! Evolutionary assignment search.
//!
//! A genetic algorithm over the direct task → operator encoding, run by
//! `u_metaheur::ga::GaRunner`. Offspring may overallocate operators; each
//! individual is scored on its [`repair`]ed decision minus a penalty for the
//! overallocation, so every individual (and the returned schedule) decodes
//! to a feasible assignment.
//!
//! # Loop
//! 1. Initial population: the greedy decision plus randomized greedy
//!    constructions.
//! 2. Tournament selection, crossover (uniform or task-ordered), mutation of
//!    one gene.
//! 3. `elite_count` best individuals carried over unchanged.
//!
//! Stops at `max_generations`, after `stall_generations` without
//! improvement, or when the budget runs out or its stop flag is raised.
//! All randomness comes from one generator seeded with `random_seed`.
//!
//! # Submodules
//!
//! - [`operators`]: crossover and mutation
//! - [`repair`]: the capacity repair function
//!
//! # Reference
//! - Chu & Beasley (1997), "A genetic algorithm for the generalised
//!   assignment problem"
//! - Eiben & Smith (2015), "Introduction to Evolutionary Computing", Ch. 5

mod chromosome;
pub mod operators;
mod problem;
pub mod repair;

pub use chromosome::AssignmentChromosome;
pub use operators::GeneticOperators;
pub use problem::AssignmentGaProblem;
pub use repair::{repair, DropOrder};

use u_metaheur::ga::{GaConfig, GaRunner, Selection};

use crate::config::{GaOptions, SolverConfig};
use crate::error::StrategyError;
use crate::models::{Schedule, SolveStatus};
use crate::problem::{AssignmentProblem, Decision};
use crate::strategy::{Budget, Strategy, StrategyKind};

/// Genetic algorithm strategy.
#[derive(Debug, Clone, Default)]
pub struct GaStrategy;

impl GaStrategy {
    pub fn new() -> Self {
        Self
    }
}

/// Outcome of one evolutionary run.
#[derive(Debug, Clone)]
pub struct EvolutionResult {
    /// Repaired decision of the best individual.
    pub best: Decision,
    /// Penalized score of the best individual.
    pub score: f64,
    pub generations: usize,
    /// Stopped because the time budget ran out or a stop was requested.
    pub interrupted: bool,
}

/// Runner configuration for `options`.
///
/// `elite_count` is turned into the runner's elite ratio so that exactly
/// that many individuals survive.
pub fn runner_config(options: &GaOptions, seed: u64, time_limit_ms: u64) -> GaConfig {
    let pop = options.population_size.max(2);
    let elite_ratio = (options.elite_count.min(pop - 1) as f64 + 0.5) / pop as f64;
    GaConfig::default()
        .with_population_size(pop)
        .with_max_generations(options.max_generations)
        .with_selection(Selection::Tournament(options.tournament_size.max(1)))
        .with_elite_ratio(elite_ratio)
        .with_crossover_rate(options.crossover_rate)
        .with_mutation_rate(options.mutation_rate)
        .with_stagnation_limit(options.stall_generations)
        .with_parallel(false)
        .with_seed(seed)
        .with_time_limit_ms(time_limit_ms)
}

/// Runs the evolutionary loop on `problem`.
///
/// Reproducible for a fixed `seed` as long as the budget does not run out.
pub fn evolve(
    problem: &AssignmentProblem,
    options: &GaOptions,
    seed: u64,
    budget: &Budget,
) -> Result<EvolutionResult, StrategyError> {
    let ga = AssignmentGaProblem::new(problem, options);

    let time_limit_ms = budget.remaining().as_millis() as u64;
    if time_limit_ms == 0 || budget.stop_requested() {
        let greedy = ga.greedy_individual();
        return Ok(EvolutionResult {
            best: ga.decode(&greedy),
            score: -greedy.fitness,
            generations: 0,
            interrupted: true,
        });
    }

    let config = runner_config(options, seed, time_limit_ms);
    config
        .validate()
        .map_err(|e| StrategyError::internal(format!("invalid GA configuration: {e}")))?;

    let result = GaRunner::run_with_cancel(&ga, &config, Some(budget.stop_flag()));
    if result.stagnated {
        tracing::debug!("GA: stalled after {} generations", result.generations);
    }
    Ok(EvolutionResult {
        best: ga.decode(&result.best),
        score: -result.best_fitness,
        generations: result.generations,
        interrupted: result.timed_out || result.cancelled,
    })
}

impl Strategy for GaStrategy {
    fn kind(&self) -> StrategyKind {
        StrategyKind::Evolutionary
    }

    #[tracing::instrument(level = "debug", name = "GA", skip_all)]
    fn solve(
        &self,
        problem: &AssignmentProblem,
        config: &SolverConfig,
        budget: &Budget,
    ) -> Result<Schedule, StrategyError> {
        if let Some(s) = problem.trivial_schedule(self.kind(), budget)? {
            return Ok(s);
        }

        let result = evolve(problem, &config.ga, config.random_seed, budget)?;
        if result.interrupted {
            tracing::warn!(
                "GA: time limit reached after {} generations",
                result.generations
            );
        }

        let mut schedule =
            problem.build_schedule(self.kind(), &result.best, SolveStatus::Feasible, budget)?;
        schedule.stats.generations = Some(result.generations);
        if result.interrupted {
            schedule = schedule.with_message("time limit reached before the generation budget");
        }
        tracing::debug!(
            "GA: {} generations, objective {:.6}",
            result.generations,
            schedule.objective
        );
        Ok(schedule)
    }
}
