//! Solver configuration.
//!
//! One [`SolverConfig`] is shared by every strategy of a run. Every field
//! has a default, so partial JSON documents deserialize.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::error::AssignError;

/// Relative weights of the shared objective terms.
///
/// The objective rewards coverage and priority and penalizes idle time,
/// utilization spread (fairness), and peak utilization (makespan proxy).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ObjectiveWeights {
    /// Weight of the assigned-task fraction.
    pub coverage: f64,
    /// Weight of the assigned priority-weight fraction.
    pub priority: f64,
    /// Weight of the unused-capacity fraction (penalty).
    pub idle: f64,
    /// Weight of `max utilization - min utilization` (penalty).
    pub fairness: f64,
    /// Weight of the peak operator utilization (penalty).
    pub makespan: f64,
}

impl Default for ObjectiveWeights {
    fn default() -> Self {
        Self {
            coverage: 1.0,
            priority: 1.0,
            idle: 0.1,
            fairness: 0.1,
            makespan: 0.0,
        }
    }
}

impl ObjectiveWeights {
    /// Sets the coverage weight.
    pub fn with_coverage(mut self, w: f64) -> Self {
        self.coverage = w;
        self
    }

    /// Sets the priority weight.
    pub fn with_priority(mut self, w: f64) -> Self {
        self.priority = w;
        self
    }

    /// Sets the idle-time penalty weight.
    pub fn with_idle(mut self, w: f64) -> Self {
        self.idle = w;
        self
    }

    /// Sets the fairness penalty weight.
    pub fn with_fairness(mut self, w: f64) -> Self {
        self.fairness = w;
        self
    }

    /// Sets the makespan penalty weight.
    pub fn with_makespan(mut self, w: f64) -> Self {
        self.makespan = w;
        self
    }

    fn all(&self) -> [f64; 5] {
        [
            self.coverage,
            self.priority,
            self.idle,
            self.fairness,
            self.makespan,
        ]
    }
}

/// Crossover operator for the evolutionary strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CrossoverKind {
    /// Each gene taken from either parent with probability 0.5.
    Uniform,
    /// Tasks in priority order; a random contiguous block comes from the
    /// second parent.
    TaskOrdered,
}

/// Evolutionary strategy parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GaOptions {
    pub population_size: usize,
    pub max_generations: usize,
    /// Generations without best-fitness improvement before stopping.
    pub stall_generations: usize,
    pub tournament_size: usize,
    pub crossover_rate: f64,
    /// Probability that an offspring is mutated (one gene reassigned).
    pub mutation_rate: f64,
    /// Share of mutations that unassign the gene instead of re-assigning it.
    pub unassign_rate: f64,
    /// Individuals copied unchanged into the next generation.
    pub elite_count: usize,
    /// Fitness penalty per overallocated minute, relative to total capacity.
    pub overallocation_penalty: f64,
    pub crossover: CrossoverKind,
}

impl Default for GaOptions {
    fn default() -> Self {
        Self {
            population_size: 40,
            max_generations: 200,
            stall_generations: 30,
            tournament_size: 3,
            crossover_rate: 0.9,
            mutation_rate: 0.3,
            unassign_rate: 0.1,
            elite_count: 2,
            overallocation_penalty: 10.0,
            crossover: CrossoverKind::Uniform,
        }
    }
}

impl GaOptions {
    /// Sets the population size.
    pub fn with_population_size(mut self, n: usize) -> Self {
        self.population_size = n;
        self
    }

    /// Sets the generation budget.
    pub fn with_max_generations(mut self, n: usize) -> Self {
        self.max_generations = n;
        self
    }

    /// Sets the stall window.
    pub fn with_stall_generations(mut self, n: usize) -> Self {
        self.stall_generations = n;
        self
    }

    /// Sets the crossover operator.
    pub fn with_crossover(mut self, kind: CrossoverKind) -> Self {
        self.crossover = kind;
        self
    }

    /// Sets the offspring mutation probability.
    pub fn with_mutation_rate(mut self, rate: f64) -> Self {
        self.mutation_rate = rate;
        self
    }
}

/// Variable-selection order for constraint search.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Branching {
    /// Smallest remaining domain first; ties by task order.
    MostConstrained,
    /// Input task order.
    InputOrder,
}

/// Constraint programming parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CpOptions {
    pub branching: Branching,
    /// Optional cardinality limit on tasks per operator.
    pub max_tasks_per_operator: Option<usize>,
}

impl Default for CpOptions {
    fn default() -> Self {
        Self {
            branching: Branching::MostConstrained,
            max_tasks_per_operator: None,
        }
    }
}

/// How tasks rank the operators they can be assigned to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OperatorRanking {
    /// Skill match first, then remaining capacity.
    SkillMatchThenCapacity,
    /// Remaining capacity first, then skill match.
    CapacityThenSkillMatch,
}

/// Stable matching parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MatchingOptions {
    pub operator_ranking: OperatorRanking,
    /// Upper bound on proposal plus stabilization rounds.
    pub max_rounds: usize,
}

impl Default for MatchingOptions {
    fn default() -> Self {
        Self {
            operator_ranking: OperatorRanking::SkillMatchThenCapacity,
            max_rounds: 10_000,
        }
    }
}

/// Configuration shared by all strategies of a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SolverConfig {
    /// Wall-clock budget per strategy (seconds).
    pub time_limit_secs: f64,
    pub objective_weights: ObjectiveWeights,
    /// Seed for every stochastic component.
    pub random_seed: u64,
    /// Exclude pairs whose earliest completion misses the task deadline.
    pub enforce_deadlines: bool,
    /// Run strategies on parallel workers.
    pub parallel: bool,
    pub ga: GaOptions,
    pub cp: CpOptions,
    pub matching: MatchingOptions,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            time_limit_secs: 10.0,
            objective_weights: ObjectiveWeights::default(),
            random_seed: 42,
            enforce_deadlines: false,
            parallel: true,
            ga: GaOptions::default(),
            cp: CpOptions::default(),
            matching: MatchingOptions::default(),
        }
    }
}

impl SolverConfig {
    /// Creates the default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the time limit.
    pub fn with_time_limit(mut self, limit: Duration) -> Self {
        self.time_limit_secs = limit.as_secs_f64();
        self
    }

    /// Sets the objective weights.
    pub fn with_weights(mut self, weights: ObjectiveWeights) -> Self {
        self.objective_weights = weights;
        self
    }

    /// Sets the random seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.random_seed = seed;
        self
    }

    /// Enables or disables hard deadlines.
    pub fn with_enforce_deadlines(mut self, enforce: bool) -> Self {
        self.enforce_deadlines = enforce;
        self
    }

    /// Enables or disables parallel strategy execution.
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Sets the evolutionary strategy options.
    pub fn with_ga(mut self, ga: GaOptions) -> Self {
        self.ga = ga;
        self
    }

    /// Sets the constraint programming options.
    pub fn with_cp(mut self, cp: CpOptions) -> Self {
        self.cp = cp;
        self
    }

    /// Sets the stable matching options.
    pub fn with_matching(mut self, matching: MatchingOptions) -> Self {
        self.matching = matching;
        self
    }

    /// Time limit as a [`Duration`]. Invalid values map to zero.
    pub fn time_limit(&self) -> Duration {
        Duration::try_from_secs_f64(self.time_limit_secs).unwrap_or(Duration::ZERO)
    }

    /// Rejects values no strategy can work with.
    pub fn validate(&self) -> Result<(), AssignError> {
        if !self.time_limit_secs.is_finite() || self.time_limit_secs < 0.0 {
            return Err(AssignError::config(format!(
                "time_limit_secs must be a non-negative number, got {}",
                self.time_limit_secs
            )));
        }
        if self
            .objective_weights
            .all()
            .iter()
            .any(|w| !w.is_finite() || *w < 0.0)
        {
            return Err(AssignError::config(
                "objective weights must be finite and non-negative",
            ));
        }
        if self.ga.population_size < 2 {
            return Err(AssignError::config("ga.population_size must be at least 2"));
        }
        if self.ga.max_generations == 0 {
            return Err(AssignError::config("ga.max_generations must be at least 1"));
        }
        if self.ga.elite_count >= self.ga.population_size {
            return Err(AssignError::config(
                "ga.elite_count must be smaller than ga.population_size",
            ));
        }
        if self.ga.tournament_size == 0 {
            return Err(AssignError::config("ga.tournament_size must be at least 1"));
        }
        for (name, rate) in [
            ("ga.crossover_rate", self.ga.crossover_rate),
            ("ga.mutation_rate", self.ga.mutation_rate),
            ("ga.unassign_rate", self.ga.unassign_rate),
        ] {
            if !(0.0..=1.0).contains(&rate) {
                return Err(AssignError::config(format!(
                    "{} must lie in [0, 1], got {}",
                    name, rate
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let c = SolverConfig::default();
        assert_eq!(c.time_limit(), Duration::from_secs(10));
        assert_eq!(c.random_seed, 42);
        assert!(c.parallel);
        assert!(!c.enforce_deadlines);
        assert!((c.objective_weights.coverage - 1.0).abs() < 1e-10);
        assert!(c.validate().is_ok());
    }

    #[test]
    fn test_builders() {
        let c = SolverConfig::new()
            .with_time_limit(Duration::from_millis(500))
            .with_seed(7)
            .with_parallel(false)
            .with_weights(ObjectiveWeights::default().with_fairness(0.0).with_makespan(0.5));
        assert_eq!(c.time_limit(), Duration::from_millis(500));
        assert_eq!(c.random_seed, 7);
        assert!((c.objective_weights.makespan - 0.5).abs() < 1e-10);
        assert!(c.objective_weights.fairness.abs() < 1e-10);
    }

    #[test]
    fn test_partial_json() {
        let c: SolverConfig =
            serde_json::from_str(r#"{"random_seed": 3, "ga": {"population_size": 10}}"#).unwrap();
        assert_eq!(c.random_seed, 3);
        assert_eq!(c.ga.population_size, 10);
        assert_eq!(c.ga.max_generations, 200);
        assert_eq!(c.cp.branching, Branching::MostConstrained);
        assert_eq!(c.matching.max_rounds, 10_000);
    }

    #[test]
    fn test_enum_json_names() {
        let c: SolverConfig = serde_json::from_str(
            r#"{"ga": {"crossover": "task_ordered"}, "matching": {"operator_ranking": "capacity_then_skill_match"}}"#,
        )
        .unwrap();
        assert_eq!(c.ga.crossover, CrossoverKind::TaskOrdered);
        assert_eq!(
            c.matching.operator_ranking,
            OperatorRanking::CapacityThenSkillMatch
        );
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut c = SolverConfig::default();
        c.time_limit_secs = -1.0;
        assert!(c.validate().is_err());
        assert_eq!(c.time_limit(), Duration::ZERO);

        let c = SolverConfig::default().with_weights(ObjectiveWeights::default().with_idle(f64::NAN));
        assert!(c.validate().is_err());

        let c = SolverConfig::default().with_ga(GaOptions::default().with_population_size(1));
        assert!(c.validate().is_err());

        let c = SolverConfig::default().with_ga(GaOptions::default().with_mutation_rate(1.5));
        assert!(c.validate().is_err());

        let c = SolverConfig::default().with_ga(GaOptions::default().with_max_generations(0));
        assert!(c.validate().is_err());

        let mut c = SolverConfig::default();
        c.ga.elite_count = c.ga.population_size;
        assert!(c.validate().is_err());
    }
}
