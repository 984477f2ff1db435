//! Assignment GA problem definition.
//!
//! Implements `u_metaheur::ga::GaProblem` for the direct task → operator
//! encoding. Individuals are scored on their repaired decision, so every
//! individual decodes to a feasible assignment while the raw genes may
//! still overallocate operators.

use std::sync::atomic::{AtomicBool, Ordering};

use rand::Rng;
use u_metaheur::ga::GaProblem;

use super::chromosome::AssignmentChromosome;
use super::operators::GeneticOperators;
use super::repair::DropOrder;
use crate::config::GaOptions;
use crate::problem::{AssignmentProblem, Decision};
use crate::scheduler::GreedyStrategy;

/// GA problem over one indexed assignment problem.
///
/// The first individual created is the greedy decision; the rest are
/// randomized greedy constructions.
///
/// # Example
/// ```no_run
/// use u_assign::config::{GaOptions, SolverConfig};
/// use u_assign::ga::AssignmentGaProblem;
/// use u_assign::models::{Instance, Operator, Task};
/// use u_assign::problem::AssignmentProblem;
/// use u_metaheur::ga::{GaConfig, GaRunner};
///
/// let instance = Instance::new()
///     .with_operator(Operator::new("A").with_window(0, 480))
///     .with_task(Task::new("T1", 120));
/// let problem = AssignmentProblem::new(&instance, &SolverConfig::default());
/// let ga = AssignmentGaProblem::new(&problem, &GaOptions::default());
/// let result = GaRunner::run(&ga, &GaConfig::default().with_seed(1).with_parallel(false));
/// let decision = ga.decode(&result.best);
/// ```
pub struct AssignmentGaProblem<'a> {
    problem: &'a AssignmentProblem,
    operators: GeneticOperators,
    task_order: Vec<usize>,
    drop_order: DropOrder,
    greedy: Decision,
    greedy_issued: AtomicBool,
    penalty_weight: f64,
}

impl<'a> AssignmentGaProblem<'a> {
    pub fn new(problem: &'a AssignmentProblem, options: &GaOptions) -> Self {
        let greedy = GreedyStrategy::new();
        let task_order = greedy.task_order(problem);
        Self {
            problem,
            operators: GeneticOperators::from_options(options),
            drop_order: DropOrder::from_order(&task_order),
            greedy: greedy.decide(problem),
            task_order,
            greedy_issued: AtomicBool::new(false),
            penalty_weight: options.overallocation_penalty,
        }
    }

    /// Repaired decision of an individual.
    pub fn decode(&self, individual: &AssignmentChromosome) -> Decision {
        individual.decode(self.problem, &self.drop_order)
    }

    /// Penalized shared objective (higher is better).
    pub fn score(&self, individual: &AssignmentChromosome) -> f64 {
        individual.score(self.problem, &self.drop_order, self.penalty_weight)
    }

    /// The greedy individual, evaluated.
    pub fn greedy_individual(&self) -> AssignmentChromosome {
        let mut c = AssignmentChromosome::from_decision(self.greedy.clone());
        c.fitness = -self.score(&c);
        c
    }
}

impl GaProblem for AssignmentGaProblem<'_> {
    type Individual = AssignmentChromosome;

    fn create_individual<R: Rng>(&self, rng: &mut R) -> AssignmentChromosome {
        if !self.greedy_issued.swap(true, Ordering::Relaxed) {
            return AssignmentChromosome::from_decision(self.greedy.clone());
        }
        AssignmentChromosome::randomized_greedy(self.problem, rng)
    }

    fn evaluate(&self, individual: &AssignmentChromosome) -> f64 {
        -self.score(individual)
    }

    fn crossover<R: Rng>(
        &self,
        parent1: &AssignmentChromosome,
        parent2: &AssignmentChromosome,
        rng: &mut R,
    ) -> Vec<AssignmentChromosome> {
        let (c1, c2) = self
            .operators
            .crossover(parent1, parent2, &self.task_order, rng);
        vec![c1, c2]
    }

    fn mutate<R: Rng>(&self, individual: &mut AssignmentChromosome, rng: &mut R) {
        self.operators.mutate(individual, self.problem, rng);
    }

    fn on_generation(&self, generation: usize, best_fitness: f64) {
        tracing::debug!("GA: generation {} best {:.6}", generation, -best_fitness);
    }
}
