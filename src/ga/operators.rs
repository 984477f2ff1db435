//! Crossover and mutation for the direct encoding.
//!
//! Selection, elitism and the crossover/mutation rates are applied by the
//! GA runner; these operators only reshape genes.
//!
//! # Usage
//!
//! ```
//! use u_assign::config::{CrossoverKind, GaOptions};
//! use u_assign::ga::operators::GeneticOperators;
//!
//! let ops = GeneticOperators::from_options(&GaOptions::default());
//! assert_eq!(ops.crossover, CrossoverKind::Uniform);
//! ```

use rand::Rng;

use super::chromosome::AssignmentChromosome;
use crate::config::{CrossoverKind, GaOptions};
use crate::problem::AssignmentProblem;

/// Runtime-selected genetic operators.
#[derive(Debug, Clone, PartialEq)]
pub struct GeneticOperators {
    pub crossover: CrossoverKind,
    /// Share of mutations that unassign the gene.
    pub unassign_rate: f64,
}

impl GeneticOperators {
    pub fn from_options(options: &GaOptions) -> Self {
        Self {
            crossover: options.crossover,
            unassign_rate: options.unassign_rate,
        }
    }

    /// Recombines two parents into two children.
    ///
    /// `task_order` is the task priority order used by
    /// [`CrossoverKind::TaskOrdered`].
    pub fn crossover<R: Rng>(
        &self,
        p1: &AssignmentChromosome,
        p2: &AssignmentChromosome,
        task_order: &[usize],
        rng: &mut R,
    ) -> (AssignmentChromosome, AssignmentChromosome) {
        let mut c1 = p1.genes.clone();
        let mut c2 = p2.genes.clone();
        match self.crossover {
            CrossoverKind::Uniform => {
                for j in 0..c1.len() {
                    if rng.random_bool(0.5) {
                        std::mem::swap(&mut c1[j], &mut c2[j]);
                    }
                }
            }
            CrossoverKind::TaskOrdered => {
                if !task_order.is_empty() {
                    let a = rng.random_range(0..task_order.len());
                    let b = rng.random_range(a..task_order.len()) + 1;
                    for &j in &task_order[a..b] {
                        std::mem::swap(&mut c1[j], &mut c2[j]);
                    }
                }
            }
        }
        (
            AssignmentChromosome::from_decision(c1),
            AssignmentChromosome::from_decision(c2),
        )
    }

    /// Reassigns one random gene to a random eligible operator, or
    /// unassigns it with probability `unassign_rate`.
    pub fn mutate<R: Rng>(
        &self,
        chromosome: &mut AssignmentChromosome,
        problem: &AssignmentProblem,
        rng: &mut R,
    ) {
        if chromosome.genes.is_empty() {
            return;
        }
        let j = rng.random_range(0..chromosome.genes.len());
        let eligible = problem.eligible(j);
        chromosome.genes[j] = if eligible.is_empty() || rng.random::<f64>() < self.unassign_rate {
            None
        } else {
            Some(eligible[rng.random_range(0..eligible.len())])
        };
    }
}
