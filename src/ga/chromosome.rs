//! Direct assignment encoding.
//!
//! One gene per task, holding the index of its operator or `None` for
//! "unassigned". Genes only ever hold operators the task is eligible for,
//! so the only constraint an individual can violate is operator capacity.

use rand::prelude::IndexedRandom;
use rand::seq::SliceRandom;
use rand::Rng;
use u_metaheur::ga::Individual;

use super::repair::{repair, DropOrder};
use crate::problem::{AssignmentProblem, Decision};

/// Individual of the evolutionary search.
///
/// `fitness` follows the GA framework convention (lower is better) and
/// holds the negated [`score`](Self::score).
#[derive(Debug, Clone, PartialEq)]
pub struct AssignmentChromosome {
    /// Operator index per task. May overallocate operators.
    pub genes: Decision,
    pub fitness: f64,
}

impl Individual for AssignmentChromosome {
    type Fitness = f64;

    fn fitness(&self) -> f64 {
        self.fitness
    }

    fn set_fitness(&mut self, fitness: f64) {
        self.fitness = fitness;
    }
}

impl AssignmentChromosome {
    /// Wraps a decision; fitness starts at the worst value.
    pub fn from_decision(genes: Decision) -> Self {
        Self {
            genes,
            fitness: f64::INFINITY,
        }
    }

    /// Randomized greedy construction.
    ///
    /// Visits tasks in random order and gives each one to a random eligible
    /// operator that still has room, so the result is always feasible.
    pub fn randomized_greedy<R: Rng>(problem: &AssignmentProblem, rng: &mut R) -> Self {
        let mut order: Vec<usize> = (0..problem.num_tasks()).collect();
        order.shuffle(rng);

        let mut remaining: Vec<i64> = (0..problem.num_operators())
            .map(|i| problem.available(i))
            .collect();
        let mut genes = problem.empty_decision();
        for j in order {
            let effort = problem.effort(j);
            let fitting: Vec<usize> = problem
                .eligible(j)
                .iter()
                .copied()
                .filter(|&i| remaining[i] >= effort)
                .collect();
            if let Some(&i) = fitting.choose(rng) {
                remaining[i] -= effort;
                genes[j] = Some(i);
            }
        }
        Self::from_decision(genes)
    }

    /// Feasible decision this individual stands for.
    pub fn decode(&self, problem: &AssignmentProblem, drop_order: &DropOrder) -> Decision {
        repair(problem, drop_order, &self.genes)
    }

    /// Shared objective of the repaired decision minus an overallocation
    /// penalty on the raw genes.
    ///
    /// The penalty is `weight * overallocated minutes / total capacity`, so
    /// a feasible individual scores exactly its objective and an infeasible
    /// one never scores above its repaired decision.
    pub fn score(&self, problem: &AssignmentProblem, drop_order: &DropOrder, penalty_weight: f64) -> f64 {
        let capacity = problem.instance().total_available_minutes();
        let overallocated = problem.overallocation(&self.genes);
        let penalty = if capacity > 0 {
            penalty_weight * overallocated as f64 / capacity as f64
        } else {
            0.0
        };
        problem.evaluate(&self.decode(problem, drop_order)) - penalty
    }

    /// Number of assigned genes.
    pub fn assigned_count(&self) -> usize {
        self.genes.iter().flatten().count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SolverConfig;
    use crate::models::{Instance, Operator, Task};
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn problem() -> AssignmentProblem {
        let inst = Instance::new()
            .with_operator(Operator::new("A").with_skill("S1").with_window(0, 200))
            .with_operator(Operator::new("B").with_window(0, 100))
            .with_task(Task::new("T1", 100).with_skill("S1"))
            .with_task(Task::new("T2", 100))
            .with_task(Task::new("T3", 100))
            .with_referenced_skills();
        AssignmentProblem::new(&inst, &SolverConfig::default())
    }

    #[test]
    fn test_randomized_greedy_is_feasible() {
        let p = problem();
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        for _ in 0..50 {
            let c = AssignmentChromosome::randomized_greedy(&p, &mut rng);
            assert!(p.is_feasible_decision(&c.genes));
            // Total capacity 300 and total effort 300: at least two fit.
            assert!(c.assigned_count() >= 2);
        }
    }

    #[test]
    fn test_feasible_scores_its_objective() {
        let p = problem();
        let order = DropOrder::new(&p);
        let c = AssignmentChromosome::from_decision(vec![Some(0), Some(1), None]);
        assert_eq!(c.decode(&p, &order), c.genes);
        assert!((c.score(&p, &order, 10.0) - p.evaluate(&c.genes)).abs() < 1e-12);
    }

    #[test]
    fn test_overallocation_is_repaired_and_penalized() {
        let p = problem();
        let order = DropOrder::new(&p);
        let over = AssignmentChromosome::from_decision(vec![Some(0), Some(1), Some(1)]);
        let decoded = over.decode(&p, &order);
        assert!(p.is_feasible_decision(&decoded));
        // 100 overallocated minutes out of 300
        let expected = p.evaluate(&decoded) - 10.0 / 3.0;
        assert!((over.score(&p, &order, 10.0) - expected).abs() < 1e-9);
    }
}
