//! Capacity repair.
//!
//! Turns any decision into a feasible one. Genes naming an operator the
//! task is not eligible for are cleared; then, for every overallocated
//! operator, its tasks are dropped in reverse assignment order (lowest
//! priority first, then latest deadline, then largest effort) until its
//! load fits.

use crate::dispatching::{self, DispatchContext};
use crate::problem::{AssignmentProblem, Decision};

/// Precomputed drop order for [`repair`].
#[derive(Debug, Clone)]
pub struct DropOrder {
    /// `rank[j]`: position of task `j` in assignment order.
    rank: Vec<usize>,
}

impl DropOrder {
    pub fn new(problem: &AssignmentProblem) -> Self {
        let ctx = DispatchContext::new(problem.instance().epoch);
        let order = dispatching::assignment_order().sort_indices(&problem.instance().tasks, &ctx);
        Self::from_order(&order)
    }

    /// From a task order, most important first.
    pub fn from_order(order: &[usize]) -> Self {
        let mut rank = vec![0; order.len()];
        for (pos, &j) in order.iter().enumerate() {
            rank[j] = pos;
        }
        Self { rank }
    }
}

/// Returns a feasible copy of `genes`.
///
/// Deterministic and side-effect free; an already feasible decision is
/// returned unchanged.
pub fn repair(problem: &AssignmentProblem, drop_order: &DropOrder, genes: &[Option<usize>]) -> Decision {
    let mut repaired: Decision = genes
        .iter()
        .enumerate()
        .map(|(j, g)| g.filter(|&i| i < problem.num_operators() && problem.is_feasible_pair(j, i)))
        .collect();

    let mut loads = problem.loads(&repaired);
    for i in 0..problem.num_operators() {
        if loads[i] <= problem.available(i) {
            continue;
        }
        let mut mine: Vec<usize> = (0..repaired.len())
            .filter(|&j| repaired[j] == Some(i))
            .collect();
        // Least important first.
        mine.sort_by_key(|&j| std::cmp::Reverse(drop_order.rank[j]));
        for j in mine {
            if loads[i] <= problem.available(i) {
                break;
            }
            repaired[j] = None;
            loads[i] -= problem.effort(j);
        }
    }
    repaired
}
