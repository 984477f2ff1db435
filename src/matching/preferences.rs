//! Preference lists for deferred acceptance.
//!
//! Both sides rank only feasible partners, and every list is a strict
//! total order (ties end at the partner ID).

use std::cmp::Ordering;

use crate::config::OperatorRanking;
use crate::dispatching::{self, DispatchContext};
use crate::problem::AssignmentProblem;

/// Static preferences of tasks over operators and operators over tasks.
#[derive(Debug, Clone)]
pub struct Preferences {
    /// Per task: feasible operators, most preferred first.
    task_lists: Vec<Vec<usize>>,
    /// `task_rank[j][i]`: position of operator `i` in task `j`'s list.
    task_rank: Vec<Vec<Option<usize>>>,
    /// `operator_rank[i][j]`: position of task `j` in operator `i`'s list.
    operator_rank: Vec<Vec<Option<usize>>>,
}

impl Preferences {
    /// Derives preferences from the problem.
    ///
    /// Operators rank tasks by priority, then deadline, then ID. Tasks rank
    /// operators by `ranking`, where "skill match" prefers operators with
    /// the required skills and the fewest skills beyond them, and
    /// "capacity" prefers more available minutes.
    pub fn new(problem: &AssignmentProblem, ranking: OperatorRanking) -> Self {
        let n = problem.num_tasks();
        let m = problem.num_operators();

        let task_lists: Vec<Vec<usize>> = (0..n)
            .map(|j| {
                let mut ops = problem.eligible(j).to_vec();
                ops.sort_by(|&a, &b| compare_operators(problem, j, a, b, ranking));
                ops
            })
            .collect();
        let mut task_rank = vec![vec![None; m]; n];
        for (j, list) in task_lists.iter().enumerate() {
            for (pos, &i) in list.iter().enumerate() {
                task_rank[j][i] = Some(pos);
            }
        }

        let ctx = DispatchContext::new(problem.instance().epoch);
        let engine = dispatching::operator_preference();
        let tasks = &problem.instance().tasks;
        let mut operator_rank = vec![vec![None; n]; m];
        for (i, ranks) in operator_rank.iter_mut().enumerate() {
            let acceptable: Vec<usize> =
                (0..n).filter(|&j| problem.is_feasible_pair(j, i)).collect();
            let ranked = engine.sort_subset(tasks, &acceptable, &ctx);
            for (pos, j) in ranked.into_iter().enumerate() {
                ranks[j] = Some(pos);
            }
        }

        Self {
            task_lists,
            task_rank,
            operator_rank,
        }
    }

    /// Task `j`'s operators, most preferred first.
    pub fn task_list(&self, j: usize) -> &[usize] {
        &self.task_lists[j]
    }

    /// Position of operator `i` in task `j`'s list (`None` = unacceptable).
    pub fn task_rank(&self, j: usize, i: usize) -> Option<usize> {
        self.task_rank[j][i]
    }

    /// Position of task `j` in operator `i`'s list (`None` = unacceptable).
    pub fn operator_rank(&self, i: usize, j: usize) -> Option<usize> {
        self.operator_rank[i][j]
    }

    /// Whether task `j` prefers operator `i` to its current outcome.
    pub fn task_prefers(&self, j: usize, i: usize, current: Option<usize>) -> bool {
        match (self.task_rank(j, i), current) {
            (None, _) => false,
            (Some(_), None) => true,
            // An unranked current partner is worse than any ranked one.
            (Some(r), Some(c)) => self.task_rank(j, c).map_or(true, |cr| r < cr),
        }
    }
}

fn compare_operators(
    problem: &AssignmentProblem,
    j: usize,
    a: usize,
    b: usize,
    ranking: OperatorRanking,
) -> Ordering {
    let skill = || {
        problem
            .skill_match(j, b)
            .cmp(&problem.skill_match(j, a))
            .then_with(|| problem.surplus_skills(j, a).cmp(&problem.surplus_skills(j, b)))
    };
    let capacity = || problem.available(b).cmp(&problem.available(a));
    let primary = match ranking {
        OperatorRanking::SkillMatchThenCapacity => skill().then_with(capacity),
        OperatorRanking::CapacityThenSkillMatch => capacity().then_with(skill),
    };
    primary.then_with(|| problem.operator(a).id.cmp(&problem.operator(b).id))
}
