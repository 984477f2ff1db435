//! Stable matching strategy.
//!
//! Task-proposing deferred acceptance for a capacitated many-to-one market:
//! each operator can hold any set of tasks whose effort fits its available
//! minutes. Tasks propose down their preference lists; an operator keeps
//! the best set it can fit from its held tasks plus the new proposal
//! (greedy in its own preference order) and rejects the rest.
//!
//! With unequal task sizes deferred acceptance alone can leave a blocking
//! pair, so a stabilization sweep follows: while some task and operator
//! both prefer each other, the task moves and the operator drops its least
//! preferred tasks to make room. The sweep is bounded by `max_rounds`;
//! [`SolveStats::stable`](crate::models::SolveStats) records whether a
//! blocking-pair-free matching was reached.
//!
//! The result is not optimized for the weighted objective; its objective
//! value is reported for comparison only.
//!
//! # Reference
//! - Gale & Shapley (1962), "College Admissions and the Stability of
//!   Marriage"
//! - Roth & Sotomayor (1990), "Two-Sided Matching", Ch. 5

mod preferences;

pub use preferences::Preferences;

use std::collections::VecDeque;

use crate::config::SolverConfig;
use crate::error::StrategyError;
use crate::models::{Schedule, SolveStatus};
use crate::problem::{AssignmentProblem, Decision};
use crate::scheduler::GreedyStrategy;
use crate::strategy::{Budget, Strategy, StrategyKind};

const CLOCK_CHECK_INTERVAL: usize = 64;

/// Deferred acceptance strategy.
#[derive(Debug, Clone, Default)]
pub struct MatchingStrategy;

impl MatchingStrategy {
    pub fn new() -> Self {
        Self
    }
}

/// Outcome of [`stable_match`].
#[derive(Debug, Clone)]
pub struct MatchOutcome {
    pub decision: Decision,
    /// Proposals plus stabilization moves.
    pub rounds: usize,
    /// Moves made by the stabilization sweep.
    pub moves: usize,
    /// No blocking pair remains.
    pub stable: bool,
    /// Stopped by the time budget.
    pub interrupted: bool,
}

/// Runs deferred acceptance followed by the stabilization sweep.
///
/// `proposal_order` is the order tasks enter the proposal queue.
pub fn stable_match(
    problem: &AssignmentProblem,
    prefs: &Preferences,
    proposal_order: &[usize],
    max_rounds: usize,
    budget: &Budget,
) -> MatchOutcome {
    let n = problem.num_tasks();
    let m = problem.num_operators();
    let mut next = vec![0usize; n];
    let mut held: Vec<Vec<usize>> = vec![Vec::new(); m];
    let mut queue: VecDeque<usize> = proposal_order.iter().copied().collect();
    let mut rounds = 0usize;
    let mut interrupted = false;

    while let Some(j) = queue.pop_front() {
        if rounds >= max_rounds {
            break;
        }
        if rounds % CLOCK_CHECK_INTERVAL == 0 && budget.is_exhausted() {
            interrupted = true;
            break;
        }
        let Some(&i) = prefs.task_list(j).get(next[j]) else {
            // Every acceptable operator refused: stays unassigned.
            continue;
        };
        next[j] += 1;
        rounds += 1;

        let mut candidates = held[i].clone();
        candidates.push(j);
        candidates.sort_by_key(|&t| prefs.operator_rank(i, t));
        let mut room = problem.available(i);
        let mut kept = Vec::with_capacity(candidates.len());
        for t in candidates {
            if problem.effort(t) <= room {
                room -= problem.effort(t);
                kept.push(t);
            } else {
                queue.push_back(t);
            }
        }
        held[i] = kept;
    }

    let mut decision = problem.empty_decision();
    for (i, tasks) in held.iter().enumerate() {
        for &j in tasks {
            decision[j] = Some(i);
        }
    }
    tracing::debug!("Matching: deferred acceptance took {} proposals", rounds);

    let mut loads = problem.loads(&decision);
    let mut stable = false;
    let mut moves = 0usize;
    while !interrupted {
        let Some((j, i)) = first_blocking_pair(problem, prefs, &decision, &loads) else {
            stable = true;
            break;
        };
        if rounds >= max_rounds {
            tracing::warn!("Matching: round limit reached with blocking pairs left");
            break;
        }
        if budget.is_exhausted() {
            interrupted = true;
            break;
        }
        rounds += 1;
        moves += 1;
        move_task(problem, prefs, &mut decision, &mut loads, j, i);
    }
    if moves > 0 {
        tracing::debug!("Matching: stabilization sweep made {} moves", moves);
    }

    MatchOutcome {
        decision,
        rounds,
        moves,
        stable,
        interrupted,
    }
}

/// All (task, operator) pairs that would both rather be matched together.
///
/// An operator wants task `j` if it fits in the operator's free minutes
/// plus the minutes of tasks it ranks below `j`.
pub fn blocking_pairs(
    problem: &AssignmentProblem,
    prefs: &Preferences,
    decision: &[Option<usize>],
) -> Vec<(usize, usize)> {
    let loads = problem.loads(decision);
    let mut pairs = Vec::new();
    for (j, current) in decision.iter().enumerate() {
        for &i in prefs.task_list(j) {
            if Some(i) == *current {
                break;
            }
            if would_accept(problem, prefs, decision, &loads, i, j) {
                pairs.push((j, i));
            }
        }
    }
    pairs
}

fn first_blocking_pair(
    problem: &AssignmentProblem,
    prefs: &Preferences,
    decision: &[Option<usize>],
    loads: &[i64],
) -> Option<(usize, usize)> {
    decision.iter().enumerate().find_map(|(j, current)| {
        prefs
            .task_list(j)
            .iter()
            .take_while(|&&i| Some(i) != *current)
            .find(|&&i| would_accept(problem, prefs, decision, loads, i, j))
            .map(|&i| (j, i))
    })
}

fn would_accept(
    problem: &AssignmentProblem,
    prefs: &Preferences,
    decision: &[Option<usize>],
    loads: &[i64],
    i: usize,
    j: usize,
) -> bool {
    let Some(rank) = prefs.operator_rank(i, j) else {
        return false;
    };
    let releasable: i64 = decision
        .iter()
        .enumerate()
        .filter(|&(t, op)| *op == Some(i) && prefs.operator_rank(i, t) > Some(rank))
        .map(|(t, _)| problem.effort(t))
        .sum();
    problem.available(i) - loads[i] + releasable >= problem.effort(j)
}

/// Moves task `j` to operator `i`, evicting `i`'s least preferred tasks
/// until it fits.
fn move_task(
    problem: &AssignmentProblem,
    prefs: &Preferences,
    decision: &mut [Option<usize>],
    loads: &mut [i64],
    j: usize,
    i: usize,
) {
    if let Some(c) = decision[j] {
        loads[c] -= problem.effort(j);
    }
    decision[j] = Some(i);
    loads[i] += problem.effort(j);

    let mut others: Vec<usize> = (0..decision.len())
        .filter(|&t| t != j && decision[t] == Some(i))
        .collect();
    others.sort_by_key(|&t| std::cmp::Reverse(prefs.operator_rank(i, t)));
    for t in others {
        if loads[i] <= problem.available(i) {
            break;
        }
        decision[t] = None;
        loads[i] -= problem.effort(t);
    }
}

impl Strategy for MatchingStrategy {
    fn kind(&self) -> StrategyKind {
        StrategyKind::StableMatching
    }

    #[tracing::instrument(level = "debug", name = "Matching", skip_all)]
    fn solve(
        &self,
        problem: &AssignmentProblem,
        config: &SolverConfig,
        budget: &Budget,
    ) -> Result<Schedule, StrategyError> {
        if let Some(s) = problem.trivial_schedule(self.kind(), budget)? {
            return Ok(s);
        }

        let prefs = Preferences::new(problem, config.matching.operator_ranking);
        let order = GreedyStrategy::new().task_order(problem);
        let outcome = stable_match(problem, &prefs, &order, config.matching.max_rounds, budget);

        let mut schedule =
            problem.build_schedule(self.kind(), &outcome.decision, SolveStatus::Feasible, budget)?;
        schedule.stats.rounds = Some(outcome.rounds);
        schedule.stats.stable = Some(outcome.stable);
        if outcome.interrupted {
            schedule = schedule.with_message("time limit reached before the matching settled");
        } else if !outcome.stable {
            schedule = schedule.with_message("round limit reached with blocking pairs left");
        }
        tracing::debug!(
            "Matching: {} rounds, stable={}, objective {:.6}",
            outcome.rounds,
            outcome.stable,
            schedule.objective
        );
        Ok(schedule)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{MatchingOptions, OperatorRanking};
    use crate::models::{Instance, Operator, Priority, Task};
    use std::time::Duration;

    fn run(instance: &Instance, config: &SolverConfig) -> Schedule {
        let problem = AssignmentProblem::new(instance, config);
        MatchingStrategy::new()
            .solve(&problem, config, &Budget::new(Duration::from_secs(10)))
            .unwrap()
    }

    fn decision_of(problem: &AssignmentProblem, s: &Schedule) -> Decision {
        (0..problem.num_tasks())
            .map(|j| {
                s.operator_of(&problem.task(j).id).and_then(|id| {
                    (0..problem.num_operators()).find(|&i| problem.operator(i).id == id)
                })
            })
            .collect()
    }

    fn crowded() -> Instance {
        Instance::new()
            .with_operator(Operator::new("A").with_skill("S1").with_window(0, 240))
            .with_operator(Operator::new("B").with_skills(["S1", "S2"]).with_window(0, 300))
            .with_operator(Operator::new("C").with_window(0, 120))
            .with_task(Task::new("T1", 120).with_skill("S1").with_priority(Priority::High))
            .with_task(Task::new("T2", 180).with_skill("S1"))
            .with_task(Task::new("T3", 90).with_skill("S2").with_priority(Priority::Urgent))
            .with_task(Task::new("T4", 60).with_priority(Priority::Low))
            .with_task(Task::new("T5", 100))
            .with_task(Task::new("T6", 150).with_skill("S1").with_priority(Priority::Low))
            .with_referenced_skills()
    }

    #[test]
    fn test_scenario() {
        let inst = Instance::new()
            .with_operator(Operator::new("A").with_skill("S1").with_window(0, 480))
            .with_operator(Operator::new("B").with_skills(["S1", "S2"]).with_window(0, 240))
            .with_task(Task::new("T1", 240).with_skill("S1").with_priority(Priority::High))
            .with_task(Task::new("T2", 240).with_skill("S2"))
            .with_referenced_skills();
        let s = run(&inst, &SolverConfig::default());
        assert_eq!(s.operator_of("T1"), Some("A"));
        assert_eq!(s.operator_of("T2"), Some("B"));
        assert_eq!(s.stats.stable, Some(true));
    }

    #[test]
    fn test_no_blocking_pair() {
        let inst = crowded();
        for ranking in [
            OperatorRanking::SkillMatchThenCapacity,
            OperatorRanking::CapacityThenSkillMatch,
        ] {
            let config = SolverConfig::default().with_matching(MatchingOptions {
                operator_ranking: ranking,
                ..MatchingOptions::default()
            });
            let s = run(&inst, &config);
            assert!(s.is_valid(&inst));
            assert_eq!(s.stats.stable, Some(true));
            let problem = AssignmentProblem::new(&inst, &config);
            let prefs = Preferences::new(&problem, ranking);
            assert!(blocking_pairs(&problem, &prefs, &decision_of(&problem, &s)).is_empty());
        }
    }

    #[test]
    fn test_operator_keeps_preferred_task() {
        let inst = Instance::new()
            .with_operator(Operator::new("A").with_window(0, 100))
            .with_task(Task::new("low", 100).with_priority(Priority::Low))
            .with_task(Task::new("high", 100).with_priority(Priority::High));
        let s = run(&inst, &SolverConfig::default());
        assert_eq!(s.operator_of("high"), Some("A"));
        assert_eq!(s.operator_of("low"), None);
    }

    #[test]
    fn test_blocking_pair_detection() {
        let inst = Instance::new()
            .with_operator(Operator::new("A").with_window(0, 100))
            .with_task(Task::new("low", 100).with_priority(Priority::Low))
            .with_task(Task::new("high", 100).with_priority(Priority::High));
        let problem = AssignmentProblem::new(&inst, &SolverConfig::default());
        let prefs = Preferences::new(&problem, OperatorRanking::SkillMatchThenCapacity);
        assert_eq!(blocking_pairs(&problem, &prefs, &[Some(0), None]), vec![(1, 0)]);
        assert!(blocking_pairs(&problem, &prefs, &[None, Some(0)]).is_empty());
    }

    /// One operator with 100 minutes. `P` (60) is held and `X` (50) turned
    /// away; then the urgent `Q` (50) displaces `P`, leaving room for `X`.
    fn displaced() -> Instance {
        Instance::new()
            .with_operator(Operator::new("A").with_window(0, 100))
            .with_task(Task::new("P", 60).with_priority(Priority::High))
            .with_task(Task::new("X", 50))
            .with_task(Task::new("Q", 50).with_priority(Priority::Urgent))
    }

    #[test]
    fn test_sweep_removes_leftover_blocking_pair() {
        let inst = displaced();
        let problem = AssignmentProblem::new(&inst, &SolverConfig::default());
        let prefs = Preferences::new(&problem, OperatorRanking::SkillMatchThenCapacity);
        let budget = Budget::new(Duration::from_secs(10));

        // Deferred acceptance alone: three proposals, no room left for the sweep.
        let da = stable_match(&problem, &prefs, &[0, 1, 2], 3, &budget);
        assert_eq!(da.decision, vec![None, None, Some(0)]);
        assert_eq!(blocking_pairs(&problem, &prefs, &da.decision), vec![(1, 0)]);
        assert!(!da.stable);

        let out = stable_match(&problem, &prefs, &[0, 1, 2], 100, &budget);
        assert_eq!(out.moves, 1);
        assert!(out.stable);
        assert_eq!(out.decision, vec![None, Some(0), Some(0)]);
        assert!(blocking_pairs(&problem, &prefs, &out.decision).is_empty());
    }

    #[test]
    fn test_round_limit() {
        let config = SolverConfig::default().with_matching(MatchingOptions {
            max_rounds: 1,
            ..MatchingOptions::default()
        });
        let s = run(&crowded(), &config);
        assert!(s.stats.rounds.unwrap() <= 1);
        assert!(s.is_valid(&crowded()));
    }
}
