//! Rule engine for multi-criteria task ordering.
//!
//! Rules are applied in sequence; a later rule only decides between tasks
//! the earlier ones rank equally.
//!
//! # Reference
//! Haupt (1989), "A Survey of Priority Rule-Based Scheduling"

use std::sync::Arc;

use super::{DispatchContext, DispatchingRule};
use crate::models::Task;

/// How ties are broken after all rules are exhausted.
#[derive(Debug, Clone, Default)]
pub enum TieBreaker {
    /// Leave the input order (stable sort).
    #[default]
    Stable,
    /// Deterministic by task ID (lexicographic).
    ById,
}

/// A composable rule engine for task prioritization.
///
/// Sequential multi-layer evaluation: primary rule, then tie-breakers in
/// the order they were added, then the final [`TieBreaker`].
///
/// # Example
/// ```
/// use u_assign::dispatching::{rules, RuleEngine};
///
/// let engine = RuleEngine::new()
///     .with_rule(rules::Edd)
///     .with_tie_breaker(rules::Spt);
/// ```
#[derive(Clone)]
pub struct RuleEngine {
    rules: Vec<Arc<dyn DispatchingRule>>,
    tie_breaker: TieBreaker,
    epsilon: f64,
}

impl RuleEngine {
    /// Creates an empty rule engine.
    pub fn new() -> Self {
        Self {
            rules: Vec::new(),
            tie_breaker: TieBreaker::Stable,
            epsilon: 1e-9,
        }
    }

    /// Adds the primary rule.
    pub fn with_rule<R: DispatchingRule + 'static>(mut self, rule: R) -> Self {
        self.rules.push(Arc::new(rule));
        self
    }

    /// Adds a rule consulted only when all earlier rules tie.
    pub fn with_tie_breaker<R: DispatchingRule + 'static>(mut self, rule: R) -> Self {
        self.rules.push(Arc::new(rule));
        self
    }

    /// Sets the final tie-breaking strategy.
    pub fn with_final_tie_breaker(mut self, tie_breaker: TieBreaker) -> Self {
        self.tie_breaker = tie_breaker;
        self
    }

    /// Sorts tasks by priority (highest priority first).
    ///
    /// Returns indices into the original task slice, sorted by rule evaluation.
    pub fn sort_indices(&self, tasks: &[Task], context: &DispatchContext) -> Vec<usize> {
        let all: Vec<usize> = (0..tasks.len()).collect();
        self.sort_subset(tasks, &all, context)
    }

    /// Sorts a subset of task indices (highest priority first).
    ///
    /// `subset` holds indices into `tasks`; the result is a permutation of it.
    pub fn sort_subset(
        &self,
        tasks: &[Task],
        subset: &[usize],
        context: &DispatchContext,
    ) -> Vec<usize> {
        let mut indices = subset.to_vec();
        if indices.len() < 2 {
            return indices;
        }

        indices.sort_by(|&a, &b| self.compare(&tasks[a], &tasks[b], context));
        indices
    }

    fn compare(
        &self,
        a: &Task,
        b: &Task,
        context: &DispatchContext,
    ) -> std::cmp::Ordering {
        for rule in &self.rules {
            let score_a = rule.evaluate(a, context);
            let score_b = rule.evaluate(b, context);

            if (score_a - score_b).abs() > self.epsilon {
                return score_a
                    .partial_cmp(&score_b)
                    .unwrap_or(std::cmp::Ordering::Equal);
            }
        }

        // All rules tied → use final tie-breaker
        match &self.tie_breaker {
            TieBreaker::Stable => std::cmp::Ordering::Equal,
            TieBreaker::ById => a.id.cmp(&b.id),
        }
    }
}

impl Default for RuleEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for RuleEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RuleEngine")
            .field(
                "rules",
                &self
                    .rules
                    .iter()
                    .map(|r| r.name())
                    .collect::<Vec<_>>(),
            )
            .field("tie_breaker", &self.tie_breaker)
            .finish()
    }
}
