//! Dispatching rules and rule engine for task ordering.
//!
//! Greedy construction, stable-matching preferences, and evolutionary
//! repair all need a total order over tasks. They share one composable
//! rule engine built from priority-based dispatching rules.
//!
//! # Usage
//!
//! ```
//! use u_assign::dispatching::{rules, DispatchContext, RuleEngine, TieBreaker};
//!
//! let engine = RuleEngine::new()
//!     .with_rule(rules::Priority)
//!     .with_tie_breaker(rules::Edd)
//!     .with_final_tie_breaker(TieBreaker::ById);
//!
//! let context = DispatchContext::default();
//! // let order = engine.sort_indices(&tasks, &context);
//! ```
//!
//! # References
//!
//! - Pinedo (2016), "Scheduling: Theory, Algorithms, and Systems", Ch. 4
//! - Haupt (1989), "A Survey of Priority Rule-Based Scheduling"

mod context;
mod engine;
pub mod rules;

pub use context::DispatchContext;
pub use engine::{RuleEngine, TieBreaker};

use crate::models::Task;
use std::fmt::Debug;

/// Score returned by a dispatching rule.
///
/// Lower scores = higher priority (ordered first).
pub type RuleScore = f64;

/// A dispatching rule that evaluates task priority.
///
/// # Score Convention
/// **Lower score = higher priority.** Rules should return smaller values
/// for tasks that should be handled first.
///
/// # Reference
/// Pinedo (2016), "Scheduling", Ch. 4: Priority Dispatching
pub trait DispatchingRule: Send + Sync + Debug {
    /// Rule name (e.g., "SPT", "EDD").
    fn name(&self) -> &'static str;

    /// Evaluates the priority of a task in the given context.
    ///
    /// Returns a score where lower = higher priority.
    fn evaluate(&self, task: &Task, context: &DispatchContext) -> RuleScore;
}

/// The assignment order used across strategies: priority descending,
/// then earliest deadline, then shortest effort, then task ID.
pub fn assignment_order() -> RuleEngine {
    RuleEngine::new()
        .with_rule(rules::Priority)
        .with_tie_breaker(rules::Edd)
        .with_tie_breaker(rules::Spt)
        .with_final_tie_breaker(TieBreaker::ById)
}

/// Operator-side preference over tasks: priority descending, then
/// earliest deadline, then task ID.
pub fn operator_preference() -> RuleEngine {
    RuleEngine::new()
        .with_rule(rules::Priority)
        .with_tie_breaker(rules::Edd)
        .with_final_tie_breaker(TieBreaker::ById)
}
