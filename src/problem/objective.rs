//! Shared weighted objective.
//!
//! Every strategy's schedule is scored by this evaluator, so objective
//! values are comparable across strategies.
//!
//! # Formula (maximized)
//!
//! With `n` tasks, `P` the sum of priority weights, `A` the total available
//! minutes, and `util_i = load_i / avail_i` over operators with capacity:
//!
//! ```text
//! score = w_cov  * assigned / n
//!       + w_pri  * sum(weight of assigned) / P
//!       - w_idle * (1 - assigned_minutes / A)
//!       - w_fair * (max util - min util)
//!       - w_mk   * max util
//! ```
//!
//! Terms with an empty denominator contribute 0. The first three terms
//! decompose into a constant plus one value per assigned task, which is
//! what the MIP model and the constraint search bound against.

use serde::{Deserialize, Serialize};

use crate::config::ObjectiveWeights;

/// Per-term objective contributions.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ObjectiveBreakdown {
    pub coverage: f64,
    pub priority: f64,
    /// Idle penalty (non-positive).
    pub idle: f64,
    /// Fairness penalty (non-positive).
    pub fairness: f64,
    /// Peak-utilization penalty (non-positive).
    pub makespan: f64,
}

impl ObjectiveBreakdown {
    /// Sum of all terms.
    pub fn total(&self) -> f64 {
        self.coverage + self.priority + self.idle + self.fairness + self.makespan
    }
}

/// The objective, pre-normalized for one problem.
#[derive(Debug, Clone)]
pub struct Objective {
    weights: ObjectiveWeights,
    effort: Vec<i64>,
    priority_weight: Vec<f64>,
    available: Vec<i64>,
    total_priority: f64,
    total_available: i64,
}

impl Objective {
    /// Builds the objective for tasks with `effort`/`priority_weight` and
    /// operators with `available` minutes.
    pub fn new(
        weights: ObjectiveWeights,
        effort: Vec<i64>,
        priority_weight: Vec<f64>,
        available: Vec<i64>,
    ) -> Self {
        let total_priority = priority_weight.iter().sum();
        let total_available = available.iter().sum();
        Self {
            weights,
            effort,
            priority_weight,
            available,
            total_priority,
            total_available,
        }
    }

    /// The weights in use.
    pub fn weights(&self) -> &ObjectiveWeights {
        &self.weights
    }

    /// Decision-independent part of the score.
    pub fn constant(&self) -> f64 {
        if self.total_available > 0 {
            -self.weights.idle
        } else {
            0.0
        }
    }

    /// Linear gain from assigning task `j` (to any operator).
    pub fn task_value(&self, j: usize) -> f64 {
        let mut v = 0.0;
        let n = self.effort.len();
        if n > 0 {
            v += self.weights.coverage / n as f64;
        }
        if self.total_priority > 0.0 {
            v += self.weights.priority * self.priority_weight[j] / self.total_priority;
        }
        if self.total_available > 0 {
            v += self.weights.idle * self.effort[j] as f64 / self.total_available as f64;
        }
        v
    }

    /// Utilization-dependent penalty for the given max/min utilization.
    pub fn spread_penalty(&self, max_util: f64, min_util: f64) -> f64 {
        -self.weights.fairness * (max_util - min_util) - self.weights.makespan * max_util
    }

    /// Per-operator loads (minutes) of a decision.
    pub fn loads(&self, decision: &[Option<usize>]) -> Vec<i64> {
        let mut loads = vec![0i64; self.available.len()];
        for (j, op) in decision.iter().enumerate() {
            if let Some(i) = *op {
                loads[i] += self.effort[j];
            }
        }
        loads
    }

    /// Max and min utilization over operators with capacity. `(0, 0)` if none.
    pub fn utilization_range(&self, loads: &[i64]) -> (f64, f64) {
        let mut max_u = f64::NEG_INFINITY;
        let mut min_u = f64::INFINITY;
        for (load, avail) in loads.iter().zip(&self.available) {
            if *avail > 0 {
                let u = *load as f64 / *avail as f64;
                max_u = max_u.max(u);
                min_u = min_u.min(u);
            }
        }
        if max_u.is_finite() {
            (max_u, min_u)
        } else {
            (0.0, 0.0)
        }
    }

    /// Term-by-term score of a decision.
    pub fn breakdown(&self, decision: &[Option<usize>]) -> ObjectiveBreakdown {
        let n = self.effort.len();
        let mut assigned = 0usize;
        let mut assigned_priority = 0.0;
        let mut assigned_minutes = 0i64;
        for (j, op) in decision.iter().enumerate() {
            if op.is_some() {
                assigned += 1;
                assigned_priority += self.priority_weight[j];
                assigned_minutes += self.effort[j];
            }
        }

        let coverage = if n > 0 {
            self.weights.coverage * assigned as f64 / n as f64
        } else {
            0.0
        };
        let priority = if self.total_priority > 0.0 {
            self.weights.priority * assigned_priority / self.total_priority
        } else {
            0.0
        };
        let idle = if self.total_available > 0 {
            -self.weights.idle * (1.0 - assigned_minutes as f64 / self.total_available as f64)
        } else {
            0.0
        };
        let (max_u, min_u) = self.utilization_range(&self.loads(decision));

        ObjectiveBreakdown {
            coverage,
            priority,
            idle,
            fairness: -self.weights.fairness * (max_u - min_u),
            makespan: -self.weights.makespan * max_u,
        }
    }

    /// Score of a decision (higher is better).
    pub fn evaluate(&self, decision: &[Option<usize>]) -> f64 {
        self.breakdown(decision).total()
    }

    /// Score from precomputed linear value and loads.
    ///
    /// `linear` is the sum of [`task_value`](Self::task_value) over the
    /// assigned tasks. Lets incremental searches avoid a full re-scan.
    pub fn evaluate_parts(&self, linear: f64, loads: &[i64]) -> f64 {
        let (max_u, min_u) = self.utilization_range(loads);
        self.constant() + linear + self.spread_penalty(max_u, min_u)
    }
}
