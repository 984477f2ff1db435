//! Baseline scheduling, metrics and orchestration.
//!
//! # Greedy
//!
//! [`GreedyStrategy`] assigns tasks in priority order to the operator with
//! the most remaining capacity. It never backtracks, so it is fast and
//! fully deterministic; the exact and evolutionary strategies use it as a
//! warm start.
//!
//! # Metrics
//!
//! [`ScheduleMetrics`] computes utilization, idle time, unmet demand and
//! fairness figures for one schedule.
//!
//! # Orchestration
//!
//! [`Orchestrator`] runs several strategies on one instance, isolates their
//! failures, and builds a [`Comparison`] table.
//!
//! # References
//!
//! - Pinedo (2016), "Scheduling: Theory, Algorithms, and Systems", Ch. 3-4
//! - Burkard, Dell'Amico & Martello (2012), "Assignment Problems"

mod comparison;
mod greedy;
mod metrics;
mod orchestrator;

pub use comparison::{Comparison, ComparisonMetric, ComparisonRow, ComparisonSummary};
pub use greedy::{construct, GreedyStrategy};
pub use metrics::{OperatorMetrics, ScheduleMetrics};
pub use orchestrator::{Orchestrator, RunReport};
