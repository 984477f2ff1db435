//! Schedule quality metrics.
//!
//! Pure functions over one schedule and the instance it was produced for.
//! Ratios are `Option<f64>`: `None` means "no data" (no tasks, no operators,
//! or no capacity), never a failure.
//!
//! # Metrics
//!
//! | Metric | Definition |
//! |--------|-----------|
//! | Utilization | assigned minutes / available minutes, per operator |
//! | Global Idle | available minutes - assigned minutes, all operators |
//! | Unmet Demand | unassigned tasks / total tasks |
//! | Weighted Unmet Demand | unassigned priority weight / total priority weight |
//! | Fairness | variance (and std. dev.) of utilization across operators |
//! | On-Time Ratio | assigned tasks completing by their deadline / assigned tasks |
//! | Tardiness | sum and max of `completion - deadline` over late tasks |
//!
//! # Reference
//! Pinedo (2016), "Scheduling", Ch. 1.2: Performance Measures

use serde::{Deserialize, Serialize};

use crate::models::{Instance, Schedule};

/// Per-operator figures.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OperatorMetrics {
    pub operator_id: String,
    pub available_minutes: i64,
    pub assigned_minutes: i64,
    /// `available - assigned`, floored at zero.
    pub idle_minutes: i64,
    pub task_count: usize,
    /// `None` for operators without availability.
    pub utilization: Option<f64>,
}

/// Schedule performance indicators.
///
/// All time values are in minutes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduleMetrics {
    pub operators: Vec<OperatorMetrics>,
    pub total_available_minutes: i64,
    pub total_assigned_minutes: i64,
    pub global_idle_minutes: i64,
    /// Effort of unassigned tasks.
    pub unassigned_minutes: i64,
    pub coverage_ratio: Option<f64>,
    pub unmet_demand_ratio: Option<f64>,
    pub weighted_unmet_demand_ratio: Option<f64>,
    /// Mean utilization over operators with availability.
    pub average_utilization: Option<f64>,
    /// Population variance of utilization (fairness; lower is fairer).
    pub utilization_variance: Option<f64>,
    pub utilization_std_dev: Option<f64>,
    /// Assigned tasks finishing by their deadline (no deadline = on time).
    pub on_time_ratio: Option<f64>,
    pub total_tardiness_minutes: i64,
    pub max_tardiness_minutes: i64,
    /// Latest completion minute of any assigned task.
    pub makespan_min: Option<i64>,
    /// Hard-constraint violations found in the schedule.
    pub violation_count: usize,
}

impl ScheduleMetrics {
    /// Computes metrics from a schedule and its instance.
    ///
    /// Tasks or operators referenced by the schedule but missing from the
    /// instance are ignored here and counted in `violation_count`.
    pub fn calculate(schedule: &Schedule, instance: &Instance) -> Self {
        let operators: Vec<OperatorMetrics> = instance
            .operators
            .iter()
            .map(|op| {
                let available = op.available_minutes();
                let mine = schedule.assignments_for_operator(&op.id);
                let assigned: i64 = mine.iter().map(|a| a.allocated_minutes()).sum();
                OperatorMetrics {
                    operator_id: op.id.clone(),
                    available_minutes: available,
                    assigned_minutes: assigned,
                    idle_minutes: (available - assigned).max(0),
                    task_count: mine.len(),
                    utilization: (available > 0).then(|| assigned as f64 / available as f64),
                }
            })
            .collect();

        let total_available: i64 = operators.iter().map(|o| o.available_minutes).sum();
        let total_assigned: i64 = operators.iter().map(|o| o.assigned_minutes).sum();
        let global_idle: i64 = operators.iter().map(|o| o.idle_minutes).sum();

        let utils: Vec<f64> = operators.iter().filter_map(|o| o.utilization).collect();
        let average_utilization = mean(&utils);
        let utilization_variance = average_utilization.map(|m| {
            utils.iter().map(|u| (u - m) * (u - m)).sum::<f64>() / utils.len() as f64
        });

        let n = instance.tasks.len();
        let mut unassigned = 0usize;
        let mut unassigned_minutes = 0i64;
        let mut unassigned_weight = 0.0;
        let mut total_weight = 0.0;
        let mut counted = 0usize;
        let mut on_time = 0usize;
        let mut total_tardiness = 0i64;
        let mut max_tardiness = 0i64;
        let mut makespan: Option<i64> = None;

        for task in &instance.tasks {
            total_weight += task.priority.weight();
            let completion = schedule
                .assignment_for_task(&task.id)
                .filter(|a| a.is_assigned())
                .and_then(|a| a.end_min());
            let Some(completion) = completion else {
                unassigned += 1;
                unassigned_minutes += task.effort_minutes;
                unassigned_weight += task.priority.weight();
                continue;
            };
            counted += 1;
            makespan = Some(makespan.map_or(completion, |m| m.max(completion)));
            match instance.deadline_minute(task) {
                Some(deadline) if completion > deadline => {
                    let tardiness = completion - deadline;
                    total_tardiness += tardiness;
                    max_tardiness = max_tardiness.max(tardiness);
                }
                _ => on_time += 1,
            }
        }

        let ratio = |num: f64, den: f64| (den > 0.0).then(|| num / den);

        Self {
            operators,
            total_available_minutes: total_available,
            total_assigned_minutes: total_assigned,
            global_idle_minutes: global_idle,
            unassigned_minutes,
            coverage_ratio: ratio((n - unassigned) as f64, n as f64),
            unmet_demand_ratio: ratio(unassigned as f64, n as f64),
            weighted_unmet_demand_ratio: ratio(unassigned_weight, total_weight),
            average_utilization,
            utilization_variance,
            utilization_std_dev: utilization_variance.map(f64::sqrt),
            on_time_ratio: ratio(on_time as f64, counted as f64),
            total_tardiness_minutes: total_tardiness,
            max_tardiness_minutes: max_tardiness,
            makespan_min: makespan,
            violation_count: schedule.violations(instance).len(),
        }
    }

    /// Metrics for one operator.
    pub fn operator(&self, operator_id: &str) -> Option<&OperatorMetrics> {
        self.operators.iter().find(|o| o.operator_id == operator_id)
    }

    /// Whether the schedule meets the given quality thresholds.
    ///
    /// Missing data never meets a threshold.
    pub fn meets_thresholds(&self, min_coverage: f64, max_utilization_std_dev: f64) -> bool {
        self.coverage_ratio.is_some_and(|c| c >= min_coverage)
            && self
                .utilization_std_dev
                .is_some_and(|s| s <= max_utilization_std_dev)
    }
}

fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        None
    } else {
        Some(values.iter().sum::<f64>() / values.len() as f64)
    }
}
