//! Skill-aware task-to-operator assignment.
//!
//! Assigns tasks (required skills, effort, priority, optional deadline) to
//! operators (skills, availability windows) with five interchangeable
//! strategies, and compares their results on one shared objective.
//!
//! # Modules
//!
//! - **`models`**: Domain types: `Skill`, `Operator`, `Task`, `Instance`,
//!   `Schedule`, `Assignment`, `TimeWindow`
//! - **`validation`**: Input integrity checks (duplicate IDs, skill refs, windows)
//! - **`problem`**: Indexed problem view, feasible pairs, shared objective
//! - **`strategy`**: The `Strategy` trait, capabilities and time budget
//! - **`lp`**: Mixed-integer programming (exact)
//! - **`cp`**: Constraint search with branch and bound (exact)
//! - **`ga`**: Genetic algorithm with capacity repair
//! - **`matching`**: Deferred acceptance (stable matching)
//! - **`scheduler`**: Greedy baseline, metrics, orchestrator, comparison
//! - **`dispatching`**: Priority rules shared by greedy, repair and matching
//!
//! # Example
//!
//! ```
//! use u_assign::models::{Instance, Operator, Priority, Task};
//! use u_assign::{solve, SolverConfig, StrategyKind};
//!
//! let instance = Instance::new()
//!     .with_operator(Operator::new("A").with_skill("S1").with_window(0, 480))
//!     .with_operator(Operator::new("B").with_skills(["S1", "S2"]).with_window(0, 240))
//!     .with_task(Task::new("T1", 240).with_skill("S1").with_priority(Priority::High))
//!     .with_task(Task::new("T2", 240).with_skill("S2"))
//!     .with_referenced_skills();
//!
//! let schedule = solve(StrategyKind::Greedy, &instance, &SolverConfig::default()).unwrap();
//! assert_eq!(schedule.operator_of("T1"), Some("A"));
//! assert_eq!(schedule.operator_of("T2"), Some("B"));
//! ```
//!
//! # References
//!
//! - Burkard, Dell'Amico & Martello (2012), "Assignment Problems"
//! - Pinedo (2016), "Scheduling: Theory, Algorithms, and Systems"
//! - Gale & Shapley (1962), "College Admissions and the Stability of Marriage"

pub mod config;
pub mod cp;
pub mod dispatching;
pub mod error;
pub mod ga;
pub mod lp;
pub mod matching;
pub mod models;
pub mod problem;
pub mod scheduler;
pub mod strategy;
pub mod validation;

pub use config::SolverConfig;
pub use error::{AssignError, StrategyError};
pub use strategy::{Budget, Strategy, StrategyKind};

use models::{Instance, Schedule, SolveStatus};
use problem::AssignmentProblem;

/// Runs one strategy on the calling thread.
///
/// Validates the instance and config first. A strategy fault is reported
/// as a schedule with status `StrategyFailed`, as in an orchestrated run.
pub fn solve(kind: StrategyKind, instance: &Instance, config: &SolverConfig) -> error::Result<Schedule> {
    config.validate()?;
    validation::validate_instance(instance).map_err(AssignError::InvalidInstance)?;
    let problem = AssignmentProblem::new(instance, config);
    let budget = Budget::from_config(config);
    match kind.build().solve(&problem, config, &budget) {
        Ok(schedule) => Ok(schedule),
        Err(e) => {
            tracing::warn!("{}: failed: {}", kind, e);
            let mut s = Schedule::all_unassigned(kind, SolveStatus::StrategyFailed, instance)
                .with_message(e.to_string());
            s.solve_duration = budget.elapsed();
            Ok(s)
        }
    }
}
