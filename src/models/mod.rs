//! Assignment domain models.
//!
//! Value types for the assignment problem and its solutions. Inputs are
//! read-only for the whole run; a [`Schedule`] is never mutated once a
//! strategy returns it.
//!
//! # Domain Mappings
//!
//! | u-assign | Maintenance | Field Service | Support Desk |
//! |----------|-------------|---------------|--------------|
//! | Task | Work Order | Visit | Ticket |
//! | Operator | Technician | Engineer | Agent |
//! | Skill | Certification | Qualification | Product Area |
//! | Schedule | Shift Plan | Route Day | Queue Plan |

mod calendar;
mod instance;
mod operator;
mod schedule;
mod skill;
mod task;

pub use calendar::{earliest_completion, TimeWindow};
pub use instance::Instance;
pub use operator::Operator;
pub use schedule::{Assignment, Schedule, SolveStats, SolveStatus, Violation, ViolationType};
pub use skill::Skill;
pub use task::{Priority, Task};
