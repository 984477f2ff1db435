//! Crate error types.
//!
//! Two layers: [`AssignError`] aborts an orchestrated run before any
//! strategy executes; [`StrategyError`] is raised inside one strategy and
//! is captured per strategy by the orchestrator.

use crate::validation::ValidationError;

/// Result alias for run-level operations.
pub type Result<T> = std::result::Result<T, AssignError>;

/// Run-level errors. These abort the run with no partial results.
#[derive(Debug, thiserror::Error)]
pub enum AssignError {
    #[error("invalid instance: {}", summarize(.0))]
    InvalidInstance(Vec<ValidationError>),

    #[error("no strategies selected")]
    NoStrategies,

    #[error("invalid configuration: {0}")]
    Config(String),
}

/// Errors raised inside a single strategy.
#[derive(Debug, thiserror::Error)]
pub enum StrategyError {
    #[error("solver error: {0}")]
    Solver(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl AssignError {
    pub fn config<S: Into<String>>(msg: S) -> Self {
        AssignError::Config(msg.into())
    }
}

impl StrategyError {
    pub fn solver<S: Into<String>>(msg: S) -> Self {
        StrategyError::Solver(msg.into())
    }

    pub fn internal<S: Into<String>>(msg: S) -> Self {
        StrategyError::Internal(msg.into())
    }
}

fn summarize(errors: &[ValidationError]) -> String {
    match errors {
        [] => "no details".to_string(),
        [only] => only.to_string(),
        [first, rest @ ..] => format!("{} (and {} more)", first, rest.len()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Instance, Task};
    use crate::validation::validate_instance;

    #[test]
    fn test_invalid_instance_message() {
        let inst = Instance::new()
            .with_task(Task::new("T1", 0))
            .with_task(Task::new("T1", 10));
        let errs = validate_instance(&inst).unwrap_err();
        let err = AssignError::InvalidInstance(errs);
        let msg = err.to_string();
        assert!(msg.starts_with("invalid instance:"));
        assert!(msg.contains("and 1 more"));
    }

    #[test]
    fn test_strategy_error_display() {
        assert_eq!(
            StrategyError::solver("backend gave up").to_string(),
            "solver error: backend gave up"
        );
        assert_eq!(AssignError::NoStrategies.to_string(), "no strategies selected");
    }
}
