//! Input validation for assignment instances.
//!
//! Checks structural integrity of skills, operators, and tasks before any
//! strategy runs. Detects:
//! - Duplicate IDs (per collection)
//! - Dangling skill references
//! - Malformed, overlapping, or unordered availability windows
//! - Non-positive task effort
//!
//! Logical infeasibility (a task nobody can do, zero operators) is not an
//! error here; strategies report it as unassigned tasks.

use crate::models::Instance;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

/// Validation result.
pub type ValidationResult = Result<(), Vec<ValidationError>>;

/// A validation error.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationError {
    /// Error category.
    pub kind: ValidationErrorKind,
    /// Human-readable description.
    pub message: String,
}

/// Categories of validation errors.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ValidationErrorKind {
    /// Two entities of the same collection share an ID.
    DuplicateId,
    /// An operator or task references a skill missing from the master list.
    UnknownSkill,
    /// A window whose end is not after its start.
    InvalidWindow,
    /// Windows of one operator overlap or are out of chronological order.
    OverlappingWindows,
    /// A task with zero or negative effort.
    NonPositiveEffort,
}

impl ValidationError {
    fn new(kind: ValidationErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}: {}", self.kind, self.message)
    }
}

/// Validates an assignment instance.
///
/// Checks:
/// 1. No duplicate skill, operator, or task IDs
/// 2. Every held or required skill exists in the master list
/// 3. Every window has `end > start`
/// 4. Each operator's windows are chronologically ordered and disjoint
/// 5. Every task has strictly positive effort
///
/// # Returns
/// `Ok(())` if all checks pass, `Err(errors)` with all detected issues.
pub fn validate_instance(instance: &Instance) -> ValidationResult {
    let mut errors = Vec::new();

    let mut skill_ids = HashSet::new();
    for s in &instance.skills {
        if !skill_ids.insert(s.id.as_str()) {
            errors.push(ValidationError::new(
                ValidationErrorKind::DuplicateId,
                format!("Duplicate skill ID: {}", s.id),
            ));
        }
    }

    let mut operator_ids = HashSet::new();
    for op in &instance.operators {
        if !operator_ids.insert(op.id.as_str()) {
            errors.push(ValidationError::new(
                ValidationErrorKind::DuplicateId,
                format!("Duplicate operator ID: {}", op.id),
            ));
        }

        for skill in &op.skills {
            if !skill_ids.contains(skill.as_str()) {
                errors.push(ValidationError::new(
                    ValidationErrorKind::UnknownSkill,
                    format!("Operator '{}' holds unknown skill '{}'", op.id, skill),
                ));
            }
        }

        for w in &op.windows {
            if w.end_min <= w.start_min {
                errors.push(ValidationError::new(
                    ValidationErrorKind::InvalidWindow,
                    format!(
                        "Operator '{}' has window [{}, {}) with end not after start",
                        op.id, w.start_min, w.end_min
                    ),
                ));
            }
        }

        for pair in op.windows.windows(2) {
            if pair[1].start_min < pair[0].end_min {
                errors.push(ValidationError::new(
                    ValidationErrorKind::OverlappingWindows,
                    format!(
                        "Operator '{}' window starting at {} overlaps or precedes the window ending at {}",
                        op.id, pair[1].start_min, pair[0].end_min
                    ),
                ));
            }
        }
    }

    let mut task_ids = HashSet::new();
    for task in &instance.tasks {
        if !task_ids.insert(task.id.as_str()) {
            errors.push(ValidationError::new(
                ValidationErrorKind::DuplicateId,
                format!("Duplicate task ID: {}", task.id),
            ));
        }

        if task.effort_minutes <= 0 {
            errors.push(ValidationError::new(
                ValidationErrorKind::NonPositiveEffort,
                format!(
                    "Task '{}' has non-positive effort ({} min)",
                    task.id, task.effort_minutes
                ),
            ));
        }

        for skill in &task.required_skills {
            if !skill_ids.contains(skill.as_str()) {
                errors.push(ValidationError::new(
                    ValidationErrorKind::UnknownSkill,
                    format!("Task '{}' requires unknown skill '{}'", task.id, skill),
                ));
            }
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Operator, Skill, Task};

    fn base() -> Instance {
        Instance::new()
            .with_skill(Skill::new("S1"))
            .with_skill(Skill::new("S2"))
            .with_operator(Operator::new("A").with_skill("S1").with_window(0, 480))
            .with_task(Task::new("T1", 60).with_skill("S1"))
    }

    fn kinds(result: ValidationResult) -> Vec<ValidationErrorKind> {
        result
            .unwrap_err()
            .into_iter()
            .map(|e| e.kind)
            .collect()
    }

    #[test]
    fn test_valid_input() {
        assert!(validate_instance(&base()).is_ok());
    }

    #[test]
    fn test_empty_input_is_valid() {
        assert!(validate_instance(&Instance::new()).is_ok());
    }

    #[test]
    fn test_duplicate_ids() {
        let inst = base()
            .with_skill(Skill::new("S1"))
            .with_operator(Operator::new("A"))
            .with_task(Task::new("T1", 30));
        let k = kinds(validate_instance(&inst));
        assert_eq!(
            k.iter()
                .filter(|x| **x == ValidationErrorKind::DuplicateId)
                .count(),
            3
        );
    }

    #[test]
    fn test_dangling_skill_references() {
        let inst = base()
            .with_operator(Operator::new("B").with_skill("S9"))
            .with_task(Task::new("T2", 30).with_skill("S8"));
        let errs = validate_instance(&inst).unwrap_err();
        assert_eq!(errs.len(), 2);
        assert!(errs
            .iter()
            .all(|e| e.kind == ValidationErrorKind::UnknownSkill));
        assert!(errs[0].message.contains("S9"));
    }

    #[test]
    fn test_bad_windows() {
        let inst = base().with_operator(
            Operator::new("B")
                .with_window(100, 100)
                .with_window(50, 200)
                .with_window(150, 300),
        );
        let k = kinds(validate_instance(&inst));
        assert!(k.contains(&ValidationErrorKind::InvalidWindow));
        assert_eq!(
            k.iter()
                .filter(|x| **x == ValidationErrorKind::OverlappingWindows)
                .count(),
            2
        );
    }

    #[test]
    fn test_adjacent_windows_are_fine() {
        let inst = base().with_operator(Operator::new("B").with_window(0, 60).with_window(60, 120));
        assert!(validate_instance(&inst).is_ok());
    }

    #[test]
    fn test_non_positive_effort() {
        let inst = base().with_task(Task::new("T0", 0));
        let k = kinds(validate_instance(&inst));
        assert_eq!(k, vec![ValidationErrorKind::NonPositiveEffort]);
    }
}
