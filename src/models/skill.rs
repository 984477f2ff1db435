//! Skill reference data.

use serde::{Deserialize, Serialize};

/// A capability from the skill master list.
///
/// Required by tasks and held by operators, always referenced by `id`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Skill {
    /// Unique skill identifier.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Grouping category (e.g., "maintenance", "assembly").
    pub category: String,
    /// Free-text description.
    pub description: String,
}

impl Skill {
    /// Creates a skill whose display name equals its ID.
    pub fn new(id: impl Into<String>) -> Self {
        let id = id.into();
        Self {
            name: id.clone(),
            id,
            category: String::new(),
            description: String::new(),
        }
    }

    /// Sets the display name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Sets the category.
    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = category.into();
        self
    }

    /// Sets the description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }
}
