//! Employee model.
//!
//! Employees are the resources of a roster: each carries a set of skill
//! tags and an upper bound on the hours it may be assigned within one solve.

use serde::{Deserialize, Serialize};

use super::deserialize_id;

/// An employee that can be assigned to shifts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Employee {
    /// Unique employee identifier (numbers in JSON are accepted and stringified).
    #[serde(deserialize_with = "deserialize_id")]
    pub id: String,
    /// Human-readable name.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub name: String,
    /// Skill tags the employee is qualified for. Set semantics; order is irrelevant.
    pub skills: Vec<String>,
    /// Maximum total hours assignable over the solve horizon.
    pub max_hours: f64,
}

impl Employee {
    /// Creates an employee with no skills.
    pub fn new(id: impl Into<String>, max_hours: f64) -> Self {
        Self {
            id: id.into(),
            name: String::new(),
            skills: Vec::new(),
            max_hours,
        }
    }

    /// Sets the display name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Adds a skill tag.
    pub fn with_skill(mut self, skill: impl Into<String>) -> Self {
        self.skills.push(skill.into());
        self
    }

    /// Adds several skill tags.
    pub fn with_skills<I, S>(mut self, skills: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.skills.extend(skills.into_iter().map(Into::into));
        self
    }

    /// Whether the employee holds the given skill tag.
    pub fn has_skill(&self, skill: &str) -> bool {
        self.skills.iter().any(|s| s == skill)
    }
}
