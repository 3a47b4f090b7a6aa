//! Input validation for rostering requests.
//!
//! Checks structural integrity of employees and shifts before the model is
//! built. Detects:
//! - Duplicate IDs
//! - Empty identifiers or skill tags
//! - Negative or non-finite hour caps
//! - Unparseable timestamps and non-positive shift durations
//!
//! A shift whose skill no employee holds is *not* an error: it is simply
//! reported as unassigned.

use std::collections::HashSet;

use crate::duration;
use crate::error::RosterError;
use crate::models::{Employee, Shift};

/// Validation result.
pub type ValidationResult = Result<(), Vec<ValidationError>>;

/// A validation error.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationError {
    /// Error category.
    pub kind: ValidationErrorKind,
    /// Human-readable description.
    pub message: String,
    /// Underlying timestamp error, for [`ValidationErrorKind::MalformedTimestamp`].
    pub timestamp: Option<RosterError>,
}

/// Categories of validation errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationErrorKind {
    /// Two entities share the same ID.
    DuplicateId,
    /// A required string field is empty.
    EmptyField,
    /// An employee's `max_hours` is negative, NaN or infinite.
    InvalidMaxHours,
    /// A shift timestamp is unparseable, or the shift has no positive length.
    MalformedTimestamp,
}

impl ValidationError {
    pub(crate) fn new(kind: ValidationErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            timestamp: None,
        }
    }

    pub(crate) fn from_timestamp(err: RosterError) -> Self {
        Self {
            kind: ValidationErrorKind::MalformedTimestamp,
            message: err.to_string(),
            timestamp: Some(err),
        }
    }
}

/// Validates the input data for a rostering problem.
///
/// Checks:
/// 1. No duplicate employee IDs
/// 2. No duplicate shift IDs
/// 3. No empty employee IDs, shift IDs or required skills
/// 4. Every `max_hours` is finite and non-negative
/// 5. Every shift has parseable timestamps and a positive duration
///
/// # Returns
/// `Ok(())` if all checks pass, `Err(errors)` with all detected issues.
pub fn validate_input(employees: &[Employee], shifts: &[Shift]) -> ValidationResult {
    let mut errors = Vec::new();

    let mut employee_ids = HashSet::new();
    for e in employees {
        if e.id.is_empty() {
            errors.push(ValidationError::new(
                ValidationErrorKind::EmptyField,
                "Employee with empty ID",
            ));
        } else if !employee_ids.insert(e.id.as_str()) {
            errors.push(ValidationError::new(
                ValidationErrorKind::DuplicateId,
                format!("Duplicate employee ID: {}", e.id),
            ));
        }

        if !e.max_hours.is_finite() || e.max_hours < 0.0 {
            errors.push(ValidationError::new(
                ValidationErrorKind::InvalidMaxHours,
                format!("Employee '{}' has invalid max_hours {}", e.id, e.max_hours),
            ));
        }
    }

    let mut shift_ids = HashSet::new();
    for s in shifts {
        if s.id.is_empty() {
            errors.push(ValidationError::new(
                ValidationErrorKind::EmptyField,
                "Shift with empty ID",
            ));
        } else if !shift_ids.insert(s.id.as_str()) {
            errors.push(ValidationError::new(
                ValidationErrorKind::DuplicateId,
                format!("Duplicate shift ID: {}", s.id),
            ));
        }

        if s.required_skill.is_empty() {
            errors.push(ValidationError::new(
                ValidationErrorKind::EmptyField,
                format!("Shift '{}' has an empty required_skill", s.id),
            ));
        }

        if let Err(err) = duration::shift_window(s) {
            errors.push(ValidationError::from_timestamp(err));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
