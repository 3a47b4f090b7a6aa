//! Scheduling request.

use serde::{Deserialize, Serialize};

use super::{Employee, Shift};
use crate::error::Result;

/// Input container for one optimization.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScheduleRequest {
    /// Employees available for the horizon.
    pub employees: Vec<Employee>,
    /// Shifts to cover.
    pub shifts: Vec<Shift>,
}

impl ScheduleRequest {
    /// Creates a new request.
    pub fn new(employees: Vec<Employee>, shifts: Vec<Shift>) -> Self {
        Self { employees, shifts }
    }

    /// Parses a request document. Missing or mistyped fields are reported as
    /// [`RosterError::InvalidInput`](crate::RosterError::InvalidInput).
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}
