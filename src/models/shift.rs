//! Shift model.
//!
//! A shift is a single block of work requiring one skill. Timestamps are
//! kept in their wire form (`YYYY-MM-DDTHH:MM:SS`) and parsed by
//! [`crate::duration`] when the model is built, so a malformed value is
//! reported against the shift that carries it.

use serde::{Deserialize, Serialize};

use super::deserialize_id;
use crate::duration::{self, ShiftWindow};
use crate::error::Result;

/// A shift to be covered by at most one employee.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Shift {
    /// Unique shift identifier.
    #[serde(deserialize_with = "deserialize_id")]
    pub id: String,
    /// Skill tag an employee must hold to work this shift.
    pub required_skill: String,
    /// Local start time, `YYYY-MM-DDTHH:MM:SS`.
    pub start_time: String,
    /// Local end time, `YYYY-MM-DDTHH:MM:SS`. Strictly after `start_time`.
    pub end_time: String,
}

impl Shift {
    /// Creates a new shift.
    pub fn new(
        id: impl Into<String>,
        required_skill: impl Into<String>,
        start_time: impl Into<String>,
        end_time: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            required_skill: required_skill.into(),
            start_time: start_time.into(),
            end_time: end_time.into(),
        }
    }

    /// Parses the shift's timestamps into a [`ShiftWindow`].
    pub fn window(&self) -> Result<ShiftWindow> {
        duration::shift_window(self)
    }

    /// Duration in hours.
    pub fn hours(&self) -> Result<f64> {
        duration::shift_hours(self)
    }
}
