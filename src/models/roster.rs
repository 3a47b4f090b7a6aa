//! Roster (solution) model.
//!
//! The response of one optimization: employee/shift assignments, the shifts
//! left uncovered, and solve metrics. Every input shift appears exactly once,
//! either as the `shift_id` of an assignment or in `unassigned_shifts`.

use serde::{Deserialize, Serialize};

use crate::config::FallbackPolicy;

/// Descriptive names of the hard constraints the model enforces.
pub const CONSTRAINTS_APPLIED: [&str; 3] = ["skill_matching", "max_hours", "one_shift_per_day"];

/// An employee-shift assignment.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Assignment {
    /// Assigned employee ID.
    pub employee_id: String,
    /// Covered shift ID.
    pub shift_id: String,
}

impl Assignment {
    /// Creates a new assignment.
    pub fn new(employee_id: impl Into<String>, shift_id: impl Into<String>) -> Self {
        Self {
            employee_id: employee_id.into(),
            shift_id: shift_id.into(),
        }
    }
}

/// Outcome of a solve as seen by the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SolveStatus {
    /// Every coverable shift is covered and optimality is proven.
    Optimal,
    /// A valid assignment that is not proven optimal (e.g. the time limit hit).
    Feasible,
    /// No assignment covers every coverable shift; assignments, if any, come from a fallback.
    Infeasible,
    /// The time limit expired before any assignment was found.
    Timeout,
    /// The engine faulted.
    EngineError,
}

impl SolveStatus {
    /// Whether the status counts as a successful solve.
    #[inline]
    pub fn is_success(self) -> bool {
        self == SolveStatus::Optimal
    }
}

/// Solve metrics.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Metrics {
    /// Reserved for overtime pricing; always 0.
    pub total_overtime_minutes: f64,
    /// Reserved for soft constraints; always 0.
    pub constraint_violations: u32,
    /// Wall-clock time spent in the engine (ms), measured by the optimizer.
    pub optimization_time_ms: f64,
    /// Objective value reported by the engine (shifts covered).
    pub objective_value: f64,
}

/// Full optimization response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptimizationResponse {
    /// `true` iff the engine proved the exact model optimal.
    pub success: bool,
    /// Detailed outcome.
    pub status: SolveStatus,
    /// Employee-shift assignments.
    pub assignments: Vec<Assignment>,
    /// Shift IDs not covered by any assignment, in input order.
    pub unassigned_shifts: Vec<String>,
    /// Solve metrics.
    pub metrics: Metrics,
    /// Names of the constraints enforced by the model.
    pub constraints_applied: Vec<String>,
    /// Set when the assignments came from a fallback re-solve.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fallback: Option<FallbackPolicy>,
}

impl OptimizationResponse {
    /// Creates a response with no assignments.
    pub fn new(status: SolveStatus) -> Self {
        Self {
            success: status.is_success(),
            status,
            assignments: Vec::new(),
            unassigned_shifts: Vec::new(),
            metrics: Metrics::default(),
            constraints_applied: CONSTRAINTS_APPLIED.iter().map(|s| s.to_string()).collect(),
            fallback: None,
        }
    }

    /// Finds the assignment covering a shift.
    pub fn assignment_for_shift(&self, shift_id: &str) -> Option<&Assignment> {
        self.assignments.iter().find(|a| a.shift_id == shift_id)
    }

    /// Returns all assignments of an employee.
    pub fn assignments_for_employee(&self, employee_id: &str) -> Vec<&Assignment> {
        self.assignments
            .iter()
            .filter(|a| a.employee_id == employee_id)
            .collect()
    }

    /// Whether a shift is covered.
    pub fn is_covered(&self, shift_id: &str) -> bool {
        self.assignment_for_shift(shift_id).is_some()
    }

    /// Number of covered shifts.
    pub fn assignment_count(&self) -> usize {
        self.assignments.len()
    }
}
