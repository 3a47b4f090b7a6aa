//! Roster quality metrics (KPIs).
//!
//! Computes staffing indicators from an optimization response and its
//! input employees and shifts.
//!
//! # Metrics
//!
//! | Metric | Definition |
//! |--------|-----------|
//! | Coverage Rate | Assigned shifts / total shifts |
//! | Hours by Employee | Sum of assigned shift durations |
//! | Utilization | Assigned hours / max_hours, per employee |
//! | Avg Utilization | Mean over employees with a positive cap |
//! | Max Utilization | Largest single utilization |

use std::collections::HashMap;

use crate::error::Result;
use crate::models::{Employee, OptimizationResponse, Shift};

/// Roster performance indicators.
///
/// All durations are in hours.
#[derive(Debug, Clone)]
pub struct RosterKpi {
    /// Fraction of shifts with an assignment (0.0..1.0).
    pub coverage_rate: f64,
    /// Number of shifts left open.
    pub unassigned_count: usize,
    /// Total assigned hours.
    pub total_assigned_hours: f64,
    /// Assigned hours per employee, including employees with none.
    pub hours_by_employee: HashMap<String, f64>,
    /// Assigned hours / max_hours per employee. Employees with a zero cap
    /// are left out.
    pub utilization_by_employee: HashMap<String, f64>,
    /// Mean of `utilization_by_employee`.
    pub avg_utilization: f64,
    /// Largest value in `utilization_by_employee`.
    pub max_utilization: f64,
}

impl RosterKpi {
    /// Computes KPIs from a response and its inputs.
    ///
    /// # Arguments
    /// * `response` - The optimization response.
    /// * `employees` - The input employees (for hour caps).
    /// * `shifts` - The input shifts (for durations).
    ///
    /// # Errors
    /// Returns an error if an assigned shift has a malformed time window.
    pub fn calculate(
        response: &OptimizationResponse,
        employees: &[Employee],
        shifts: &[Shift],
    ) -> Result<Self> {
        let shift_by_id: HashMap<&str, &Shift> =
            shifts.iter().map(|s| (s.id.as_str(), s)).collect();

        let mut hours_by_employee: HashMap<String, f64> =
            employees.iter().map(|e| (e.id.clone(), 0.0)).collect();
        let mut total_assigned_hours = 0.0;
        for assignment in &response.assignments {
            let Some(shift) = shift_by_id.get(assignment.shift_id.as_str()) else {
                continue;
            };
            let hours = shift.hours()?;
            total_assigned_hours += hours;
            *hours_by_employee
                .entry(assignment.employee_id.clone())
                .or_insert(0.0) += hours;
        }

        let utilization_by_employee: HashMap<String, f64> = employees
            .iter()
            .filter(|e| e.max_hours > 0.0)
            .map(|e| {
                let assigned = hours_by_employee.get(&e.id).copied().unwrap_or(0.0);
                (e.id.clone(), assigned / e.max_hours)
            })
            .collect();

        let avg_utilization = if utilization_by_employee.is_empty() {
            0.0
        } else {
            let sum: f64 = utilization_by_employee.values().sum();
            sum / utilization_by_employee.len() as f64
        };
        let max_utilization = utilization_by_employee
            .values()
            .copied()
            .fold(0.0, f64::max);

        let covered = shifts.iter().filter(|s| response.is_covered(&s.id)).count();
        let coverage_rate = if shifts.is_empty() {
            1.0
        } else {
            covered as f64 / shifts.len() as f64
        };

        Ok(Self {
            coverage_rate,
            unassigned_count: shifts.len() - covered,
            total_assigned_hours,
            hours_by_employee,
            utilization_by_employee,
            avg_utilization,
            max_utilization,
        })
    }

    /// Whether the roster meets the given quality thresholds.
    pub fn meets_thresholds(&self, min_coverage: f64, max_utilization: f64) -> bool {
        self.coverage_rate >= min_coverage && self.max_utilization <= max_utilization
    }
}
