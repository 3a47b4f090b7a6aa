//! Engine output interpretation.
//!
//! Turns variable values back into [`Assignment`]s and assembles the
//! response. Unassigned shifts are computed by set difference over the input
//! shift IDs, so shifts pruned at model-build time and shifts the engine left
//! open are reported the same way.
//!
//! # Status mapping
//!
//! | Engine | Values | Response status | Assignments from |
//! |--------|--------|-----------------|------------------|
//! | Optimal | yes | `optimal` | engine |
//! | Feasible | yes | `feasible` | engine |
//! | TimedOut | yes | `feasible` | incumbent |
//! | TimedOut | no | `timeout` | fallback, if any |
//! | Infeasible | – | `infeasible` | fallback, if any |
//! | Unbounded / Error | – | `engine_error` | none |

use std::collections::HashSet;
use std::time::Duration;

use tracing::warn;

use crate::config::FallbackPolicy;
use crate::engine::{EngineSolution, EngineStatus};
use crate::error::{Result, RosterError};
use crate::model::RosterModel;
use crate::models::{Assignment, OptimizationResponse, SolveStatus};

/// Everything the engine produced for one request.
#[derive(Debug, Clone)]
pub struct SolveOutcome {
    /// Name of the engine that solved the exact model.
    pub engine: String,
    /// Result on the exact model.
    pub primary: EngineSolution,
    /// Result of the fallback re-solve on the relaxed model, if one ran.
    pub fallback: Option<(FallbackPolicy, EngineSolution)>,
}

impl SolveOutcome {
    /// An outcome without fallback.
    pub fn new(engine: impl Into<String>, primary: EngineSolution) -> Self {
        Self {
            engine: engine.into(),
            primary,
            fallback: None,
        }
    }

    /// Attaches a fallback result.
    pub fn with_fallback(mut self, policy: FallbackPolicy, solution: EngineSolution) -> Self {
        self.fallback = Some((policy, solution));
        self
    }
}

/// Builds the response for a solved model.
///
/// `elapsed` is the wall-clock time the optimizer measured around the
/// engine call(s).
///
/// # Errors
/// [`RosterError::EngineInternal`] if the engine returned a value vector of
/// the wrong length, or values that violate the model while claiming
/// optimality or feasibility.
pub fn interpret(
    model: &RosterModel,
    outcome: &SolveOutcome,
    elapsed: Duration,
) -> Result<OptimizationResponse> {
    let primary = &outcome.primary;
    let (status, chosen, fallback) = match (&primary.status, &primary.values) {
        (EngineStatus::Optimal, Some(_)) => (SolveStatus::Optimal, Some(primary), None),
        (EngineStatus::Feasible, Some(_)) | (EngineStatus::TimedOut, Some(_)) => {
            (SolveStatus::Feasible, Some(primary), None)
        }
        (EngineStatus::TimedOut, None) => with_fallback(SolveStatus::Timeout, outcome),
        (EngineStatus::Infeasible, _) => with_fallback(SolveStatus::Infeasible, outcome),
        (EngineStatus::Optimal, None) | (EngineStatus::Feasible, None) => {
            return Err(engine_fault(outcome, "reported a solution without values"));
        }
        (EngineStatus::Unbounded, _) => {
            warn!(engine = %outcome.engine, "engine reported an unbounded binary program");
            (SolveStatus::EngineError, None, None)
        }
        (EngineStatus::Error(message), _) => {
            warn!(engine = %outcome.engine, %message, "engine fault");
            (SolveStatus::EngineError, None, None)
        }
    };

    let mut response = OptimizationResponse::new(status);
    response.fallback = fallback;
    response.metrics.optimization_time_ms = elapsed.as_secs_f64() * 1000.0;

    if let Some(solution) = chosen {
        let values = solution.values.as_deref().unwrap_or_default();
        check_values(model, outcome, values, fallback.is_some())?;

        response.assignments = model
            .variables()
            .iter()
            .zip(values)
            .filter(|(_, &on)| on)
            .map(|(var, _)| Assignment::new(&var.key.employee_id, &var.key.shift_id))
            .collect();
        response.metrics.objective_value = solution
            .objective_value
            .unwrap_or_else(|| model.objective_value(values));
    }

    let covered: HashSet<&str> = response
        .assignments
        .iter()
        .map(|a| a.shift_id.as_str())
        .collect();
    response.unassigned_shifts = model
        .shift_ids()
        .iter()
        .filter(|id| !covered.contains(id.as_str()))
        .cloned()
        .collect();

    Ok(response)
}

fn with_fallback(
    status: SolveStatus,
    outcome: &SolveOutcome,
) -> (SolveStatus, Option<&EngineSolution>, Option<FallbackPolicy>) {
    match &outcome.fallback {
        Some((policy, solution)) if solution.values.is_some() => {
            (status, Some(solution), Some(*policy))
        }
        _ => (status, None, None),
    }
}

/// Primary values must satisfy the exact model. Fallback values come from
/// the relaxed model and only need at-most-one coverage.
fn check_values(
    model: &RosterModel,
    outcome: &SolveOutcome,
    values: &[bool],
    relaxed: bool,
) -> Result<()> {
    if values.len() != model.num_variables() {
        return Err(engine_fault(
            outcome,
            &format!(
                "returned {} values for {} variables",
                values.len(),
                model.num_variables()
            ),
        ));
    }
    let feasible = if relaxed {
        model.is_feasible_relaxed(values)
    } else {
        model.is_feasible(values)
    };
    if !feasible {
        return Err(engine_fault(outcome, "returned values that violate the model"));
    }
    Ok(())
}

fn engine_fault(outcome: &SolveOutcome, message: &str) -> RosterError {
    RosterError::EngineInternal {
        engine: outcome.engine.clone(),
        message: message.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::RosterModelBuilder;
    use crate::models::{Employee, Shift};

    fn make_model() -> RosterModel {
        let employees = vec![
            Employee::new("E1", 8.0).with_skill("nurse"),
            Employee::new("E2", 8.0).with_skill("nurse"),
        ];
        let shifts = vec![
            Shift::new("S1", "nurse", "2024-03-01T08:00:00", "2024-03-01T16:00:00"),
            Shift::new("S2", "surgeon", "2024-03-01T08:00:00", "2024-03-01T16:00:00"),
            Shift::new("S3", "nurse", "2024-03-02T08:00:00", "2024-03-02T16:00:00"),
        ];
        RosterModelBuilder::new(&employees, &shifts).build().unwrap()
    }

    fn values_for(model: &RosterModel, pairs: &[(&str, &str)]) -> Vec<bool> {
        let mut values = vec![false; model.num_variables()];
        for (e, s) in pairs {
            values[model.var_id(e, s).unwrap()] = true;
        }
        values
    }

    #[test]
    fn test_optimal_solution() {
        let model = make_model();
        let values = values_for(&model, &[("E1", "S1"), ("E2", "S3")]);
        let outcome = SolveOutcome::new("fake", EngineSolution::optimal(values, 2.0, 10));
        let r = interpret(&model, &outcome, Duration::from_millis(5)).unwrap();

        assert!(r.success);
        assert_eq!(r.status, SolveStatus::Optimal);
        assert_eq!(
            r.assignments,
            vec![Assignment::new("E1", "S1"), Assignment::new("E2", "S3")]
        );
        // S2 was pruned at build time and still shows up.
        assert_eq!(r.unassigned_shifts, vec!["S2".to_string()]);
        assert!((r.metrics.objective_value - 2.0).abs() < 1e-10);
        assert!((r.metrics.optimization_time_ms - 5.0).abs() < 1e-6);
        assert_eq!(r.metrics.constraint_violations, 0);
        assert!(r.fallback.is_none());
    }

    #[test]
    fn test_timed_out_with_incumbent_is_feasible() {
        let model = make_model();
        let values = values_for(&model, &[("E1", "S1"), ("E2", "S3")]);
        let outcome = SolveOutcome::new(
            "fake",
            EngineSolution::timed_out(Some((values, 2.0)), 99),
        );
        let r = interpret(&model, &outcome, Duration::ZERO).unwrap();
        assert!(!r.success);
        assert_eq!(r.status, SolveStatus::Feasible);
        assert_eq!(r.assignments.len(), 2);
        assert_eq!(r.unassigned_shifts, vec!["S2".to_string()]);
    }

    #[test]
    fn test_timed_out_without_incumbent() {
        let model = make_model();
        let outcome = SolveOutcome::new("fake", EngineSolution::timed_out(None, 99));
        let r = interpret(&model, &outcome, Duration::ZERO).unwrap();
        assert_eq!(r.status, SolveStatus::Timeout);
        assert!(r.assignments.is_empty());
        assert_eq!(r.unassigned_shifts.len(), 3);
        assert_eq!(r.metrics.objective_value, 0.0);
    }

    #[test]
    fn test_infeasible_without_fallback_reports_everything_unassigned() {
        let model = make_model();
        let outcome = SolveOutcome::new("fake", EngineSolution::infeasible(3));
        let r = interpret(&model, &outcome, Duration::ZERO).unwrap();
        assert!(!r.success);
        assert_eq!(r.status, SolveStatus::Infeasible);
        assert!(r.assignments.is_empty());
        assert_eq!(r.unassigned_shifts, model.shift_ids().to_vec());
    }

    #[test]
    fn test_infeasible_with_fallback_assignments() {
        let model = make_model();
        let values = values_for(&model, &[("E2", "S1")]);
        let outcome = SolveOutcome::new("fake", EngineSolution::infeasible(3))
            .with_fallback(FallbackPolicy::Greedy, EngineSolution::feasible(values, 1.0, 1));
        let r = interpret(&model, &outcome, Duration::ZERO).unwrap();
        assert!(!r.success);
        assert_eq!(r.status, SolveStatus::Infeasible);
        assert_eq!(r.fallback, Some(FallbackPolicy::Greedy));
        assert_eq!(r.assignments, vec![Assignment::new("E2", "S1")]);
        assert_eq!(r.unassigned_shifts, vec!["S2".to_string(), "S3".to_string()]);
    }

    #[test]
    fn test_unbounded_and_error_are_engine_errors() {
        let model = make_model();
        let mut unbounded = EngineSolution::infeasible(0);
        unbounded.status = EngineStatus::Unbounded;
        let r = interpret(&model, &SolveOutcome::new("fake", unbounded), Duration::ZERO).unwrap();
        assert_eq!(r.status, SolveStatus::EngineError);
        assert!(!r.success);

        let r = interpret(
            &model,
            &SolveOutcome::new("fake", EngineSolution::error("license expired")),
            Duration::ZERO,
        )
        .unwrap();
        assert_eq!(r.status, SolveStatus::EngineError);
        assert_eq!(r.unassigned_shifts.len(), 3);
    }

    #[test]
    fn test_wrong_value_count_is_engine_fault() {
        let model = make_model();
        let outcome = SolveOutcome::new("fake", EngineSolution::optimal(vec![true], 1.0, 1));
        let err = interpret(&model, &outcome, Duration::ZERO).unwrap_err();
        assert!(matches!(err, RosterError::EngineInternal { ref engine, .. } if engine == "fake"));
    }

    #[test]
    fn test_violating_values_are_engine_fault() {
        let model = make_model();
        // Two employees on one shift.
        let values = values_for(&model, &[("E1", "S1"), ("E2", "S1")]);
        let outcome = SolveOutcome::new("fake", EngineSolution::optimal(values, 2.0, 1));
        assert!(interpret(&model, &outcome, Duration::ZERO).is_err());
    }

    #[test]
    fn test_primary_values_must_cover_every_coverable_shift() {
        let model = make_model();
        // S3 is coverable but left open.
        let values = values_for(&model, &[("E1", "S1")]);
        let outcome = SolveOutcome::new("fake", EngineSolution::optimal(values.clone(), 1.0, 1));
        let err = interpret(&model, &outcome, Duration::ZERO).unwrap_err();
        assert!(matches!(err, RosterError::EngineInternal { .. }));

        let outcome = SolveOutcome::new("fake", EngineSolution::optimal(vec![false; model.num_variables()], 0.0, 1));
        assert!(interpret(&model, &outcome, Duration::ZERO).is_err());

        // The same values are fine as a fallback roster.
        let outcome = SolveOutcome::new("fake", EngineSolution::infeasible(1))
            .with_fallback(FallbackPolicy::Relaxed, EngineSolution::optimal(values, 1.0, 1));
        let r = interpret(&model, &outcome, Duration::ZERO).unwrap();
        assert_eq!(r.assignments, vec![Assignment::new("E1", "S1")]);
    }

    #[test]
    fn test_timeout_with_fallback_roster() {
        let model = make_model();
        let values = values_for(&model, &[("E2", "S3")]);
        let outcome = SolveOutcome::new("fake", EngineSolution::timed_out(None, 5))
            .with_fallback(FallbackPolicy::Relaxed, EngineSolution::timed_out(Some((values, 1.0)), 1));
        let r = interpret(&model, &outcome, Duration::ZERO).unwrap();
        assert!(!r.success);
        assert_eq!(r.status, SolveStatus::Timeout);
        assert_eq!(r.fallback, Some(FallbackPolicy::Relaxed));
        assert_eq!(r.assignments, vec![Assignment::new("E2", "S3")]);
        assert_eq!(r.unassigned_shifts, vec!["S1".to_string(), "S2".to_string()]);
    }

    #[test]
    fn test_claimed_solution_without_values_is_engine_fault() {
        let model = make_model();
        let mut broken = EngineSolution::infeasible(0);
        broken.status = EngineStatus::Optimal;
        assert!(interpret(&model, &SolveOutcome::new("fake", broken), Duration::ZERO).is_err());
    }
}
