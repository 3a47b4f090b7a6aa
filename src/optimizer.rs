//! Shift assignment optimizer.
//!
//! # Pipeline
//!
//! 1. Validate employees and shifts.
//! 2. Build the exact model (every coverable shift covered).
//! 3. Solve it with the configured engine under the configured limits.
//! 4. If the engine proves infeasibility, or stops at a limit without any
//!    assignment, re-solve the relaxed model (coverage at most one) according
//!    to [`FallbackPolicy`].
//! 5. Interpret the engine output into an [`OptimizationResponse`].
//!
//! Each call builds its own model; the optimizer keeps no state between
//! calls and can be shared across threads.

use std::time::Instant;

use tracing::{debug, info, instrument, warn};

use crate::config::{FallbackPolicy, OptimizerConfig};
use crate::engine::{
    BranchAndBoundEngine, EngineSolution, EngineStatus, GreedyEngine, SolveLimits, SolverEngine,
};
use crate::error::Result;
use crate::interpret::{interpret, SolveOutcome};
use crate::model::{RosterModel, RosterModelBuilder};
use crate::models::{Employee, OptimizationResponse, ScheduleRequest, Shift, SolveStatus};
use crate::validation::validate_input;

/// Assigns shifts to employees.
///
/// # Example
/// ```
/// use u_roster::{Employee, Shift, ShiftOptimizer};
///
/// let employees = vec![Employee::new("E1", 8.0).with_skill("nurse")];
/// let shifts = vec![Shift::new("S1", "nurse", "2024-03-01T08:00:00", "2024-03-01T12:00:00")];
///
/// let response = ShiftOptimizer::new().optimize(&employees, &shifts).unwrap();
/// assert!(response.success);
/// assert_eq!(response.assignments.len(), 1);
/// assert!(response.unassigned_shifts.is_empty());
/// ```
#[derive(Debug, Clone)]
pub struct ShiftOptimizer<E = BranchAndBoundEngine> {
    engine: E,
    config: OptimizerConfig,
}

impl ShiftOptimizer {
    /// Creates an optimizer with the branch-and-bound engine and default config.
    pub fn new() -> Self {
        Self::with_engine(BranchAndBoundEngine::new())
    }
}

impl Default for ShiftOptimizer {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: SolverEngine> ShiftOptimizer<E> {
    /// Creates an optimizer around a specific engine.
    pub fn with_engine(engine: E) -> Self {
        Self {
            engine,
            config: OptimizerConfig::default(),
        }
    }

    /// Sets the configuration.
    pub fn with_config(mut self, config: OptimizerConfig) -> Self {
        self.config = config;
        self
    }

    /// The configuration.
    pub fn config(&self) -> &OptimizerConfig {
        &self.config
    }

    /// The engine.
    pub fn engine(&self) -> &E {
        &self.engine
    }

    /// Assigns shifts to employees.
    ///
    /// Infeasibility and timeouts are reported through the response status,
    /// never as errors.
    ///
    /// # Errors
    /// - [`RosterError::MalformedTimestamp`](crate::RosterError::MalformedTimestamp)
    ///   for unparseable or non-positive shift times.
    /// - [`RosterError::InvalidInput`](crate::RosterError::InvalidInput) for
    ///   duplicate IDs, empty fields, or bad hour caps.
    /// - [`RosterError::EngineInternal`](crate::RosterError::EngineInternal)
    ///   when the engine breaks its output contract.
    /// - [`RosterError::Config`](crate::RosterError::Config) for an unusable config.
    #[instrument(
        name = "optimize",
        skip_all,
        fields(
            engine = self.engine.name(),
            employees = employees.len(),
            shifts = shifts.len()
        )
    )]
    pub fn optimize(
        &self,
        employees: &[Employee],
        shifts: &[Shift],
    ) -> Result<OptimizationResponse> {
        self.config.validate()?;
        validate_input(employees, shifts)?;

        let model = RosterModelBuilder::new(employees, shifts).build()?;

        let start = Instant::now();
        let limits = self.config.limits_from(start);
        let primary = self.engine.solve(&model, &limits);
        debug!(status = ?primary.status, nodes = primary.nodes, "primary solve finished");

        let mut outcome = SolveOutcome::new(self.engine.name(), primary);
        if needs_fallback(&outcome.primary) {
            if let Some((policy, solution)) = self.fallback(&model, &limits) {
                outcome = outcome.with_fallback(policy, solution);
            }
        }
        let elapsed = start.elapsed();

        let response = interpret(&model, &outcome, elapsed)?;
        match response.status {
            SolveStatus::Optimal | SolveStatus::Feasible => info!(
                status = ?response.status,
                assigned = response.assignments.len(),
                unassigned = response.unassigned_shifts.len(),
                elapsed_ms = response.metrics.optimization_time_ms,
                "optimization finished"
            ),
            _ => warn!(
                status = ?response.status,
                fallback = ?response.fallback,
                assigned = response.assignments.len(),
                unassigned = response.unassigned_shifts.len(),
                elapsed_ms = response.metrics.optimization_time_ms,
                "optimization finished without a proven optimum"
            ),
        }
        Ok(response)
    }

    /// Optimizes a parsed request.
    pub fn optimize_request(&self, request: &ScheduleRequest) -> Result<OptimizationResponse> {
        self.optimize(&request.employees, &request.shifts)
    }

    fn fallback(
        &self,
        model: &RosterModel,
        limits: &SolveLimits,
    ) -> Option<(FallbackPolicy, EngineSolution)> {
        let policy = self.config.fallback;
        let solution = match policy {
            FallbackPolicy::Disabled => return None,
            FallbackPolicy::Relaxed => self.engine.solve(&model.relaxed(), limits),
            FallbackPolicy::Greedy => GreedyEngine::new().solve(&model.relaxed(), limits),
        };
        debug!(?policy, status = ?solution.status, nodes = solution.nodes, "fallback solve finished");
        Some((policy, solution))
    }
}

fn needs_fallback(primary: &EngineSolution) -> bool {
    match primary.status {
        EngineStatus::Infeasible => true,
        EngineStatus::TimedOut => primary.values.is_none(),
        _ => false,
    }
}

/// Assigns shifts to employees with the default engine and configuration.
pub fn optimize(employees: &[Employee], shifts: &[Shift]) -> Result<OptimizationResponse> {
    ShiftOptimizer::new().optimize(employees, shifts)
}
