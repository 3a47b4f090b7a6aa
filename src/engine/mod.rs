//! Optimization engines.
//!
//! An engine takes a [`RosterModel`] and returns a status plus a value for
//! every decision variable. The optimizer only talks to engines through
//! [`SolverEngine`], so an external MILP solver, a commercial solver, or a
//! custom matching algorithm can be swapped in without touching the model
//! builder or the interpreter.
//!
//! # Engines
//!
//! - [`BranchAndBoundEngine`]: exact depth-first branch and bound for
//!   binary programs. Proves optimality or infeasibility.
//! - [`GreedyEngine`]: most-constrained-shift-first heuristic. Fast, never
//!   proves optimality.

mod bnb;
mod greedy;

use std::sync::Arc;
use std::time::Instant;

pub use bnb::BranchAndBoundEngine;
pub use greedy::GreedyEngine;

use crate::model::RosterModel;

/// Limits an engine must honour cooperatively.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SolveLimits {
    /// Abandon the search once this instant has passed.
    pub deadline: Option<Instant>,
    /// Abandon the search after this many nodes.
    pub node_limit: Option<u64>,
    /// Nodes between clock checks.
    pub check_interval: u64,
}

impl SolveLimits {
    /// No limits.
    pub fn unlimited() -> Self {
        Self {
            deadline: None,
            node_limit: None,
            check_interval: 1_024,
        }
    }

    /// Whether the deadline has passed.
    pub fn deadline_passed(&self) -> bool {
        self.deadline.is_some_and(|d| Instant::now() >= d)
    }
}

impl Default for SolveLimits {
    fn default() -> Self {
        Self::unlimited()
    }
}

/// Engine-reported outcome.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineStatus {
    /// Values are provably optimal.
    Optimal,
    /// Values satisfy every row but are not proven optimal.
    Feasible,
    /// No assignment satisfies every row.
    Infeasible,
    /// The objective is unbounded. Impossible for a binary program; treated as a fault.
    Unbounded,
    /// A limit stopped the search. Values hold the best incumbent, if any.
    TimedOut,
    /// The engine faulted.
    Error(String),
}

/// Result of one engine call.
#[derive(Debug, Clone, PartialEq)]
pub struct EngineSolution {
    /// Outcome.
    pub status: EngineStatus,
    /// One value per model variable, when an assignment is available.
    pub values: Option<Vec<bool>>,
    /// Objective of `values`, as computed by the engine.
    pub objective_value: Option<f64>,
    /// Search nodes explored.
    pub nodes: u64,
}

impl EngineSolution {
    /// A proven-optimal solution.
    pub fn optimal(values: Vec<bool>, objective_value: f64, nodes: u64) -> Self {
        Self {
            status: EngineStatus::Optimal,
            values: Some(values),
            objective_value: Some(objective_value),
            nodes,
        }
    }

    /// A feasible solution without an optimality proof.
    pub fn feasible(values: Vec<bool>, objective_value: f64, nodes: u64) -> Self {
        Self {
            status: EngineStatus::Feasible,
            values: Some(values),
            objective_value: Some(objective_value),
            nodes,
        }
    }

    /// Proven infeasibility.
    pub fn infeasible(nodes: u64) -> Self {
        Self {
            status: EngineStatus::Infeasible,
            values: None,
            objective_value: None,
            nodes,
        }
    }

    /// A search stopped by a limit, with its best incumbent.
    pub fn timed_out(incumbent: Option<(Vec<bool>, f64)>, nodes: u64) -> Self {
        let (values, objective_value) = match incumbent {
            Some((v, obj)) => (Some(v), Some(obj)),
            None => (None, None),
        };
        Self {
            status: EngineStatus::TimedOut,
            values,
            objective_value,
            nodes,
        }
    }

    /// An engine fault.
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            status: EngineStatus::Error(message.into()),
            values: None,
            objective_value: None,
            nodes: 0,
        }
    }
}

/// A pluggable optimization engine.
///
/// Implementations must treat the model as read-only and keep no state
/// between calls; one engine may serve concurrent solves.
pub trait SolverEngine: Send + Sync {
    /// Short engine name for logs and error messages.
    fn name(&self) -> &str;

    /// Maximizes the model's objective subject to its rows.
    fn solve(&self, model: &RosterModel, limits: &SolveLimits) -> EngineSolution;
}

impl<E: SolverEngine + ?Sized> SolverEngine for Box<E> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn solve(&self, model: &RosterModel, limits: &SolveLimits) -> EngineSolution {
        (**self).solve(model, limits)
    }
}

impl<E: SolverEngine + ?Sized> SolverEngine for Arc<E> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn solve(&self, model: &RosterModel, limits: &SolveLimits) -> EngineSolution {
        (**self).solve(model, limits)
    }
}

impl<E: SolverEngine + ?Sized> SolverEngine for &E {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn solve(&self, model: &RosterModel, limits: &SolveLimits) -> EngineSolution {
        (**self).solve(model, limits)
    }
}
