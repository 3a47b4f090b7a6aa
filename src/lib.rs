//! Shift rostering for the U-Engine ecosystem.
//!
//! Assigns shifts to employees so that as many shifts as possible are
//! covered, subject to skill eligibility, per-employee hour caps, and at most
//! one shift per employee per calendar day. The problem is modelled as a
//! binary program and handed to a pluggable engine.
//!
//! # Modules
//!
//! - **`models`**: Domain types: `Employee`, `Shift`, `Assignment`,
//!   `ScheduleRequest`, `OptimizationResponse`
//! - **`duration`**: Shift length in hours and calendar day from timestamps
//! - **`validation`**: Input integrity checks (duplicate IDs, empty fields, hour caps, timestamps)
//! - **`model`**: Binary program construction (variables, coverage, hour cap, daily exclusivity)
//! - **`engine`**: `SolverEngine` trait, branch-and-bound and greedy engines
//! - **`interpret`**: Engine output → response
//! - **`optimizer`**: `ShiftOptimizer`, the end-to-end pipeline
//! - **`kpi`**: Coverage and utilization indicators
//! - **`config`**, **`logging`**, **`error`**: Ambient plumbing
//!
//! # Example
//!
//! ```
//! use u_roster::{Employee, Shift, ShiftOptimizer, SolveStatus};
//!
//! let employees = vec![
//!     Employee::new("E1", 8.0).with_skill("nurse"),
//!     Employee::new("E2", 8.0).with_skill("nurse"),
//! ];
//! let shifts = vec![
//!     Shift::new("S1", "nurse", "2024-03-01T08:00:00", "2024-03-01T16:00:00"),
//!     Shift::new("S2", "nurse", "2024-03-01T16:00:00", "2024-03-01T23:00:00"),
//! ];
//!
//! let response = ShiftOptimizer::new().optimize(&employees, &shifts).unwrap();
//! assert_eq!(response.status, SolveStatus::Optimal);
//! assert_eq!(response.assignments.len(), 2);
//! ```
//!
//! # References
//!
//! - Ernst et al. (2004), "Staff scheduling and rostering: A review of applications, methods and models"
//! - Wolsey (1998), "Integer Programming", Ch. 7: Branch and Bound

pub mod config;
pub mod duration;
pub mod engine;
pub mod error;
pub mod interpret;
pub mod kpi;
pub mod logging;
pub mod model;
pub mod models;
pub mod optimizer;
pub mod validation;

pub use config::{FallbackPolicy, OptimizerConfig};
pub use engine::{BranchAndBoundEngine, EngineSolution, EngineStatus, GreedyEngine, SolverEngine};
pub use error::{Result, RosterError};
pub use kpi::RosterKpi;
pub use models::{
    Assignment, Employee, Metrics, OptimizationResponse, ScheduleRequest, Shift, SolveStatus,
};
pub use optimizer::{optimize, ShiftOptimizer};
