//! Most-constrained-first greedy engine.
//!
//! # Algorithm
//!
//! 1. Order coverage rows (shifts) by number of eligible employees,
//!    ascending; ties keep model order.
//! 2. For each shift, pick the eligible variable that keeps every row within
//!    its right-hand side and leaves the most slack on the employee's hour
//!    cap; ties go to the lower variable index.
//!
//! Coverage rows are treated as at-most-one while building. The result is
//! `Feasible` if it satisfies every row of the model as given, otherwise
//! `Infeasible`. Optimality is never claimed.
//!
//! # Complexity
//! O(s log s + v · r) where s = shifts, v = variables, r = rows per variable.

use super::{EngineSolution, SolveLimits, SolverEngine};
use crate::model::{ConstraintKind, RosterModel};

/// Greedy heuristic engine.
#[derive(Debug, Clone, Copy, Default)]
pub struct GreedyEngine;

impl GreedyEngine {
    /// Creates the engine.
    pub fn new() -> Self {
        Self
    }
}

impl SolverEngine for GreedyEngine {
    fn name(&self) -> &str {
        "greedy"
    }

    fn solve(&self, model: &RosterModel, _limits: &SolveLimits) -> EngineSolution {
        let rows = model.constraints();
        let mut values = vec![false; model.num_variables()];
        let mut lhs = vec![0.0; rows.len()];
        let mut nodes = 0u64;

        let mut order: Vec<usize> = rows
            .iter()
            .enumerate()
            .filter(|(_, r)| r.kind == ConstraintKind::Coverage)
            .map(|(ci, _)| ci)
            .collect();
        order.sort_by_key(|&ci| rows[ci].terms.len());

        for ci in order {
            let mut choice: Option<(usize, f64)> = None;
            for &(var, _) in &rows[ci].terms {
                nodes += 1;
                if !model.fits(&lhs, var) {
                    continue;
                }
                let slack = hour_slack(model, &lhs, var);
                if choice.map_or(true, |(_, best)| slack > best) {
                    choice = Some((var, slack));
                }
            }
            if let Some((var, _)) = choice {
                take(model, &mut values, &mut lhs, var);
            }
        }

        if model.is_feasible(&values) {
            let objective = model.objective_value(&values);
            EngineSolution::feasible(values, objective, nodes)
        } else {
            EngineSolution::infeasible(nodes)
        }
    }
}

fn hour_slack(model: &RosterModel, lhs: &[f64], var: usize) -> f64 {
    let rows = model.constraints();
    model
        .constraints_of(var)
        .iter()
        .filter(|&&(ci, _)| rows[ci].kind == ConstraintKind::MaxHours)
        .map(|&(ci, a)| rows[ci].rhs - lhs[ci] - a)
        .fold(f64::INFINITY, f64::min)
}

fn take(model: &RosterModel, values: &mut [bool], lhs: &mut [f64], var: usize) {
    values[var] = true;
    for &(ci, a) in model.constraints_of(var) {
        lhs[ci] += a;
    }
}
