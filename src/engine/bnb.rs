//! Depth-first branch and bound for binary rostering programs.
//!
//! # Algorithm
//!
//! Variables are decided in model order (shift-major), trying 1 before 0.
//! Each row keeps its current left-hand side and the sum of coefficients of
//! its undecided variables, so both branches are checked in O(rows of var):
//!
//! - setting `x = 1` is refused if any row would exceed its right-hand side;
//! - setting `x = 0` is refused if an equality row could no longer reach its
//!   right-hand side.
//!
//! # Bound
//!
//! Each further assignment covers one still-open shift and uses one
//! employee. Among the undecided variables that still fit, an employee can
//! take no more shifts than the smallest of:
//!
//! - its fitting variables,
//! - the distinct days those variables fall on,
//! - `⌊hour slack / shortest fitting shift⌋`.
//!
//! The remaining gain is the smaller of the open shifts and the summed
//! employee capacities. A node is pruned when `objective + gain` cannot beat
//! the incumbent, or, on an exact model, cannot reach full coverage (every
//! exact solution covers every coverage row).
//!
//! On a relaxed model the search starts from the greedy roster, so a search
//! stopped by a limit still returns an assignment.
//!
//! The search is iterative, so depth is bounded by memory rather than the
//! call stack.
//!
//! # Reference
//! Land & Doig (1960), "An Automatic Method of Solving Discrete Programming Problems"

use tracing::trace;

use super::{EngineSolution, GreedyEngine, SolveLimits, SolverEngine};
use crate::model::{ConstraintKind, CoverageMode, RosterModel, Sense, FEASIBILITY_EPS};

/// Exact branch-and-bound engine.
#[derive(Debug, Clone, Copy, Default)]
pub struct BranchAndBoundEngine;

impl BranchAndBoundEngine {
    /// Creates the engine.
    pub fn new() -> Self {
        Self
    }
}

impl SolverEngine for BranchAndBoundEngine {
    fn name(&self) -> &str {
        "branch_and_bound"
    }

    fn solve(&self, model: &RosterModel, limits: &SolveLimits) -> EngineSolution {
        Search::new(model, limits).run()
    }
}

/// Branching state: 0 = fresh, 1 = tried 1, 2 = exhausted.
type Tried = u8;

/// Scratch space for the per-employee capacity bound.
struct Capacity {
    fitting: Vec<usize>,
    days: Vec<usize>,
    shortest: Vec<f64>,
    slack: Vec<f64>,
    seen: Vec<u64>,
    stamp: u64,
}

impl Capacity {
    fn new(employees: usize, rows: usize) -> Self {
        Self {
            fitting: vec![0; employees],
            days: vec![0; employees],
            shortest: vec![f64::INFINITY; employees],
            slack: vec![f64::INFINITY; employees],
            seen: vec![0; rows],
            stamp: 0,
        }
    }

    fn reset(&mut self) {
        self.fitting.fill(0);
        self.days.fill(0);
        self.shortest.fill(f64::INFINITY);
        self.slack.fill(f64::INFINITY);
        self.stamp += 1;
    }

    /// Marks a row for the current node. `false` if it was already marked.
    fn mark(&mut self, row: usize) -> bool {
        if self.seen[row] == self.stamp {
            return false;
        }
        self.seen[row] = self.stamp;
        true
    }

    fn total(&self) -> usize {
        (0..self.fitting.len())
            .map(|e| {
                let cap = self.fitting[e].min(self.days[e]);
                if self.slack[e].is_finite() && self.shortest[e] > 0.0 {
                    let by_hours = ((self.slack[e] + FEASIBILITY_EPS) / self.shortest[e]).floor();
                    cap.min(by_hours.max(0.0) as usize)
                } else {
                    cap
                }
            })
            .sum()
    }
}

struct Search<'m> {
    model: &'m RosterModel,
    limits: SolveLimits,
    values: Vec<bool>,
    lhs: Vec<f64>,
    potential: Vec<f64>,
    hours_row: Vec<Option<usize>>,
    day_row: Vec<Option<usize>>,
    exact: bool,
    target: usize,
    capacity: Capacity,
    objective: usize,
    best: Option<(Vec<bool>, usize)>,
    nodes: u64,
}

impl<'m> Search<'m> {
    fn new(model: &'m RosterModel, limits: &SolveLimits) -> Self {
        let rows = model.constraints();
        let n = model.num_variables();
        let potential = rows
            .iter()
            .map(|r| r.terms.iter().map(|(_, a)| *a).sum())
            .collect();

        let mut hours_row = vec![None; n];
        let mut day_row = vec![None; n];
        for v in 0..n {
            for &(ci, _) in model.constraints_of(v) {
                match rows[ci].kind {
                    ConstraintKind::MaxHours => hours_row[v] = Some(ci),
                    ConstraintKind::OneShiftPerDay => day_row[v] = Some(ci),
                    ConstraintKind::Coverage => {}
                }
            }
        }
        let employees = model
            .variables()
            .iter()
            .map(|v| v.employee + 1)
            .max()
            .unwrap_or(0);

        Self {
            model,
            limits: *limits,
            values: vec![false; n],
            lhs: vec![0.0; rows.len()],
            potential,
            hours_row,
            day_row,
            exact: model.coverage_mode() == CoverageMode::Exact,
            target: model.constraints_of_kind(ConstraintKind::Coverage).count(),
            capacity: Capacity::new(employees, rows.len()),
            objective: 0,
            best: None,
            nodes: 0,
        }
    }

    fn run(mut self) -> EngineSolution {
        if !self.equalities_reachable() {
            return EngineSolution::infeasible(0);
        }
        if !self.exact {
            self.seed();
        }

        let n = self.model.num_variables();
        let mut tried: Vec<Tried> = vec![0; n + 1];
        let mut depth = 0usize;

        loop {
            if tried[depth] == 0 {
                self.nodes += 1;
                if let Some(reason) = self.limit_reached() {
                    trace!(nodes = self.nodes, reason, "search abandoned");
                    return self.abandon();
                }
                if depth == n {
                    self.record_incumbent();
                    tried[depth] = 2;
                } else if self.pruned(depth) {
                    tried[depth] = 2;
                }
            }

            if depth < n && tried[depth] < 2 {
                let value = tried[depth] == 0;
                tried[depth] += 1;
                if self.can_assign(depth, value) {
                    self.assign(depth, value);
                    depth += 1;
                }
                continue;
            }

            tried[depth] = 0;
            if depth == 0 {
                break;
            }
            depth -= 1;
            self.unassign(depth);
        }

        match self.best {
            Some((values, obj)) => EngineSolution::optimal(values, obj as f64, self.nodes),
            None => EngineSolution::infeasible(self.nodes),
        }
    }

    fn equalities_reachable(&self) -> bool {
        self.model
            .constraints()
            .iter()
            .zip(&self.potential)
            .all(|(row, &p)| row.sense != Sense::Equal || p >= row.rhs - FEASIBILITY_EPS)
    }

    /// Starts a relaxed search from the greedy roster.
    fn seed(&mut self) {
        let greedy = GreedyEngine::new().solve(self.model, &SolveLimits::unlimited());
        if let Some(values) = greedy.values {
            let objective = values.iter().filter(|&&v| v).count();
            trace!(objective, "seeded incumbent");
            self.best = Some((values, objective));
        }
    }

    fn limit_reached(&self) -> Option<&'static str> {
        if self.limits.node_limit.is_some_and(|limit| self.nodes > limit) {
            return Some("node limit");
        }
        let interval = self.limits.check_interval.max(1);
        if (self.nodes == 1 || self.nodes % interval == 0) && self.limits.deadline_passed() {
            return Some("time limit");
        }
        None
    }

    fn abandon(self) -> EngineSolution {
        let incumbent = self.best.map(|(values, obj)| (values, obj as f64));
        EngineSolution::timed_out(incumbent, self.nodes)
    }

    fn pruned(&mut self, depth: usize) -> bool {
        let bound = self.objective + self.remaining_gain(depth);
        if self.exact && bound < self.target {
            return true;
        }
        self.best.as_ref().is_some_and(|(_, best)| bound <= *best)
    }

    /// Upper bound on how many more variables can be set to 1 below `depth`.
    fn remaining_gain(&mut self, depth: usize) -> usize {
        let model = self.model;
        let rows = model.constraints();
        let capacity = &mut self.capacity;
        capacity.reset();

        let mut open = 0;
        for v in depth..model.num_variables() {
            if !model.fits(&self.lhs, v) {
                continue;
            }
            let var = model.variable(v);
            let e = var.employee;
            capacity.fitting[e] += 1;
            capacity.shortest[e] = capacity.shortest[e].min(var.hours);
            if let Some(ci) = self.hours_row[v] {
                capacity.slack[e] = rows[ci].rhs - self.lhs[ci];
            }
            if let Some(ci) = self.day_row[v] {
                if capacity.mark(ci) {
                    capacity.days[e] += 1;
                }
            }
            if let Some(ci) = model.coverage_row(v) {
                if capacity.mark(ci) {
                    open += 1;
                }
            }
        }
        open.min(capacity.total())
    }

    fn record_incumbent(&mut self) {
        let improves = self
            .best
            .as_ref()
            .map_or(true, |(_, best)| self.objective > *best);
        if improves {
            debug_assert!(self.model.is_feasible(&self.values));
            trace!(objective = self.objective, nodes = self.nodes, "new incumbent");
            self.best = Some((self.values.clone(), self.objective));
        }
    }

    fn can_assign(&self, var: usize, value: bool) -> bool {
        if value {
            return self.model.fits(&self.lhs, var);
        }
        let rows = self.model.constraints();
        self.model.constraints_of(var).iter().all(|&(ci, a)| {
            rows[ci].sense != Sense::Equal
                || self.lhs[ci] + self.potential[ci] - a >= rows[ci].rhs - FEASIBILITY_EPS
        })
    }

    fn assign(&mut self, var: usize, value: bool) {
        let model = self.model;
        self.values[var] = value;
        for &(ci, a) in model.constraints_of(var) {
            self.potential[ci] -= a;
            if value {
                self.lhs[ci] += a;
            }
        }
        if value {
            self.objective += 1;
        }
    }

    fn unassign(&mut self, var: usize) {
        let model = self.model;
        let value = self.values[var];
        for &(ci, a) in model.constraints_of(var) {
            self.potential[ci] += a;
            if value {
                self.lhs[ci] -= a;
            }
        }
        if value {
            self.objective -= 1;
        }
        self.values[var] = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::EngineStatus;
    use crate::model::{CoverageMode, RosterModelBuilder};
    use crate::models::{Employee, Shift};

    fn solve(employees: &[Employee], shifts: &[Shift], mode: CoverageMode) -> (RosterModel, EngineSolution) {
        let model = RosterModelBuilder::new(employees, shifts)
            .with_coverage(mode)
            .build()
            .unwrap();
        let solution = BranchAndBoundEngine::new().solve(&model, &SolveLimits::unlimited());
        (model, solution)
    }

    fn day_shift(id: &str, skill: &str, day: u32, start_h: u32, end_h: u32) -> Shift {
        Shift::new(
            id,
            skill,
            format!("2024-03-{day:02}T{start_h:02}:00:00"),
            format!("2024-03-{day:02}T{end_h:02}:00:00"),
        )
    }

    #[test]
    fn test_empty_model_is_optimal() {
        let (_, solution) = solve(&[], &[], CoverageMode::Exact);
        assert_eq!(solution.status, EngineStatus::Optimal);
        assert_eq!(solution.values, Some(vec![]));
        assert_eq!(solution.objective_value, Some(0.0));
    }

    #[test]
    fn test_single_assignment() {
        let employees = vec![Employee::new("E1", 8.0).with_skill("nurse")];
        let shifts = vec![day_shift("S1", "nurse", 1, 8, 12)];
        let (model, solution) = solve(&employees, &shifts, CoverageMode::Exact);

        assert_eq!(solution.status, EngineStatus::Optimal);
        let values = solution.values.unwrap();
        assert!(values[model.var_id("E1", "S1").unwrap()]);
        assert_eq!(solution.objective_value, Some(1.0));
    }

    #[test]
    fn test_exact_model_infeasible_under_hour_cap() {
        let employees = vec![Employee::new("E1", 4.0).with_skill("nurse")];
        let shifts = vec![
            day_shift("S1", "nurse", 1, 6, 10),
            day_shift("S2", "nurse", 1, 14, 18),
        ];
        let (_, solution) = solve(&employees, &shifts, CoverageMode::Exact);
        assert_eq!(solution.status, EngineStatus::Infeasible);
        assert!(solution.values.is_none());
    }

    #[test]
    fn test_relaxed_model_maximizes_coverage() {
        let employees = vec![Employee::new("E1", 4.0).with_skill("nurse")];
        let shifts = vec![
            day_shift("S1", "nurse", 1, 6, 10),
            day_shift("S2", "nurse", 1, 14, 18),
        ];
        let (model, solution) = solve(&employees, &shifts, CoverageMode::AtMostOne);
        assert_eq!(solution.status, EngineStatus::Optimal);
        let values = solution.values.unwrap();
        assert!(model.is_feasible(&values));
        assert_eq!(solution.objective_value, Some(1.0));
    }

    #[test]
    fn test_search_finds_non_greedy_matching() {
        // Taking 1 first puts E1 on S1, which leaves S2 without anyone.
        let employees = vec![
            Employee::new("E1", 8.0).with_skills(["a", "b"]),
            Employee::new("E2", 8.0).with_skill("a"),
        ];
        let shifts = vec![day_shift("S1", "a", 1, 8, 12), day_shift("S2", "b", 2, 8, 12)];
        let employees_one_day = vec![
            Employee::new("E1", 4.0).with_skills(["a", "b"]),
            Employee::new("E2", 8.0).with_skill("a"),
        ];

        let (_, solution) = solve(&employees, &shifts, CoverageMode::Exact);
        assert_eq!(solution.status, EngineStatus::Optimal);

        let (model, solution) = solve(&employees_one_day, &shifts, CoverageMode::Exact);
        assert_eq!(solution.status, EngineStatus::Optimal);
        let values = solution.values.unwrap();
        assert!(values[model.var_id("E2", "S1").unwrap()]);
        assert!(values[model.var_id("E1", "S2").unwrap()]);
    }

    #[test]
    fn test_relaxed_optimum_beats_first_fit() {
        // Two employees, three shifts on two days; best is 3 covered.
        let employees = vec![
            Employee::new("E1", 16.0).with_skills(["a", "b"]),
            Employee::new("E2", 8.0).with_skill("a"),
        ];
        let shifts = vec![
            day_shift("S1", "a", 1, 8, 16),
            day_shift("S2", "b", 1, 8, 16),
            day_shift("S3", "a", 2, 8, 16),
        ];
        let (model, solution) = solve(&employees, &shifts, CoverageMode::AtMostOne);
        assert_eq!(solution.status, EngineStatus::Optimal);
        assert_eq!(solution.objective_value, Some(3.0));
        assert!(model.is_feasible(&solution.values.unwrap()));
    }

    #[test]
    fn test_node_limit_abandons_search() {
        let employees: Vec<Employee> = (0..4)
            .map(|i| Employee::new(format!("E{i}"), 40.0).with_skill("a"))
            .collect();
        let shifts: Vec<Shift> = (1..=6).map(|d| day_shift(&format!("S{d}"), "a", d, 8, 16)).collect();
        let model = RosterModelBuilder::new(&employees, &shifts).build().unwrap();
        let limits = SolveLimits {
            node_limit: Some(3),
            ..SolveLimits::unlimited()
        };
        let solution = BranchAndBoundEngine::new().solve(&model, &limits);
        assert_eq!(solution.status, EngineStatus::TimedOut);
        assert!(solution.values.is_none());
        assert!(solution.nodes <= 4);
    }

    #[test]
    fn test_expired_deadline_abandons_search() {
        let employees = vec![Employee::new("E1", 8.0).with_skill("a")];
        let shifts = vec![day_shift("S1", "a", 1, 8, 12)];
        let model = RosterModelBuilder::new(&employees, &shifts).build().unwrap();
        let limits = SolveLimits {
            deadline: Some(std::time::Instant::now()),
            node_limit: None,
            check_interval: 1,
        };
        let solution = BranchAndBoundEngine::new().solve(&model, &limits);
        assert_eq!(solution.status, EngineStatus::TimedOut);
        assert!(solution.values.is_none());

        // A relaxed search always holds the greedy roster.
        let solution = BranchAndBoundEngine::new().solve(&model.relaxed(), &limits);
        assert_eq!(solution.status, EngineStatus::TimedOut);
        let values = solution.values.unwrap();
        assert!(model.relaxed().is_feasible(&values));
        assert_eq!(solution.objective_value, Some(1.0));
    }

    #[test]
    fn test_node_limit_after_incumbent_keeps_it() {
        let employees = vec![
            Employee::new("E1", 8.0).with_skill("a"),
            Employee::new("E2", 8.0).with_skill("a"),
        ];
        let shifts = vec![day_shift("S1", "a", 1, 8, 12)];
        let model = RosterModelBuilder::new(&employees, &shifts).build().unwrap();
        // root, E1 on S1, leaf; the next node is the E1-off branch
        let limits = SolveLimits {
            node_limit: Some(3),
            ..SolveLimits::unlimited()
        };
        let solution = BranchAndBoundEngine::new().solve(&model, &limits);
        assert_eq!(solution.status, EngineStatus::TimedOut);
        let values = solution.values.unwrap();
        assert!(model.is_feasible(&values));
        assert!(values[model.var_id("E1", "S1").unwrap()]);
    }

    /// 4 employees with room for 5 seven-hour shifts each, 21 shifts over a week.
    fn understaffed_week() -> (Vec<Employee>, Vec<Shift>) {
        let employees = (1..=4)
            .map(|i| Employee::new(format!("E{i}"), 40.0).with_skill("a"))
            .collect();
        let shifts = (1..=7)
            .flat_map(|d| {
                [(0, 7), (8, 15), (16, 23)]
                    .into_iter()
                    .enumerate()
                    .map(move |(k, (s, e))| day_shift(&format!("S{d}_{k}"), "a", d, s, e))
            })
            .collect();
        (employees, shifts)
    }

    #[test]
    fn test_capacity_bound_proves_infeasibility() {
        let (employees, shifts) = understaffed_week();
        let (_, solution) = solve(&employees, &shifts, CoverageMode::Exact);
        assert_eq!(solution.status, EngineStatus::Infeasible);
        assert!(solution.nodes <= 1);
    }

    #[test]
    fn test_capacity_bound_closes_relaxed_search() {
        let (employees, shifts) = understaffed_week();
        let (model, solution) = solve(&employees, &shifts, CoverageMode::AtMostOne);
        assert_eq!(solution.status, EngineStatus::Optimal);
        assert_eq!(solution.objective_value, Some(20.0));
        assert!(model.is_feasible(&solution.values.unwrap()));
        assert!(solution.nodes < 10_000);
    }

    #[test]
    fn test_day_limit_in_bound() {
        // Plenty of hours, but three shifts on one day for a single employee.
        let employees = vec![Employee::new("E1", 100.0).with_skill("a")];
        let shifts = vec![
            day_shift("S1", "a", 1, 0, 4),
            day_shift("S2", "a", 1, 8, 12),
            day_shift("S3", "a", 1, 16, 20),
        ];
        let (_, solution) = solve(&employees, &shifts, CoverageMode::Exact);
        assert_eq!(solution.status, EngineStatus::Infeasible);
        assert!(solution.nodes <= 1);
    }
}
