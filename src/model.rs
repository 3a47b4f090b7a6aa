//! Binary-program formulation of the rostering problem.
//!
//! Builds the decision variables, objective and constraints from employees
//! and shifts. The resulting [`RosterModel`] is plain data that any
//! [`SolverEngine`](crate::engine::SolverEngine) can consume.
//!
//! # Formulation
//!
//! One binary variable `x[e,s]` per *eligible* pair (the shift's skill is in
//! the employee's skill set). Ineligible pairs have no variable at all.
//!
//! ```text
//! maximize   Σ x[e,s]
//! subject to Σ_e x[e,s]            = 1          for each shift s with an eligible employee
//!            Σ_s x[e,s] · hours(s) ≤ max_hours  for each employee e with a variable
//!            Σ_{s on d} x[e,s]     ≤ 1          for each employee e and day d
//! ```
//!
//! A shift nobody is eligible for gets no coverage row; it is recorded in
//! [`RosterModel::uncoverable_shifts`] instead.
//!
//! # Reference
//! Ernst et al. (2004), "Staff scheduling and rostering: A review of
//! applications, methods and models"

use std::collections::{BTreeMap, HashMap, HashSet};

use chrono::NaiveDate;
use tracing::debug;

use crate::error::Result;
use crate::models::{Employee, Shift};

/// Tolerance used when checking constraint satisfaction.
pub const FEASIBILITY_EPS: f64 = 1e-9;

/// Index of a decision variable within a [`RosterModel`].
pub type VarId = usize;

/// Composite key of a decision variable.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VarKey {
    /// Employee ID.
    pub employee_id: String,
    /// Shift ID.
    pub shift_id: String,
}

impl VarKey {
    /// Creates a key.
    pub fn new(employee_id: impl Into<String>, shift_id: impl Into<String>) -> Self {
        Self {
            employee_id: employee_id.into(),
            shift_id: shift_id.into(),
        }
    }
}

/// A binary decision variable: "employee is assigned to shift".
#[derive(Debug, Clone, PartialEq)]
pub struct Variable {
    /// Composite key.
    pub key: VarKey,
    /// Position of the employee in the input slice.
    pub employee: usize,
    /// Position of the shift in the input slice.
    pub shift: usize,
    /// Length of the shift in hours.
    pub hours: f64,
    /// Calendar day of the shift.
    pub day: NaiveDate,
}

/// Constraint family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConstraintKind {
    /// At most / exactly one employee per shift.
    Coverage,
    /// Hour cap per employee.
    MaxHours,
    /// One shift per employee per day.
    OneShiftPerDay,
}

/// Relation between a row's left-hand side and its right-hand side.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sense {
    /// `lhs = rhs`
    Equal,
    /// `lhs ≤ rhs`
    LessOrEqual,
}

/// How shift coverage rows are emitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CoverageMode {
    /// Every coverable shift must be covered (`= 1`).
    #[default]
    Exact,
    /// Shifts may stay uncovered (`≤ 1`).
    AtMostOne,
}

/// A linear constraint over decision variables. All coefficients are positive.
#[derive(Debug, Clone, PartialEq)]
pub struct LinearConstraint {
    /// Stable row name, e.g. `Cover_S1`.
    pub name: String,
    /// Constraint family.
    pub kind: ConstraintKind,
    /// `(variable, coefficient)` pairs.
    pub terms: Vec<(VarId, f64)>,
    /// Relation.
    pub sense: Sense,
    /// Right-hand side.
    pub rhs: f64,
}

impl LinearConstraint {
    /// Left-hand side under a full assignment.
    pub fn lhs(&self, values: &[bool]) -> f64 {
        self.terms
            .iter()
            .filter(|(v, _)| values[*v])
            .map(|(_, a)| *a)
            .sum()
    }

    /// Whether a full assignment satisfies this row.
    pub fn is_satisfied(&self, values: &[bool]) -> bool {
        let lhs = self.lhs(values);
        match self.sense {
            Sense::Equal => (lhs - self.rhs).abs() <= FEASIBILITY_EPS,
            Sense::LessOrEqual => lhs <= self.rhs + FEASIBILITY_EPS,
        }
    }
}

/// A binary maximization program over eligible employee/shift pairs.
///
/// The objective is the number of variables set to 1.
#[derive(Debug, Clone)]
pub struct RosterModel {
    variables: Vec<Variable>,
    index: HashMap<VarKey, VarId>,
    constraints: Vec<LinearConstraint>,
    var_constraints: Vec<Vec<(usize, f64)>>,
    coverage_of: Vec<Option<usize>>,
    shift_ids: Vec<String>,
    uncoverable_shifts: Vec<String>,
    coverage_mode: CoverageMode,
}

impl RosterModel {
    /// Number of decision variables.
    pub fn num_variables(&self) -> usize {
        self.variables.len()
    }

    /// Number of constraint rows.
    pub fn num_constraints(&self) -> usize {
        self.constraints.len()
    }

    /// All variables, shift-major in input order.
    pub fn variables(&self) -> &[Variable] {
        &self.variables
    }

    /// A single variable.
    pub fn variable(&self, id: VarId) -> &Variable {
        &self.variables[id]
    }

    /// Looks up the variable of an employee/shift pair. `None` means ineligible.
    pub fn var_id(&self, employee_id: &str, shift_id: &str) -> Option<VarId> {
        self.index.get(&VarKey::new(employee_id, shift_id)).copied()
    }

    /// All constraint rows.
    pub fn constraints(&self) -> &[LinearConstraint] {
        &self.constraints
    }

    /// Rows of one family.
    pub fn constraints_of_kind(
        &self,
        kind: ConstraintKind,
    ) -> impl Iterator<Item = &LinearConstraint> + '_ {
        self.constraints.iter().filter(move |c| c.kind == kind)
    }

    /// `(row index, coefficient)` of every row a variable appears in.
    pub fn constraints_of(&self, id: VarId) -> &[(usize, f64)] {
        &self.var_constraints[id]
    }

    /// Whether raising a variable to 1 keeps every row it appears in within
    /// its right-hand side, given the current row sums `lhs`.
    pub fn fits(&self, lhs: &[f64], id: VarId) -> bool {
        self.var_constraints[id]
            .iter()
            .all(|&(ci, a)| lhs[ci] + a <= self.constraints[ci].rhs + FEASIBILITY_EPS)
    }

    /// Index of the coverage row of a variable's shift.
    pub fn coverage_row(&self, id: VarId) -> Option<usize> {
        self.coverage_of[id]
    }

    /// Input shift IDs, in input order.
    pub fn shift_ids(&self) -> &[String] {
        &self.shift_ids
    }

    /// Shifts no employee is eligible for, in input order.
    pub fn uncoverable_shifts(&self) -> &[String] {
        &self.uncoverable_shifts
    }

    /// How coverage rows were emitted.
    pub fn coverage_mode(&self) -> CoverageMode {
        self.coverage_mode
    }

    /// Objective value of an assignment.
    pub fn objective_value(&self, values: &[bool]) -> f64 {
        values.iter().filter(|&&v| v).count() as f64
    }

    /// Whether an assignment satisfies every row.
    pub fn is_feasible(&self, values: &[bool]) -> bool {
        values.len() == self.variables.len()
            && self.constraints.iter().all(|c| c.is_satisfied(values))
    }

    /// Whether an assignment satisfies every row with coverage read as `≤ 1`.
    pub fn is_feasible_relaxed(&self, values: &[bool]) -> bool {
        values.len() == self.variables.len()
            && self.constraints.iter().all(|c| {
                if c.kind == ConstraintKind::Coverage {
                    c.lhs(values) <= c.rhs + FEASIBILITY_EPS
                } else {
                    c.is_satisfied(values)
                }
            })
    }

    /// Copy of this model with coverage rows turned into `≤ 1`.
    ///
    /// The relaxed model is always feasible (all variables at 0).
    pub fn relaxed(&self) -> RosterModel {
        let mut model = self.clone();
        for row in &mut model.constraints {
            if row.kind == ConstraintKind::Coverage {
                row.sense = Sense::LessOrEqual;
            }
        }
        model.coverage_mode = CoverageMode::AtMostOne;
        model
    }
}

/// Builds a [`RosterModel`] from employees and shifts.
///
/// # Example
/// ```
/// use u_roster::model::RosterModelBuilder;
/// use u_roster::models::{Employee, Shift};
///
/// let employees = vec![Employee::new("E1", 8.0).with_skill("nurse")];
/// let shifts = vec![Shift::new("S1", "nurse", "2024-03-01T08:00:00", "2024-03-01T12:00:00")];
/// let model = RosterModelBuilder::new(&employees, &shifts).build().unwrap();
/// assert_eq!(model.num_variables(), 1);
/// // coverage + max hours + one shift per day
/// assert_eq!(model.num_constraints(), 3);
/// ```
pub struct RosterModelBuilder<'a> {
    employees: &'a [Employee],
    shifts: &'a [Shift],
    coverage: CoverageMode,
}

impl<'a> RosterModelBuilder<'a> {
    /// Creates a builder.
    pub fn new(employees: &'a [Employee], shifts: &'a [Shift]) -> Self {
        Self {
            employees,
            shifts,
            coverage: CoverageMode::Exact,
        }
    }

    /// Sets how coverage rows are emitted.
    pub fn with_coverage(mut self, coverage: CoverageMode) -> Self {
        self.coverage = coverage;
        self
    }

    /// Builds the model.
    ///
    /// # Errors
    /// [`RosterError::MalformedTimestamp`](crate::RosterError::MalformedTimestamp)
    /// if any shift's duration cannot be computed.
    pub fn build(&self) -> Result<RosterModel> {
        let windows = self
            .shifts
            .iter()
            .map(Shift::window)
            .collect::<Result<Vec<_>>>()?;

        let skill_sets: Vec<HashSet<&str>> = self
            .employees
            .iter()
            .map(|e| e.skills.iter().map(String::as_str).collect())
            .collect();

        // Eligibility pruning, shift-major.
        let mut variables = Vec::new();
        let mut index = HashMap::new();
        let mut by_shift: Vec<Vec<VarId>> = vec![Vec::new(); self.shifts.len()];
        let mut by_employee: Vec<Vec<VarId>> = vec![Vec::new(); self.employees.len()];

        for (si, shift) in self.shifts.iter().enumerate() {
            for (ei, employee) in self.employees.iter().enumerate() {
                if !skill_sets[ei].contains(shift.required_skill.as_str()) {
                    continue;
                }
                let id = variables.len();
                let key = VarKey::new(employee.id.clone(), shift.id.clone());
                index.insert(key.clone(), id);
                variables.push(Variable {
                    key,
                    employee: ei,
                    shift: si,
                    hours: windows[si].hours,
                    day: windows[si].day,
                });
                by_shift[si].push(id);
                by_employee[ei].push(id);
            }
        }

        let mut constraints = Vec::new();
        let mut uncoverable_shifts = Vec::new();
        let coverage_sense = match self.coverage {
            CoverageMode::Exact => Sense::Equal,
            CoverageMode::AtMostOne => Sense::LessOrEqual,
        };

        for (si, shift) in self.shifts.iter().enumerate() {
            if by_shift[si].is_empty() {
                uncoverable_shifts.push(shift.id.clone());
                continue;
            }
            constraints.push(LinearConstraint {
                name: format!("Cover_{}", shift.id),
                kind: ConstraintKind::Coverage,
                terms: by_shift[si].iter().map(|&v| (v, 1.0)).collect(),
                sense: coverage_sense,
                rhs: 1.0,
            });
        }

        for (ei, employee) in self.employees.iter().enumerate() {
            if by_employee[ei].is_empty() {
                continue;
            }
            constraints.push(LinearConstraint {
                name: format!("MaxHours_{}", employee.id),
                kind: ConstraintKind::MaxHours,
                terms: by_employee[ei]
                    .iter()
                    .map(|&v| (v, variables[v].hours))
                    .collect(),
                sense: Sense::LessOrEqual,
                rhs: employee.max_hours,
            });
        }

        for (ei, employee) in self.employees.iter().enumerate() {
            let mut by_day: BTreeMap<NaiveDate, Vec<VarId>> = BTreeMap::new();
            for &v in &by_employee[ei] {
                by_day.entry(variables[v].day).or_default().push(v);
            }
            for (day, vars) in by_day {
                constraints.push(LinearConstraint {
                    name: format!("OneShiftPerDay_{}_{}", employee.id, day),
                    kind: ConstraintKind::OneShiftPerDay,
                    terms: vars.into_iter().map(|v| (v, 1.0)).collect(),
                    sense: Sense::LessOrEqual,
                    rhs: 1.0,
                });
            }
        }

        let mut var_constraints = vec![Vec::new(); variables.len()];
        let mut coverage_of = vec![None; variables.len()];
        for (ci, row) in constraints.iter().enumerate() {
            for &(v, a) in &row.terms {
                var_constraints[v].push((ci, a));
                if row.kind == ConstraintKind::Coverage {
                    coverage_of[v] = Some(ci);
                }
            }
        }

        debug!(
            employees = self.employees.len(),
            shifts = self.shifts.len(),
            variables = variables.len(),
            constraints = constraints.len(),
            uncoverable = uncoverable_shifts.len(),
            "built roster model"
        );

        Ok(RosterModel {
            variables,
            index,
            constraints,
            var_constraints,
            coverage_of,
            shift_ids: self.shifts.iter().map(|s| s.id.clone()).collect(),
            uncoverable_shifts,
            coverage_mode: self.coverage,
        })
    }
}
