use std::collections::HashSet;
use std::fmt;

use log::{debug, info, warn};
use thiserror::Error;

use crate::matrix::{add_rows, Matrix, MatrixError};
use crate::problem::{Column, ColumnKind, Direction, LpProblem};
use crate::solution::{Solution, SolutionStatus};

#[derive(Error, Debug, Clone, PartialEq)]
pub enum SolverError {
    #[error("A problem needs at least one constraint")]
    EmptyProblem,
    #[error("Row `{row}` has {found} coefficients but the problem has {expected} columns")]
    DimensionMismatch {
        row: String,
        expected: usize,
        found: usize,
    },
    #[error(transparent)]
    Matrix(#[from] MatrixError),
}

/// Row and column of the element to pivot on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PivotPoint {
    pub row: usize,
    pub column: usize,
}

/// Simplex tableau.
///
/// One row per constraint followed by the objective row. The last entry of
/// every row is its right-hand side. Columns are ordered variables, then
/// slacks, then artificials.
#[derive(Debug, Clone)]
pub struct Tableau {
    columns: Vec<Column>,
    matrix: Matrix,
    direction: Direction,
    num_constraints: usize,
    iterations: usize,
}

impl Tableau {
    pub fn new(problem: &LpProblem) -> Result<Self, SolverError> {
        if problem.constraints.is_empty() {
            return Err(SolverError::EmptyProblem);
        }
        let n = problem.num_columns();
        for c in &problem.constraints {
            if c.coefficients.len() != n {
                return Err(SolverError::DimensionMismatch {
                    row: c.name.clone(),
                    expected: n,
                    found: c.coefficients.len(),
                });
            }
        }
        if problem.objective.coefficients.len() != n {
            return Err(SolverError::DimensionMismatch {
                row: "objective".to_string(),
                expected: n,
                found: problem.objective.coefficients.len(),
            });
        }

        // Grouped by kind, then by name as a string: `slack10` sorts before `slack2`.
        let mut order: Vec<usize> = (0..n).collect();
        order.sort_by(|&a, &b| {
            let (a, b) = (&problem.columns[a], &problem.columns[b]);
            (a.kind, &a.name).cmp(&(b.kind, &b.name))
        });

        let layout = |coefficients: &[f64], rhs: f64| -> Vec<f64> {
            order
                .iter()
                .map(|&j| coefficients[j])
                .chain(std::iter::once(rhs))
                .collect()
        };

        let mut matrix = Matrix::new();
        for c in &problem.constraints {
            matrix.add_row(layout(&c.coefficients, c.rhs));
        }
        matrix.add_row(layout(
            &problem.objective.coefficients,
            problem.objective.constant,
        ));

        Ok(Self {
            columns: order.iter().map(|&j| problem.columns[j].clone()).collect(),
            matrix,
            direction: problem.objective.direction,
            num_constraints: problem.num_constraints(),
            iterations: 0,
        })
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn matrix(&self) -> &Matrix {
        &self.matrix
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    pub fn iterations(&self) -> usize {
        self.iterations
    }

    pub fn has_artificial(&self) -> bool {
        self.columns.iter().any(|c| c.kind == ColumnKind::Artificial)
    }

    /// Number of leading columns that may enter the basis outside the
    /// feasibility pass.
    fn non_artificial_columns(&self) -> usize {
        self.columns
            .iter()
            .take_while(|c| c.kind != ColumnKind::Artificial)
            .count()
    }

    /// Most negative entry of the last row when maximizing, most positive when
    /// minimizing, among the first `eligible` columns. `None` means optimal.
    pub fn entering_column(&self, direction: Direction, eligible: usize, tolerance: f64) -> Option<usize> {
        let best = self
            .matrix
            .greatest_value_from_last_row(direction.is_minimize(), eligible)?;
        let qualifies = match direction {
            Direction::Minimize => best.value > tolerance,
            Direction::Maximize => best.value < -tolerance,
        };
        qualifies.then_some(best.index)
    }

    /// Minimum-ratio test over the constraint rows. `None` means the column
    /// can grow without bound.
    pub fn leaving_row(&self, column: usize, tolerance: f64) -> Option<usize> {
        self.matrix
            .min_positive_ratio_row(column, self.num_constraints, tolerance)
            .map(|r| r.row)
    }

    pub fn pivot_point(&self, direction: Direction, tolerance: f64) -> Option<PivotPoint> {
        let column = self.entering_column(direction, self.columns.len(), tolerance)?;
        let row = self.leaving_row(column, tolerance)?;
        Some(PivotPoint { row, column })
    }

    pub fn pivot(&mut self, point: PivotPoint) -> Result<(), SolverError> {
        self.matrix.pivot(point.row, point.column)?;
        self.iterations += 1;
        debug!(
            "pivot #{} on row {} column `{}`",
            self.iterations, point.row, self.columns[point.column].name
        );
        Ok(())
    }

    /// Value of every column read from unit columns. A row already claimed
    /// by an earlier column is not reused.
    pub fn values(&self, tolerance: f64) -> Vec<f64> {
        let mut claimed = HashSet::new();
        let mut values = Vec::with_capacity(self.columns.len());
        for j in 0..self.columns.len() {
            let value = match self.matrix.unit_value_for_column(j, tolerance) {
                Some((row, value)) if !claimed.contains(&row) => {
                    claimed.insert(row);
                    value
                }
                _ => 0.0,
            };
            values.push(value);
        }
        values
    }

    pub fn objective_value(&self) -> f64 {
        self.matrix.last_element_on_last_row().unwrap_or(0.0)
    }

    /// Pivots every basic artificial column out of the basis on the first
    /// non-artificial column with a non-zero entry in its row. A row with no
    /// such column is redundant and is removed.
    fn drive_out_artificials(&mut self, tolerance: f64) -> Result<(), SolverError> {
        let eligible = self.non_artificial_columns();
        for j in eligible..self.columns.len() {
            let Some((row, _)) = self.matrix.unit_value_for_column(j, tolerance) else {
                continue;
            };
            if row >= self.num_constraints {
                continue;
            }
            let entering = self
                .matrix
                .row(row)
                .and_then(|r| r[..eligible].iter().position(|v| v.abs() > tolerance));
            match entering {
                Some(column) => self.pivot(PivotPoint { row, column })?,
                None => {
                    debug!("row {} only holds `{}`, removing it", row, self.columns[j].name);
                    self.matrix.remove_row(row);
                    self.num_constraints -= 1;
                }
            }
        }
        Ok(())
    }

    /// Appends the auxiliary "minimize the sum of artificials" row, priced out
    /// against the rows where each artificial column is basic.
    fn push_feasibility_row(&mut self, tolerance: f64) {
        let width = self.columns.len() + 1;
        let mut row = vec![0.0; width];
        for (j, column) in self.columns.iter().enumerate() {
            if column.kind != ColumnKind::Artificial {
                continue;
            }
            row[j] -= 1.0;
            if let Some((i, _)) = self.matrix.unit_value_for_column(j, tolerance) {
                if let Some(basic) = self.matrix.row(i) {
                    row = add_rows(&row, basic);
                }
            }
        }
        self.matrix.add_row(row);
    }
}

impl fmt::Display for Tableau {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[")?;
        for column in &self.columns {
            write!(f, "{},", column.name)?;
        }
        writeln!(f, "Constant]")?;
        for row in self.matrix.rows() {
            let cells: Vec<String> = row.iter().map(|v| format!("{}", v)).collect();
            writeln!(f, "[{}]", cells.join(","))?;
        }
        Ok(())
    }
}

/// Tableau simplex solver for linear programming problems
pub struct Solver {
    /// Maximum pivots before giving up
    max_iterations: usize,
    /// Tolerance for floating point comparisons
    tolerance: f64,
}

impl Default for Solver {
    fn default() -> Self {
        Self {
            max_iterations: 10000,
            tolerance: 1e-9,
        }
    }
}

impl Solver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_iterations(mut self, max: usize) -> Self {
        self.max_iterations = max;
        self
    }

    pub fn with_tolerance(mut self, tol: f64) -> Self {
        self.tolerance = tol;
        self
    }

    pub fn max_iterations(&self) -> usize {
        self.max_iterations
    }

    pub fn tolerance(&self) -> f64 {
        self.tolerance
    }

    /// Builds the tableau for `problem` and pivots it to a final state
    pub fn solve(&self, problem: &LpProblem) -> Result<Solution, SolverError> {
        let mut tableau = Tableau::new(problem)?;
        self.run(&mut tableau)
    }

    /// Pivots an existing tableau in place and extracts the solution
    pub fn run(&self, tableau: &mut Tableau) -> Result<Solution, SolverError> {
        let mut status = None;
        if tableau.has_artificial() {
            status = self.feasibility_pass(tableau)?;
        }
        let status = match status {
            Some(status) => status,
            None => {
                tableau.drive_out_artificials(self.tolerance)?;
                let direction = tableau.direction;
                let eligible = tableau.non_artificial_columns();
                self.iterate(tableau, direction, eligible)?
            }
        };

        let values = tableau.values(self.tolerance);
        let artificial_left = tableau
            .columns
            .iter()
            .zip(&values)
            .any(|(c, v)| c.kind == ColumnKind::Artificial && *v > self.tolerance);
        let status = if status == SolutionStatus::Optimal && artificial_left {
            warn!("an artificial column is still positive at the optimum");
            SolutionStatus::Infeasible
        } else {
            status
        };

        let solution = Solution {
            status,
            columns: tableau.columns.iter().map(|c| c.name.clone()).collect(),
            values,
            objective_value: tableau.objective_value(),
            iterations: tableau.iterations,
        };
        info!(
            "{} after {} pivots, z = {}",
            solution.status, solution.iterations, solution.objective_value
        );
        Ok(solution)
    }

    /// Drives the artificial columns to zero. Returns the final status when
    /// the main loop must not run.
    fn feasibility_pass(&self, tableau: &mut Tableau) -> Result<Option<SolutionStatus>, SolverError> {
        tableau.push_feasibility_row(self.tolerance);
        let initial = tableau.objective_value();
        let all = tableau.columns.len();
        let outcome = self.iterate(tableau, Direction::Minimize, all);
        let residual = tableau.objective_value();
        tableau.matrix.remove_last_row();

        match outcome? {
            SolutionStatus::IterationLimit => Ok(Some(SolutionStatus::IterationLimit)),
            _ if residual.abs() > self.tolerance * initial.abs().max(1.0) => {
                warn!("artificial columns could not reach zero (sum = {})", residual);
                Ok(Some(SolutionStatus::Infeasible))
            }
            _ => Ok(None),
        }
    }

    fn iterate(&self, tableau: &mut Tableau, direction: Direction, eligible: usize) -> Result<SolutionStatus, SolverError> {
        loop {
            let Some(column) = tableau.entering_column(direction, eligible, self.tolerance) else {
                return Ok(SolutionStatus::Optimal);
            };
            let Some(row) = tableau.leaving_row(column, self.tolerance) else {
                warn!("column `{}` has no leaving row, objective is unbounded", tableau.columns[column].name);
                return Ok(SolutionStatus::Unbounded);
            };
            if tableau.iterations >= self.max_iterations {
                warn!("stopped after {} pivots without reaching an optimum", tableau.iterations);
                return Ok(SolutionStatus::IterationLimit);
            }
            tableau.pivot(PivotPoint { row, column })?;
        }
    }
}
