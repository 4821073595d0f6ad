mod matrix;
mod problem;
mod solution;
mod tableau;

pub use matrix::{
    add_rows, greatest_element_in_row, negate_row, scale_row, scale_then_add_rows, Extremum, Matrix,
    MatrixError, Ratio,
};
pub use problem::{Column, ColumnKind, Constraint, Direction, LpProblem, Objective};
pub use solution::{Solution, SolutionStatus};
pub use tableau::{PivotPoint, Solver, SolverError, Tableau};
