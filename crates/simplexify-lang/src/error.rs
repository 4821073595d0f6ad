use simplexify_solver::SolverError;
use thiserror::Error;

use crate::constraint::ConstraintError;
use crate::expression::ExpressionError;

/// Everything that can stop a request from producing a solution
#[derive(Error, Debug)]
pub enum SolveError {
    #[error("Invalid objective: {0}")]
    MalformedExpression(#[from] ExpressionError),

    #[error("Invalid constraint `{constraint}`: {source}")]
    MalformedConstraint {
        constraint: String,
        source: ConstraintError,
    },

    #[error("{0}")]
    InvalidRequestShape(String),

    #[error("The objective term `{0}` does not appear on the left side of any constraint")]
    UnreferencedObjectiveVariable(String),

    #[error("`{0}` is reserved for generated slack and artificial terms")]
    ReservedTermName(String),

    #[error(transparent)]
    Solver(#[from] SolverError),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}
