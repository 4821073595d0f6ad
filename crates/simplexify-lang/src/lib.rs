pub mod constraint;
pub mod error;
pub mod expression;
pub mod input;
pub mod request;

#[cfg(feature = "wasm")]
pub mod wasm;

pub use constraint::{Comparison, Constraint, ConstraintError, Side, SpecialTerm, SpecialTerms};
pub use error::SolveError;
pub use expression::{CONSTANT, Expression, ExpressionError};
pub use input::Input;
pub use request::SolveRequest;

use simplexify_solver::{Solution, Solver};

/// Solves a request with the default solver settings and returns the result
/// as a JSON object text: every column, then `z`.
pub fn solve(request: &SolveRequest) -> Result<String, SolveError> {
    let solution = solve_with(request, &Solver::new())?;
    Ok(serde_json::to_string(&solution)?)
}

/// Like [`solve`], but takes the request as JSON text
pub fn solve_json(text: &str) -> Result<String, SolveError> {
    solve(&SolveRequest::from_json(text)?)
}

/// Parses, standardizes and solves a request, returning the full
/// [`Solution`] including its status.
pub fn solve_with(request: &SolveRequest, solver: &Solver) -> Result<Solution, SolveError> {
    let mut input = Input::parse(&request.kind, &request.objective, request.constraints.as_slice())?;
    let problem = input.to_lp_problem();
    Ok(solver.solve(&problem)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use simplexify_solver::SolutionStatus;

    fn request(kind: &str, objective: &str, constraints: &[&str]) -> SolveRequest {
        SolveRequest::new(kind, objective, constraints.iter().copied())
    }

    #[test]
    fn test_known_maximization() {
        let request = request(
            "maximize",
            "3x + 2y",
            &["x + y <= 4", "x + 3y <= 6", "x >= 0", "y >= 0"],
        );
        let solution = solve_with(&request, &Solver::new()).unwrap();
        assert_eq!(solution.status, SolutionStatus::Optimal);
        assert_abs_diff_eq!(solution.objective_value, 12.0, epsilon = 1e-9);
        assert_abs_diff_eq!(solution.value("x").unwrap(), 4.0, epsilon = 1e-9);
        assert_abs_diff_eq!(solution.value("y").unwrap(), 0.0, epsilon = 1e-9);
        assert_eq!(
            solution.columns,
            vec!["x", "y", "slack1", "slack2", "slack3", "slack4", "artificial1", "artificial2"]
        );
    }

    #[test]
    fn test_known_maximization_json() {
        let json = solve(&request("maximize", "3x + 2y", &["x + y <= 4", "x + 3y <= 6"])).unwrap();
        assert_eq!(json, r#"{"x":4.0,"y":0.0,"slack1":0.0,"slack2":2.0,"z":12.0}"#);
    }

    #[test]
    fn test_minimization() {
        let solution = solve_with(&request("minimize", "x + y", &["x + y >= 2"]), &Solver::new()).unwrap();
        assert_eq!(solution.status, SolutionStatus::Optimal);
        assert_abs_diff_eq!(solution.objective_value, 2.0, epsilon = 1e-9);
        assert_abs_diff_eq!(
            solution.value("x").unwrap() + solution.value("y").unwrap(),
            2.0,
            epsilon = 1e-9
        );
    }

    #[test]
    fn test_zero_right_side_ge_row_stays_feasible() {
        let solution = solve_with(
            &request("maximize", "x + y", &["x + y <= 4", "0 >= x + y"]),
            &Solver::new(),
        )
        .unwrap();
        assert_eq!(solution.status, SolutionStatus::Optimal);
        assert_abs_diff_eq!(solution.objective_value, 0.0, epsilon = 1e-9);
        assert_abs_diff_eq!(solution.value("x").unwrap(), 0.0, epsilon = 1e-9);
        assert_abs_diff_eq!(solution.value("y").unwrap(), 0.0, epsilon = 1e-9);
        assert_abs_diff_eq!(solution.value("artificial1").unwrap(), 0.0, epsilon = 1e-9);
    }

    #[test]
    fn test_slack_columns_use_name_order() {
        let constraints = vec!["x <= 5"; 11];
        let json = solve(&request("maximize", "x", &constraints)).unwrap();
        let mut expected = String::from(r#"{"x":5.0"#);
        for name in ["1", "10", "11", "2", "3", "4", "5", "6", "7", "8", "9"] {
            expected.push_str(&format!(r#","slack{}":0.0"#, name));
        }
        expected.push_str(r#","z":5.0}"#);
        assert_eq!(json, expected);
    }

    #[test]
    fn test_objective_constant_is_carried() {
        let solution = solve_with(&request("maximize", "x + 5", &["x <= 3"]), &Solver::new()).unwrap();
        assert_abs_diff_eq!(solution.objective_value, 8.0, epsilon = 1e-9);
    }

    #[test]
    fn test_strict_inequality_moves_bound() {
        let solution = solve_with(&request("maximize", "x", &["x < 2"]), &Solver::new()).unwrap();
        assert_abs_diff_eq!(solution.objective_value, 2.0 - 1e-6, epsilon = 1e-12);
    }

    #[test]
    fn test_unbounded_and_infeasible_statuses() {
        let solution = solve_with(&request("maximize", "x", &["x >= 1"]), &Solver::new()).unwrap();
        assert_eq!(solution.status, SolutionStatus::Unbounded);

        let solution =
            solve_with(&request("maximize", "x", &["x <= 1", "x >= 2"]), &Solver::new()).unwrap();
        assert_eq!(solution.status, SolutionStatus::Infeasible);
    }

    #[test]
    fn test_errors_are_reported() {
        assert!(matches!(
            solve(&request("maximize", "x + q", &["x <= 4"])),
            Err(SolveError::UnreferencedObjectiveVariable(name)) if name == "q"
        ));
        assert!(matches!(
            solve(&request("maximize", "x", &["x >= <= 2"])),
            Err(SolveError::MalformedConstraint { .. })
        ));
        assert!(matches!(
            solve_json(r#"{"type": "maximize", "objective": "x"}"#),
            Err(SolveError::InvalidRequestShape(_))
        ));
    }

    #[test]
    fn test_solve_json() {
        let json = solve_json(
            r#"{"type": "minimize", "objective": "x + y", "constraints": ["x + y >= 2"]}"#,
        )
        .unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_abs_diff_eq!(value["z"].as_f64().unwrap(), 2.0, epsilon = 1e-9);
    }
}
