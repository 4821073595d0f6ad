use std::collections::BTreeSet;
use std::fmt;

use log::trace;
use simplexify_solver::{Column, ColumnKind, Direction, LpProblem};

use crate::constraint::{Comparison, Constraint, Side, SpecialTerm};
use crate::error::SolveError;
use crate::expression::{CONSTANT, Expression, is_artificial_name, is_slack_name};

/// A parsed optimization problem: direction, objective and constraints.
///
/// Call [`Input::convert_to_standard_form`] (or [`Input::to_lp_problem`],
/// which does it for you) before handing it to the solver.
#[derive(Debug, Clone, PartialEq)]
pub struct Input {
    direction: Direction,
    z: Expression,
    constraints: Vec<Constraint>,
    terms: Vec<String>,
    is_standard_form: bool,
}

impl Input {
    /// Validates and parses a problem.
    ///
    /// `kind` must be `maximize` or `minimize`. Every variable of the
    /// objective must appear on the left side of at least one constraint.
    pub fn parse<S: AsRef<str>>(
        kind: &str,
        objective: &str,
        constraints: &[S],
    ) -> Result<Self, SolveError> {
        if objective.trim().is_empty() {
            return Err(SolveError::InvalidRequestShape(
                "The objective must be a non-empty string".to_string(),
            ));
        }
        let direction: Direction = kind.parse().map_err(SolveError::InvalidRequestShape)?;
        if constraints.is_empty() {
            return Err(SolveError::InvalidRequestShape(
                "At least one constraint is required".to_string(),
            ));
        }

        let z = Expression::parse(objective)?;
        let constraints = constraints
            .iter()
            .map(|text| {
                let text = text.as_ref();
                Constraint::parse(text).map_err(|source| SolveError::MalformedConstraint {
                    constraint: text.to_string(),
                    source,
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        let mut input = Self {
            direction,
            z,
            constraints,
            terms: Vec::new(),
            is_standard_form: false,
        };
        input.check_reserved_names()?;
        input.check_objective_variables()?;
        input.terms = input.collect_variable_names();
        Ok(input)
    }

    fn check_reserved_names(&self) -> Result<(), SolveError> {
        let objective = self.z.variable_names();
        let constraints = self.constraints.iter().flat_map(|c| c.term_names(false));
        match objective
            .into_iter()
            .chain(constraints)
            .find(|name| is_slack_name(name) || is_artificial_name(name))
        {
            Some(name) => Err(SolveError::ReservedTermName(name.to_string())),
            None => Ok(()),
        }
    }

    fn check_objective_variables(&self) -> Result<(), SolveError> {
        for name in self.z.variable_names() {
            if !self.constraints.iter().any(|c| c.left().has_term(name)) {
                return Err(SolveError::UnreferencedObjectiveVariable(name.to_string()));
            }
        }
        Ok(())
    }

    /// Sorted union of every variable name across the constraints
    fn collect_variable_names(&self) -> Vec<String> {
        let names: BTreeSet<&str> = self
            .constraints
            .iter()
            .flat_map(|c| c.term_names(false))
            .collect();
        names.into_iter().map(String::from).collect()
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    pub fn objective(&self) -> &Expression {
        &self.z
    }

    pub fn constraints(&self) -> &[Constraint] {
        &self.constraints
    }

    /// Variable names in sorted order. After standardization this includes
    /// the numbered slack and artificial terms.
    pub fn term_names(&self) -> &[String] {
        &self.terms
    }

    pub fn is_standard_form(&self) -> bool {
        self.is_standard_form
    }

    pub fn has_any_comparison(&self, comparison: Comparison) -> bool {
        self.constraints.iter().any(|c| c.comparison() == comparison)
    }

    pub fn all_have_comparison(&self, comparison: Comparison) -> bool {
        self.constraints.iter().all(|c| c.comparison() == comparison)
    }

    pub fn all_artificial_names(&self) -> Vec<&str> {
        self.constraints
            .iter()
            .filter_map(|c| c.artificial_name())
            .collect()
    }

    /// Slack and artificial names, constraint by constraint
    pub fn all_special_term_names(&self) -> Vec<&str> {
        self.constraints
            .iter()
            .flat_map(|c| c.special_term_names())
            .collect()
    }

    /// Turns every constraint into an equation and numbers the generated
    /// terms `slack1, slack2, ...` and `artificial1, artificial2, ...` in
    /// constraint order. Does nothing the second time.
    pub fn convert_to_standard_form(&mut self) -> &mut Self {
        if self.is_standard_form {
            return self;
        }
        for constraint in &mut self.constraints {
            constraint.convert_to_equation();
        }
        self.number_special_terms();
        self.terms = self.collect_variable_names();
        self.is_standard_form = true;

        for constraint in &self.constraints {
            trace!("standardized: {}", constraint);
        }
        self
    }

    fn number_special_terms(&mut self) {
        let mut slacks = 0;
        let mut artificials = 0;
        for constraint in &mut self.constraints {
            if constraint.has_special_term(SpecialTerm::Slack) {
                slacks += 1;
                constraint.rename_slack(&format!("slack{}", slacks));
            }
            if constraint.has_special_term(SpecialTerm::Artificial) {
                artificials += 1;
                constraint.rename_artificial(&format!("artificial{}", artificials));
            }
        }
    }

    /// Standardizes the problem and lays it out as numeric rows.
    ///
    /// Columns are the sorted user variables followed by each constraint's
    /// slack and artificial. The objective row comes from `0 = z` with the
    /// variables moved to the left, so it holds `-c` and the objective
    /// constant as its right-hand side.
    pub fn to_lp_problem(&mut self) -> LpProblem {
        self.convert_to_standard_form();

        let mut columns: Vec<Column> = self
            .terms
            .iter()
            .filter(|name| !is_slack_name(name) && !is_artificial_name(name))
            .map(|name| Column::new(name.as_str(), ColumnKind::Variable))
            .collect();
        for constraint in &self.constraints {
            if let Some(name) = constraint.slack_name() {
                columns.push(Column::new(name, ColumnKind::Slack));
            }
            if let Some(name) = constraint.artificial_name() {
                columns.push(Column::new(name, ColumnKind::Artificial));
            }
        }
        let names: Vec<&str> = columns.iter().map(|c| c.name.as_str()).collect();

        let mut objective = Constraint::new(Expression::new(), Comparison::Eq, self.z.clone());
        objective.move_type_to_one_side(Some(Side::Left), Some(Side::Right));
        let objective_row = objective.left().coefficients(&names);
        let objective_constant = objective.right().constant();

        let rows: Vec<(String, Vec<f64>, f64)> = self
            .constraints
            .iter()
            .map(|c| (c.to_string(), c.coefficients(&names), c.coefficients(&[CONSTANT])[0]))
            .collect();

        let mut problem = LpProblem::new(columns, self.direction);
        problem.set_objective(objective_row, objective_constant);
        for (name, coefficients, rhs) in rows {
            problem.add_constraint(name, coefficients, rhs);
        }
        problem
    }
}

impl fmt::Display for Input {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} z = {}, where ", self.direction, self.z)?;
        for (i, constraint) in self.constraints.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{}", constraint)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn textbook() -> Input {
        Input::parse(
            "maximize",
            "3x + 2y",
            &["x + y <= 4", "x + 3y <= 6", "x >= 0", "y >= 0"],
        )
        .unwrap()
    }

    #[test]
    fn test_parse_collects_variables() {
        let input = textbook();
        assert_eq!(input.direction(), Direction::Maximize);
        assert_eq!(input.term_names(), &["x", "y"]);
        assert!(!input.is_standard_form());
        assert!(input.has_any_comparison(Comparison::Ge));
        assert!(!input.all_have_comparison(Comparison::Le));
    }

    #[test]
    fn test_shape_errors() {
        assert!(matches!(
            Input::parse("maximize", "  ", &["x <= 1"]),
            Err(SolveError::InvalidRequestShape(_))
        ));
        assert!(matches!(
            Input::parse("maximise", "x", &["x <= 1"]),
            Err(SolveError::InvalidRequestShape(_))
        ));
        let none: [&str; 0] = [];
        assert!(matches!(
            Input::parse("maximize", "x", &none),
            Err(SolveError::InvalidRequestShape(_))
        ));
    }

    #[test]
    fn test_malformed_inputs() {
        assert!(matches!(
            Input::parse("maximize", "2 * x", &["x <= 1"]),
            Err(SolveError::MalformedExpression(_))
        ));
        match Input::parse("maximize", "x", &["x <= 1", "x >= <= 2"]) {
            Err(SolveError::MalformedConstraint { constraint, .. }) => {
                assert_eq!(constraint, "x >= <= 2")
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_unreferenced_objective_variable() {
        match Input::parse("maximize", "x + q", &["x <= 4"]) {
            Err(SolveError::UnreferencedObjectiveVariable(name)) => assert_eq!(name, "q"),
            other => panic!("unexpected {:?}", other),
        }
        // right-side occurrences do not count
        assert!(matches!(
            Input::parse("maximize", "x + q", &["x <= q + 4"]),
            Err(SolveError::UnreferencedObjectiveVariable(_))
        ));
    }

    #[test]
    fn test_reserved_names() {
        assert!(matches!(
            Input::parse("maximize", "x", &["x + slack2 <= 4"]),
            Err(SolveError::ReservedTermName(name)) if name == "slack2"
        ));
    }

    #[test]
    fn test_standard_form_numbers_special_terms() {
        let mut input = textbook();
        input.convert_to_standard_form();
        assert!(input.is_standard_form());
        assert!(input.all_have_comparison(Comparison::Eq));
        assert_eq!(
            input.all_special_term_names(),
            vec!["slack1", "slack2", "slack3", "artificial1", "slack4", "artificial2"]
        );
        assert_eq!(input.all_artificial_names(), vec!["artificial1", "artificial2"]);
        assert_eq!(input.constraints()[2].to_string(), "artificial1 - slack3 + x = 0");
        assert!(input.term_names().contains(&"slack4".to_string()));
    }

    #[test]
    fn test_standard_form_is_idempotent() {
        let mut once = textbook();
        once.convert_to_standard_form();
        let mut twice = once.clone();
        twice.convert_to_standard_form();
        assert_eq!(once, twice);
    }

    #[test]
    fn test_to_lp_problem_layout() {
        let mut input = Input::parse("minimize", "x + y + 3", &["x + y >= 2"]).unwrap();
        let problem = input.to_lp_problem();
        let names: Vec<_> = problem.column_names().collect();
        assert_eq!(names, vec!["x", "y", "slack1", "artificial1"]);
        assert_eq!(problem.objective.coefficients, vec![-1.0, -1.0, 0.0, 0.0]);
        assert_abs_diff_eq!(problem.objective.constant, 3.0);
        assert_eq!(problem.constraints[0].coefficients, vec![1.0, 1.0, -1.0, 1.0]);
        assert_abs_diff_eq!(problem.constraints[0].rhs, 2.0);
    }

    #[test]
    fn test_display() {
        let input = Input::parse("maximize", "2y + 3x", &["x + y <= 4", "x > 1"]).unwrap();
        assert_eq!(input.to_string(), "maximize z = 3x + 2y, where x + y <= 4, x > 1");
    }
}
