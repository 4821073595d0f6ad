use std::fmt;
use std::str::FromStr;

/// A linear program in standard form, ready to be laid out as a tableau.
///
/// Every constraint is an equation whose coefficients follow the order of
/// `columns`, with its right-hand side kept separately.
#[derive(Debug, Clone)]
pub struct LpProblem {
    /// Column layout: variables first, then slack, then artificial columns
    pub columns: Vec<Column>,
    /// Objective row
    pub objective: Objective,
    /// Constraint rows, one per equation
    pub constraints: Vec<Constraint>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    pub name: String,
    pub kind: ColumnKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ColumnKind {
    /// A decision variable named by the user
    Variable,
    /// Slack or surplus column added to turn an inequality into an equation
    Slack,
    /// Artificial column added for a `>=` row
    Artificial,
}

#[derive(Debug, Clone)]
pub struct Objective {
    /// Coefficients for each column, already moved to the left side
    /// (`-c` for an objective `c·x`)
    pub coefficients: Vec<f64>,
    /// Constant of the objective, carried as the row's right-hand side
    pub constant: f64,
    pub direction: Direction,
}

#[derive(Debug, Clone)]
pub struct Constraint {
    /// Name/label for the constraint (for diagnostics)
    pub name: String,
    /// Coefficients for each column
    pub coefficients: Vec<f64>,
    /// Right-hand side value
    pub rhs: f64,
}

#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Maximize,
    Minimize,
}

impl Direction {
    pub fn is_minimize(self) -> bool {
        self == Direction::Minimize
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Direction::Maximize => "maximize",
            Direction::Minimize => "minimize",
        }
    }
}

impl FromStr for Direction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "maximize" => Ok(Direction::Maximize),
            "minimize" => Ok(Direction::Minimize),
            other => Err(format!(
                "`maximize` and `minimize` are the only supported types, found `{}`",
                other
            )),
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Column {
    pub fn new(name: impl Into<String>, kind: ColumnKind) -> Self {
        Self {
            name: name.into(),
            kind,
        }
    }
}

impl LpProblem {
    pub fn new(columns: Vec<Column>, direction: Direction) -> Self {
        let n = columns.len();
        Self {
            columns,
            objective: Objective {
                coefficients: vec![0.0; n],
                constant: 0.0,
                direction,
            },
            constraints: Vec::new(),
        }
    }

    pub fn set_objective(&mut self, coefficients: Vec<f64>, constant: f64) {
        self.objective.coefficients = coefficients;
        self.objective.constant = constant;
    }

    pub fn add_constraint(&mut self, name: impl Into<String>, coefficients: Vec<f64>, rhs: f64) {
        self.constraints.push(Constraint {
            name: name.into(),
            coefficients,
            rhs,
        });
    }

    pub fn num_columns(&self) -> usize {
        self.columns.len()
    }

    pub fn num_constraints(&self) -> usize {
        self.constraints.len()
    }

    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|c| c.name.as_str())
    }

    pub fn has_artificial(&self) -> bool {
        self.columns.iter().any(|c| c.kind == ColumnKind::Artificial)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_direction_parsing() {
        assert_eq!("maximize".parse::<Direction>(), Ok(Direction::Maximize));
        assert_eq!("minimize".parse::<Direction>(), Ok(Direction::Minimize));
        assert!("Maximize".parse::<Direction>().is_err());
        assert_eq!(Direction::Minimize.to_string(), "minimize");
    }

    #[test]
    fn test_problem_builder() {
        let mut problem = LpProblem::new(
            vec![
                Column::new("x", ColumnKind::Variable),
                Column::new("slack1", ColumnKind::Slack),
            ],
            Direction::Maximize,
        );
        problem.set_objective(vec![-1.0, 0.0], 0.0);
        problem.add_constraint("x <= 4", vec![1.0, 1.0], 4.0);

        assert_eq!(problem.num_columns(), 2);
        assert_eq!(problem.num_constraints(), 1);
        assert!(!problem.has_artificial());
        assert_eq!(problem.column_names().collect::<Vec<_>>(), vec!["x", "slack1"]);
    }
}
