/// The result of solving an LP problem
#[derive(Debug, Clone, PartialEq)]
pub struct Solution {
    /// Solution status
    pub status: SolutionStatus,
    /// Column names in tableau order (variables, slacks, artificials)
    pub columns: Vec<String>,
    /// Value of each column, parallel to `columns`
    pub values: Vec<f64>,
    /// Objective value read from the last tableau row
    pub objective_value: f64,
    /// Number of pivots performed
    pub iterations: usize,
}

#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SolutionStatus {
    /// No entering column is left: the tableau is optimal
    Optimal,
    /// An entering column exists but no row passes the ratio test
    Unbounded,
    /// The feasibility pass could not drive the artificial columns to zero
    Infeasible,
    /// The pivot ceiling was reached before the tableau became optimal
    IterationLimit,
}

impl Solution {
    /// Value of a column by name
    pub fn value(&self, name: &str) -> Option<f64> {
        self.columns
            .iter()
            .position(|c| c == name)
            .map(|i| self.values[i])
    }

    pub fn is_optimal(&self) -> bool {
        self.status == SolutionStatus::Optimal
    }

    /// `(name, value)` pairs in column order
    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.columns
            .iter()
            .map(String::as_str)
            .zip(self.values.iter().copied())
    }
}

impl std::fmt::Display for SolutionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            SolutionStatus::Optimal => "OPTIMAL",
            SolutionStatus::Unbounded => "UNBOUNDED",
            SolutionStatus::Infeasible => "INFEASIBLE",
            SolutionStatus::IterationLimit => "ITERATION LIMIT",
        };
        f.write_str(s)
    }
}

/// Serializes as one flat object: every column in order, then `z`.
/// A column named `z` is shadowed by the objective value.
#[cfg(feature = "serde")]
impl serde::Serialize for Solution {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        use serde::ser::SerializeMap;

        let entries = self.iter().filter(|(name, _)| *name != "z");
        let mut map = serializer.serialize_map(None)?;
        for (name, value) in entries {
            map.serialize_entry(name, &value)?;
        }
        map.serialize_entry("z", &self.objective_value)?;
        map.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Solution {
        Solution {
            status: SolutionStatus::Optimal,
            columns: vec!["x".into(), "y".into(), "slack1".into()],
            values: vec![4.0, 0.0, 2.5],
            objective_value: 12.0,
            iterations: 2,
        }
    }

    #[test]
    fn test_value_lookup() {
        let solution = sample();
        assert_eq!(solution.value("x"), Some(4.0));
        assert_eq!(solution.value("slack1"), Some(2.5));
        assert_eq!(solution.value("q"), None);
        assert!(solution.is_optimal());
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_serializes_flat_object_in_column_order() {
        let json = serde_json::to_string(&sample()).unwrap();
        assert_eq!(json, r#"{"x":4.0,"y":0.0,"slack1":2.5,"z":12.0}"#);
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_column_named_z_is_shadowed() {
        let mut solution = sample();
        solution.columns[1] = "z".into();
        let json = serde_json::to_string(&solution).unwrap();
        assert_eq!(json, r#"{"x":4.0,"slack1":2.5,"z":12.0}"#);
    }
}
