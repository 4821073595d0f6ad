use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::SolveError;

/// The raw request accepted by [`crate::solve`]:
/// `{"type": "maximize", "objective": "3x + 2y", "constraints": ["x + y <= 4"]}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SolveRequest {
    #[serde(rename = "type")]
    pub kind: String,
    pub objective: String,
    pub constraints: Vec<String>,
}

impl SolveRequest {
    pub fn new(
        kind: impl Into<String>,
        objective: impl Into<String>,
        constraints: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        Self {
            kind: kind.into(),
            objective: objective.into(),
            constraints: constraints.into_iter().map(Into::into).collect(),
        }
    }

    pub fn from_json(text: &str) -> Result<Self, SolveError> {
        let value: Value = serde_json::from_str(text)?;
        Self::try_from(&value)
    }

    /// Drops constraints that are empty or only whitespace
    pub fn without_blank_constraints(mut self) -> Self {
        self.constraints.retain(|c| !c.trim().is_empty());
        self
    }
}

fn shape_error(message: &str) -> SolveError {
    SolveError::InvalidRequestShape(message.to_string())
}

impl TryFrom<&Value> for SolveRequest {
    type Error = SolveError;

    /// Checks field presence and types before anything is parsed
    fn try_from(value: &Value) -> Result<Self, Self::Error> {
        let object = value
            .as_object()
            .ok_or_else(|| shape_error("The request must be an object"))?;

        let (Some(kind), Some(objective), Some(constraints)) = (
            object.get("type"),
            object.get("objective"),
            object.get("constraints"),
        ) else {
            return Err(shape_error(
                "The request must have the properties `type`, `objective` and `constraints`",
            ));
        };

        let kind = kind
            .as_str()
            .ok_or_else(|| shape_error("`type` must be a string"))?;
        let objective = objective
            .as_str()
            .ok_or_else(|| shape_error("`objective` must be a string"))?;
        let constraints = constraints
            .as_array()
            .ok_or_else(|| shape_error("`constraints` must be a list of strings"))?
            .iter()
            .map(|c| {
                c.as_str()
                    .map(String::from)
                    .ok_or_else(|| shape_error("`constraints` must be a list of strings"))
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self::new(kind, objective, constraints))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_from_json() {
        let request = SolveRequest::from_json(
            r#"{"type": "minimize", "objective": "x + y", "constraints": ["x + y >= 2"]}"#,
        )
        .unwrap();
        assert_eq!(request, SolveRequest::new("minimize", "x + y", ["x + y >= 2"]));
    }

    #[test]
    fn test_shape_errors() {
        let cases = [
            json!([1, 2]),
            json!({"type": "maximize", "objective": "x"}),
            json!({"type": 1, "objective": "x", "constraints": ["x <= 1"]}),
            json!({"type": "maximize", "objective": ["x"], "constraints": ["x <= 1"]}),
            json!({"type": "maximize", "objective": "x", "constraints": "x <= 1"}),
            json!({"type": "maximize", "objective": "x", "constraints": [1]}),
        ];
        for case in &cases {
            assert!(
                matches!(SolveRequest::try_from(case), Err(SolveError::InvalidRequestShape(_))),
                "{}",
                case
            );
        }
        assert!(matches!(
            SolveRequest::from_json("{"),
            Err(SolveError::Json(_))
        ));
    }

    #[test]
    fn test_without_blank_constraints() {
        let request = SolveRequest::new("maximize", "x", ["x <= 1", "", "   ", "x >= 0"])
            .without_blank_constraints();
        assert_eq!(request.constraints, vec!["x <= 1", "x >= 0"]);
    }

    #[test]
    fn test_serializes_type_field() {
        let request = SolveRequest::new("maximize", "x", ["x <= 1"]);
        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value["type"], "maximize");
    }
}
