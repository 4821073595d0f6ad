use std::fmt;
use std::str::FromStr;

use thiserror::Error;

use crate::expression::{CONSTANT, Expression, ExpressionError};

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConstraintError {
    #[error("A constraint needs exactly one comparison (<, <=, =, >=, >)")]
    MissingComparison,
    #[error("Only one comparison is allowed per constraint")]
    MultipleComparisons,
    #[error("Exactly one operator must be between terms. Good: (a+b). Bad: (a+- b+)")]
    IncompleteBinaryOperator,
    #[error("Unknown comparison `{0}`")]
    UnknownComparison(String),
    #[error(transparent)]
    Expression(#[from] ExpressionError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Comparison {
    Eq,
    Lt,
    Le,
    Gt,
    Ge,
}

impl Comparison {
    pub fn symbol(self) -> &'static str {
        match self {
            Comparison::Eq => "=",
            Comparison::Lt => "<",
            Comparison::Le => "<=",
            Comparison::Gt => ">",
            Comparison::Ge => ">=",
        }
    }

    /// Comparison used after both sides are multiplied by -1.
    ///
    /// `=` maps to itself, `>=` and `<` map to each other, and so do `>` and
    /// `<=`.
    pub fn inverse(self) -> Self {
        match self {
            Comparison::Eq => Comparison::Eq,
            Comparison::Ge => Comparison::Lt,
            Comparison::Lt => Comparison::Ge,
            Comparison::Gt => Comparison::Le,
            Comparison::Le => Comparison::Gt,
        }
    }

    pub fn is_strict(self) -> bool {
        matches!(self, Comparison::Lt | Comparison::Gt)
    }

    /// `<` becomes `<=` and `>` becomes `>=`
    pub fn non_strict(self) -> Self {
        match self {
            Comparison::Lt => Comparison::Le,
            Comparison::Gt => Comparison::Ge,
            other => other,
        }
    }
}

impl FromStr for Comparison {
    type Err = ConstraintError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "=" => Ok(Comparison::Eq),
            "<" => Ok(Comparison::Lt),
            "<=" => Ok(Comparison::Le),
            ">" => Ok(Comparison::Gt),
            ">=" => Ok(Comparison::Ge),
            other => Err(ConstraintError::UnknownComparison(other.to_string())),
        }
    }
}

impl fmt::Display for Comparison {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Left,
    Right,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpecialTerm {
    Slack,
    Artificial,
}

/// Current names of the generated terms of a constraint
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SpecialTerms {
    pub slack: Option<String>,
    pub artificial: Option<String>,
}

impl SpecialTerms {
    pub fn get(&self, kind: SpecialTerm) -> Option<&str> {
        match kind {
            SpecialTerm::Slack => self.slack.as_deref(),
            SpecialTerm::Artificial => self.artificial.as_deref(),
        }
    }

    fn slot_mut(&mut self, kind: SpecialTerm) -> &mut Option<String> {
        match kind {
            SpecialTerm::Slack => &mut self.slack,
            SpecialTerm::Artificial => &mut self.artificial,
        }
    }
}

/// Two expressions related by a comparison, plus the slack and artificial
/// terms added while converting it to an equation.
#[derive(Debug, Clone, PartialEq)]
pub struct Constraint {
    comparison: Comparison,
    left: Expression,
    right: Expression,
    special: SpecialTerms,
}

impl Constraint {
    /// Shift applied to the right side when a strict comparison is relaxed
    pub const EPSILON: f64 = 1e-6;

    pub fn new(left: Expression, comparison: Comparison, right: Expression) -> Self {
        Self {
            comparison,
            left,
            right,
            special: SpecialTerms::default(),
        }
    }

    /// Parses text such as `2x + y <= 10` or `x > = 3`. An empty right side
    /// reads as `0`.
    pub fn parse(source: &str) -> Result<Self, ConstraintError> {
        let source = collapse_comparisons(source);
        let (at, len) = find_comparison(&source)?;
        check_operators(&source)?;

        let comparison: Comparison = source[at..at + len].parse()?;
        let left = Expression::parse(&source[..at])?;
        let right = Expression::parse(&source[at + len..])?;
        Ok(Self::new(left, comparison, right))
    }

    pub fn comparison(&self) -> Comparison {
        self.comparison
    }

    pub fn left(&self) -> &Expression {
        &self.left
    }

    pub fn right(&self) -> &Expression {
        &self.right
    }

    pub fn special_terms(&self) -> &SpecialTerms {
        &self.special
    }

    /// Variables to the left, constant to the right, non-negative right
    /// constant and no strict comparison.
    pub fn normalize(&mut self) -> &mut Self {
        self.move_type_to_one_side(Some(Side::Left), Some(Side::Right));
        if self.right.constant() < 0.0 {
            self.inverse();
        }
        self.remove_strict_inequality()
    }

    /// Moves every variable term to `variables` and the constant to
    /// `constants`. `None` leaves that kind of term where it is.
    pub fn move_type_to_one_side(
        &mut self,
        variables: Option<Side>,
        constants: Option<Side>,
    ) -> &mut Self {
        if let Some(side) = variables {
            let (from, to) = self.sides_towards(side);
            let names: Vec<String> = from.variable_names().into_iter().map(String::from).collect();
            for name in names {
                move_term(from, to, &name);
            }
        }
        if let Some(side) = constants {
            let (from, to) = self.sides_towards(side);
            move_term(from, to, CONSTANT);
        }
        self
    }

    /// Moves a single term to `to`, negating it. A numeric name means the
    /// constant.
    pub fn switch_side(&mut self, name: &str, to: Side) -> &mut Self {
        let name = if name.trim().parse::<f64>().is_ok() {
            CONSTANT
        } else {
            name
        };
        let (from, to) = self.sides_towards(to);
        move_term(from, to, name);
        self
    }

    fn sides_towards(&mut self, side: Side) -> (&mut Expression, &mut Expression) {
        match side {
            Side::Left => (&mut self.right, &mut self.left),
            Side::Right => (&mut self.left, &mut self.right),
        }
    }

    /// Multiplies both sides by -1 and inverts the comparison
    pub fn inverse(&mut self) -> &mut Self {
        self.comparison = self.comparison.inverse();
        self.left.negate();
        self.right.negate();
        self
    }

    /// `a > b` becomes `a >= b + EPSILON`, `a < b` becomes `a <= b - EPSILON`
    pub fn remove_strict_inequality(&mut self) -> &mut Self {
        if self.comparison.is_strict() {
            let shift = match self.comparison {
                Comparison::Gt => Self::EPSILON,
                _ => -Self::EPSILON,
            };
            self.right.add_term(CONSTANT, shift);
            self.comparison = self.comparison.non_strict();
        }
        self
    }

    /// Normalizes, then turns the constraint into an equation: `<=` gets a
    /// `+slack`, `>=` gets `-slack + artificial`.
    pub fn convert_to_equation(&mut self) -> &mut Self {
        self.normalize();
        match self.comparison {
            Comparison::Le => {
                self.add_slack(1.0);
            }
            Comparison::Ge => {
                self.add_slack(-1.0);
                self.add_artificial(1.0);
            }
            _ => {}
        }
        self.comparison = Comparison::Eq;
        self
    }

    pub fn add_slack(&mut self, value: f64) -> &mut Self {
        self.set_special_term(SpecialTerm::Slack, "slack", Some(value))
    }

    pub fn add_artificial(&mut self, value: f64) -> &mut Self {
        self.set_special_term(SpecialTerm::Artificial, "artificial", Some(value))
    }

    pub fn rename_slack(&mut self, name: &str) -> &mut Self {
        self.set_special_term(SpecialTerm::Slack, name, None)
    }

    pub fn rename_artificial(&mut self, name: &str) -> &mut Self {
        self.set_special_term(SpecialTerm::Artificial, name, None)
    }

    /// Registers `name` as the term for `kind` on the left side, replacing
    /// the previous one. Without a `value` the previous coefficient is kept.
    pub fn set_special_term(
        &mut self,
        kind: SpecialTerm,
        name: &str,
        value: Option<f64>,
    ) -> &mut Self {
        let slot = self.special.slot_mut(kind);
        let previous = slot.take().and_then(|old| self.left.remove_term(&old));
        *slot = Some(name.to_string());
        self.left
            .set_term(name, value.or(previous).unwrap_or(0.0));
        self
    }

    pub fn has_special_term(&self, kind: SpecialTerm) -> bool {
        self.special.get(kind).is_some()
    }

    /// Slack name first, then artificial
    pub fn special_term_names(&self) -> Vec<&str> {
        [SpecialTerm::Slack, SpecialTerm::Artificial]
            .into_iter()
            .filter_map(|kind| self.special.get(kind))
            .collect()
    }

    pub fn special_term_value(&self, kind: SpecialTerm) -> Option<f64> {
        self.special
            .get(kind)
            .map(|name| self.coefficients(&[name])[0])
    }

    pub fn slack_name(&self) -> Option<&str> {
        self.special.get(SpecialTerm::Slack)
    }

    pub fn artificial_name(&self) -> Option<&str> {
        self.special.get(SpecialTerm::Artificial)
    }

    /// Multiplies both sides by `factor`
    pub fn scale(&mut self, factor: f64) -> &mut Self {
        self.left.scale(factor);
        self.right.scale(factor);
        self
    }

    /// Coefficient of each name, read from the left side first, then the
    /// right side, zero if absent from both.
    pub fn coefficients<S: AsRef<str>>(&self, names: &[S]) -> Vec<f64> {
        names
            .iter()
            .map(|name| {
                let name = name.as_ref();
                self.left
                    .term_value(name)
                    .or_else(|| self.right.term_value(name))
                    .unwrap_or(0.0)
            })
            .collect()
    }

    /// Coefficient of each name as if every term sat on the left side
    pub fn left_side_coefficients<S: AsRef<str>>(&self, names: &[S]) -> Vec<f64> {
        names
            .iter()
            .map(|name| {
                let name = name.as_ref();
                self.left
                    .term_value(name)
                    .or_else(|| self.right.term_value(name).map(|v| -v))
                    .unwrap_or(0.0)
            })
            .collect()
    }

    /// Distinct term names of both sides, left side first
    pub fn term_names(&self, include_constant: bool) -> Vec<&str> {
        let mut names: Vec<&str> = Vec::new();
        let all = self.left.term_names().into_iter().chain(self.right.term_names());
        for name in all {
            if (include_constant || name != CONSTANT) && !names.contains(&name) {
                names.push(name);
            }
        }
        names
    }
}

impl fmt::Display for Constraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.left, self.comparison, self.right)
    }
}

fn move_term(from: &mut Expression, to: &mut Expression, name: &str) {
    if let Some(value) = from.remove_term(name) {
        to.add_term(name, -value);
    }
}

/// `> =` and `< =` are read as `>=` and `<=`
fn collapse_comparisons(source: &str) -> String {
    let mut out = String::with_capacity(source.len());
    let mut chars = source.chars().peekable();
    while let Some(c) = chars.next() {
        out.push(c);
        if matches!(c, '<' | '>') {
            let mut gap = String::new();
            while let Some(&w) = chars.peek() {
                if !w.is_whitespace() {
                    break;
                }
                gap.push(w);
                chars.next();
            }
            if chars.peek() != Some(&'=') {
                out.push_str(&gap);
            }
        }
    }
    out
}

/// Byte offset and length of the single comparison operator
fn find_comparison(source: &str) -> Result<(usize, usize), ConstraintError> {
    let bytes = source.as_bytes();
    let mut found = None;
    let mut count = 0;
    let mut i = 0;
    while i < bytes.len() {
        let len = match bytes[i] {
            b'<' | b'>' if bytes.get(i + 1) == Some(&b'=') => 2,
            b'<' | b'>' | b'=' => 1,
            _ => 0,
        };
        if len > 0 {
            count += 1;
            found.get_or_insert((i, len));
            i += len;
        } else {
            i += 1;
        }
    }
    match (count, found) {
        (1, Some(at)) => Ok(at),
        (0, _) => Err(ConstraintError::MissingComparison),
        _ => Err(ConstraintError::MultipleComparisons),
    }
}

fn is_operator(c: char) -> bool {
    matches!(c, '+' | '-' | '<' | '>' | '=')
}

/// Rejects a sign followed by another operator, a trailing sign, and two terms
/// separated only by whitespace.
fn check_operators(source: &str) -> Result<(), ConstraintError> {
    let compact: Vec<char> = source.chars().filter(|c| !c.is_whitespace()).collect();
    let doubled = compact
        .windows(2)
        .any(|w| matches!(w[0], '+' | '-') && is_operator(w[1]));
    let dangling = compact.last().is_some_and(|&c| matches!(c, '+' | '-'));

    let words: Vec<&str> = source.split_whitespace().collect();
    let juxtaposed = words.windows(2).any(|w| {
        let before = w[0].chars().last();
        let after = w[1].chars().next();
        matches!((before, after), (Some(a), Some(b)) if !is_operator(a) && !is_operator(b))
    });

    if doubled || dangling || juxtaposed {
        return Err(ConstraintError::IncompleteBinaryOperator);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn parse(s: &str) -> Constraint {
        Constraint::parse(s).unwrap()
    }

    #[test]
    fn test_parse_sides_and_comparison() {
        let c = parse("2x + y <= 10");
        assert_eq!(c.comparison(), Comparison::Le);
        assert_eq!(c.left().to_string(), "2x + y");
        assert_eq!(c.right().to_string(), "10");

        let c = parse("x > = 3");
        assert_eq!(c.comparison(), Comparison::Ge);

        let c = parse("x - y =");
        assert_eq!(c.comparison(), Comparison::Eq);
        assert!(c.right().is_empty());
        assert_eq!(c.to_string(), "x - y = 0");
    }

    #[test]
    fn test_parse_errors() {
        assert_eq!(
            Constraint::parse("x + y"),
            Err(ConstraintError::MissingComparison)
        );
        assert_eq!(
            Constraint::parse("x >= <= 2"),
            Err(ConstraintError::MultipleComparisons)
        );
        assert_eq!(
            Constraint::parse("x = y = 2"),
            Err(ConstraintError::MultipleComparisons)
        );
        assert_eq!(
            Constraint::parse("x + <= 2"),
            Err(ConstraintError::IncompleteBinaryOperator)
        );
        assert_eq!(
            Constraint::parse("x <= 2 +"),
            Err(ConstraintError::IncompleteBinaryOperator)
        );
        assert_eq!(
            Constraint::parse("x y <= 2"),
            Err(ConstraintError::IncompleteBinaryOperator)
        );
        assert_eq!(
            Constraint::parse("2*x <= 2"),
            Err(ConstraintError::Expression(
                ExpressionError::UnsupportedOperator('*')
            ))
        );
    }

    #[test]
    fn test_comparison_inverse_table() {
        assert_eq!(Comparison::Eq.inverse(), Comparison::Eq);
        assert_eq!(Comparison::Ge.inverse(), Comparison::Lt);
        assert_eq!(Comparison::Lt.inverse(), Comparison::Ge);
        assert_eq!(Comparison::Gt.inverse(), Comparison::Le);
        assert_eq!(Comparison::Le.inverse(), Comparison::Gt);
        assert_eq!("<=".parse::<Comparison>(), Ok(Comparison::Le));
        assert!("=<".parse::<Comparison>().is_err());
    }

    #[test]
    fn test_normalize_moves_terms() {
        let mut c = parse("3 + x <= 2y + 7");
        c.normalize();
        assert_eq!(c.comparison(), Comparison::Le);
        assert_eq!(c.left().to_string(), "x - 2y");
        assert_eq!(c.right().to_string(), "4");

        // negative right constant flips the row
        let mut c = parse("x - y >= -4");
        c.normalize();
        assert_eq!(c.left().to_string(), "-x + y");
        // >= inverts to <, then relaxes to <=
        assert_eq!(c.comparison(), Comparison::Le);
        assert_abs_diff_eq!(c.right().constant(), 4.0 - Constraint::EPSILON);
    }

    #[test]
    fn test_normalize_is_idempotent() {
        for text in ["x + 2 >= 3y - 1", "x - y <= -4", "2x = 8 - y", "a > 5", "x + y >= 0"] {
            let mut once = parse(text);
            once.normalize();
            let mut twice = once.clone();
            twice.normalize();
            assert_eq!(once, twice, "{}", text);
        }
    }

    #[test]
    fn test_normalize_flips_again_below_epsilon() {
        // `x < 0` relaxes to a negative right side, so normalize is not stable
        let mut once = parse("x < 0");
        once.normalize();
        assert_eq!(once.comparison(), Comparison::Le);
        assert_eq!(once.left().to_string(), "x");
        assert_abs_diff_eq!(once.right().constant(), -Constraint::EPSILON);

        let mut twice = once.clone();
        twice.normalize();
        assert_ne!(once, twice);
        assert_eq!(twice.comparison(), Comparison::Ge);
        assert_eq!(twice.left().to_string(), "-x");
        assert_abs_diff_eq!(twice.right().constant(), 2.0 * Constraint::EPSILON);
    }

    #[test]
    fn test_strict_comparisons_shift_by_epsilon() {
        let mut c = parse("x > 2");
        c.normalize();
        assert_eq!(c.comparison(), Comparison::Ge);
        assert_abs_diff_eq!(c.right().constant(), 2.000001, epsilon = 1e-12);

        let mut c = parse("x < 2");
        c.normalize();
        assert_eq!(c.comparison(), Comparison::Le);
        assert_abs_diff_eq!(c.right().constant(), 1.999999, epsilon = 1e-12);
    }

    #[test]
    fn test_convert_to_equation() {
        let mut c = parse("x + y <= 4");
        c.convert_to_equation();
        assert_eq!(c.comparison(), Comparison::Eq);
        assert_eq!(c.special_term_names(), vec!["slack"]);
        assert_eq!(c.special_term_value(SpecialTerm::Slack), Some(1.0));
        assert!(!c.has_special_term(SpecialTerm::Artificial));

        let mut c = parse("x + y >= 2");
        c.convert_to_equation();
        assert_eq!(c.special_term_names(), vec!["slack", "artificial"]);
        assert_eq!(c.special_term_value(SpecialTerm::Slack), Some(-1.0));
        assert_eq!(c.special_term_value(SpecialTerm::Artificial), Some(1.0));

        let mut c = parse("x = 3");
        c.convert_to_equation();
        assert!(c.special_term_names().is_empty());
    }

    #[test]
    fn test_rename_special_terms_keeps_value() {
        let mut c = parse("x >= 2");
        c.convert_to_equation();
        c.rename_slack("slack3").rename_artificial("artificial1");
        assert_eq!(c.slack_name(), Some("slack3"));
        assert_eq!(c.artificial_name(), Some("artificial1"));
        assert!(!c.left().has_term("slack"));
        assert_eq!(c.left().term_value("slack3"), Some(-1.0));
        assert_eq!(c.to_string(), "artificial1 - slack3 + x = 2");
    }

    #[test]
    fn test_coefficients() {
        let c = parse("2x + 1 = 3y - 4");
        assert_eq!(c.coefficients(&["x", "y", "1", "z"]), vec![2.0, 3.0, 1.0, 0.0]);
        assert_eq!(
            c.left_side_coefficients(&["x", "y", "z"]),
            vec![2.0, -3.0, 0.0]
        );
        assert_eq!(c.term_names(true), vec!["x", "1", "y"]);
        assert_eq!(c.term_names(false), vec!["x", "y"]);
    }

    #[test]
    fn test_switch_side_and_scale() {
        let mut c = parse("x + 3 <= y");
        c.switch_side("3", Side::Right).switch_side("y", Side::Left);
        assert_eq!(c.to_string(), "x - y <= -3");
        c.scale(2.0);
        assert_eq!(c.to_string(), "2x - 2y <= -6");
    }
}
