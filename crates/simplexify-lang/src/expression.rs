use std::collections::BTreeMap;
use std::fmt;

use thiserror::Error;

/// Term name under which the constant of an expression is stored
pub const CONSTANT: &str = "1";

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ExpressionError {
    #[error("Comparisons are not allowed within an expression")]
    ComparisonInExpression,
    #[error("Only addition and subtraction are supported, found `{0}`")]
    UnsupportedOperator(char),
    #[error("Exactly one operator must be between terms. Good: (a+b). Bad: (a+- b+)")]
    IncompleteBinaryOperator,
    #[error("Invalid number: {0}")]
    InvalidNumber(String),
    #[error("Invalid term: {0}")]
    InvalidTerm(String),
}

/// A sum of terms, stored as term name -> coefficient.
///
/// The constant lives under [`CONSTANT`]. A coefficient of exactly zero is
/// never stored.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Expression {
    terms: BTreeMap<String, f64>,
}

/// `slack`, `slack1`, `SLACK12`, ...
pub fn is_slack_name(name: &str) -> bool {
    has_numbered_prefix(name, "slack")
}

/// `artificial`, `artificial1`, ...
pub fn is_artificial_name(name: &str) -> bool {
    has_numbered_prefix(name, "artificial")
}

fn has_numbered_prefix(name: &str, prefix: &str) -> bool {
    name.len() >= prefix.len()
        && name.is_char_boundary(prefix.len())
        && name[..prefix.len()].eq_ignore_ascii_case(prefix)
        && name[prefix.len()..].bytes().all(|b| b.is_ascii_digit())
}

impl Expression {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses a signed sum of terms such as `3x - 2.5y + 1e-3z + 4`.
    ///
    /// Each term is an optional numeral followed by an optional name. A bare
    /// numeral is the constant and a bare name has coefficient `±1`. Terms
    /// sharing a name are summed. An empty string is the empty expression.
    pub fn parse(source: &str) -> Result<Self, ExpressionError> {
        let mut expression = Self::new();
        if source.trim().is_empty() {
            return Ok(expression);
        }
        validate(source)?;
        for token in split_terms(source) {
            let (coefficient, name) = parse_term(&token)?;
            expression.add_term(name, coefficient);
            if expression.term_value(name).is_some_and(|v| !v.is_finite()) {
                return Err(ExpressionError::InvalidNumber(token));
            }
        }
        Ok(expression)
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    pub fn len(&self) -> usize {
        self.terms.len()
    }

    /// Adds `value` to the coefficient of `name`, dropping the term if the sum
    /// is zero.
    pub fn add_term(&mut self, name: &str, value: f64) -> &mut Self {
        let sum = value + self.terms.get(name).copied().unwrap_or(0.0);
        self.set_term(name, sum)
    }

    pub fn set_term(&mut self, name: &str, value: f64) -> &mut Self {
        if value == 0.0 {
            self.terms.remove(name);
        } else {
            self.terms.insert(name.to_string(), value);
        }
        self
    }

    pub fn remove_term(&mut self, name: &str) -> Option<f64> {
        self.terms.remove(name)
    }

    pub fn add_terms<'a>(&mut self, terms: impl IntoIterator<Item = (&'a str, f64)>) -> &mut Self {
        for (name, value) in terms {
            self.add_term(name, value);
        }
        self
    }

    pub fn add_expression(&mut self, other: &Expression) -> &mut Self {
        for (name, &value) in &other.terms {
            self.add_term(name, value);
        }
        self
    }

    pub fn scale(&mut self, factor: f64) -> &mut Self {
        for value in self.terms.values_mut() {
            *value *= factor;
        }
        self.terms.retain(|_, v| *v != 0.0);
        self
    }

    /// Multiplies every coefficient by -1
    pub fn negate(&mut self) -> &mut Self {
        for value in self.terms.values_mut() {
            *value = -*value;
        }
        self
    }

    pub fn has_term(&self, name: &str) -> bool {
        self.terms.contains_key(name)
    }

    pub fn term_value(&self, name: &str) -> Option<f64> {
        self.terms.get(name).copied()
    }

    pub fn constant(&self) -> f64 {
        self.term_value(CONSTANT).unwrap_or(0.0)
    }

    /// `(name, coefficient)` pairs, constant included, in map order
    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.terms.iter().map(|(k, &v)| (k.as_str(), v))
    }

    /// `(name, coefficient)` pairs of every non-constant term
    pub fn variables(&self) -> impl Iterator<Item = (&str, f64)> {
        self.iter().filter(|(name, _)| *name != CONSTANT)
    }

    /// Alphabetically sorted term names with the constant moved last
    pub fn term_names(&self) -> Vec<&str> {
        let mut names = self.variable_names();
        if self.has_term(CONSTANT) {
            names.push(CONSTANT);
        }
        names
    }

    /// Alphabetically sorted names, constant excluded
    pub fn variable_names(&self) -> Vec<&str> {
        self.variables().map(|(name, _)| name).collect()
    }

    pub fn variable_names_without_slack(&self) -> Vec<&str> {
        self.variables()
            .map(|(name, _)| name)
            .filter(|name| !is_slack_name(name))
            .collect()
    }

    /// Coefficients for `names`, zero where a term is absent
    pub fn coefficients<S: AsRef<str>>(&self, names: &[S]) -> Vec<f64> {
        names
            .iter()
            .map(|name| self.term_value(name.as_ref()).unwrap_or(0.0))
            .collect()
    }

    /// Coefficients in [`Expression::term_names`] order
    pub fn all_coefficients(&self) -> Vec<f64> {
        self.coefficients(&self.term_names())
    }
}

impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names = self.term_names();
        if names.is_empty() {
            return f.write_str("0");
        }
        for (i, name) in names.into_iter().enumerate() {
            let value = self.terms[name];
            let magnitude = value.abs();
            match (i, value < 0.0) {
                (0, true) => f.write_str("-")?,
                (0, false) => {}
                (_, true) => f.write_str(" - ")?,
                (_, false) => f.write_str(" + ")?,
            }
            if name == CONSTANT {
                write!(f, "{}", magnitude)?;
            } else if magnitude == 1.0 {
                f.write_str(name)?;
            } else {
                write!(f, "{}{}", magnitude, name)?;
            }
        }
        Ok(())
    }
}

fn validate(source: &str) -> Result<(), ExpressionError> {
    if source.contains(['<', '>', '=']) {
        return Err(ExpressionError::ComparisonInExpression);
    }
    if let Some(op) = source.chars().find(|c| matches!(c, '*' | '/' | '%')) {
        return Err(ExpressionError::UnsupportedOperator(op));
    }

    let compact: String = source.chars().filter(|c| !c.is_whitespace()).collect();
    let has_operator = compact.contains(['+', '-']);
    let several_words = source.split_whitespace().nth(1).is_some();
    let doubled = compact
        .as_bytes()
        .windows(2)
        .any(|w| matches!(w[0], b'+' | b'-') && matches!(w[1], b'+' | b'-'));
    let dangling = compact.ends_with(['+', '-']);

    if (several_words && !has_operator) || doubled || dangling {
        return Err(ExpressionError::IncompleteBinaryOperator);
    }
    Ok(())
}

/// `e`/`E` sign between two digits, as in `1e-5`
fn is_exponent_sign(chars: &[char], i: usize) -> bool {
    i >= 2
        && matches!(chars[i - 1], 'e' | 'E')
        && chars[i - 2].is_ascii_digit()
        && chars.get(i + 1).is_some_and(|c| c.is_ascii_digit())
}

/// Splits on binary `+`/`-`, keeping each operator as the sign of the term
/// that follows it.
fn split_terms(source: &str) -> Vec<String> {
    let chars: Vec<char> = source.trim().chars().collect();
    let mut terms = Vec::new();
    let mut current = String::new();

    for (i, &c) in chars.iter().enumerate() {
        if matches!(c, '+' | '-') && !is_exponent_sign(&chars, i) {
            if !current.trim().is_empty() {
                terms.push(current.trim().to_string());
            }
            current.clear();
        }
        current.push(c);
    }
    if !current.trim().is_empty() {
        terms.push(current.trim().to_string());
    }
    terms
}

/// Byte length of the leading numeral: `digits[.digits][e[+-]digits]`
fn numeral_len(s: &str) -> usize {
    let b = s.as_bytes();
    let digits = |from: usize| b.iter().skip(from).take_while(|c| c.is_ascii_digit()).count();

    let mut end = digits(0);
    if end == 0 {
        return 0;
    }
    if b.get(end) == Some(&b'.') {
        let fraction = digits(end + 1);
        if fraction > 0 {
            end += 1 + fraction;
        }
    }
    if matches!(b.get(end), Some(b'e' | b'E')) {
        let mut exponent = end + 1;
        if matches!(b.get(exponent), Some(b'+' | b'-')) {
            exponent += 1;
        }
        let n = digits(exponent);
        if n > 0 {
            end = exponent + n;
        }
    }
    end
}

fn parse_term(token: &str) -> Result<(f64, &str), ExpressionError> {
    let (sign, body) = match token.strip_prefix('-') {
        Some(rest) => (-1.0, rest.trim_start()),
        None => (1.0, token.strip_prefix('+').unwrap_or(token).trim_start()),
    };
    if body.is_empty() {
        return Err(ExpressionError::IncompleteBinaryOperator);
    }
    if body.contains(char::is_whitespace) {
        return Err(ExpressionError::InvalidTerm(body.to_string()));
    }

    let (numeral, name) = body.split_at(numeral_len(body));
    let coefficient = if numeral.is_empty() {
        1.0
    } else {
        numeral
            .parse::<f64>()
            .ok()
            .filter(|v| v.is_finite())
            .ok_or_else(|| ExpressionError::InvalidNumber(numeral.to_string()))?
    };

    let name = if name.is_empty() {
        CONSTANT
    } else if name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
        name
    } else {
        return Err(ExpressionError::InvalidTerm(body.to_string()));
    };

    Ok((sign * coefficient, name))
}
