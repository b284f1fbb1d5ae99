//! Formula parsing for R-style selection-model formulas.
//!
//! This module parses formulas like `"used ~ elev * slope + I(elev^2)"` or
//! `"used ~ log(slope) + log(elev)"` into a list of model terms. Each term is
//! a product of one or more factors, and each factor is a covariate that is
//! used raw, raised to an integer power, or log-transformed.
//!
//! Term names follow R's coefficient naming, so a fitted model's coefficients
//! can be looked up with the same strings you'd use against `coef(glm(...))`:
//! `elev`, `I(elev^2)`, `log(slope)`, `elev:slope`, `log(slope):elev`.

use std::fmt;

use crate::error::{LogRssError, Result};

/// Name of the intercept coefficient.
pub const INTERCEPT: &str = "(Intercept)";

/// One covariate feature inside a term.
#[derive(Debug, Clone, PartialEq)]
pub enum Factor {
    /// The covariate as-is: `elev`
    Variable(String),
    /// Integer power: `I(elev^2)`
    Power { var: String, exponent: i32 },
    /// Natural log: `log(slope)`
    Log(String),
}

impl Factor {
    /// The underlying covariate name.
    pub fn variable(&self) -> &str {
        match self {
            Factor::Variable(v) | Factor::Log(v) => v,
            Factor::Power { var, .. } => var,
        }
    }
}

impl fmt::Display for Factor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Factor::Variable(v) => write!(f, "{v}"),
            Factor::Power { var, exponent } => write!(f, "I({var}^{exponent})"),
            Factor::Log(v) => write!(f, "log({v})"),
        }
    }
}

/// A model term: the product of its factors.
#[derive(Debug, Clone, PartialEq)]
pub struct Term {
    pub factors: Vec<Factor>,
}

impl Term {
    /// Coefficient name, e.g. `log(slope):elev`.
    pub fn name(&self) -> String {
        self.factors
            .iter()
            .map(Factor::to_string)
            .collect::<Vec<_>>()
            .join(":")
    }
}

/// Result of parsing a formula
#[derive(Debug, Clone)]
pub struct ParsedFormula {
    pub response: String,
    pub terms: Vec<Term>,
    pub has_intercept: bool,
}

impl ParsedFormula {
    /// Coefficient names in design-matrix column order.
    pub fn coefficient_names(&self) -> Vec<String> {
        let mut names = Vec::with_capacity(self.terms.len() + 1);
        if self.has_intercept {
            names.push(INTERCEPT.to_string());
        }
        names.extend(self.terms.iter().map(Term::name));
        names
    }

    /// Distinct covariates the terms read, in first-use order.
    pub fn variables(&self) -> Vec<String> {
        let mut vars: Vec<String> = Vec::new();
        for factor in self.terms.iter().flat_map(|t| t.factors.iter()) {
            if !vars.iter().any(|v| v == factor.variable()) {
                vars.push(factor.variable().to_string());
            }
        }
        vars
    }
}

/// Split on `sep` at parenthesis depth 0.
fn split_top_level(s: &str, sep: char) -> Vec<String> {
    let mut parts = Vec::new();
    let mut current = String::new();
    let mut depth = 0i32;

    for c in s.chars() {
        match c {
            '(' => {
                depth += 1;
                current.push(c);
            }
            ')' => {
                depth -= 1;
                current.push(c);
            }
            c if c == sep && depth == 0 => {
                parts.push(current.trim().to_string());
                current = String::new();
            }
            _ => current.push(c),
        }
    }
    parts.push(current.trim().to_string());
    parts
}

fn is_identifier(s: &str) -> bool {
    !s.is_empty()
        && !s.starts_with(|c: char| c.is_ascii_digit())
        && s.chars().all(|c| c.is_alphanumeric() || c == '_' || c == '.')
}

fn parse_identifier(s: &str) -> Result<String> {
    let s = s.trim();
    if is_identifier(s) {
        Ok(s.to_string())
    } else {
        Err(LogRssError::FormulaParse(format!("'{s}' is not a valid covariate name")))
    }
}

/// Strip `prefix(` ... `)` and return the inside.
fn call_argument<'a>(s: &'a str, prefix: &str) -> Option<&'a str> {
    s.strip_prefix(prefix)?.trim_start().strip_prefix('(')?.strip_suffix(')')
}

/// Parse a single factor: `x`, `I(x^2)` or `log(x)`.
fn parse_factor(s: &str) -> Result<Factor> {
    let s = s.trim();

    if let Some(inner) = call_argument(s, "log") {
        return Ok(Factor::Log(parse_identifier(inner)?));
    }

    if let Some(inner) = call_argument(s, "I") {
        let (var, exponent) = inner.split_once('^').ok_or_else(|| {
            LogRssError::FormulaParse(format!("I() only supports powers like I(x^2), got '{s}'"))
        })?;
        let exponent: i32 = exponent.trim().parse().map_err(|_| {
            LogRssError::FormulaParse(format!("exponent in '{s}' must be an integer"))
        })?;
        return Ok(match exponent {
            1 => Factor::Variable(parse_identifier(var)?),
            _ => Factor::Power {
                var: parse_identifier(var)?,
                exponent,
            },
        });
    }

    Ok(Factor::Variable(parse_identifier(s)?))
}

/// All non-empty subsets of `factors`, smallest first, in index order.
///
/// `a*b*c` → a, b, c, a:b, a:c, b:c, a:b:c
fn expand_crossing(factors: &[Factor]) -> Vec<Term> {
    fn combinations(factors: &[Factor], k: usize, start: usize, acc: &mut Vec<Factor>, out: &mut Vec<Term>) {
        if acc.len() == k {
            out.push(Term {
                factors: acc.clone(),
            });
            return;
        }
        for i in start..factors.len() {
            acc.push(factors[i].clone());
            combinations(factors, k, i + 1, acc, out);
            acc.pop();
        }
    }

    let mut out = Vec::new();
    for k in 1..=factors.len() {
        combinations(factors, k, 0, &mut Vec::with_capacity(k), &mut out);
    }
    out
}

fn push_unique(terms: &mut Vec<Term>, term: Term) {
    let name = term.name();
    if !terms.iter().any(|t| t.name() == name) {
        terms.push(term);
    }
}

/// Parse a formula string into structured components.
///
/// Handles:
/// - Main effects: `x`
/// - Powers: `I(x^2)`
/// - Log transforms: `log(x)`
/// - Interactions: `a:b` (product only), `a*b` (= a + b + a:b)
/// - Intercept removal: `0 + ...` or `... - 1`
///
/// Terms are ordered like R orders them: main effects first, then two-way
/// interactions, and so on.
pub fn parse_formula(formula: &str) -> Result<ParsedFormula> {
    let (lhs, rhs) = formula
        .split_once('~')
        .ok_or_else(|| LogRssError::FormulaParse(format!("Formula must contain '~': {formula}")))?;
    if rhs.contains('~') {
        return Err(LogRssError::FormulaParse(format!(
            "Formula must contain exactly one '~': {formula}"
        )));
    }

    let response = parse_identifier(lhs)?;
    let mut rhs = rhs.trim().to_string();
    let mut has_intercept = true;

    // "... - 1"
    if let Some(stripped) = rhs.strip_suffix("-1").or_else(|| rhs.strip_suffix("- 1")) {
        has_intercept = false;
        rhs = stripped.trim().trim_end_matches('+').trim().to_string();
    }

    let mut terms: Vec<Term> = Vec::new();

    for piece in split_top_level(&rhs, '+') {
        match piece.as_str() {
            "" => {
                return Err(LogRssError::FormulaParse(format!(
                    "empty term in '{formula}'"
                )))
            }
            "0" => {
                has_intercept = false;
                continue;
            }
            "1" => continue,
            _ => {}
        }

        let crossed = split_top_level(&piece, '*');
        if crossed.len() > 1 {
            let factors = crossed
                .iter()
                .map(|f| parse_factor(f))
                .collect::<Result<Vec<_>>>()?;
            for term in expand_crossing(&factors) {
                push_unique(&mut terms, term);
            }
            continue;
        }

        let factors = split_top_level(&piece, ':')
            .iter()
            .map(|f| parse_factor(f))
            .collect::<Result<Vec<_>>>()?;
        push_unique(&mut terms, Term { factors });
    }

    if terms.is_empty() && !has_intercept {
        return Err(LogRssError::FormulaParse(format!(
            "formula has no terms and no intercept: {formula}"
        )));
    }

    // Stable sort keeps the written order within each interaction order
    terms.sort_by_key(|t| t.factors.len());

    Ok(ParsedFormula {
        response,
        terms,
        has_intercept,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(formula: &str) -> Vec<String> {
        parse_formula(formula).unwrap().coefficient_names()
    }

    #[test]
    fn test_parse_additive() {
        let parsed = parse_formula("used ~ elev + slope").unwrap();
        assert_eq!(parsed.response, "used");
        assert!(parsed.has_intercept);
        assert_eq!(names("used ~ elev + slope"), vec!["(Intercept)", "elev", "slope"]);
    }

    #[test]
    fn test_crossing_expands_to_main_effects_and_interaction() {
        assert_eq!(
            names("used ~ elev * slope"),
            vec!["(Intercept)", "elev", "slope", "elev:slope"]
        );
    }

    #[test]
    fn test_quadratic_term_name() {
        assert_eq!(names("used ~ elev + I(elev^2)"), vec!["(Intercept)", "elev", "I(elev^2)"]);
    }

    #[test]
    fn test_interactions_sort_after_main_effects() {
        assert_eq!(
            names("used ~ elev * slope + I(elev^2)"),
            vec!["(Intercept)", "elev", "slope", "I(elev^2)", "elev:slope"]
        );
    }

    #[test]
    fn test_log_terms() {
        assert_eq!(
            names("used ~ log(slope) * elev"),
            vec!["(Intercept)", "log(slope)", "elev", "log(slope):elev"]
        );
        assert_eq!(
            names("used ~ log(slope) + log(elev)"),
            vec!["(Intercept)", "log(slope)", "log(elev)"]
        );
    }

    #[test]
    fn test_three_way_crossing() {
        assert_eq!(
            names("y ~ a * b * c"),
            vec!["(Intercept)", "a", "b", "c", "a:b", "a:c", "b:c", "a:b:c"]
        );
    }

    #[test]
    fn test_duplicate_terms_collapse() {
        assert_eq!(names("y ~ a + a + a:b + a*b"), vec!["(Intercept)", "a", "b", "a:b"]);
    }

    #[test]
    fn test_no_intercept() {
        assert!(!parse_formula("y ~ 0 + x1 + x2").unwrap().has_intercept);
        assert!(!parse_formula("y ~ x1 + x2 - 1").unwrap().has_intercept);
        assert_eq!(names("y ~ x1 + x2 - 1"), vec!["x1", "x2"]);
    }

    #[test]
    fn test_variables() {
        let parsed = parse_formula("used ~ log(slope) * elev + I(elev^2)").unwrap();
        assert_eq!(parsed.variables(), vec!["slope", "elev"]);
    }

    #[test]
    fn test_power_of_one_is_plain_variable() {
        assert_eq!(names("y ~ I(x^1)"), vec!["(Intercept)", "x"]);
    }

    #[test]
    fn test_malformed_formulas() {
        assert!(matches!(parse_formula("used elev"), Err(LogRssError::FormulaParse(_))));
        assert!(matches!(parse_formula("y ~ a ~ b"), Err(LogRssError::FormulaParse(_))));
        assert!(matches!(parse_formula("y ~ a + "), Err(LogRssError::FormulaParse(_))));
        assert!(matches!(parse_formula("y ~ I(a^b)"), Err(LogRssError::FormulaParse(_))));
        assert!(matches!(parse_formula("y ~ sqrt(a)"), Err(LogRssError::FormulaParse(_))));
    }
}
