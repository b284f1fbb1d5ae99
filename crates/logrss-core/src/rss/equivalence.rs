//! Deciding whether two log-RSS vectors agree.

use ndarray::{Array1, Zip};
use serde::{Deserialize, Serialize};

use crate::constants::{DEFAULT_ROUNDING_DIGITS, MAX_ROUNDING_DIGITS};
use crate::error::{LogRssError, Result};

/// How two log-RSS vectors are compared.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EquivalencePolicy {
    /// Round both to this many decimals; every difference must be exactly 0.
    RoundedDecimals(u32),
    /// |a − b| ≤ tol · max(1, |a|, |b|) elementwise.
    RelativeTolerance(f64),
}

impl Default for EquivalencePolicy {
    fn default() -> Self {
        EquivalencePolicy::RoundedDecimals(DEFAULT_ROUNDING_DIGITS)
    }
}

impl EquivalencePolicy {
    /// Reject rounding finer than `MAX_ROUNDING_DIGITS` and negative or NaN
    /// tolerances.
    pub fn check(&self) -> Result<()> {
        match *self {
            EquivalencePolicy::RoundedDecimals(d) if d > MAX_ROUNDING_DIGITS => {
                Err(LogRssError::InvalidValue(format!(
                    "cannot round to {d} decimals (at most {MAX_ROUNDING_DIGITS})"
                )))
            }
            EquivalencePolicy::RelativeTolerance(tol) if !(tol >= 0.0) => Err(
                LogRssError::InvalidValue(format!("relative tolerance must be non-negative, got {tol}")),
            ),
            _ => Ok(()),
        }
    }
}

/// Round half away from zero to `decimals` places.
///
/// `decimals` is capped at `MAX_ROUNDING_DIGITS`.
pub fn round_to(value: f64, decimals: u32) -> f64 {
    let digits = decimals.min(MAX_ROUNDING_DIGITS);
    let scale = 10f64.powi(digits as i32);
    (value * scale).round() / scale
}

/// Outcome of comparing closed-form and linear-predictor log-RSS.
#[derive(Debug, Clone, PartialEq)]
pub struct EquivalenceReport {
    pub policy: EquivalencePolicy,
    /// Elementwise differences as the policy sees them (rounded for
    /// `RoundedDecimals`, raw for `RelativeTolerance`).
    pub differences: Array1<f64>,
    /// Signed sum of `differences`.
    pub sum_difference: f64,
    /// Largest raw |a − b|.
    pub max_abs_diff: f64,
    pub n_mismatched: usize,
    pub agrees: bool,
}

impl EquivalenceReport {
    /// Turn a disagreement into an error naming `case`.
    pub fn ensure(&self, case: &str) -> Result<()> {
        if self.agrees {
            Ok(())
        } else {
            Err(LogRssError::Disagreement {
                case: case.to_string(),
                n_mismatched: self.n_mismatched,
                max_abs_diff: self.max_abs_diff,
            })
        }
    }
}

/// Compare two equal-length log-RSS vectors under `policy`.
pub fn check_equivalence(
    a: &Array1<f64>,
    b: &Array1<f64>,
    policy: EquivalencePolicy,
) -> Result<EquivalenceReport> {
    if a.len() != b.len() {
        return Err(LogRssError::DimensionMismatch(format!(
            "cannot compare log-RSS vectors of length {} and {}",
            a.len(),
            b.len()
        )));
    }
    if a.is_empty() {
        return Err(LogRssError::EmptyInput("no log-RSS values to compare".to_string()));
    }
    policy.check()?;

    let max_abs_diff = Zip::from(a)
        .and(b)
        .fold(0.0f64, |acc, &x, &y| acc.max((x - y).abs()));

    let (differences, n_mismatched) = match policy {
        EquivalencePolicy::RoundedDecimals(decimals) => {
            let diffs = Zip::from(a)
                .and(b)
                .map_collect(|&x, &y| round_to(x, decimals) - round_to(y, decimals));
            let bad = diffs.iter().filter(|&&d| d != 0.0).count();
            (diffs, bad)
        }
        EquivalencePolicy::RelativeTolerance(tol) => {
            let diffs = a - b;
            let bad = Zip::from(a)
                .and(b)
                .fold(0usize, |acc, &x, &y| {
                    let scale = 1.0f64.max(x.abs()).max(y.abs());
                    if (x - y).abs() <= tol * scale {
                        acc
                    } else {
                        acc + 1
                    }
                });
            (diffs, bad)
        }
    };

    let sum_difference = differences.sum();
    let agrees = n_mismatched == 0
        && match policy {
            EquivalencePolicy::RoundedDecimals(_) => sum_difference == 0.0,
            EquivalencePolicy::RelativeTolerance(_) => true,
        };

    Ok(EquivalenceReport {
        policy,
        differences,
        sum_difference,
        max_abs_diff,
        n_mismatched,
        agrees,
    })
}
