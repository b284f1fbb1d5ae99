// =============================================================================
// Statistical Inference
// =============================================================================
//
// Wald-type inference for binomial selection models. The dispersion is fixed
// at 1, so every test statistic is referred to the standard normal:
//
//   - coefficient summaries:  z = β̂ / SE(β̂), two-sided p-value
//   - log-RSS intervals:      log-RSS ± z_{1-α/2} × SE(log-RSS)
//
// =============================================================================

use statrs::distribution::{ContinuousCDF, Normal};

fn standard_normal() -> Option<Normal> {
    Normal::new(0.0, 1.0).ok()
}

/// Two-tailed p-value from a z-statistic.
///
/// P(|Z| > |z|) = 2 × (1 − Φ(|z|))
pub fn pvalue_z(z: f64) -> f64 {
    if !z.is_finite() {
        return f64::NAN;
    }
    match standard_normal() {
        Some(normal) => 2.0 * (1.0 - normal.cdf(z.abs())),
        None => f64::NAN,
    }
}

/// Critical value z_{1-α/2} for a two-sided interval at `confidence`.
///
/// Returns NaN unless 0 < confidence < 1.
pub fn z_critical(confidence: f64) -> f64 {
    if !(confidence > 0.0 && confidence < 1.0) {
        return f64::NAN;
    }
    let alpha = 1.0 - confidence;
    match standard_normal() {
        Some(normal) => normal.inverse_cdf(1.0 - alpha / 2.0),
        None => f64::NAN,
    }
}

/// Confidence interval using the normal distribution.
///
/// Returns (lower, upper). A zero standard error gives a degenerate interval
/// at the estimate, which is what a log-RSS of a point against itself needs.
pub fn confidence_interval_z(estimate: f64, std_error: f64, confidence: f64) -> (f64, f64) {
    if !estimate.is_finite() || !std_error.is_finite() || std_error < 0.0 {
        return (f64::NAN, f64::NAN);
    }
    let margin = z_critical(confidence) * std_error;
    (estimate - margin, estimate + margin)
}

/// Significance stars for a p-value, R style.
pub fn significance_stars(pvalue: f64) -> &'static str {
    if pvalue < 0.001 {
        "***"
    } else if pvalue < 0.01 {
        "**"
    } else if pvalue < 0.05 {
        "*"
    } else if pvalue < 0.1 {
        "."
    } else {
        ""
    }
}
