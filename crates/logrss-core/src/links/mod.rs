// =============================================================================
// Link Functions
// =============================================================================
//
// A link function g connects the mean μ to the linear predictor η:
//
//     g(μ) = η = β₀ + β₁x₁ + ... + βₚxₚ
//
// For used/available habitat data we fit a logistic regression, so the only
// link we need is the logit:
//
//     η = log(μ / (1 - μ))
//
// When available points vastly outnumber used points, μ is small and the odds
// μ/(1-μ) ≈ μ, so exp(η) is proportional to the exponential habitat-selection
// function w(x) = exp(β₁x₁ + ... + βₚxₚ). The intercept only scales w(x), which
// is why it cancels in any ratio w(x1)/w(x2).
//
// =============================================================================

use ndarray::Array1;

use crate::constants::{MU_MAX_PROBABILITY, MU_MIN_PROBABILITY};

/// A link function g with its inverse and derivative.
pub trait Link: Send + Sync {
    /// Name used in logs and summaries.
    fn name(&self) -> &'static str;

    /// η = g(μ)
    fn link(&self, mu: &Array1<f64>) -> Array1<f64>;

    /// μ = g⁻¹(η)
    fn inverse(&self, eta: &Array1<f64>) -> Array1<f64>;

    /// g'(μ), needed for the IRLS working weights and working response.
    fn derivative(&self, mu: &Array1<f64>) -> Array1<f64>;
}

/// Logit link: η = log(μ / (1 - μ)).
///
/// Canonical link for the binomial family.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogitLink;

impl Link for LogitLink {
    fn name(&self) -> &'static str {
        "logit"
    }

    fn link(&self, mu: &Array1<f64>) -> Array1<f64> {
        mu.mapv(|m| {
            let m = m.clamp(MU_MIN_PROBABILITY, MU_MAX_PROBABILITY);
            (m / (1.0 - m)).ln()
        })
    }

    fn inverse(&self, eta: &Array1<f64>) -> Array1<f64> {
        // Split on sign so exp() never overflows
        eta.mapv(|e| {
            if e >= 0.0 {
                1.0 / (1.0 + (-e).exp())
            } else {
                let ex = e.exp();
                ex / (1.0 + ex)
            }
        })
    }

    fn derivative(&self, mu: &Array1<f64>) -> Array1<f64> {
        mu.mapv(|m| {
            let m = m.clamp(MU_MIN_PROBABILITY, MU_MAX_PROBABILITY);
            1.0 / (m * (1.0 - m))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use ndarray::array;

    #[test]
    fn test_logit_roundtrip() {
        let mu = array![0.1, 0.5, 0.9];
        let back = LogitLink.inverse(&LogitLink.link(&mu));
        for (a, b) in mu.iter().zip(back.iter()) {
            assert_abs_diff_eq!(a, b, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_logit_midpoint() {
        let eta = LogitLink.link(&array![0.5]);
        assert_abs_diff_eq!(eta[0], 0.0, epsilon = 1e-15);
    }

    #[test]
    fn test_inverse_extreme_values_stay_finite() {
        let mu = LogitLink.inverse(&array![-800.0, 800.0]);
        assert!(mu.iter().all(|m| m.is_finite()));
        assert!(mu[0] >= 0.0 && mu[1] <= 1.0);
    }

    #[test]
    fn test_derivative_at_half() {
        // g'(0.5) = 1 / (0.5 × 0.5) = 4
        let d = LogitLink.derivative(&array![0.5]);
        assert_abs_diff_eq!(d[0], 4.0, epsilon = 1e-12);
    }
}
