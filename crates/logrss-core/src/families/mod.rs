// =============================================================================
// Distribution Families
// =============================================================================
//
// A family describes the distribution of the response. IRLS needs three
// things from it:
//
//   - variance(μ):   V(μ), how the variance scales with the mean
//   - deviance:      the convergence criterion
//   - initialize_mu: a starting point for the iterations
//
// Habitat-selection models only use the binomial family: each row is a
// location that was either used (1) or merely available (0).
//
// =============================================================================

use ndarray::Array1;

use crate::constants::{MU_MAX_PROBABILITY, MU_MIN_PROBABILITY};

/// Distribution family for a GLM.
pub trait Family: Send + Sync {
    /// Name used in logs and summaries.
    fn name(&self) -> &'static str;

    /// Variance function V(μ).
    fn variance(&self, mu: &Array1<f64>) -> Array1<f64>;

    /// Per-observation deviance contributions.
    fn unit_deviance(&self, y: &Array1<f64>, mu: &Array1<f64>) -> Array1<f64>;

    /// Total (optionally weighted) deviance.
    fn deviance(&self, y: &Array1<f64>, mu: &Array1<f64>, weights: Option<&Array1<f64>>) -> f64 {
        let unit = self.unit_deviance(y, mu);
        match weights {
            Some(w) => unit.iter().zip(w.iter()).map(|(&d, &wi)| d * wi).sum(),
            None => unit.sum(),
        }
    }

    /// Starting values for μ.
    fn initialize_mu(&self, y: &Array1<f64>) -> Array1<f64>;

    /// Whether every μ lies in the family's valid range.
    fn is_valid_mu(&self, mu: &Array1<f64>) -> bool;

    /// Clamp μ into the valid range.
    fn clamp_mu(&self, mu: &Array1<f64>) -> Array1<f64>;
}

/// Binomial family for binary (used/available) responses.
///
/// V(μ) = μ(1 - μ), dispersion fixed at 1.
#[derive(Debug, Clone, Copy, Default)]
pub struct BinomialFamily;

impl BinomialFamily {
    /// Log-likelihood of 0/1 responses under fitted probabilities μ.
    pub fn log_likelihood(
        &self,
        y: &Array1<f64>,
        mu: &Array1<f64>,
        weights: Option<&Array1<f64>>,
    ) -> f64 {
        y.iter()
            .zip(mu.iter())
            .enumerate()
            .map(|(i, (&yi, &mi))| {
                let m = mi.clamp(MU_MIN_PROBABILITY, MU_MAX_PROBABILITY);
                let w = weights.map_or(1.0, |w| w[i]);
                w * (yi * m.ln() + (1.0 - yi) * (1.0 - m).ln())
            })
            .sum()
    }
}

impl Family for BinomialFamily {
    fn name(&self) -> &'static str {
        "Binomial"
    }

    fn variance(&self, mu: &Array1<f64>) -> Array1<f64> {
        mu.mapv(|m| m * (1.0 - m))
    }

    fn unit_deviance(&self, y: &Array1<f64>, mu: &Array1<f64>) -> Array1<f64> {
        // d_i = 2 [ y log(y/μ) + (1-y) log((1-y)/(1-μ)) ], with 0 log 0 = 0
        y.iter()
            .zip(mu.iter())
            .map(|(&yi, &mi)| {
                let m = mi.clamp(MU_MIN_PROBABILITY, MU_MAX_PROBABILITY);
                let a = if yi > 0.0 { yi * (yi / m).ln() } else { 0.0 };
                let b = if yi < 1.0 {
                    (1.0 - yi) * ((1.0 - yi) / (1.0 - m)).ln()
                } else {
                    0.0
                };
                2.0 * (a + b)
            })
            .collect()
    }

    fn initialize_mu(&self, y: &Array1<f64>) -> Array1<f64> {
        // Same start as R's binomial()$initialize with unit weights
        y.mapv(|yi| (yi + 0.5) / 2.0)
    }

    fn is_valid_mu(&self, mu: &Array1<f64>) -> bool {
        mu.iter().all(|&m| m.is_finite() && m > 0.0 && m < 1.0)
    }

    fn clamp_mu(&self, mu: &Array1<f64>) -> Array1<f64> {
        mu.mapv(|m| m.clamp(MU_MIN_PROBABILITY, MU_MAX_PROBABILITY))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use ndarray::array;

    #[test]
    fn test_binomial_variance() {
        let v = BinomialFamily.variance(&array![0.5, 0.1]);
        assert_abs_diff_eq!(v[0], 0.25, epsilon = 1e-15);
        assert_abs_diff_eq!(v[1], 0.09, epsilon = 1e-15);
    }

    #[test]
    fn test_deviance_is_minus_twice_loglik_for_binary_y() {
        // For 0/1 responses the saturated log-likelihood is 0
        let y = array![1.0, 0.0, 1.0, 0.0];
        let mu = array![0.7, 0.2, 0.4, 0.6];
        let dev = BinomialFamily.deviance(&y, &mu, None);
        let ll = BinomialFamily.log_likelihood(&y, &mu, None);
        assert_abs_diff_eq!(dev, -2.0 * ll, epsilon = 1e-12);
    }

    #[test]
    fn test_weighted_deviance() {
        let y = array![1.0, 0.0];
        let mu = array![0.5, 0.5];
        let w = array![2.0, 3.0];
        let unweighted = BinomialFamily.unit_deviance(&y, &mu);
        let weighted = BinomialFamily.deviance(&y, &mu, Some(&w));
        assert_abs_diff_eq!(weighted, 2.0 * unweighted[0] + 3.0 * unweighted[1], epsilon = 1e-12);
    }

    #[test]
    fn test_initial_mu_is_valid() {
        let mu = BinomialFamily.initialize_mu(&array![0.0, 1.0, 1.0]);
        assert!(BinomialFamily.is_valid_mu(&mu));
    }
}
