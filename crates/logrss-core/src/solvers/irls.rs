// =============================================================================
// IRLS: Iteratively Reweighted Least Squares
// =============================================================================
//
// This is how every selection model in this crate gets its coefficients.
//
// THE BIG PICTURE
// ---------------
// We want β that maximizes the binomial likelihood of the used/available
// labels. There's no closed form, so we iterate:
//
//     Start with initial guess μ⁰
//     Repeat:
//         1. Compute "working weights" W from the variance and link
//         2. Compute "working response" z (linearized version of problem)
//         3. Solve weighted least squares: (X'WX)β = X'Wz
//         4. Update η = Xβ and μ = g⁻¹(η)
//         5. Stop once the deviance stops changing
//
// THE WORKING RESPONSE
// --------------------
//     z = η + (y - μ) × g'(μ)
//
// For the logit link the weights reduce to w = μ(1 - μ).
//
// CONVERGENCE
// -----------
// Used/available data occasionally separates perfectly along a covariate
// (e.g. no used point ever above some elevation). The likelihood then has
// no finite maximum, the deviance creeps towards zero, and we hit
// `max_iterations`. That's reported via `converged = false`, not an error:
// the linear predictor is still a valid function of the coefficients, and
// the log-RSS identity holds for any coefficient vector.
//
// =============================================================================

use log::{debug, warn};
use ndarray::{Array1, Array2, Axis};

use crate::constants::{MAX_IRLS_WEIGHT, ZERO_TOL};
use crate::convert::{solve_and_invert, to_dmatrix, to_dvector};
use crate::error::{LogRssError, Result};
use crate::families::Family;
use crate::links::Link;

// =============================================================================
// Configuration
// =============================================================================

/// Iteration limits and tolerances for `fit_glm`.
#[derive(Debug, Clone, PartialEq, serde::Deserialize, serde::Serialize)]
#[serde(default)]
pub struct IRLSConfig {
    /// Iteration cap; hitting it leaves `converged = false`.
    /// Default: 25 (same as R's glm.control)
    pub max_iterations: usize,

    /// Convergence tolerance for relative deviance change.
    /// Stop once |ΔD| / |D| falls below this.
    /// Default: 1e-8
    pub tolerance: f64,

    /// Floor on the working weights μ(1 - μ) near 0 or 1.
    /// Default: 1e-10
    pub min_weight: f64,
}

impl Default for IRLSConfig {
    fn default() -> Self {
        Self {
            max_iterations: 25,
            tolerance: 1e-8,
            min_weight: 1e-10,
        }
    }
}

// =============================================================================
// Result Structure
// =============================================================================

/// A fitted selection model, as returned by `fit_glm_full`.
#[derive(Debug, Clone)]
pub struct IRLSResult {
    /// The fitted coefficients β, in design-matrix column order
    pub coefficients: Array1<f64>,

    /// Fitted values μ = g⁻¹(Xβ)
    pub fitted_values: Array1<f64>,

    /// η for every row of the design matrix
    pub linear_predictor: Array1<f64>,

    /// Final deviance
    pub deviance: f64,

    /// Number of iterations run
    pub iterations: usize,

    /// Did the deviance settle within `tolerance`?
    pub converged: bool,

    /// The (X'WX)⁻¹ matrix. For the binomial family (φ = 1) this is
    /// the coefficient covariance.
    pub covariance_unscaled: Array2<f64>,

    /// Final IRLS weights
    pub irls_weights: Array1<f64>,

    /// Prior weights used in fitting
    pub prior_weights: Array1<f64>,
}

// =============================================================================
// Main Fitting Functions
// =============================================================================

/// Fit a GLM with unit prior weights.
///
/// # Arguments
/// * `y` - 0/1 used/available labels
/// * `x` - Design matrix (n × p), including the intercept column if wanted
/// * `family`, `link` - binomial and logit for every model here
/// * `config` - iteration limits
pub fn fit_glm(
    y: &Array1<f64>,
    x: &Array2<f64>,
    family: &dyn Family,
    link: &dyn Link,
    config: &IRLSConfig,
) -> Result<IRLSResult> {
    fit_glm_full(y, x, family, link, config, None)
}

/// Fit a GLM with optional prior weights.
///
/// Prior weights scale each observation's contribution to the likelihood.
/// In used/available designs a large weight on available points approximates
/// the infinitely-weighted logistic regression that recovers the exponential
/// selection function exactly.
pub fn fit_glm_full(
    y: &Array1<f64>,
    x: &Array2<f64>,
    family: &dyn Family,
    link: &dyn Link,
    config: &IRLSConfig,
    weights: Option<&Array1<f64>>,
) -> Result<IRLSResult> {
    // -------------------------------------------------------------------------
    // Step 0: Validate inputs
    // -------------------------------------------------------------------------
    let n = y.len();
    let p = x.ncols();

    if x.nrows() != n {
        return Err(LogRssError::DimensionMismatch(format!(
            "X has {} rows but y has {} elements",
            x.nrows(),
            n
        )));
    }

    if n == 0 {
        return Err(LogRssError::EmptyInput("y is empty".to_string()));
    }

    if p == 0 {
        return Err(LogRssError::EmptyInput("X has no columns".to_string()));
    }

    if x.iter().any(|v| !v.is_finite()) {
        return Err(LogRssError::InvalidValue(
            "design matrix contains non-finite values".to_string(),
        ));
    }

    let prior_weights = match weights {
        Some(w) => {
            if w.len() != n {
                return Err(LogRssError::DimensionMismatch(format!(
                    "weights has {} elements but y has {}",
                    w.len(),
                    n
                )));
            }
            if w.iter().any(|&wi| wi < 0.0 || !wi.is_finite()) {
                return Err(LogRssError::InvalidValue(
                    "weights must be finite and non-negative".to_string(),
                ));
            }
            w.clone()
        }
        None => Array1::ones(n),
    };

    // -------------------------------------------------------------------------
    // Step 1: Initialize μ and η
    // -------------------------------------------------------------------------
    let mut mu = family.initialize_mu(y);
    if !family.is_valid_mu(&mu) {
        mu = family.clamp_mu(&mu);
    }
    let mut eta = link.link(&mu);
    let mut deviance = family.deviance(y, &mu, Some(&prior_weights));

    let mut converged = false;
    let mut iteration = 0;
    let mut coefficients = Array1::zeros(p);
    let mut cov_unscaled = Array2::zeros((p, p));
    let mut final_weights = Array1::zeros(n);

    // -------------------------------------------------------------------------
    // Step 2: IRLS iteration loop
    // -------------------------------------------------------------------------
    while iteration < config.max_iterations {
        iteration += 1;

        // w_i = prior_i / (V(μ_i) × g'(μ_i)²)
        let variance = family.variance(&mu);
        let link_deriv = link.derivative(&mu);

        let irls_weights: Array1<f64> = variance
            .iter()
            .zip(link_deriv.iter())
            .map(|(&v, &d)| (1.0 / (v * d * d)).clamp(config.min_weight, MAX_IRLS_WEIGHT))
            .collect();

        let combined_weights: Array1<f64> = &prior_weights * &irls_weights;

        // z_i = η_i + (y_i - μ_i) × g'(μ_i)
        let working_response = compute_working_response(y, &mu, &eta, &link_deriv);

        let (new_coefficients, xtwinv) =
            solve_weighted_least_squares(x, &working_response, &combined_weights)?;

        eta = x.dot(&new_coefficients);
        mu = family.clamp_mu(&link.inverse(&eta));

        let deviance_old = deviance;
        deviance = family.deviance(y, &mu, Some(&prior_weights));

        let rel_change = if deviance_old.abs() > ZERO_TOL {
            (deviance_old - deviance).abs() / deviance_old.abs()
        } else {
            (deviance_old - deviance).abs()
        };

        debug!(
            "IRLS iteration {}: deviance = {:.6}, rel_change = {:.2e}",
            iteration, deviance, rel_change
        );

        coefficients = new_coefficients;
        cov_unscaled = xtwinv;
        final_weights = irls_weights;

        if rel_change < config.tolerance {
            converged = true;
            break;
        }
    }

    if !converged {
        warn!(
            "IRLS did not converge after {} iterations (deviance = {:.6}); \
             check for separation in the used/available data",
            iteration, deviance
        );
    }

    Ok(IRLSResult {
        coefficients,
        fitted_values: mu,
        linear_predictor: eta,
        deviance,
        iterations: iteration,
        converged,
        covariance_unscaled: cov_unscaled,
        irls_weights: final_weights,
        prior_weights,
    })
}

// =============================================================================
// Helper Functions
// =============================================================================

/// z = η + (y - μ) × g'(μ), the linearized response for this iteration.
fn compute_working_response(
    y: &Array1<f64>,
    mu: &Array1<f64>,
    eta: &Array1<f64>,
    link_deriv: &Array1<f64>,
) -> Array1<f64> {
    eta + &((y - mu) * link_deriv)
}

/// argmin_β Σ w_i (z_i - x_i'β)², with the unscaled covariance alongside.
///
/// Errors when X'WX is singular (e.g. a constant covariate).
fn solve_weighted_least_squares(
    x: &Array2<f64>,
    z: &Array1<f64>,
    w: &Array1<f64>,
) -> Result<(Array1<f64>, Array2<f64>)> {
    let sqrt_w = w.mapv(f64::sqrt);

    // X_w = W^(1/2) X, z_w = W^(1/2) z
    let x_weighted = to_dmatrix(&(x * &sqrt_w.view().insert_axis(Axis(1))));
    let z_weighted = to_dvector(&(z * &sqrt_w));

    let xtwx = x_weighted.transpose() * &x_weighted;
    let xtwz = x_weighted.transpose() * z_weighted;

    solve_and_invert(&xtwx, &xtwz).ok_or_else(|| {
        LogRssError::LinearAlgebraError(
            "Failed to solve weighted least squares - matrix may be singular. \
             This often indicates collinear or constant covariates."
                .to_string(),
        )
    })
}

// =============================================================================
// Tests
// =============================================================================
