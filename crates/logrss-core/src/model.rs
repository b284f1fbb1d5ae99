// =============================================================================
// Fitted Selection Models
// =============================================================================
//
// `FittedModel` is the only thing the log-RSS evaluators know about a model:
//
//   - coefficient lookup by name (the closed-form formulas need this)
//   - the linear predictor at a covariate point (the generic method needs this)
//
// The linear predictor is on the LINK scale: intercept plus weighted features,
// no inverse-logit applied. That's the scale on which
//
//     log w(x1) - log w(x2) = η(x1) - η(x2)
//
// holds, because the intercept appears in both and cancels.
//
// `Glm` is the concrete binomial/logit model fitted from a formula.
//
// =============================================================================

use indexmap::IndexMap;
use log::info;
use ndarray::{Array1, Array2};

use crate::data::{CovariatePoint, Dataset};
use crate::design_matrix::{build_design_matrix, design_row, design_rows};
use crate::error::{LogRssError, Result};
use crate::families::{BinomialFamily, Family};
use crate::formula::{parse_formula, ParsedFormula};
use crate::inference::pvalue_z;
use crate::links::{Link, LogitLink};
use crate::solvers::{fit_glm_full, IRLSConfig, IRLSResult};

/// A fitted exponential-family selection model.
pub trait FittedModel {
    /// Coefficient estimates keyed by R-style term name, in model order.
    fn coefficients(&self) -> &IndexMap<String, f64>;

    /// Look up one coefficient. Absent names are a `MissingTerm` error.
    fn coefficient(&self, name: &str) -> Result<f64> {
        self.coefficients()
            .get(name)
            .copied()
            .ok_or_else(|| LogRssError::MissingTerm(name.to_string()))
    }

    /// Feature vector (one design-matrix row) at a covariate point.
    fn features(&self, point: &CovariatePoint) -> Result<Array1<f64>>;

    /// Link-scale prediction η(x): intercept + Σ βₖ hₖ(x).
    fn linear_predictor(&self, point: &CovariatePoint) -> Result<f64> {
        let coefs: Array1<f64> = self.coefficients().values().copied().collect();
        Ok(self.features(point)?.dot(&coefs))
    }

    /// Link-scale predictions for a batch of points.
    fn linear_predictor_batch(&self, points: &[CovariatePoint]) -> Result<Array1<f64>> {
        points.iter().map(|p| self.linear_predictor(p)).collect()
    }

    /// Coefficient covariance matrix, when the model carries one.
    fn covariance(&self) -> Option<&Array2<f64>> {
        None
    }
}

/// One row of a coefficient table.
#[derive(Debug, Clone, PartialEq)]
pub struct CoefficientSummary {
    pub name: String,
    pub estimate: f64,
    pub std_error: f64,
    pub z_value: f64,
    pub p_value: f64,
}

/// A binomial GLM with logit link, fitted from an R-style formula.
#[derive(Debug, Clone)]
pub struct Glm {
    formula: ParsedFormula,
    coefficients: IndexMap<String, f64>,
    result: IRLSResult,
    response: Array1<f64>,
}

impl Glm {
    /// Fit `formula` to `data` with unit weights.
    pub fn fit(formula: &str, data: &Dataset, config: &IRLSConfig) -> Result<Self> {
        Self::fit_weighted(formula, data, config, None)
    }

    /// Fit `formula` to `data` with optional prior weights.
    ///
    /// The response column must hold 0/1 (or proportions in [0, 1]).
    pub fn fit_weighted(
        formula: &str,
        data: &Dataset,
        config: &IRLSConfig,
        weights: Option<&Array1<f64>>,
    ) -> Result<Self> {
        let parsed = parse_formula(formula)?;
        let y = data.column(&parsed.response)?.clone();
        if let Some(&bad) = y.iter().find(|&&v| !(0.0..=1.0).contains(&v)) {
            return Err(LogRssError::InvalidValue(format!(
                "binomial response '{}' must lie in [0, 1], found {}",
                parsed.response, bad
            )));
        }

        let design = build_design_matrix(&parsed, data)?;
        let result = fit_glm_full(&y, &design.matrix, &BinomialFamily, &LogitLink, config, weights)?;

        info!(
            "Fitted '{}' ({} / {}): deviance = {:.4}, iterations = {}, converged = {}",
            formula,
            BinomialFamily.name(),
            LogitLink.name(),
            result.deviance,
            result.iterations,
            result.converged
        );

        let coefficients = design
            .names
            .into_iter()
            .zip(result.coefficients.iter().copied())
            .collect();

        Ok(Self {
            formula: parsed,
            coefficients,
            result,
            response: y,
        })
    }

    pub fn converged(&self) -> bool {
        self.result.converged
    }

    pub fn iterations(&self) -> usize {
        self.result.iterations
    }

    pub fn deviance(&self) -> f64 {
        self.result.deviance
    }

    pub fn n_obs(&self) -> usize {
        self.response.len()
    }

    /// Weighted binomial log-likelihood at the fitted probabilities.
    pub fn log_likelihood(&self) -> f64 {
        BinomialFamily.log_likelihood(
            &self.response,
            &self.result.fitted_values,
            Some(&self.result.prior_weights),
        )
    }

    /// Akaike information criterion, -2ℓ + 2p.
    ///
    /// For 0/1 responses the saturated log-likelihood is zero, so this is
    /// also deviance + 2p.
    pub fn aic(&self) -> f64 {
        -2.0 * self.log_likelihood() + 2.0 * self.coefficients.len() as f64
    }

    /// Standard errors √diag((X'WX)⁻¹); the binomial dispersion is 1.
    pub fn standard_errors(&self) -> Array1<f64> {
        self.result.covariance_unscaled.diag().mapv(f64::sqrt)
    }

    /// Coefficient table with Wald z-tests.
    pub fn summary(&self) -> Vec<CoefficientSummary> {
        self.coefficients
            .iter()
            .zip(self.standard_errors().iter())
            .map(|((name, &estimate), &std_error)| {
                let z_value = estimate / std_error;
                CoefficientSummary {
                    name: name.clone(),
                    estimate,
                    std_error,
                    z_value,
                    p_value: pvalue_z(z_value),
                }
            })
            .collect()
    }

    /// Response-scale prediction: the probability of use, g⁻¹(η(x)).
    pub fn predict_response(&self, point: &CovariatePoint) -> Result<f64> {
        let eta = Array1::from_elem(1, self.linear_predictor(point)?);
        Ok(LogitLink.inverse(&eta)[0])
    }
}

impl FittedModel for Glm {
    fn coefficients(&self) -> &IndexMap<String, f64> {
        &self.coefficients
    }

    fn features(&self, point: &CovariatePoint) -> Result<Array1<f64>> {
        design_row(&self.formula, point)
    }

    fn linear_predictor(&self, point: &CovariatePoint) -> Result<f64> {
        Ok(self.features(point)?.dot(&self.result.coefficients))
    }

    fn linear_predictor_batch(&self, points: &[CovariatePoint]) -> Result<Array1<f64>> {
        Ok(design_rows(&self.formula, points)?.dot(&self.result.coefficients))
    }

    fn covariance(&self) -> Option<&Array2<f64>> {
        Some(&self.result.covariance_unscaled)
    }
}
