// =============================================================================
// Design Matrix Construction
// =============================================================================
//
// Turns parsed formula terms into numbers: one column per term for a whole
// dataset (for fitting), or one row per covariate point (for prediction).
// Both paths go through `Factor::transform`, so the fitted model and its
// linear predictor see exactly the same features.
//
// =============================================================================

use ndarray::{Array1, Array2};

use crate::data::{CovariatePoint, Dataset};
use crate::error::{LogRssError, Result};
use crate::formula::{Factor, ParsedFormula, Term};

impl Factor {
    /// Apply this factor's transformation to a raw covariate value.
    pub fn transform(&self, value: f64) -> Result<f64> {
        let out = match self {
            Factor::Variable(_) => value,
            Factor::Power { exponent, .. } => value.powi(*exponent),
            Factor::Log(var) => {
                if value <= 0.0 {
                    return Err(LogRssError::DegenerateCovariate {
                        name: var.clone(),
                        value,
                    });
                }
                value.ln()
            }
        };
        if out.is_finite() {
            Ok(out)
        } else {
            Err(LogRssError::DegenerateCovariate {
                name: self.variable().to_string(),
                value,
            })
        }
    }

    /// Feature value at a covariate point.
    pub fn evaluate(&self, point: &CovariatePoint) -> Result<f64> {
        self.transform(point.get(self.variable())?)
    }
}

impl Term {
    /// Product of the factor values at a covariate point.
    pub fn evaluate(&self, point: &CovariatePoint) -> Result<f64> {
        self.factors
            .iter()
            .try_fold(1.0, |acc, f| -> Result<f64> { Ok(acc * f.evaluate(point)?) })
    }

    /// Feature column over every row of a dataset.
    pub fn column(&self, data: &Dataset) -> Result<Array1<f64>> {
        let mut out = Array1::ones(data.nrows());
        for factor in &self.factors {
            let raw = data.column(factor.variable())?;
            for (o, &v) in out.iter_mut().zip(raw.iter()) {
                *o *= factor.transform(v)?;
            }
        }
        Ok(out)
    }
}

/// A design matrix together with its column (coefficient) names.
#[derive(Debug, Clone)]
pub struct DesignMatrix {
    pub matrix: Array2<f64>,
    pub names: Vec<String>,
}

/// Build the n × p design matrix for `formula` over `data`.
pub fn build_design_matrix(formula: &ParsedFormula, data: &Dataset) -> Result<DesignMatrix> {
    let n = data.nrows();
    if n == 0 {
        return Err(LogRssError::EmptyInput("dataset has no rows".to_string()));
    }

    let names = formula.coefficient_names();
    let mut matrix = Array2::zeros((n, names.len()));
    let offset = usize::from(formula.has_intercept);

    if formula.has_intercept {
        matrix.column_mut(0).fill(1.0);
    }
    for (j, term) in formula.terms.iter().enumerate() {
        matrix.column_mut(j + offset).assign(&term.column(data)?);
    }

    Ok(DesignMatrix { matrix, names })
}

/// One design-matrix row for a covariate point.
pub fn design_row(formula: &ParsedFormula, point: &CovariatePoint) -> Result<Array1<f64>> {
    let mut row = Vec::with_capacity(formula.terms.len() + 1);
    if formula.has_intercept {
        row.push(1.0);
    }
    for term in &formula.terms {
        row.push(term.evaluate(point)?);
    }
    Ok(Array1::from_vec(row))
}

/// Stack design rows for a batch of covariate points.
pub fn design_rows(formula: &ParsedFormula, points: &[CovariatePoint]) -> Result<Array2<f64>> {
    let p = formula.coefficient_names().len();
    let mut out = Array2::zeros((points.len(), p));
    for (i, point) in points.iter().enumerate() {
        out.row_mut(i).assign(&design_row(formula, point)?);
    }
    Ok(out)
}
