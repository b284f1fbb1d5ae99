//! Log-RSS from the linear predictor of any fitted model.

use ndarray::Array1;

use crate::convert::quadratic_form;
use crate::data::CovariatePoint;
use crate::error::{LogRssError, Result};
use crate::inference::confidence_interval_z;
use crate::model::FittedModel;

/// η(x1) − η(x2) for every `x1` point.
pub fn log_rss(
    model: &dyn FittedModel,
    x1: &[CovariatePoint],
    x2: &CovariatePoint,
) -> Result<Array1<f64>> {
    let reference = model.linear_predictor(x2)?;
    Ok(model.linear_predictor_batch(x1)?.mapv(|eta| eta - reference))
}

/// RSS itself: exp(log-RSS).
pub fn rss(model: &dyn FittedModel, x1: &[CovariatePoint], x2: &CovariatePoint) -> Result<Array1<f64>> {
    Ok(log_rss(model, x1, x2)?.mapv(f64::exp))
}

/// Log-RSS with Wald confidence bounds.
#[derive(Debug, Clone, PartialEq)]
pub struct LogRss {
    pub values: Array1<f64>,
    pub std_errors: Array1<f64>,
    pub lower: Array1<f64>,
    pub upper: Array1<f64>,
    pub level: f64,
}

/// Log-RSS with a normal-approximation interval at confidence `level`.
///
/// With d = row(x1) − row(x2), Var(log-RSS) = dᵀ Σ d. The intercept entry of d
/// is zero, so the intercept's variance drops out just as its estimate does.
pub fn log_rss_with_ci(
    model: &dyn FittedModel,
    x1: &[CovariatePoint],
    x2: &CovariatePoint,
    level: f64,
) -> Result<LogRss> {
    if !(level > 0.0 && level < 1.0) {
        return Err(LogRssError::InvalidValue(format!(
            "confidence level must be in (0, 1), got {level}"
        )));
    }
    let cov = model.covariance().ok_or_else(|| {
        LogRssError::InvalidValue("model carries no coefficient covariance".to_string())
    })?;

    let reference = model.features(x2)?;
    if cov.nrows() != reference.len() {
        return Err(LogRssError::DimensionMismatch(format!(
            "covariance is {}×{} but the design row has {} entries",
            cov.nrows(),
            cov.ncols(),
            reference.len()
        )));
    }

    let values = log_rss(model, x1, x2)?;
    let std_errors = x1
        .iter()
        .map(|p| {
            let d = model.features(p)? - &reference;
            Ok(quadratic_form(cov, d.view()).max(0.0).sqrt())
        })
        .collect::<Result<Array1<f64>>>()?;

    let (lower, upper): (Vec<f64>, Vec<f64>) = values
        .iter()
        .zip(std_errors.iter())
        .map(|(&v, &se)| confidence_interval_z(v, se, level))
        .unzip();

    Ok(LogRss {
        values,
        std_errors,
        lower: Array1::from_vec(lower),
        upper: Array1::from_vec(upper),
        level,
    })
}
