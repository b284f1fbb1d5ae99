// =============================================================================
// Covariate Grids
// =============================================================================
//
// log-RSS curves are drawn by sweeping one covariate across its observed range
// while holding a second covariate at a few representative values:
//
//     x1 = { (vary = v, hold = q) : v ∈ linspace(min, max, n), q ∈ quantiles }
//     x2 = column means
//
// Points are laid out hold-major: the first n points use the first held
// value, the next n the second, and so on. `series()` hands those blocks back
// for plotting.
//
// =============================================================================

use std::ops::Range;

use ndarray::Array1;

use crate::data::{CovariatePoint, Dataset};
use crate::error::{LogRssError, Result};
use crate::rss::ModelCase;

/// Quantiles the held covariate is fixed at by default.
pub const DEFAULT_HOLD_QUANTILES: [f64; 3] = [0.1, 0.5, 0.9];

/// Number of values along the swept covariate by default.
pub const DEFAULT_GRID_POINTS: usize = 100;

/// The covariate held fixed within each series.
#[derive(Debug, Clone, PartialEq)]
pub struct HeldCovariate {
    pub name: String,
    pub quantiles: Vec<f64>,
    pub values: Vec<f64>,
}

/// The x1 points of a log-RSS comparison.
#[derive(Debug, Clone, PartialEq)]
pub struct CovariateGrid {
    pub vary: String,
    pub vary_values: Array1<f64>,
    pub hold: Option<HeldCovariate>,
    points: Vec<CovariatePoint>,
}

impl CovariateGrid {
    /// Sweep `vary` over its range in `n_points` steps, crossed with `hold`
    /// at the given sample quantiles.
    pub fn new(
        data: &Dataset,
        vary: &str,
        hold: Option<&str>,
        n_points: usize,
        quantiles: &[f64],
    ) -> Result<Self> {
        if n_points == 0 {
            return Err(LogRssError::InvalidValue(
                "grid needs at least one point".to_string(),
            ));
        }
        let (lo, hi) = data.min_max(vary)?;
        let vary_values = Array1::linspace(lo, hi, n_points);

        let hold = match hold {
            Some(name) => {
                if quantiles.is_empty() {
                    return Err(LogRssError::EmptyInput(format!(
                        "no quantiles to hold '{name}' at"
                    )));
                }
                let values = quantiles
                    .iter()
                    .map(|&q| data.quantile(name, q))
                    .collect::<Result<Vec<_>>>()?;
                Some(HeldCovariate {
                    name: name.to_string(),
                    quantiles: quantiles.to_vec(),
                    values,
                })
            }
            None => None,
        };

        let points = match &hold {
            Some(h) => h
                .values
                .iter()
                .flat_map(|&held| {
                    vary_values.iter().map(move |&v| {
                        CovariatePoint::new([(vary, v), (h.name.as_str(), held)])
                    })
                })
                .collect(),
            None => vary_values
                .iter()
                .map(|&v| CovariatePoint::new([(vary, v)]))
                .collect(),
        };

        Ok(Self {
            vary: vary.to_string(),
            vary_values,
            hold,
            points,
        })
    }

    /// Grid over a case's covariates: sweep `hi`, hold `hj` if it has one.
    pub fn for_case(
        data: &Dataset,
        case: &ModelCase,
        n_points: usize,
        quantiles: &[f64],
    ) -> Result<Self> {
        let covariates = case.covariates();
        Self::new(data, covariates[0], covariates.get(1).copied(), n_points, quantiles)
    }

    pub fn points(&self) -> &[CovariatePoint] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Index ranges of each held-value series, with the held quantile.
    pub fn series(&self) -> Vec<(Option<f64>, Range<usize>)> {
        let n = self.vary_values.len();
        match &self.hold {
            Some(h) => h
                .quantiles
                .iter()
                .enumerate()
                .map(|(k, &q)| (Some(q), k * n..(k + 1) * n))
                .collect(),
            None => vec![(None, 0..n)],
        }
    }
}

/// The x2 point: sample means of `covariates`.
pub fn reference_point(data: &Dataset, covariates: &[&str]) -> Result<CovariatePoint> {
    data.means(covariates)
}
