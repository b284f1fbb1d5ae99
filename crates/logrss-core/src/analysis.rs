// =============================================================================
// Closed-Form vs Linear-Predictor Comparison
// =============================================================================
//
// For each model case:
//
//   1. fit the case's formula to the prepared used/available data
//   2. build x1 (covariate grid) and x2 (sample means) from the data
//   3. evaluate log-RSS both ways
//   4. check the two agree under the configured policy
//
// Data preparation happens once, before any case runs: zeros in the log-scale
// covariates are remapped and requested columns get a standardized `_sc`
// companion. A failing case (bad data, unknown term, singular fit) is recorded
// and the remaining cases still run.
//
// =============================================================================

use indexmap::IndexMap;
use log::{info, warn};
use ndarray::Array1;

use crate::config::AnalysisConfig;
use crate::data::{CovariatePoint, Dataset, Standardization};
use crate::error::Result;
use crate::grid::{reference_point, CovariateGrid};
use crate::model::Glm;
use crate::rss::{check_equivalence, log_rss_with_ci, EquivalenceReport, LogRss, ModelCase};

// =============================================================================
// Data preparation
// =============================================================================

/// A dataset ready for fitting, plus a record of what was done to it.
#[derive(Debug, Clone)]
pub struct PreparedData {
    pub data: Dataset,
    /// Standardization applied per source column
    pub scalings: IndexMap<String, Standardization>,
    /// Zeros remapped per column
    pub zeros_replaced: IndexMap<String, usize>,
}

/// Remap zeros in the log-scale covariates, then add standardized columns.
pub fn prepare(data: &Dataset, config: &AnalysisConfig) -> Result<PreparedData> {
    let mut data = data.clone();

    let mut zeros_replaced = IndexMap::new();
    for col in &config.positive {
        if !zeros_replaced.contains_key(col) {
            let n = data.replace_zeros(col, config.zero_replacement)?;
            zeros_replaced.insert(col.clone(), n);
        }
    }

    let mut scalings = IndexMap::new();
    for col in &config.standardize {
        let scaling = data.standardize(col, &format!("{col}_sc"))?;
        scalings.insert(col.clone(), scaling);
    }

    Ok(PreparedData {
        data,
        scalings,
        zeros_replaced,
    })
}

/// Prior weights: 1 for used rows, `available_weight` for available ones.
pub fn prior_weights(data: &Dataset, config: &AnalysisConfig) -> Result<Option<Array1<f64>>> {
    let Some(w) = config.available_weight else {
        return Ok(None);
    };
    let response = data.column(&config.response)?;
    Ok(Some(response.mapv(|y| if y == 1.0 { 1.0 } else { w })))
}

// =============================================================================
// Per-case comparison
// =============================================================================

/// Everything computed for one model case.
#[derive(Debug, Clone)]
pub struct CaseReport {
    pub case: ModelCase,
    pub formula: String,
    pub model: Glm,
    pub grid: CovariateGrid,
    pub reference: CovariatePoint,
    pub closed_form: Array1<f64>,
    pub linear_predictor: LogRss,
    pub equivalence: EquivalenceReport,
}

impl CaseReport {
    pub fn agrees(&self) -> bool {
        self.equivalence.agrees
    }
}

/// Fit one case and compare its closed-form and linear-predictor log-RSS.
pub fn compare_case(
    data: &Dataset,
    case: &ModelCase,
    config: &AnalysisConfig,
    weights: Option<&Array1<f64>>,
) -> Result<CaseReport> {
    let formula = case.formula(&config.response);
    let model = Glm::fit_weighted(&formula, data, &config.irls, weights)?;
    if !model.converged() {
        warn!(
            "'{}' did not converge in {} iterations; comparing anyway",
            formula,
            model.iterations()
        );
    }

    let grid = CovariateGrid::for_case(data, case, config.grid_points, &config.hold_quantiles)?;
    let reference = reference_point(data, &case.covariates())?;

    let closed_form = case.log_rss(&model, grid.points(), &reference)?;
    let linear_predictor = log_rss_with_ci(&model, grid.points(), &reference, config.ci_level)?;
    let equivalence = check_equivalence(&closed_form, &linear_predictor.values, config.equivalence)?;

    info!(
        "{}: {} points, max |closed - lp| = {:.3e}, sum of differences = {}, agrees = {}",
        case,
        grid.len(),
        equivalence.max_abs_diff,
        equivalence.sum_difference,
        equivalence.agrees
    );

    Ok(CaseReport {
        case: case.clone(),
        formula,
        model,
        grid,
        reference,
        closed_form,
        linear_predictor,
        equivalence,
    })
}

// =============================================================================
// All cases
// =============================================================================

/// One case's result; failures don't stop the other cases.
#[derive(Debug)]
pub struct CaseOutcome {
    pub case: ModelCase,
    pub result: Result<CaseReport>,
}

impl CaseOutcome {
    pub fn agrees(&self) -> bool {
        matches!(&self.result, Ok(report) if report.agrees())
    }
}

#[derive(Debug)]
pub struct AnalysisReport {
    pub scalings: IndexMap<String, Standardization>,
    pub zeros_replaced: IndexMap<String, usize>,
    pub outcomes: Vec<CaseOutcome>,
}

impl AnalysisReport {
    pub fn all_agree(&self) -> bool {
        !self.outcomes.is_empty() && self.outcomes.iter().all(CaseOutcome::agrees)
    }

    pub fn n_agreeing(&self) -> usize {
        self.outcomes.iter().filter(|o| o.agrees()).count()
    }

    /// One message per disagreeing or failed case.
    pub fn failures(&self) -> Vec<String> {
        self.outcomes
            .iter()
            .filter_map(|o| match &o.result {
                Ok(report) => report
                    .equivalence
                    .ensure(&o.case.to_string())
                    .err()
                    .map(|e| e.to_string()),
                Err(e) => Some(format!("{}: {}", o.case, e)),
            })
            .collect()
    }
}

/// Prepare `data` and run every configured case, in order.
pub fn run_all(data: &Dataset, config: &AnalysisConfig) -> Result<AnalysisReport> {
    config.validate()?;
    let prepared = prepare(data, config)?;
    let weights = prior_weights(&prepared.data, config)?;

    let cases = config.model_cases();
    info!(
        "Comparing {} model case(s) on {} rows",
        cases.len(),
        prepared.data.nrows()
    );

    let outcomes = cases
        .into_iter()
        .map(|case| {
            let result = compare_case(&prepared.data, &case, config, weights.as_ref());
            if let Err(e) = &result {
                warn!("{case} failed: {e}");
            }
            CaseOutcome { case, result }
        })
        .collect();

    Ok(AnalysisReport {
        scalings: prepared.scalings,
        zeros_replaced: prepared.zeros_replaced,
        outcomes,
    })
}
