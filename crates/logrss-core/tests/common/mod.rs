//! Shared fixtures for the integration tests.

#![allow(dead_code)]

use logrss_core::analysis::prepare;
use logrss_core::{AnalysisConfig, CovariatePoint, Dataset, Glm, IRLSConfig, ModelCase};
use logrss_core::{simulate_habitat, SimulationConfig};

/// Simulated used/available data after the default preparation
/// (`elev_sc` added, zeros in `slope` remapped).
pub fn prepared_data() -> Dataset {
    let raw = simulate_habitat(&SimulationConfig::default()).unwrap();
    prepare(&raw, &AnalysisConfig::default()).unwrap().data
}

/// The seven cases on the default covariates.
pub fn all_cases() -> Vec<ModelCase> {
    AnalysisConfig::default().model_cases()
}

pub fn fit(case: &ModelCase, data: &Dataset) -> Glm {
    Glm::fit(&case.formula("used"), data, &IRLSConfig::default()).unwrap()
}

/// A point carrying every covariate any case reads.
pub fn point(elev_sc: f64, slope: f64, elev: f64) -> CovariatePoint {
    CovariatePoint::new([("elev_sc", elev_sc), ("slope", slope), ("elev", elev)])
}

/// A handful of x1 points spread over the landscape.
pub fn spread_points() -> Vec<CovariatePoint> {
    vec![
        point(-2.1, 0.3, 870.0),
        point(-0.6, 4.0, 1320.0),
        point(0.0, 8.5, 1500.0),
        point(0.9, 15.2, 1770.0),
        point(2.4, 31.0, 2220.0),
    ]
}
