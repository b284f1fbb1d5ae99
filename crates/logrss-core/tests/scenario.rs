//! End-to-end comparison on simulated used/available data.
//!
//! The reference scenario: an additive model on elevation and slope, x2 at the
//! sample means, x1 sweeping 100 elevation values at the 10th, 50th and 90th
//! slope percentiles.

mod common;

use common::prepared_data;
use logrss_core::grid::reference_point;
use logrss_core::rss::round_to;
use logrss_core::{
    log_rss, run_all, simulate_habitat, AnalysisConfig, CovariateGrid, Dataset, EquivalencePolicy,
    Glm, IRLSConfig, ModelCase, SimulationConfig,
};

fn additive_scenario(data: &Dataset, elev: &str) {
    let case = ModelCase::Additive {
        hi: elev.to_string(),
        hj: "slope".to_string(),
    };
    let model = Glm::fit(&case.formula("used"), data, &IRLSConfig::default()).unwrap();
    assert!(model.converged());

    let grid = CovariateGrid::new(data, elev, Some("slope"), 100, &[0.1, 0.5, 0.9]).unwrap();
    assert_eq!(grid.len(), 300);
    let x2 = reference_point(data, &[elev, "slope"]).unwrap();

    let closed = case.log_rss(&model, grid.points(), &x2).unwrap();
    let generic = log_rss(&model, grid.points(), &x2).unwrap();

    let rounded_diff: Vec<f64> = closed
        .iter()
        .zip(generic.iter())
        .map(|(c, g)| round_to(*c, 10) - round_to(*g, 10))
        .collect();
    assert!(rounded_diff.iter().all(|&d| d == 0.0), "{elev}: {rounded_diff:?}");
    assert_eq!(rounded_diff.iter().sum::<f64>(), 0.0);
}

#[test]
fn test_additive_scenario_standardized_elevation() {
    additive_scenario(&prepared_data(), "elev_sc");
}

#[test]
fn test_additive_scenario_raw_elevation() {
    additive_scenario(&prepared_data(), "elev");
}

#[test]
fn test_all_seven_cases_agree() {
    let data = simulate_habitat(&SimulationConfig::default()).unwrap();
    let report = run_all(&data, &AnalysisConfig::default()).unwrap();

    assert_eq!(report.outcomes.len(), 7);
    assert!(report.all_agree(), "{:?}", report.failures());
    assert!(report.zeros_replaced["slope"] > 0);

    for outcome in &report.outcomes {
        let case = outcome.result.as_ref().unwrap();
        let expected = if case.grid.hold.is_some() { 300 } else { 100 };
        assert_eq!(case.closed_form.len(), expected, "{}", outcome.case);
        assert_eq!(case.equivalence.sum_difference, 0.0);
        assert!(case.model.converged(), "{}", case.formula);
    }
}

#[test]
fn test_weighted_fits_still_agree() {
    let data = simulate_habitat(&SimulationConfig {
        seed: 7,
        ..SimulationConfig::default()
    })
    .unwrap();
    let config = AnalysisConfig {
        available_weight: Some(20.0),
        grid_points: 25,
        ..AnalysisConfig::default()
    };
    let report = run_all(&data, &config).unwrap();
    assert!(report.all_agree(), "{:?}", report.failures());
}

#[test]
fn test_relative_tolerance_policy() {
    let data = simulate_habitat(&SimulationConfig::default()).unwrap();
    let config = AnalysisConfig {
        equivalence: EquivalencePolicy::RelativeTolerance(1e-9),
        cases: vec![4, 6],
        ..AnalysisConfig::default()
    };
    let report = run_all(&data, &config).unwrap();
    assert_eq!(report.n_agreeing(), 2);
}

#[test]
fn test_intervals_cover_point_estimates() {
    let data = simulate_habitat(&SimulationConfig::default()).unwrap();
    let config = AnalysisConfig {
        cases: vec![2],
        ..AnalysisConfig::default()
    };
    let report = run_all(&data, &config).unwrap();
    let case = report.outcomes[0].result.as_ref().unwrap();
    let lp = &case.linear_predictor;
    for i in 0..lp.values.len() {
        assert!(lp.lower[i] <= lp.values[i] && lp.values[i] <= lp.upper[i]);
    }
}

#[test]
fn test_csv_round_trip_gives_same_answer() {
    let data = simulate_habitat(&SimulationConfig::default()).unwrap();
    let mut csv = String::from("used,elev,slope\n");
    let (used, elev, slope) = (
        data.column("used").unwrap(),
        data.column("elev").unwrap(),
        data.column("slope").unwrap(),
    );
    for i in 0..data.nrows() {
        // {:?} prints the shortest string that parses back to the same f64
        csv.push_str(&format!("{:?},{:?},{:?}\n", used[i], elev[i], slope[i]));
    }
    let reloaded = Dataset::from_csv_str(&csv).unwrap();

    let config = AnalysisConfig {
        cases: vec![1],
        ..AnalysisConfig::default()
    };
    let a = run_all(&data, &config).unwrap();
    let b = run_all(&reloaded, &config).unwrap();
    let a = &a.outcomes[0].result.as_ref().unwrap().closed_form;
    let b = &b.outcomes[0].result.as_ref().unwrap().closed_form;
    assert_eq!(a, b);
}
