//! Properties of log-RSS that hold for every model case:
//! - closed form == linear-predictor difference (after rounding)
//! - antisymmetry and identity
//! - additivity of the additive model
//! - power-inside-log == coefficient-times-log for the log cases

mod common;

use approx::assert_abs_diff_eq;
use common::{all_cases, fit, point, prepared_data, spread_points};
use logrss_core::rss::round_to;
use logrss_core::{check_equivalence, log_rss, EquivalencePolicy, FittedModel, LogRssError, ModelCase};

// =============================================================================
// Equivalence
// =============================================================================

#[test]
fn test_closed_form_matches_linear_predictor_for_every_case() {
    let data = prepared_data();
    let x2 = point(0.1, 7.3, 1530.0);
    let x1 = spread_points();

    for case in all_cases() {
        let model = fit(&case, &data);
        let closed = case.log_rss(&model, &x1, &x2).unwrap();
        let generic = log_rss(&model, &x1, &x2).unwrap();

        let report = check_equivalence(&closed, &generic, EquivalencePolicy::RoundedDecimals(10)).unwrap();
        assert!(report.agrees, "{case}: max diff {:e}", report.max_abs_diff);
        assert_eq!(report.sum_difference, 0.0);
        for (c, g) in closed.iter().zip(generic.iter()) {
            assert_eq!(round_to(*c, 10), round_to(*g, 10), "{case}");
        }
    }
}

#[test]
fn test_wrong_case_for_model_is_missing_term() {
    let data = prepared_data();
    let cases = all_cases();
    let additive = fit(&cases[0], &data);
    let x = spread_points();
    assert!(matches!(
        cases[1].log_rss(&additive, &x, &x[0]),
        Err(LogRssError::MissingTerm(name)) if name == "elev_sc:slope"
    ));
}

// =============================================================================
// Antisymmetry and identity
// =============================================================================

#[test]
fn test_antisymmetry() {
    let data = prepared_data();
    let points = spread_points();

    for case in all_cases() {
        let model = fit(&case, &data);
        for a in &points {
            for b in &points {
                let ab = case.log_rss(&model, std::slice::from_ref(a), b).unwrap()[0];
                let ba = case.log_rss(&model, std::slice::from_ref(b), a).unwrap()[0];
                assert_abs_diff_eq!(ab, -ba, epsilon = 1e-10);

                let ab = log_rss(&model, std::slice::from_ref(a), b).unwrap()[0];
                let ba = log_rss(&model, std::slice::from_ref(b), a).unwrap()[0];
                assert_abs_diff_eq!(ab, -ba, epsilon = 1e-10);
            }
        }
    }
}

#[test]
fn test_identity() {
    let data = prepared_data();
    let points = spread_points();

    for case in all_cases() {
        let model = fit(&case, &data);
        for x in &points {
            let closed = case.log_rss(&model, std::slice::from_ref(x), x).unwrap()[0];
            let generic = log_rss(&model, std::slice::from_ref(x), x).unwrap()[0];
            assert_abs_diff_eq!(closed, 0.0, epsilon = 1e-12);
            assert_abs_diff_eq!(generic, 0.0, epsilon = 1e-12);
        }
    }
}

// =============================================================================
// Additivity (case 1)
// =============================================================================

#[test]
fn test_additive_model_is_additive() {
    let data = prepared_data();
    let case = &all_cases()[0];
    let model = fit(case, &data);
    let b_elev = model.coefficient("elev_sc").unwrap();
    let b_slope = model.coefficient("slope").unwrap();

    let x2 = point(0.0, 5.0, 1500.0);
    let x1 = point(1.5, 12.0, 1950.0);

    // Split into an elevation-only step and a slope-only step
    let mid = point(1.5, 5.0, 1950.0);
    let whole = case.log_rss(&model, &[x1.clone()], &x2).unwrap()[0];
    let elev_step = case.log_rss(&model, &[mid.clone()], &x2).unwrap()[0];
    let slope_step = case.log_rss(&model, &[x1], &mid).unwrap()[0];

    assert_abs_diff_eq!(whole, elev_step + slope_step, epsilon = 1e-12);
    assert_abs_diff_eq!(elev_step, 1.5 * b_elev, epsilon = 1e-12);
    assert_abs_diff_eq!(slope_step, 7.0 * b_slope, epsilon = 1e-12);
}

#[test]
fn test_log_rss_chains_through_intermediate_point() {
    let data = prepared_data();
    let points = spread_points();
    for case in all_cases() {
        let model = fit(&case, &data);
        let direct = log_rss(&model, &[points[0].clone()], &points[4]).unwrap()[0];
        let via = log_rss(&model, &[points[0].clone()], &points[2]).unwrap()[0]
            + log_rss(&model, &[points[2].clone()], &points[4]).unwrap()[0];
        assert_abs_diff_eq!(direct, via, epsilon = 1e-10);
    }
}

// =============================================================================
// Log reparametrization (cases 5 and 7)
// =============================================================================

#[test]
fn test_log_cases_reparametrize() {
    let data = prepared_data();
    let cases = all_cases();
    let x2 = point(0.0, 8.0, 1500.0);

    let case5 = &cases[4];
    let model5 = fit(case5, &data);
    let beta = model5.coefficient("log(slope)").unwrap();

    let case7 = &cases[6];
    let model7 = fit(case7, &data);
    let b_slope = model7.coefficient("log(slope)").unwrap();
    let b_elev = model7.coefficient("log(elev)").unwrap();

    for x1 in spread_points() {
        let a = x1.get("slope").unwrap();
        let closed5 = case5.log_rss(&model5, &[x1.clone()], &x2).unwrap()[0];
        assert_abs_diff_eq!(closed5, beta * (a / 8.0).ln(), epsilon = 1e-10);

        let e = x1.get("elev").unwrap();
        let closed7 = case7.log_rss(&model7, &[x1], &x2).unwrap()[0];
        let expected = b_slope * (a / 8.0).ln() + b_elev * (e / 1500.0).ln();
        assert_abs_diff_eq!(closed7, expected, epsilon = 1e-10);
    }
}

#[test]
fn test_log_case_rejects_zero_covariate() {
    let data = prepared_data();
    let case = ModelCase::LogSingle { hi: "slope".into() };
    let model = fit(&case, &data);
    let flat = point(0.0, 0.0, 1500.0);
    assert!(matches!(
        case.log_rss(&model, &[flat.clone()], &point(0.0, 5.0, 1500.0)),
        Err(LogRssError::DegenerateCovariate { .. })
    ));
    assert!(matches!(
        log_rss(&model, &[flat], &point(0.0, 5.0, 1500.0)),
        Err(LogRssError::DegenerateCovariate { .. })
    ));
}
