//! Closed-form log-RSS for the seven model forms.
//!
//! Each variant names its covariates: `hi` is always present, `hj` is the
//! second covariate for two-covariate forms. With Δh = h(x1) − h(x2):
//!
//! | Case | Formula                 | log-RSS |
//! |------|-------------------------|---------|
//! | 1    | `y ~ hi + hj`           | βᵢΔhᵢ + βⱼΔhⱼ |
//! | 2    | `y ~ hi * hj`           | βᵢΔhᵢ + βⱼΔhⱼ + βᵢⱼΔ(hᵢhⱼ) |
//! | 3    | `y ~ hi + I(hi^2)`      | Δhᵢ(βᵢ + βᵢ₂(2hᵢ(x1) − Δhᵢ)) |
//! | 4    | `y ~ hi * hj + I(hi^2)` | case 2 + βᵢ₂Δhᵢ(2hᵢ(x1) − Δhᵢ) |
//! | 5    | `y ~ log(hi)`           | ln[(hᵢ(x1) / (hᵢ(x1) − Δhᵢ))^βᵢ] |
//! | 6    | `y ~ log(hi) * hj`      | ln[(hᵢ(x1)/hᵢ(x2))^βᵢ] + βⱼΔhⱼ + ln[hᵢ(x1)^(βᵢⱼhⱼ(x1)) / hᵢ(x2)^(βᵢⱼhⱼ(x2))] |
//! | 7    | `y ~ log(hi) + log(hj)` | case 5 for hᵢ + case 5 for hⱼ |
//!
//! The expressions are evaluated as written (powers before logs) rather than
//! simplified, so agreement with the linear predictor is a real check of the
//! algebra.

use std::fmt;

use ndarray::Array1;
use serde::{Deserialize, Serialize};

use crate::data::CovariatePoint;
use crate::error::{LogRssError, Result};
use crate::model::FittedModel;

/// The seven model forms with a closed-form log-RSS.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ModelCase {
    Additive { hi: String, hj: String },
    Interaction { hi: String, hj: String },
    Quadratic { hi: String },
    QuadraticInteraction { hi: String, hj: String },
    LogSingle { hi: String },
    LogLinear { hi: String, hj: String },
    LogSum { hi: String, hj: String },
}

impl ModelCase {
    /// The seven cases in order, for a linear covariate pair and a
    /// strictly positive covariate pair.
    ///
    /// Cases 1-4 use `linear`; case 5 logs `positive.0`, case 6 crosses
    /// `log(positive.0)` with `linear.0`, case 7 logs both of `positive`.
    pub fn standard_set(linear: (&str, &str), positive: (&str, &str)) -> Vec<ModelCase> {
        let (li, lj) = (linear.0.to_string(), linear.1.to_string());
        let (pi, pj) = (positive.0.to_string(), positive.1.to_string());
        vec![
            ModelCase::Additive { hi: li.clone(), hj: lj.clone() },
            ModelCase::Interaction { hi: li.clone(), hj: lj.clone() },
            ModelCase::Quadratic { hi: li.clone() },
            ModelCase::QuadraticInteraction { hi: li.clone(), hj: lj },
            ModelCase::LogSingle { hi: pi.clone() },
            ModelCase::LogLinear { hi: pi.clone(), hj: li },
            ModelCase::LogSum { hi: pi, hj: pj },
        ]
    }

    /// Case number, 1 through 7.
    pub fn number(&self) -> u8 {
        match self {
            ModelCase::Additive { .. } => 1,
            ModelCase::Interaction { .. } => 2,
            ModelCase::Quadratic { .. } => 3,
            ModelCase::QuadraticInteraction { .. } => 4,
            ModelCase::LogSingle { .. } => 5,
            ModelCase::LogLinear { .. } => 6,
            ModelCase::LogSum { .. } => 7,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ModelCase::Additive { .. } => "additive",
            ModelCase::Interaction { .. } => "interaction",
            ModelCase::Quadratic { .. } => "quadratic",
            ModelCase::QuadraticInteraction { .. } => "quadratic + interaction",
            ModelCase::LogSingle { .. } => "log",
            ModelCase::LogLinear { .. } => "log × linear",
            ModelCase::LogSum { .. } => "log + log",
        }
    }

    /// Covariates the case reads from each point.
    pub fn covariates(&self) -> Vec<&str> {
        match self {
            ModelCase::Quadratic { hi } | ModelCase::LogSingle { hi } => vec![hi.as_str()],
            ModelCase::Additive { hi, hj }
            | ModelCase::Interaction { hi, hj }
            | ModelCase::QuadraticInteraction { hi, hj }
            | ModelCase::LogLinear { hi, hj }
            | ModelCase::LogSum { hi, hj } => vec![hi.as_str(), hj.as_str()],
        }
    }

    /// Right-hand side of the model formula.
    pub fn rhs(&self) -> String {
        match self {
            ModelCase::Additive { hi, hj } => format!("{hi} + {hj}"),
            ModelCase::Interaction { hi, hj } => format!("{hi} * {hj}"),
            ModelCase::Quadratic { hi } => format!("{hi} + I({hi}^2)"),
            ModelCase::QuadraticInteraction { hi, hj } => format!("{hi} * {hj} + I({hi}^2)"),
            ModelCase::LogSingle { hi } => format!("log({hi})"),
            ModelCase::LogLinear { hi, hj } => format!("log({hi}) * {hj}"),
            ModelCase::LogSum { hi, hj } => format!("log({hi}) + log({hj})"),
        }
    }

    /// Full model formula for `response`.
    pub fn formula(&self, response: &str) -> String {
        format!("{response} ~ {}", self.rhs())
    }

    /// Coefficient names the closed form reads.
    pub fn required_terms(&self) -> Vec<String> {
        match self {
            ModelCase::Additive { hi, hj } => vec![hi.clone(), hj.clone()],
            ModelCase::Interaction { hi, hj } => {
                vec![hi.clone(), hj.clone(), format!("{hi}:{hj}")]
            }
            ModelCase::Quadratic { hi } => vec![hi.clone(), format!("I({hi}^2)")],
            ModelCase::QuadraticInteraction { hi, hj } => vec![
                hi.clone(),
                hj.clone(),
                format!("{hi}:{hj}"),
                format!("I({hi}^2)"),
            ],
            ModelCase::LogSingle { hi } => vec![format!("log({hi})")],
            ModelCase::LogLinear { hi, hj } => vec![
                format!("log({hi})"),
                hj.clone(),
                format!("log({hi}):{hj}"),
            ],
            ModelCase::LogSum { hi, hj } => vec![format!("log({hi})"), format!("log({hj})")],
        }
    }

    /// Closed-form log-RSS of every `x1` point against `x2`.
    pub fn log_rss(
        &self,
        model: &dyn FittedModel,
        x1: &[CovariatePoint],
        x2: &CovariatePoint,
    ) -> Result<Array1<f64>> {
        let betas = self
            .required_terms()
            .iter()
            .map(|name| model.coefficient(name))
            .collect::<Result<Vec<f64>>>()?;

        x1.iter().map(|p| self.evaluate(&betas, p, x2)).collect()
    }

    /// One closed-form value. `b` holds coefficients in `required_terms` order.
    fn evaluate(&self, b: &[f64], x1: &CovariatePoint, x2: &CovariatePoint) -> Result<f64> {
        let value = match self {
            ModelCase::Additive { hi, hj } => {
                let (i1, i2) = pair(hi, x1, x2)?;
                let (j1, j2) = pair(hj, x1, x2)?;
                b[0] * (i1 - i2) + b[1] * (j1 - j2)
            }
            ModelCase::Interaction { hi, hj } => {
                let (i1, i2) = pair(hi, x1, x2)?;
                let (j1, j2) = pair(hj, x1, x2)?;
                b[0] * (i1 - i2) + b[1] * (j1 - j2) + b[2] * (i1 * j1 - i2 * j2)
            }
            ModelCase::Quadratic { hi } => {
                let (i1, i2) = pair(hi, x1, x2)?;
                let d = i1 - i2;
                d * (b[0] + b[1] * (2.0 * i1 - d))
            }
            ModelCase::QuadraticInteraction { hi, hj } => {
                let (i1, i2) = pair(hi, x1, x2)?;
                let (j1, j2) = pair(hj, x1, x2)?;
                let d = i1 - i2;
                b[0] * d + b[1] * (j1 - j2) + b[2] * (i1 * j1 - i2 * j2) + b[3] * d * (2.0 * i1 - d)
            }
            ModelCase::LogSingle { hi } => {
                let (i1, i2) = positive_pair(hi, x1, x2)?;
                log_power_ratio(hi, i1, i1 - i2, b[0])?
            }
            ModelCase::LogLinear { hi, hj } => {
                let (i1, i2) = positive_pair(hi, x1, x2)?;
                let (j1, j2) = pair(hj, x1, x2)?;
                let main = ((i1 / i2).powf(b[0])).ln();
                let cross = (i1.powf(b[2] * j1) / i2.powf(b[2] * j2)).ln();
                main + b[1] * (j1 - j2) + cross
            }
            ModelCase::LogSum { hi, hj } => {
                let (i1, i2) = positive_pair(hi, x1, x2)?;
                let (j1, j2) = positive_pair(hj, x1, x2)?;
                log_power_ratio(hi, i1, i1 - i2, b[0])? + log_power_ratio(hj, j1, j1 - j2, b[1])?
            }
        };
        // The powers are evaluated literally and can overflow (inf / inf).
        if !value.is_finite() {
            let name = self.covariates()[0];
            return Err(LogRssError::DegenerateCovariate {
                name: name.to_string(),
                value: x1.get(name)?,
            });
        }
        Ok(value)
    }
}

impl fmt::Display for ModelCase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "case {} ({}): {}", self.number(), self.label(), self.rhs())
    }
}

fn pair(name: &str, x1: &CovariatePoint, x2: &CovariatePoint) -> Result<(f64, f64)> {
    Ok((x1.get(name)?, x2.get(name)?))
}

fn positive_pair(name: &str, x1: &CovariatePoint, x2: &CovariatePoint) -> Result<(f64, f64)> {
    let (a, b) = pair(name, x1, x2)?;
    for value in [a, b] {
        if value <= 0.0 || !value.is_finite() {
            return Err(LogRssError::DegenerateCovariate {
                name: name.to_string(),
                value,
            });
        }
    }
    Ok((a, b))
}

/// ln[(h1 / (h1 − Δh))^β].
fn log_power_ratio(name: &str, h1: f64, delta: f64, beta: f64) -> Result<f64> {
    let base = h1 - delta;
    if base <= 0.0 {
        return Err(LogRssError::DegenerateCovariate {
            name: name.to_string(),
            value: base,
        });
    }
    let value = ((h1 / base).powf(beta)).ln();
    if !value.is_finite() {
        return Err(LogRssError::DegenerateCovariate {
            name: name.to_string(),
            value: h1,
        });
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use indexmap::IndexMap;

    /// Coefficients only; the closed form never calls `features`.
    struct Coefs(IndexMap<String, f64>);

    impl FittedModel for Coefs {
        fn coefficients(&self) -> &IndexMap<String, f64> {
            &self.0
        }

        fn features(&self, _point: &CovariatePoint) -> Result<Array1<f64>> {
            Err(LogRssError::InvalidValue("no design".to_string()))
        }
    }

    fn coefs(pairs: &[(&str, f64)]) -> Coefs {
        Coefs(pairs.iter().map(|&(k, v)| (k.to_string(), v)).collect())
    }

    fn pt(a: f64, b: f64) -> CovariatePoint {
        CovariatePoint::new([("a", a), ("b", b)])
    }

    #[test]
    fn test_formulas_and_terms() {
        let cases = ModelCase::standard_set(("a", "b"), ("p", "q"));
        let formulas: Vec<String> = cases.iter().map(|c| c.formula("y")).collect();
        assert_eq!(
            formulas,
            vec![
                "y ~ a + b",
                "y ~ a * b",
                "y ~ a + I(a^2)",
                "y ~ a * b + I(a^2)",
                "y ~ log(p)",
                "y ~ log(p) * a",
                "y ~ log(p) + log(q)",
            ]
        );
        assert_eq!(
            cases[5].required_terms(),
            vec!["log(p)", "a", "log(p):a"]
        );
        assert_eq!(cases.iter().map(ModelCase::number).collect::<Vec<_>>(), (1..=7).collect::<Vec<_>>());
    }

    #[test]
    fn test_additive_by_hand() {
        let m = coefs(&[("a", 0.5), ("b", -2.0)]);
        let case = ModelCase::Additive { hi: "a".into(), hj: "b".into() };
        let out = case.log_rss(&m, &[pt(3.0, 1.0)], &pt(1.0, 2.0)).unwrap();
        // 0.5 * 2 + (-2) * (-1)
        assert_abs_diff_eq!(out[0], 3.0, epsilon = 1e-15);
    }

    #[test]
    fn test_quadratic_matches_expanded_form() {
        let (b1, b2) = (0.7, -0.2);
        let m = coefs(&[("a", b1), ("I(a^2)", b2)]);
        let case = ModelCase::Quadratic { hi: "a".into() };
        let out = case.log_rss(&m, &[pt(2.5, 0.0)], &pt(-1.0, 0.0)).unwrap();
        let expected = b1 * (2.5 - -1.0) + b2 * (2.5f64.powi(2) - 1.0);
        assert_abs_diff_eq!(out[0], expected, epsilon = 1e-12);
    }

    #[test]
    fn test_log_reparametrization() {
        // ln((a/b)^β) == β ln(a/b)
        let beta = -0.35;
        let m = coefs(&[("log(a)", beta), ("log(b)", 1.2)]);
        let x1 = pt(12.0, 0.4);
        let x2 = pt(3.0, 2.0);

        let five = ModelCase::LogSingle { hi: "a".into() };
        let out = five.log_rss(&m, &[x1.clone()], &x2).unwrap();
        assert_abs_diff_eq!(out[0], beta * (12.0f64 / 3.0).ln(), epsilon = 1e-12);

        let seven = ModelCase::LogSum { hi: "a".into(), hj: "b".into() };
        let out = seven.log_rss(&m, &[x1], &x2).unwrap();
        let expected = beta * 4.0f64.ln() + 1.2 * 0.2f64.ln();
        assert_abs_diff_eq!(out[0], expected, epsilon = 1e-12);
    }

    #[test]
    fn test_log_linear_by_hand() {
        let (bi, bj, bij) = (0.4, 0.1, -0.3);
        let m = coefs(&[("log(a)", bi), ("b", bj), ("log(a):b", bij)]);
        let case = ModelCase::LogLinear { hi: "a".into(), hj: "b".into() };
        let (x1, x2) = (pt(5.0, 1.5), pt(2.0, -0.5));
        let out = case.log_rss(&m, &[x1], &x2).unwrap();
        let eta = |a: f64, b: f64| bi * a.ln() + bj * b + bij * a.ln() * b;
        assert_abs_diff_eq!(out[0], eta(5.0, 1.5) - eta(2.0, -0.5), epsilon = 1e-12);
    }

    #[test]
    fn test_missing_coefficient() {
        let m = coefs(&[("a", 1.0), ("b", 1.0)]);
        let case = ModelCase::Interaction { hi: "a".into(), hj: "b".into() };
        assert!(matches!(
            case.log_rss(&m, &[pt(1.0, 1.0)], &pt(0.0, 0.0)),
            Err(LogRssError::MissingTerm(name)) if name == "a:b"
        ));
    }

    #[test]
    fn test_log_of_non_positive() {
        let m = coefs(&[("log(a)", 1.0)]);
        let case = ModelCase::LogSingle { hi: "a".into() };
        assert!(matches!(
            case.log_rss(&m, &[pt(0.0, 1.0)], &pt(1.0, 1.0)),
            Err(LogRssError::DegenerateCovariate { .. })
        ));
    }

    #[test]
    fn test_overflowing_power_is_an_error_not_nan() {
        // 50^(0.6 * 400) overflows even though x1 == x2
        let m = coefs(&[("log(a)", 0.5), ("b", 0.1), ("log(a):b", 0.6)]);
        let case = ModelCase::LogLinear { hi: "a".into(), hj: "b".into() };
        let x = pt(50.0, 400.0);
        match case.log_rss(&m, &[x.clone()], &x) {
            Err(LogRssError::DegenerateCovariate { name, value }) => {
                assert_eq!(name, "a");
                assert_eq!(value, 50.0);
            }
            other => panic!("expected DegenerateCovariate, got {other:?}"),
        }

        // (1e-200 / 1)^-2 overflows inside the single-log form
        let m = coefs(&[("log(a)", -2.0)]);
        let case = ModelCase::LogSingle { hi: "a".into() };
        assert!(matches!(
            case.log_rss(&m, &[pt(1e-200, 1.0)], &pt(1.0, 1.0)),
            Err(LogRssError::DegenerateCovariate { name, .. }) if name == "a"
        ));

        // moderate exponents still evaluate
        let x2 = pt(2.0, 3.0);
        let m = coefs(&[("log(a)", 0.5), ("b", 0.1), ("log(a):b", 0.6)]);
        let case = ModelCase::LogLinear { hi: "a".into(), hj: "b".into() };
        assert_abs_diff_eq!(case.log_rss(&m, &[x2.clone()], &x2).unwrap()[0], 0.0, epsilon = 1e-12);
    }

    #[test]
    fn test_missing_covariate() {
        let m = coefs(&[("a", 1.0), ("c", 1.0)]);
        let case = ModelCase::Additive { hi: "a".into(), hj: "c".into() };
        assert!(matches!(
            case.log_rss(&m, &[pt(1.0, 1.0)], &pt(0.0, 0.0)),
            Err(LogRssError::UnknownColumn(_))
        ));
    }

    #[test]
    fn test_empty_x1() {
        let m = coefs(&[("a", 1.0), ("b", 1.0)]);
        let case = ModelCase::Additive { hi: "a".into(), hj: "b".into() };
        assert!(case.log_rss(&m, &[], &pt(0.0, 0.0)).unwrap().is_empty());
    }

    #[test]
    fn test_serde_tagging() {
        let case: ModelCase = serde_json::from_str(r#"{"kind":"log_linear","hi":"slope","hj":"elev"}"#).unwrap();
        assert_eq!(case, ModelCase::LogLinear { hi: "slope".into(), hj: "elev".into() });
        assert_eq!(case.to_string(), "case 6 (log × linear): log(slope) * elev");
    }
}
