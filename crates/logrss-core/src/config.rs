// =============================================================================
// Analysis Configuration
// =============================================================================
//
// Everything the seven-case comparison can be tuned with, in one struct that
// deserializes from JSON. Every field has a default, so a config file only
// needs the fields it changes:
//
//     {
//       "linear": ["elev_sc", "slope"],
//       "equivalence": { "rounded_decimals": 8 },
//       "cases": [1, 5, 6]
//     }
//
// =============================================================================

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::constants::DEFAULT_ZERO_REPLACEMENT;
use crate::error::{LogRssError, Result};
use crate::grid::{DEFAULT_GRID_POINTS, DEFAULT_HOLD_QUANTILES};
use crate::rss::{EquivalencePolicy, ModelCase};
use crate::simulate::SimulationConfig;
use crate::solvers::IRLSConfig;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// 0/1 column: used vs available
    pub response: String,
    /// Covariate pair for the untransformed cases (1-4) and the linear side of case 6
    pub linear: [String; 2],
    /// Strictly positive covariate pair for the log cases (5-7)
    pub positive: [String; 2],
    /// Columns to z-score; each gets a `<name>_sc` companion
    pub standardize: Vec<String>,
    /// Stand-in for exact zeros in the `positive` columns
    pub zero_replacement: f64,
    /// Steps along the swept covariate
    pub grid_points: usize,
    /// Quantiles the second covariate is held at
    pub hold_quantiles: Vec<f64>,
    pub equivalence: EquivalencePolicy,
    /// Confidence level for log-RSS intervals
    pub ci_level: f64,
    /// Prior weight for available (response = 0) rows; used rows get 1
    pub available_weight: Option<f64>,
    /// Case numbers to run; empty runs all seven
    pub cases: Vec<u8>,
    pub irls: IRLSConfig,
    pub simulation: SimulationConfig,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            response: "used".to_string(),
            linear: ["elev_sc".to_string(), "slope".to_string()],
            positive: ["slope".to_string(), "elev".to_string()],
            standardize: vec!["elev".to_string()],
            zero_replacement: DEFAULT_ZERO_REPLACEMENT,
            grid_points: DEFAULT_GRID_POINTS,
            hold_quantiles: DEFAULT_HOLD_QUANTILES.to_vec(),
            equivalence: EquivalencePolicy::default(),
            ci_level: 0.95,
            available_weight: None,
            cases: Vec::new(),
            irls: IRLSConfig::default(),
            simulation: SimulationConfig::default(),
        }
    }
}

impl AnalysisConfig {
    /// Parse and validate a JSON document.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self =
            serde_json::from_str(json).map_err(|e| LogRssError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a JSON file.
    pub fn from_json_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let reader = BufReader::new(File::open(path)?);
        let config: Self = serde_json::from_reader(reader)
            .map_err(|e| LogRssError::Config(format!("{}: {}", path.display(), e)))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        let fail = |msg: String| -> Result<()> { Err(LogRssError::Config(msg)) };

        if self.grid_points == 0 {
            return fail("grid_points must be at least 1".to_string());
        }
        if self.hold_quantiles.is_empty() {
            return fail("hold_quantiles must not be empty".to_string());
        }
        if let Some(q) = self.hold_quantiles.iter().find(|q| !(0.0..=1.0).contains(*q)) {
            return fail(format!("hold quantile {q} is outside [0, 1]"));
        }
        if !(self.ci_level > 0.0 && self.ci_level < 1.0) {
            return fail(format!("ci_level must be in (0, 1), got {}", self.ci_level));
        }
        if !(self.zero_replacement > 0.0 && self.zero_replacement.is_finite()) {
            return fail(format!(
                "zero_replacement must be positive, got {}",
                self.zero_replacement
            ));
        }
        if let Some(w) = self.available_weight {
            if !(w > 0.0 && w.is_finite()) {
                return fail(format!("available_weight must be positive, got {w}"));
            }
        }
        if let Some(k) = self.cases.iter().find(|k| !(1..=7).contains(*k)) {
            return fail(format!("case {k} does not exist (cases are 1-7)"));
        }
        if let Err(e) = self.equivalence.check() {
            return fail(e.to_string());
        }
        Ok(())
    }

    /// The selected model cases, in case-number order.
    pub fn model_cases(&self) -> Vec<ModelCase> {
        let [li, lj] = &self.linear;
        let [pi, pj] = &self.positive;
        ModelCase::standard_set((li.as_str(), lj.as_str()), (pi.as_str(), pj.as_str()))
            .into_iter()
            .filter(|c| self.cases.is_empty() || self.cases.contains(&c.number()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_validate() {
        let config = AnalysisConfig::default();
        config.validate().unwrap();
        assert_eq!(config.model_cases().len(), 7);
        assert_eq!(config.equivalence, EquivalencePolicy::RoundedDecimals(10));
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config = AnalysisConfig::from_json_str(
            r#"{ "cases": [1, 6], "equivalence": { "rounded_decimals": 8 }, "irls": { "max_iterations": 50 } }"#,
        )
        .unwrap();
        assert_eq!(config.equivalence, EquivalencePolicy::RoundedDecimals(8));
        assert_eq!(config.irls.max_iterations, 50);
        assert_eq!(config.irls.tolerance, IRLSConfig::default().tolerance);
        assert_eq!(config.response, "used");

        let cases = config.model_cases();
        assert_eq!(cases.len(), 2);
        assert_eq!(cases[1].formula("used"), "used ~ log(slope) * elev_sc");
    }

    #[test]
    fn test_relative_tolerance_json() {
        let config =
            AnalysisConfig::from_json_str(r#"{ "equivalence": { "relative_tolerance": 1e-9 } }"#)
                .unwrap();
        assert_eq!(config.equivalence, EquivalencePolicy::RelativeTolerance(1e-9));
    }

    #[test]
    fn test_rejects_bad_values() {
        for json in [
            r#"{ "cases": [8] }"#,
            r#"{ "ci_level": 1.0 }"#,
            r#"{ "hold_quantiles": [0.5, 1.2] }"#,
            r#"{ "zero_replacement": 0.0 }"#,
            r#"{ "grid_points": 0 }"#,
            r#"{ "available_weight": -2.0 }"#,
            r#"{ "grid_points": "many" }"#,
            r#"{ "equivalence": { "rounded_decimals": 400 } }"#,
            r#"{ "equivalence": { "rounded_decimals": 4294967295 } }"#,
            r#"{ "equivalence": { "relative_tolerance": -1.0 } }"#,
        ] {
            assert!(
                matches!(AnalysisConfig::from_json_str(json), Err(LogRssError::Config(_))),
                "accepted {json}"
            );
        }
    }

    #[test]
    fn test_missing_file_is_io_error() {
        assert!(matches!(
            AnalysisConfig::from_json_path("/nonexistent/logrss.json"),
            Err(LogRssError::Io(_))
        ));
    }
}
