// =============================================================================
// logrss-core
// =============================================================================
//
// Log relative selection strength (log-RSS) for binomial habitat-selection
// models, computed two ways:
//
//   - closed form:       one algebraic expression per model formula
//   - linear predictor:  η(x1) - η(x2), valid for any fitted model
//
// and a check that the two agree.
//
// STRUCTURE:
// ----------
//   - data, simulate:        used/available datasets (CSV or simulated)
//   - formula, design_matrix: R-style formulas and the features they produce
//   - links, families:       logit link and binomial family
//   - solvers, inference:    IRLS fitting and Wald inference
//   - model:                 the `FittedModel` interface and `Glm`
//   - rss:                   closed-form cases, generic log-RSS, equivalence
//   - grid, analysis:        x1/x2 construction and the seven-case comparison
//   - config:                JSON-loadable analysis settings
//   - error:                 error types used throughout the library
//
// =============================================================================

pub mod analysis;
pub mod config;
pub mod constants;
pub mod convert;
pub mod data;
pub mod design_matrix;
pub mod error;
pub mod families;
pub mod formula;
pub mod grid;
pub mod inference;
pub mod links;
pub mod model;
pub mod rss;
pub mod simulate;
pub mod solvers;

pub use analysis::{compare_case, run_all, AnalysisReport, CaseOutcome, CaseReport};
pub use config::AnalysisConfig;
pub use data::{CovariatePoint, Dataset};
pub use error::{LogRssError, Result};
pub use families::Family;
pub use grid::CovariateGrid;
pub use links::Link;
pub use model::{FittedModel, Glm};
pub use rss::{check_equivalence, log_rss, log_rss_with_ci, EquivalencePolicy, ModelCase};
pub use simulate::{simulate_habitat, SimulationConfig};
pub use solvers::{fit_glm, fit_glm_full, IRLSConfig, IRLSResult};
