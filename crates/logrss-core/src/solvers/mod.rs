// =============================================================================
// GLM Solvers
// =============================================================================
//
// Fitting algorithms for the selection models. A used/available logistic
// regression models
//
//     logit(P(used | x)) = β₀ + Σ βₖ hₖ(x)
//
// where hₖ are the covariate features (raw, squared, logged, or products).
// IRLS finds β by repeatedly solving a weighted least squares problem.
//
// =============================================================================

mod irls;

pub use irls::{fit_glm, fit_glm_full, IRLSConfig, IRLSResult};
