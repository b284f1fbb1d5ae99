// =============================================================================
// Log Relative Selection Strength
// =============================================================================
//
// log-RSS compares a habitat-selection function at two covariate points:
//
//     log-RSS(x1, x2) = ln[ w(x1) / w(x2) ],   w(x) = exp(Σ βₖ hₖ(x))
//
// There are two ways to evaluate it:
//
// CLOSED FORM (cases.rs)
// ----------------------
// One algebraic expression per model form, written in terms of the named
// coefficients and the covariate values. Needs a formula per model.
//
// LINEAR PREDICTOR (generic.rs)
// -----------------------------
// η(x1) - η(x2) on the link scale. Works for any fitted model, because the
// intercept is in both predictions and cancels.
//
// The equivalence check (equivalence.rs) decides whether the two agree.
//
// =============================================================================

mod cases;
mod equivalence;
mod generic;

pub use cases::ModelCase;
pub use equivalence::{check_equivalence, round_to, EquivalencePolicy, EquivalenceReport};
pub use generic::{log_rss, log_rss_with_ci, rss, LogRss};
