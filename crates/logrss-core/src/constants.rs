//! Numeric constants shared across the library.

/// Values closer than this to zero are treated as zero.
pub const ZERO_TOL: f64 = 1e-12;

/// Lower clamp for fitted probabilities.
pub const MU_MIN_PROBABILITY: f64 = 1e-10;

/// Upper clamp for fitted probabilities.
pub const MU_MAX_PROBABILITY: f64 = 1.0 - 1e-10;

/// Upper clamp for IRLS working weights.
pub const MAX_IRLS_WEIGHT: f64 = 1e10;

/// Decimal places both log-RSS vectors are rounded to before comparison.
pub const DEFAULT_ROUNDING_DIGITS: u32 = 10;

/// Finest rounding accepted. An f64 carries about 15 significant decimals,
/// and 10^d must stay finite.
pub const MAX_ROUNDING_DIGITS: u32 = 15;

/// Value substituted for exact zeros in covariates that get log-transformed.
pub const DEFAULT_ZERO_REPLACEMENT: f64 = 0.001;
