// =============================================================================
// Error Types
// =============================================================================
//
// One error enum for the whole library. Every fallible function returns
// `Result<T>`, so callers can use `?` all the way up to the binary, which
// wraps these in `anyhow` for context.
//
// The first three variants are the interesting ones for log-RSS work:
//
//   - MissingTerm:          the fitted model has no coefficient with that name.
//                           The formula doesn't match the case you assumed.
//   - DegenerateCovariate:  a zero/negative value went into a log or a division.
//                           Sanitize the data before fitting.
//   - Disagreement:         closed-form and linear-predictor log-RSS differ
//                           after rounding. Either the algebra is wrong or the
//                           rounding is too fine for the magnitudes involved.
//
// =============================================================================

use thiserror::Error;

/// Errors produced by the log-RSS library.
#[derive(Error, Debug)]
pub enum LogRssError {
    /// A coefficient was requested that the fitted model doesn't have.
    #[error("Missing term: the fitted model has no coefficient named '{0}'")]
    MissingTerm(String),

    /// A covariate value can't be fed to a log-transform or used as a divisor.
    #[error("Degenerate covariate: '{name}' has value {value}, which is not usable here")]
    DegenerateCovariate { name: String, value: f64 },

    /// The two log-RSS evaluation paths disagree after rounding.
    #[error(
        "Log-RSS methods disagree for {case}: {n_mismatched} mismatched points \
         (max absolute difference {max_abs_diff:e})"
    )]
    Disagreement {
        case: String,
        n_mismatched: usize,
        max_abs_diff: f64,
    },

    /// A column or covariate name wasn't found.
    #[error("Unknown column: '{0}'")]
    UnknownColumn(String),

    /// The model formula couldn't be parsed.
    #[error("Formula error: {0}")]
    FormulaParse(String),

    /// Array dimensions don't line up.
    #[error("Dimension mismatch: {0}")]
    DimensionMismatch(String),

    /// Input was empty where data is required.
    #[error("Empty input: {0}")]
    EmptyInput(String),

    /// Input contains a value outside its valid range.
    #[error("Invalid value: {0}")]
    InvalidValue(String),

    /// The weighted least squares system couldn't be solved.
    #[error("Linear algebra error: {0}")]
    LinearAlgebraError(String),

    /// A data file couldn't be parsed.
    #[error("Parse error at line {line}, column {column}: {msg}")]
    Parse {
        line: usize,
        column: usize,
        msg: String,
    },

    /// Configuration couldn't be decoded.
    #[error("Configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Result alias used throughout the library.
pub type Result<T> = std::result::Result<T, LogRssError>;
