// =============================================================================
// Datasets
// =============================================================================
//
// A `Dataset` is a table of named numeric columns: the response (`used`, 1 for
// observed locations and 0 for available ones) and the habitat covariates
// measured at each location.
//
// Before fitting, covariates are usually prepared:
//
//   - standardize:   z-score so coefficients are comparable across covariates
//   - replace_zeros: remap exact zeros to a small positive constant, so a
//                    later log() doesn't produce -inf
//   - log_transform: materialize log(x) as its own column
//
// The formula language can also apply log() on the fly, in which case only
// `replace_zeros` is needed.
//
// =============================================================================

mod point;

pub use point::CovariatePoint;

use std::path::Path;

use indexmap::IndexMap;
use log::{info, warn};
use ndarray::Array1;

use crate::error::{LogRssError, Result};

/// Mean and standard deviation used to standardize a column.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Standardization {
    pub mean: f64,
    pub std_dev: f64,
}

impl Standardization {
    /// Map a raw value onto the standardized scale.
    pub fn apply(&self, value: f64) -> f64 {
        (value - self.mean) / self.std_dev
    }

    /// Map a standardized value back onto the raw scale.
    pub fn invert(&self, value: f64) -> f64 {
        value * self.std_dev + self.mean
    }
}

/// Named numeric columns of equal length.
#[derive(Debug, Clone, Default)]
pub struct Dataset {
    columns: IndexMap<String, Array1<f64>>,
    nrows: usize,
}

impl Dataset {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a dataset from `(name, values)` pairs.
    pub fn from_columns<I, S>(columns: I) -> Result<Self>
    where
        I: IntoIterator<Item = (S, Array1<f64>)>,
        S: Into<String>,
    {
        let mut dataset = Self::new();
        for (name, values) in columns {
            dataset.insert_column(name, values)?;
        }
        Ok(dataset)
    }

    /// Parse comma-separated text with a header row.
    ///
    /// Every cell must be numeric. Blank lines are skipped.
    pub fn from_csv_str(text: &str) -> Result<Self> {
        let mut lines = text
            .lines()
            .enumerate()
            .filter(|(_, line)| !line.trim().is_empty());

        let (_, header) = lines
            .next()
            .ok_or_else(|| LogRssError::EmptyInput("CSV has no header row".to_string()))?;
        let names: Vec<String> = header
            .split(',')
            .map(|h| h.trim().trim_matches('"').to_string())
            .collect();

        let mut values: Vec<Vec<f64>> = vec![Vec::new(); names.len()];
        for (idx, line) in lines {
            let parts: Vec<&str> = line.split(',').collect();
            if parts.len() != names.len() {
                return Err(LogRssError::Parse {
                    line: idx + 1,
                    column: parts.len(),
                    msg: format!("expected {} fields, found {}", names.len(), parts.len()),
                });
            }
            for (col, part) in parts.iter().enumerate() {
                let cell = part.trim().trim_matches('"');
                let v: f64 = cell.parse().map_err(|_| LogRssError::Parse {
                    line: idx + 1,
                    column: col + 1,
                    msg: format!("'{cell}' is not a number"),
                })?;
                values[col].push(v);
            }
        }

        Self::from_columns(names.into_iter().zip(values.into_iter().map(Array1::from_vec)))
    }

    /// Read a CSV file; see [`Dataset::from_csv_str`].
    pub fn from_csv_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;
        let dataset = Self::from_csv_str(&text)?;
        info!(
            "Loaded {} rows × {} columns from {}",
            dataset.nrows(),
            dataset.ncols(),
            path.display()
        );
        Ok(dataset)
    }

    pub fn nrows(&self) -> usize {
        self.nrows
    }

    pub fn ncols(&self) -> usize {
        self.columns.len()
    }

    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.keys().map(String::as_str)
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.columns.contains_key(name)
    }

    pub fn column(&self, name: &str) -> Result<&Array1<f64>> {
        self.columns
            .get(name)
            .ok_or_else(|| LogRssError::UnknownColumn(name.to_string()))
    }

    /// Add or replace a column.
    pub fn insert_column(&mut self, name: impl Into<String>, values: Array1<f64>) -> Result<()> {
        let name = name.into();
        let replacing_only_column = self.columns.len() == 1 && self.columns.contains_key(&name);
        if !self.columns.is_empty() && !replacing_only_column && values.len() != self.nrows {
            return Err(LogRssError::DimensionMismatch(format!(
                "column '{}' has {} rows but the dataset has {}",
                name,
                values.len(),
                self.nrows
            )));
        }
        self.nrows = values.len();
        self.columns.insert(name, values);
        Ok(())
    }

    // -------------------------------------------------------------------------
    // Transformations
    // -------------------------------------------------------------------------

    /// Add `new_name` = (col - mean) / sd, using the n-1 standard deviation.
    pub fn standardize(&mut self, col: &str, new_name: &str) -> Result<Standardization> {
        let mean = self.mean(col)?;
        let std_dev = self.std_dev(col)?;
        if std_dev <= 0.0 || !std_dev.is_finite() {
            return Err(LogRssError::DegenerateCovariate {
                name: col.to_string(),
                value: std_dev,
            });
        }
        let scaling = Standardization { mean, std_dev };
        let scaled = self.column(col)?.mapv(|v| scaling.apply(v));
        self.insert_column(new_name, scaled)?;
        Ok(scaling)
    }

    /// Add `new_name` = ln(col). Every value must be strictly positive.
    pub fn log_transform(&mut self, col: &str, new_name: &str) -> Result<()> {
        let values = self.column(col)?;
        if let Some(&bad) = values.iter().find(|&&v| v <= 0.0 || !v.is_finite()) {
            return Err(LogRssError::DegenerateCovariate {
                name: col.to_string(),
                value: bad,
            });
        }
        let logged = values.mapv(f64::ln);
        self.insert_column(new_name, logged)
    }

    /// Replace exact zeros in `col` with `replacement`. Returns how many changed.
    pub fn replace_zeros(&mut self, col: &str, replacement: f64) -> Result<usize> {
        if replacement <= 0.0 || !replacement.is_finite() {
            return Err(LogRssError::InvalidValue(format!(
                "zero replacement must be positive, got {replacement}"
            )));
        }
        let values = self
            .columns
            .get_mut(col)
            .ok_or_else(|| LogRssError::UnknownColumn(col.to_string()))?;
        let mut count = 0;
        values.mapv_inplace(|v| {
            if v == 0.0 {
                count += 1;
                replacement
            } else {
                v
            }
        });
        if count > 0 {
            warn!("Replaced {count} zero values in '{col}' with {replacement}");
        }
        Ok(count)
    }

    // -------------------------------------------------------------------------
    // Summaries
    // -------------------------------------------------------------------------

    pub fn mean(&self, col: &str) -> Result<f64> {
        self.column(col)?
            .mean()
            .ok_or_else(|| LogRssError::EmptyInput(format!("column '{col}' is empty")))
    }

    /// Sample standard deviation (n - 1 denominator).
    pub fn std_dev(&self, col: &str) -> Result<f64> {
        let values = self.column(col)?;
        if values.len() < 2 {
            return Err(LogRssError::EmptyInput(format!(
                "column '{col}' needs at least two values for a standard deviation"
            )));
        }
        Ok(values.std(1.0))
    }

    pub fn min_max(&self, col: &str) -> Result<(f64, f64)> {
        let values = self.column(col)?;
        if values.is_empty() {
            return Err(LogRssError::EmptyInput(format!("column '{col}' is empty")));
        }
        Ok(values
            .iter()
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| (lo.min(v), hi.max(v))))
    }

    /// Sample quantile of a column; see [`quantile`].
    pub fn quantile(&self, col: &str, p: f64) -> Result<f64> {
        quantile(&self.column(col)?.to_vec(), p)
    }

    /// Covariate point holding the column means of `cols`.
    pub fn means(&self, cols: &[&str]) -> Result<CovariatePoint> {
        let values = cols
            .iter()
            .map(|&c| Ok((c, self.mean(c)?)))
            .collect::<Result<Vec<_>>>()?;
        Ok(CovariatePoint::new(values))
    }

    /// All columns at row `i` as a covariate point.
    pub fn row(&self, i: usize) -> Result<CovariatePoint> {
        if i >= self.nrows {
            return Err(LogRssError::InvalidValue(format!(
                "row {i} out of range for {} rows",
                self.nrows
            )));
        }
        Ok(CovariatePoint::new(
            self.columns.iter().map(|(k, v)| (k.clone(), v[i])),
        ))
    }
}

/// Sample quantile using linear interpolation between order statistics.
///
/// This is R's default (type 7): h = (n - 1)p, interpolate between the values
/// at floor(h) and ceil(h).
pub fn quantile(values: &[f64], p: f64) -> Result<f64> {
    if values.is_empty() {
        return Err(LogRssError::EmptyInput("quantile of empty data".to_string()));
    }
    if !(0.0..=1.0).contains(&p) {
        return Err(LogRssError::InvalidValue(format!(
            "quantile probability must be in [0, 1], got {p}"
        )));
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);

    let h = (sorted.len() - 1) as f64 * p;
    let lo = h.floor() as usize;
    let hi = h.ceil() as usize;
    Ok(sorted[lo] + (h - lo as f64) * (sorted[hi] - sorted[lo]))
}
