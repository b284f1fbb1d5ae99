//! Covariate points: named covariate values at one location.

use indexmap::IndexMap;

use crate::error::{LogRssError, Result};

/// An immutable mapping from covariate name to value.
///
/// Log-RSS compares two of these: `x1` (a location of interest) and `x2`
/// (a reference location, often the sample means).
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CovariatePoint {
    values: IndexMap<String, f64>,
}

impl CovariatePoint {
    pub fn new<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = (S, f64)>,
        S: Into<String>,
    {
        Self {
            values: values.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }

    /// Value of a covariate.
    pub fn get(&self, name: &str) -> Result<f64> {
        self.values
            .get(name)
            .copied()
            .ok_or_else(|| LogRssError::UnknownColumn(name.to_string()))
    }

    /// A copy of this point with one covariate set to `value`.
    pub fn with(&self, name: &str, value: f64) -> Self {
        let mut values = self.values.clone();
        values.insert(name.to_string(), value);
        Self { values }
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_and_missing() {
        let x = CovariatePoint::new([("elev", 1200.0), ("slope", 4.5)]);
        assert_eq!(x.get("elev").unwrap(), 1200.0);
        assert!(matches!(x.get("aspect"), Err(LogRssError::UnknownColumn(_))));
    }

    #[test]
    fn test_with_leaves_original_untouched() {
        let x = CovariatePoint::new([("elev", 1200.0), ("slope", 4.5)]);
        let y = x.with("elev", 900.0);
        assert_eq!(x.get("elev").unwrap(), 1200.0);
        assert_eq!(y.get("elev").unwrap(), 900.0);
        assert_eq!(y.get("slope").unwrap(), 4.5);
        assert_eq!(y.names().collect::<Vec<_>>(), vec!["elev", "slope"]);
    }
}
