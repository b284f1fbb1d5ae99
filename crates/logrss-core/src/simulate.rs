//! Simulation of used/available habitat data.
//!
//! Generates a reproducible dataset for exercising the selection models:
//!
//! - **available** locations are drawn from the landscape distribution of
//!   elevation (normal, truncated to ±4 sd) and slope (exponential, truncated
//!   at `slope_max`, rounded to 0.1 degree as a DEM would report it);
//! - **used** locations are drawn from the same landscape and kept with
//!   probability w(x) / max w, where
//!
//! ```text
//! log w(x) = β_elev z + β_elev2 z² + β_slope slope,   z = (elev - μ) / σ
//! ```
//!
//! Rounding slope means some locations have slope exactly 0, which is what
//! real terrain data looks like and why slope needs zero remapping before a
//! log-transform.

use log::info;
use ndarray::Array1;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::{Distribution, Exp, Normal};

use crate::data::Dataset;
use crate::error::{LogRssError, Result};

/// Rejection-sampling attempts allowed per requested used point.
const MAX_ATTEMPTS_PER_USED: usize = 10_000;

/// Parameters for [`simulate_habitat`].
#[derive(Debug, Clone, PartialEq, serde::Deserialize, serde::Serialize)]
#[serde(default)]
pub struct SimulationConfig {
    pub n_used: usize,
    pub n_available: usize,
    pub seed: u64,
    /// Landscape mean elevation (m)
    pub elev_mean: f64,
    /// Landscape elevation standard deviation (m)
    pub elev_sd: f64,
    /// Landscape mean slope (degrees)
    pub slope_mean: f64,
    /// Slopes above this are redrawn
    pub slope_max: f64,
    /// Selection for standardized elevation
    pub beta_elev: f64,
    /// Selection for squared standardized elevation
    pub beta_elev2: f64,
    /// Selection per degree of slope
    pub beta_slope: f64,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            n_used: 500,
            n_available: 2500,
            seed: 42,
            elev_mean: 1500.0,
            elev_sd: 300.0,
            slope_mean: 8.0,
            slope_max: 60.0,
            beta_elev: 0.8,
            beta_elev2: -0.3,
            beta_slope: -0.08,
        }
    }
}

impl SimulationConfig {
    /// True log selection strength at (elev, slope), up to a constant.
    pub fn log_selection(&self, elev: f64, slope: f64) -> f64 {
        let z = (elev - self.elev_mean) / self.elev_sd;
        self.beta_elev * z + self.beta_elev2 * z * z + self.beta_slope * slope
    }

    /// Upper bound of `log_selection` over the truncated landscape.
    fn max_log_selection(&self) -> f64 {
        let quad = |z: f64| self.beta_elev * z + self.beta_elev2 * z * z;
        let mut best = quad(-4.0).max(quad(4.0));
        if self.beta_elev2 != 0.0 {
            let vertex = -self.beta_elev / (2.0 * self.beta_elev2);
            if (-4.0..=4.0).contains(&vertex) {
                best = best.max(quad(vertex));
            }
        }
        best + (self.beta_slope * self.slope_max).max(0.0)
    }
}

struct Landscape {
    elev: Normal<f64>,
    slope: Exp<f64>,
    elev_lo: f64,
    elev_hi: f64,
    slope_max: f64,
}

impl Landscape {
    fn new(config: &SimulationConfig) -> Result<Self> {
        if config.slope_mean <= 0.0 || config.slope_max <= 0.0 {
            return Err(LogRssError::InvalidValue(
                "slope_mean and slope_max must be positive".to_string(),
            ));
        }
        let elev = Normal::new(config.elev_mean, config.elev_sd)
            .map_err(|e| LogRssError::InvalidValue(format!("elevation distribution: {e}")))?;
        let slope = Exp::new(1.0 / config.slope_mean)
            .map_err(|e| LogRssError::InvalidValue(format!("slope distribution: {e}")))?;
        Ok(Self {
            elev,
            slope,
            elev_lo: config.elev_mean - 4.0 * config.elev_sd,
            elev_hi: config.elev_mean + 4.0 * config.elev_sd,
            slope_max: config.slope_max,
        })
    }

    fn draw(&self, rng: &mut StdRng) -> (f64, f64) {
        let elev = loop {
            let e = self.elev.sample(rng);
            if (self.elev_lo..=self.elev_hi).contains(&e) {
                break e;
            }
        };
        let slope = loop {
            let s = (self.slope.sample(rng) * 10.0).round() / 10.0;
            if s <= self.slope_max {
                break s;
            }
        };
        (elev, slope)
    }
}

/// Simulate a used/available dataset with columns `used`, `elev`, `slope`.
pub fn simulate_habitat(config: &SimulationConfig) -> Result<Dataset> {
    if config.n_used == 0 || config.n_available == 0 {
        return Err(LogRssError::EmptyInput(
            "simulation needs at least one used and one available point".to_string(),
        ));
    }
    if !(config.elev_sd > 0.0) {
        return Err(LogRssError::InvalidValue("elev_sd must be positive".to_string()));
    }

    let landscape = Landscape::new(config)?;
    let mut rng = StdRng::seed_from_u64(config.seed);
    let max_log_w = config.max_log_selection();

    let too_large = || {
        LogRssError::InvalidValue(format!(
            "cannot simulate {} used and {} available points",
            config.n_used, config.n_available
        ))
    };
    let n = config.n_used.checked_add(config.n_available).ok_or_else(too_large)?;
    let max_attempts = config
        .n_used
        .checked_mul(MAX_ATTEMPTS_PER_USED)
        .ok_or_else(too_large)?;

    let mut used = Vec::new();
    let mut elev = Vec::new();
    let mut slope = Vec::new();
    for column in [&mut used, &mut elev, &mut slope] {
        column.try_reserve_exact(n).map_err(|_| too_large())?;
    }

    let mut attempts = 0;
    while used.len() < config.n_used {
        if attempts == max_attempts {
            return Err(LogRssError::InvalidValue(format!(
                "rejection sampling accepted only {} of {} used points in {} draws",
                used.len(),
                config.n_used,
                attempts
            )));
        }
        attempts += 1;
        let (e, s) = landscape.draw(&mut rng);
        let accept = (config.log_selection(e, s) - max_log_w).exp();
        if rng.gen::<f64>() < accept {
            used.push(1.0);
            elev.push(e);
            slope.push(s);
        }
    }

    for _ in 0..config.n_available {
        let (e, s) = landscape.draw(&mut rng);
        used.push(0.0);
        elev.push(e);
        slope.push(s);
    }

    info!(
        "Simulated {} used and {} available points ({} draws for used)",
        config.n_used, config.n_available, attempts
    );

    Dataset::from_columns([
        ("used", Array1::from_vec(used)),
        ("elev", Array1::from_vec(elev)),
        ("slope", Array1::from_vec(slope)),
    ])
}
