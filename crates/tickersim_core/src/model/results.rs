//! Simulation outputs
//!
//! Every Monte Carlo result is a plain value backed by a row-major [`Grid`].
//! Nothing here holds onto the model that produced it.

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize};

use super::grid::Grid;
use super::ids::AssetCode;
use crate::error::Result;
use crate::stats::{self, Axis, PercentileBands};

fn grid_with_ndim<'de, D: Deserializer<'de>>(
    deserializer: D,
    ndim: usize,
) -> std::result::Result<Grid<f64>, D::Error> {
    let grid = Grid::<f64>::deserialize(deserializer)?;
    if grid.ndim() != ndim {
        return Err(D::Error::custom(format!(
            "expected a {ndim}-dimensional grid, got {}",
            grid.ndim()
        )));
    }
    Ok(grid)
}

fn matrix_grid<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> std::result::Result<Grid<f64>, D::Error> {
    grid_with_ndim(deserializer, 2)
}

fn cube_grid<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> std::result::Result<Grid<f64>, D::Error> {
    grid_with_ndim(deserializer, 3)
}

/// Simulated balances, shape `(sims, days + 1)`.
///
/// Column 0 holds the starting balance for every simulation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BalancePaths {
    #[serde(deserialize_with = "matrix_grid")]
    grid: Grid<f64>,
}

impl BalancePaths {
    pub(crate) fn from_grid(grid: Grid<f64>) -> Self {
        debug_assert_eq!(grid.ndim(), 2);
        Self { grid }
    }

    #[must_use]
    pub fn sims(&self) -> usize {
        self.grid.shape()[0]
    }

    /// Number of simulated days, excluding the starting column
    #[must_use]
    pub fn days(&self) -> usize {
        self.grid.shape()[1].saturating_sub(1)
    }

    /// One simulation's balance trajectory
    pub fn path(&self, sim: usize) -> Option<&[f64]> {
        self.grid.lane(&[sim])
    }

    /// Balances of every simulation on a given day
    pub fn column(&self, day: usize) -> Option<Vec<f64>> {
        (day <= self.days()).then(|| {
            (0..self.sims())
                .filter_map(|sim| self.grid.get(&[sim, day]).copied())
                .collect()
        })
    }

    #[must_use]
    pub fn at(&self, sim: usize, day: usize) -> Option<f64> {
        self.grid.get(&[sim, day]).copied()
    }

    pub fn final_balances(&self) -> Vec<f64> {
        self.column(self.days()).unwrap_or_default()
    }

    /// Confidence band per day across simulations
    pub fn percentile_bands(&self, confidence: f64) -> Result<PercentileBands> {
        stats::calculate_percentiles_along(&self.grid, confidence, Axis::Sims)
    }

    pub fn grid(&self) -> &Grid<f64> {
        &self.grid
    }

    pub fn into_grid(self) -> Grid<f64> {
        self.grid
    }
}

/// Simulated daily log returns, shape `(days, assets, sims)`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CorrelatedReturns {
    codes: Vec<AssetCode>,
    #[serde(deserialize_with = "cube_grid")]
    grid: Grid<f64>,
}

impl CorrelatedReturns {
    pub(crate) fn from_grid(codes: Vec<AssetCode>, grid: Grid<f64>) -> Self {
        debug_assert_eq!(grid.ndim(), 3);
        Self { codes, grid }
    }

    #[must_use]
    pub fn days(&self) -> usize {
        self.grid.shape()[0]
    }

    #[must_use]
    pub fn assets(&self) -> usize {
        self.grid.shape()[1]
    }

    #[must_use]
    pub fn sims(&self) -> usize {
        self.grid.shape()[2]
    }

    pub fn codes(&self) -> &[AssetCode] {
        &self.codes
    }

    /// Draws for one asset on one day, one per simulation
    pub fn draws(&self, day: usize, asset: usize) -> Option<&[f64]> {
        self.grid.lane(&[day, asset])
    }

    #[must_use]
    pub fn at(&self, day: usize, asset: usize, sim: usize) -> Option<f64> {
        self.grid.get(&[day, asset, sim]).copied()
    }

    /// Every simulated return of one asset, flattened over days and sims
    pub fn asset_returns(&self, asset: usize) -> Vec<f64> {
        (0..self.days())
            .filter_map(|day| self.draws(day, asset))
            .flatten()
            .copied()
            .collect()
    }

    pub fn grid(&self) -> &Grid<f64> {
        &self.grid
    }
}

/// Correlated uniforms from the copula, shape `(sims, assets)`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CorrelatedUniforms {
    #[serde(deserialize_with = "matrix_grid")]
    grid: Grid<f64>,
}

impl CorrelatedUniforms {
    pub(crate) fn from_grid(grid: Grid<f64>) -> Self {
        debug_assert_eq!(grid.ndim(), 2);
        Self { grid }
    }

    #[must_use]
    pub fn sims(&self) -> usize {
        self.grid.shape()[0]
    }

    #[must_use]
    pub fn assets(&self) -> usize {
        self.grid.shape()[1]
    }

    /// One joint draw across all assets
    pub fn row(&self, sim: usize) -> Option<&[f64]> {
        self.grid.lane(&[sim])
    }

    /// All draws for one asset
    pub fn column(&self, asset: usize) -> Vec<f64> {
        (0..self.sims())
            .filter_map(|sim| self.grid.get(&[sim, asset]).copied())
            .collect()
    }

    pub fn grid(&self) -> &Grid<f64> {
        &self.grid
    }
}

/// Transform applied to returns before the non-directional autocorrelation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum AutocorrelationMeasure {
    /// `|r|`, volatility clustering in the size of moves
    #[default]
    Absolute,
    /// `r²`, volatility clustering in variance
    Squared,
}

impl AutocorrelationMeasure {
    #[must_use]
    pub fn apply(self, value: f64) -> f64 {
        match self {
            AutocorrelationMeasure::Absolute => value.abs(),
            AutocorrelationMeasure::Squared => value * value,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AutocorrelationRow {
    pub lag: usize,
    /// Correlation of signed returns with their lagged values
    pub directional: f64,
    /// Correlation of transformed (absolute or squared) returns
    pub non_directional: f64,
}

/// Autocorrelation per lag, `0..=max_lag`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AutocorrelationTable {
    pub measure: AutocorrelationMeasure,
    pub rows: Vec<AutocorrelationRow>,
}

impl AutocorrelationTable {
    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    #[must_use]
    pub fn get(&self, lag: usize) -> Option<&AutocorrelationRow> {
        self.rows.get(lag)
    }
}

/// One sampled portfolio weighting and its annualized risk/return
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrontierPoint {
    /// Non-negative, sums to 1, in holdings order
    pub weights: Vec<f64>,
    pub mean: f64,
    pub volatility: f64,
}

/// Cloud of random weightings approximating the feasible risk/return region
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptimizationScatter {
    pub codes: Vec<AssetCode>,
    pub points: Vec<FrontierPoint>,
}

impl OptimizationScatter {
    #[must_use]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn means(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.mean).collect()
    }

    pub fn volatilities(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.volatility).collect()
    }

    pub fn sharpe_ratios(&self, risk_free_rate: f64) -> Vec<f64> {
        self.points
            .iter()
            .map(|p| stats::calculate_sharpe_ratio(p.mean, p.volatility, risk_free_rate))
            .collect()
    }

    /// Point with the highest Sharpe ratio. Points with an undefined ratio
    /// are skipped.
    #[must_use]
    pub fn max_sharpe(&self, risk_free_rate: f64) -> Option<&FrontierPoint> {
        self.points
            .iter()
            .zip(self.sharpe_ratios(risk_free_rate))
            .filter(|(_, s)| !s.is_nan())
            .max_by(|(_, a), (_, b)| a.total_cmp(b))
            .map(|(p, _)| p)
    }

    #[must_use]
    pub fn min_volatility(&self) -> Option<&FrontierPoint> {
        self.points
            .iter()
            .filter(|p| p.volatility.is_finite())
            .min_by(|a, b| a.volatility.total_cmp(&b.volatility))
    }
}

/// Row of the holdings summary table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HoldingRow {
    pub code: AssetCode,
    pub name: Option<String>,
    pub price: f64,
    pub units: f64,
    /// `price * units`, rounded to cents
    pub value: f64,
}
