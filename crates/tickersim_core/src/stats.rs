//! Summary statistics over simulated outcomes
//!
//! Percentiles use linear interpolation between closest ranks, matching the
//! default of most numeric libraries. Non-finite samples are ignored.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result, SourceError};
use crate::model::Grid;
use crate::source::PriceSource;

/// Arithmetic mean, NaN for an empty slice
#[must_use]
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return f64::NAN;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Sample standard deviation (n - 1 denominator), NaN below two values
#[must_use]
pub fn std_dev(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return f64::NAN;
    }
    let m = mean(values);
    let ss: f64 = values.iter().map(|v| (v - m).powi(2)).sum();
    (ss / (values.len() - 1) as f64).sqrt()
}

/// Pearson correlation of two equally long samples.
///
/// NaN when the lengths differ, fewer than two pairs exist, or either side
/// has zero variance.
#[must_use]
pub fn pearson_correlation(x: &[f64], y: &[f64]) -> f64 {
    if x.len() != y.len() || x.len() < 2 {
        return f64::NAN;
    }
    let (mx, my) = (mean(x), mean(y));

    let mut sxy = 0.0;
    let mut sxx = 0.0;
    let mut syy = 0.0;
    for (a, b) in x.iter().zip(y) {
        let (dx, dy) = (a - mx, b - my);
        sxy += dx * dy;
        sxx += dx * dx;
        syy += dy * dy;
    }

    if sxx <= 0.0 || syy <= 0.0 {
        return f64::NAN;
    }
    (sxy / (sxx * syy).sqrt()).clamp(-1.0, 1.0)
}

/// Value at percentile `p` (0..=100) of an ascending-sorted slice
fn percentile_sorted(sorted: &[f64], p: f64) -> f64 {
    let rank = p / 100.0 * (sorted.len() - 1) as f64;
    let lo = rank.floor() as usize;
    let hi = rank.ceil() as usize;
    let frac = rank - lo as f64;
    sorted[lo] + (sorted[hi] - sorted[lo]) * frac
}

/// Lower/median/upper values of a confidence interval
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PercentileBand {
    pub low: f64,
    pub median: f64,
    pub high: f64,
}

/// One [`PercentileBand`] per lane, stored column-wise for plotting
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PercentileBands {
    pub low: Vec<f64>,
    pub median: Vec<f64>,
    pub high: Vec<f64>,
}

impl PercentileBands {
    #[must_use]
    pub fn len(&self) -> usize {
        self.median.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.median.is_empty()
    }

    #[must_use]
    pub fn get(&self, index: usize) -> Option<PercentileBand> {
        Some(PercentileBand {
            low: *self.low.get(index)?,
            median: *self.median.get(index)?,
            high: *self.high.get(index)?,
        })
    }

    fn push(&mut self, band: PercentileBand) {
        self.low.push(band.low);
        self.median.push(band.median);
        self.high.push(band.high);
    }
}

fn check_confidence(confidence: f64) -> Result<()> {
    if !(confidence > 0.0 && confidence <= 100.0) {
        return Err(Error::invalid_parameter(
            "confidence",
            format!("must lie in (0, 100], got {confidence}"),
        ));
    }
    Ok(())
}

fn band_of(mut values: Vec<f64>, confidence: f64) -> Result<PercentileBand> {
    values.retain(|v| v.is_finite());
    if values.is_empty() {
        return Err(Error::InsufficientData(
            "no finite samples to take percentiles of".into(),
        ));
    }
    values.sort_by(f64::total_cmp);

    let tail = (100.0 - confidence) / 2.0;
    Ok(PercentileBand {
        low: percentile_sorted(&values, tail),
        median: percentile_sorted(&values, 50.0),
        high: percentile_sorted(&values, 100.0 - tail),
    })
}

/// Symmetric confidence interval around the median.
///
/// `confidence = 95` yields the 2.5th and 97.5th percentiles.
pub fn calculate_percentiles(samples: &[f64], confidence: f64) -> Result<PercentileBand> {
    check_confidence(confidence)?;
    band_of(samples.to_vec(), confidence)
}

/// Which dimension of a `(sims, columns)` grid the percentiles run across
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Axis {
    /// Across simulations: one band per column (e.g. per day)
    Sims,
    /// Across columns: one band per simulation
    Days,
}

/// Percentile bands along one axis of a 2-D grid
pub fn calculate_percentiles_along(
    grid: &Grid<f64>,
    confidence: f64,
    axis: Axis,
) -> Result<PercentileBands> {
    check_confidence(confidence)?;
    let &[rows, cols] = grid.shape() else {
        return Err(Error::invalid_parameter(
            "grid",
            format!("expected 2 dimensions, got {}", grid.ndim()),
        ));
    };

    let mut bands = PercentileBands::default();
    match axis {
        Axis::Sims => {
            let data = grid.data();
            for col in 0..cols {
                let column: Vec<f64> = (0..rows).map(|row| data[row * cols + col]).collect();
                bands.push(band_of(column, confidence)?);
            }
        }
        Axis::Days => {
            for row in 0..rows {
                let lane = grid.lane(&[row]).unwrap_or_default();
                bands.push(band_of(lane.to_vec(), confidence)?);
            }
        }
    }
    Ok(bands)
}

/// Excess return per unit of volatility.
///
/// Returns NaN when `volatility <= 0` or any input is non-finite, so a
/// degenerate portfolio never ranks as the best one.
#[must_use]
pub fn calculate_sharpe_ratio(annual_return: f64, volatility: f64, risk_free_rate: f64) -> f64 {
    if !annual_return.is_finite()
        || !volatility.is_finite()
        || !risk_free_rate.is_finite()
        || volatility <= 0.0
    {
        return f64::NAN;
    }
    (annual_return - risk_free_rate) / volatility
}

/// Element-wise [`calculate_sharpe_ratio`]
pub fn sharpe_ratios(
    returns: &[f64],
    volatilities: &[f64],
    risk_free_rate: f64,
) -> Result<Vec<f64>> {
    if returns.len() != volatilities.len() {
        return Err(Error::invalid_parameter(
            "volatilities",
            format!(
                "{} volatilities for {} returns",
                volatilities.len(),
                returns.len()
            ),
        ));
    }
    Ok(returns
        .iter()
        .zip(volatilities)
        .map(|(r, v)| calculate_sharpe_ratio(*r, *v, risk_free_rate))
        .collect())
}

/// Annual risk-free rate from the source, or `fallback` when it has none
pub fn lookup_risk_free_rate(source: &dyn PriceSource, fallback: f64) -> Result<f64> {
    match source.fetch_risk_free_rate() {
        Ok(Some(rate)) if rate.is_finite() => Ok(rate),
        Ok(Some(rate)) => Err(Error::DataSource {
            symbol: "risk-free rate".into(),
            source: SourceError::new(format!("non-finite rate {rate}")),
        }),
        Ok(None) => Ok(fallback),
        Err(source) => Err(Error::DataSource {
            symbol: "risk-free rate".into(),
            source,
        }),
    }
}
