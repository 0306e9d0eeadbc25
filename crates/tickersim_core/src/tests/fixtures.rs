//! Seeded synthetic price histories

use jiff::civil::{Date, date};
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use rand_distr::StandardNormal;

use crate::config::AnalysisConfig;
use crate::date_math;
use crate::model::PriceSeries;

pub const FIRST_DAY: Date = date(2023, 1, 2);

/// Daily drift and volatility of the synthetic log returns
pub const DRIFT: f64 = 0.0003;
pub const VOL: f64 = 0.012;

/// Config with a pinned window that covers every fixture
pub fn config() -> AnalysisConfig {
    AnalysisConfig {
        as_of: Some(date(2024, 12, 31)),
        ..AnalysisConfig::default()
    }
}

pub fn trading_dates(n: usize) -> Vec<Date> {
    date_math::date_range(FIRST_DAY, n)
}

/// `n_assets` close histories of length `n` whose daily shocks share a common
/// factor with correlation `rho`. Asset `k` starts at `100 * (k + 1)`.
pub fn correlated_closes(n_assets: usize, n: usize, rho: f64, seed: u64) -> Vec<Vec<(Date, f64)>> {
    let mut rng = SmallRng::seed_from_u64(seed);
    let dates = trading_dates(n);
    let mut prices: Vec<f64> = (0..n_assets).map(|k| 100.0 * (k + 1) as f64).collect();
    let mut out = vec![Vec::with_capacity(n); n_assets];

    for &day in &dates {
        let common: f64 = rng.sample(StandardNormal);
        for (k, price) in prices.iter_mut().enumerate() {
            let own: f64 = rng.sample(StandardNormal);
            let shock = rho.sqrt() * common + (1.0 - rho).sqrt() * own;
            *price *= (DRIFT + VOL * shock).exp();
            out[k].push((day, *price));
        }
    }
    out
}

pub fn series(closes: &[(Date, f64)]) -> PriceSeries {
    PriceSeries::new(closes.iter().copied()).unwrap()
}

pub fn correlated_series(n_assets: usize, n: usize, rho: f64, seed: u64) -> Vec<PriceSeries> {
    correlated_closes(n_assets, n, rho, seed)
        .iter()
        .map(|c| series(c))
        .collect()
}

/// One history repeated for every asset, so returns are identical
pub fn identical_series(n_assets: usize, n: usize, seed: u64) -> Vec<PriceSeries> {
    let base = correlated_closes(1, n, 0.0, seed).remove(0);
    (0..n_assets).map(|_| series(&base)).collect()
}

pub fn sample_std(values: &[f64]) -> f64 {
    crate::stats::std_dev(values)
}
