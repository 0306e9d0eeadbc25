//! Single-asset model: price history, log returns and a fitted Student-t
//!
//! Everything is derived eagerly at construction; the model is immutable
//! afterwards. Rebuild it to change the lookback window or market.

use jiff::civil::Date;
use rand::distr::Distribution;
use tracing::{debug, info};

use crate::config::{AnalysisConfig, FitConfig};
use crate::date_math;
use crate::distribution::{FittedDistribution, fit_normal, fit_student_t};
use crate::error::{Error, Result, SourceError};
use crate::model::{
    AssetCode, AutocorrelationMeasure, AutocorrelationRow, AutocorrelationTable, BalancePaths,
    Grid, LogReturnSeries, PriceSeries,
};
use crate::simulation::{check_sizes, run_batches};
use crate::source::PriceSource;
use crate::stats::pearson_correlation;

/// Trading days per year used to annualize daily statistics
pub const TRADING_DAYS_PER_YEAR: f64 = 252.0;

#[derive(Debug, Clone)]
pub struct AssetModel {
    code: AssetCode,
    symbol: String,
    display_name: Option<String>,
    start_date: Date,
    prices: PriceSeries,
    log_returns: LogReturnSeries,
    distribution: FittedDistribution,
    autocorrelation: AutocorrelationMeasure,
    fit: FitConfig,
    batch_size: usize,
}

impl AssetModel {
    /// Build from an already-fetched price series
    pub fn new(code: AssetCode, prices: PriceSeries, config: &AnalysisConfig) -> Result<Self> {
        config.validate()?;

        if prices.valid_count() == 0 {
            return Err(Error::NoData(code));
        }

        let log_returns = LogReturnSeries::from_prices(&prices)?;
        let distribution = fit_student_t(log_returns.values(), &config.fit)?;

        info!(
            code = %code,
            prices = prices.len(),
            returns = log_returns.len(),
            "built asset model"
        );

        Ok(Self {
            symbol: config.market.resolve(&code),
            code,
            display_name: None,
            start_date: config.lookback_start(),
            prices,
            log_returns,
            distribution,
            autocorrelation: config.autocorrelation,
            fit: config.fit,
            batch_size: config.batch_size,
        })
    }

    /// Fetch the lookback window from `source` and build the model
    pub fn load(
        code: AssetCode,
        config: &AnalysisConfig,
        source: &dyn PriceSource,
    ) -> Result<Self> {
        let symbol = config.market.resolve(&code);
        let data_source_error = |source: SourceError| Error::DataSource {
            symbol: symbol.clone(),
            source,
        };

        let bars = source
            .fetch_price_history(&symbol, config.lookback_start(), config.as_of_date())
            .map_err(data_source_error)?;
        let name = source
            .fetch_display_name(&symbol)
            .map_err(data_source_error)?;
        debug!(symbol = %symbol, bars = bars.len(), "fetched price history");

        let prices = PriceSeries::from_bars(&bars)?;
        let mut model = Self::new(code, prices, config)?;
        model.display_name = name;
        Ok(model)
    }

    #[must_use]
    pub fn with_display_name(mut self, name: impl Into<String>) -> Self {
        self.display_name = Some(name.into());
        self
    }

    pub fn code(&self) -> &AssetCode {
        &self.code
    }

    /// Symbol as resolved for the configured market (e.g. `CBA.AX`)
    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn display_name(&self) -> Option<&str> {
        self.display_name.as_deref()
    }

    /// First day of the lookback window
    #[must_use]
    pub fn start_date(&self) -> Date {
        self.start_date
    }

    pub fn prices(&self) -> &PriceSeries {
        &self.prices
    }

    pub fn log_returns(&self) -> &LogReturnSeries {
        &self.log_returns
    }

    /// Student-t fitted to the log returns
    pub fn distribution(&self) -> &FittedDistribution {
        &self.distribution
    }

    /// Normal fit of the same returns, for comparison against the Student-t
    pub fn normal_fit(&self) -> Result<FittedDistribution> {
        fit_normal(self.log_returns.values(), &self.fit)
    }

    /// Most recent valid close
    pub fn current_price(&self) -> Result<f64> {
        self.prices
            .last_valid()
            .map(|(_, close)| close)
            .ok_or_else(|| Error::NoData(self.code.clone()))
    }

    /// `exp(252 * mean daily log return) - 1`
    #[must_use]
    pub fn annualized_return(&self) -> f64 {
        (TRADING_DAYS_PER_YEAR * self.log_returns.mean()).exp() - 1.0
    }

    /// Daily log-return standard deviation scaled by `sqrt(252)`
    #[must_use]
    pub fn annualized_volatility(&self) -> f64 {
        self.log_returns.std_dev() * TRADING_DAYS_PER_YEAR.sqrt()
    }

    /// Calendar dates matching the columns of a `days`-day simulation,
    /// starting at the date of the most recent close
    pub fn forecast_dates(&self, days: usize) -> Vec<Date> {
        self.prices
            .last_valid()
            .map(|(last, _)| date_math::date_range(last, days + 1))
            .unwrap_or_default()
    }

    /// Balance paths from i.i.d. daily draws of the fitted distribution.
    ///
    /// Shape `(sims, days + 1)`; column 0 equals `starting_balance` exactly.
    pub fn simulate_independent_returns(
        &self,
        days: usize,
        starting_balance: f64,
        sims: usize,
        seed: u64,
    ) -> Result<BalancePaths> {
        check_sizes(Some(days), sims)?;
        if !starting_balance.is_finite() {
            return Err(Error::invalid_parameter(
                "starting_balance",
                format!("must be finite, got {starting_balance}"),
            ));
        }

        let sampler = self.distribution.sampler()?;
        let width = days + 1;
        debug!(code = %self.code, days, sims, "simulating independent returns");

        let batches = run_batches(sims, self.batch_size, seed, |range, rng| {
            let mut rows = Vec::with_capacity(range.len() * width);
            for _ in range {
                rows.push(starting_balance);
                let mut cumulative = 0.0;
                for _ in 0..days {
                    cumulative += sampler.sample(rng);
                    rows.push(starting_balance * cumulative.exp());
                }
            }
            rows
        });

        let data: Vec<f64> = batches.into_iter().flatten().collect();
        Grid::from_data(vec![sims, width], data)
            .map(BalancePaths::from_grid)
            .ok_or_else(|| Error::invalid_parameter("sims", "simulation produced a ragged grid"))
    }

    /// Directional and non-directional autocorrelation for lags `0..=max_lag`.
    ///
    /// Lags with fewer than two overlapping returns yield NaN.
    pub fn calculate_autocorrelation(&self, max_lag: usize) -> AutocorrelationTable {
        let signed = self.log_returns.values();
        let transformed: Vec<f64> = signed
            .iter()
            .map(|&r| self.autocorrelation.apply(r))
            .collect();
        let n = signed.len();

        let lagged = |series: &[f64], lag: usize| {
            if lag >= n {
                return f64::NAN;
            }
            pearson_correlation(&series[lag..], &series[..n - lag])
        };

        let rows = (0..=max_lag)
            .map(|lag| AutocorrelationRow {
                lag,
                directional: if lag == 0 { 1.0 } else { lagged(signed, lag) },
                non_directional: lagged(&transformed, lag),
            })
            .collect();

        AutocorrelationTable {
            measure: self.autocorrelation,
            rows,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::InMemorySource;
    use jiff::civil::date;
    use rand::rngs::SmallRng;
    use rand::{Rng, SeedableRng};
    use rand_distr::StandardNormal;

    fn trending_prices(n: usize) -> PriceSeries {
        let mut rng = SmallRng::seed_from_u64(11);
        let start = date(2023, 1, 2);
        let mut price = 100.0;
        PriceSeries::new((0..n).map(|i| {
            let shock: f64 = rng.sample(StandardNormal);
            price *= (0.0003 + 0.012 * shock).exp();
            (date_math::add_days(start, i as i32), price)
        }))
        .unwrap()
    }

    fn config() -> AnalysisConfig {
        AnalysisConfig {
            as_of: Some(date(2024, 1, 2)),
            ..AnalysisConfig::default()
        }
    }

    #[test]
    fn test_build_and_accessors() {
        let model = AssetModel::new(AssetCode::new("cba").unwrap(), trending_prices(120), &config())
            .unwrap();

        assert_eq!(model.symbol(), "CBA.AX");
        assert_eq!(model.log_returns().len(), 119);
        assert_eq!(model.start_date(), date(2019, 1, 3));
        assert!(model.current_price().unwrap() > 0.0);
        assert!(model.distribution().scale() > 0.0);
        assert_eq!(model.forecast_dates(5).len(), 6);
        assert_eq!(model.forecast_dates(5)[0], model.prices().last_date().unwrap());
    }

    #[test]
    fn test_all_missing_prices_is_no_data() {
        let prices =
            PriceSeries::new([(date(2024, 1, 2), f64::NAN), (date(2024, 1, 3), 0.0)]).unwrap();
        let err = AssetModel::new(AssetCode::new("XYZ").unwrap(), prices, &config()).unwrap_err();
        assert!(matches!(err, Error::NoData(_)));
    }

    #[test]
    fn test_first_column_is_exact_starting_balance() {
        let model = AssetModel::new(AssetCode::new("A").unwrap(), trending_prices(200), &config())
            .unwrap();
        let paths = model.simulate_independent_returns(30, 12_345.67, 250, 1).unwrap();

        assert_eq!(paths.sims(), 250);
        assert_eq!(paths.days(), 30);
        assert!(paths.column(0).unwrap().iter().all(|&b| b == 12_345.67));
        assert!(paths.final_balances().iter().all(|b| b.is_finite() && *b > 0.0));
    }

    #[test]
    fn test_simulation_is_seeded() {
        let model = AssetModel::new(AssetCode::new("A").unwrap(), trending_prices(200), &config())
            .unwrap();
        let a = model.simulate_independent_returns(10, 100.0, 150, 5).unwrap();
        let b = model.simulate_independent_returns(10, 100.0, 150, 5).unwrap();
        let c = model.simulate_independent_returns(10, 100.0, 150, 6).unwrap();
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert!(model.simulate_independent_returns(0, 100.0, 10, 5).is_err());
    }

    #[test]
    fn test_autocorrelation_table() {
        let model = AssetModel::new(AssetCode::new("A").unwrap(), trending_prices(200), &config())
            .unwrap();
        let table = model.calculate_autocorrelation(5);

        assert_eq!(table.len(), 6);
        assert_eq!(table.get(0).unwrap().directional, 1.0);
        assert!((table.get(0).unwrap().non_directional - 1.0).abs() < 1e-12);
        assert!(table.rows.iter().all(|r| r.directional.abs() <= 1.0 + 1e-12));

        let beyond = model.calculate_autocorrelation(model.log_returns().len() + 1);
        assert!(beyond.rows.last().unwrap().directional.is_nan());
    }

    #[test]
    fn test_load_from_source() {
        let prices = trending_prices(60);
        let source = InMemorySource::new()
            .with_closes(
                "ABC",
                prices.points().iter().filter_map(|p| p.close.map(|c| (p.date, c))),
            )
            .with_name("ABC", "Alphabet Soup Co");
        let config = AnalysisConfig {
            market: crate::model::Market::Us,
            as_of: Some(date(2023, 12, 31)),
            lookback_years: 2,
            ..AnalysisConfig::default()
        };

        let model = AssetModel::load(AssetCode::new("abc").unwrap(), &config, &source).unwrap();
        assert_eq!(model.display_name(), Some("Alphabet Soup Co"));
        assert_eq!(model.prices().len(), 60);

        let missing = AssetModel::load(AssetCode::new("nope").unwrap(), &config, &source);
        assert!(matches!(missing, Err(Error::DataSource { .. })));
    }
}
