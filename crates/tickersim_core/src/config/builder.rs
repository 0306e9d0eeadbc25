//! Portfolio Builder
//!
//! Fluent setup for a [`PortfolioModel`]: holdings are collected as plain
//! `(code, units)` pairs and validated together when the portfolio is built,
//! so a chain of calls reports the first bad holding rather than panicking.
//!
//! # Example
//!
//! ```ignore
//! use tickersim_core::config::PortfolioBuilder;
//! use tickersim_core::model::{AutocorrelationMeasure, Market};
//!
//! let portfolio = PortfolioBuilder::new()
//!     .holding("CBA", 120.0)
//!     .holding("WDS", 300.0)
//!     .holding("TLS", 2_500.0)
//!     .years(3)
//!     .market(Market::Asx)
//!     .autocorrelation(AutocorrelationMeasure::Squared)
//!     .build(&source)?;
//!
//! let paths = portfolio.simulate_portfolio(252, 10_000, 7)?;
//! ```

use jiff::civil::Date;

use super::{AnalysisConfig, FitConfig};
use crate::error::Result;
use crate::model::{AutocorrelationMeasure, Holdings, Market, PriceSeries};
use crate::portfolio::PortfolioModel;
use crate::source::PriceSource;

/// Builder for [`PortfolioModel`]s with deferred validation
#[derive(Debug, Clone, Default)]
pub struct PortfolioBuilder {
    config: AnalysisConfig,
    pending_holdings: Vec<(String, f64)>,
}

impl PortfolioBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    // =========================================================================
    // Holdings
    // =========================================================================

    /// Add `units` of `code`. Codes are normalized at build time.
    #[must_use]
    pub fn holding(mut self, code: impl Into<String>, units: f64) -> Self {
        self.pending_holdings.push((code.into(), units));
        self
    }

    #[must_use]
    pub fn holdings<C: Into<String>>(
        mut self,
        entries: impl IntoIterator<Item = (C, f64)>,
    ) -> Self {
        self.pending_holdings
            .extend(entries.into_iter().map(|(code, units)| (code.into(), units)));
        self
    }

    // =========================================================================
    // Analysis settings
    // =========================================================================

    /// Replace every analysis setting at once
    #[must_use]
    pub fn config(mut self, config: AnalysisConfig) -> Self {
        self.config = config;
        self
    }

    #[must_use]
    pub fn years(mut self, years: u32) -> Self {
        self.config.lookback_years = years;
        self
    }

    #[must_use]
    pub fn market(mut self, market: Market) -> Self {
        self.config.market = market;
        self
    }

    /// Pin the end of the lookback window instead of using today
    #[must_use]
    pub fn as_of(mut self, date: Date) -> Self {
        self.config.as_of = Some(date);
        self
    }

    #[must_use]
    pub fn min_overlap(mut self, days: usize) -> Self {
        self.config.min_overlap = days;
        self
    }

    #[must_use]
    pub fn batch_size(mut self, size: usize) -> Self {
        self.config.batch_size = size;
        self
    }

    #[must_use]
    pub fn autocorrelation(mut self, measure: AutocorrelationMeasure) -> Self {
        self.config.autocorrelation = measure;
        self
    }

    #[must_use]
    pub fn fit(mut self, fit: FitConfig) -> Self {
        self.config.fit = fit;
        self
    }

    // =========================================================================
    // Build
    // =========================================================================

    /// Validated holdings and configuration without fetching anything
    pub fn build_parts(&self) -> Result<(Holdings, AnalysisConfig)> {
        self.config.validate()?;
        let pending = self.pending_holdings.iter().map(|(c, u)| (c.as_str(), *u));
        let holdings = Holdings::new(pending)?;
        Ok((holdings, self.config.clone()))
    }

    /// Fetch every holding's history from `source` and fit the portfolio
    pub fn build(self, source: &dyn PriceSource) -> Result<PortfolioModel> {
        let (holdings, config) = self.build_parts()?;
        PortfolioModel::load(holdings, &config, source)
    }

    /// Fit the portfolio from price series supplied in holding order
    pub fn build_with_prices(self, prices: Vec<PriceSeries>) -> Result<PortfolioModel> {
        let (holdings, config) = self.build_parts()?;
        PortfolioModel::from_prices(holdings, prices, &config)
    }
}
