//! Boundary to the market-data provider
//!
//! The engine never talks to the network itself. Applications implement
//! [`PriceSource`] over their provider of choice; [`InMemorySource`] serves
//! fixtures and offline analysis.

use jiff::civil::Date;
use rustc_hash::FxHashMap;

use crate::error::SourceError;
use crate::model::PriceBar;

pub type SourceResult<T> = std::result::Result<T, SourceError>;

pub trait PriceSource: Send + Sync {
    /// Daily bars for `symbol` with `start <= date <= end`, oldest first
    fn fetch_price_history(&self, symbol: &str, start: Date, end: Date)
    -> SourceResult<Vec<PriceBar>>;

    /// Human-readable name of the listing, if the provider knows one
    fn fetch_display_name(&self, symbol: &str) -> SourceResult<Option<String>>;

    /// Annual risk-free rate as a fraction (e.g. `0.043`)
    fn fetch_risk_free_rate(&self) -> SourceResult<Option<f64>> {
        Ok(None)
    }
}

#[derive(Debug, Clone, Default)]
struct Listing {
    name: Option<String>,
    bars: Vec<PriceBar>,
}

/// Price source backed by bars held in memory, keyed by provider symbol
#[derive(Debug, Clone, Default)]
pub struct InMemorySource {
    listings: FxHashMap<String, Listing>,
    risk_free_rate: Option<f64>,
}

impl InMemorySource {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register bars for a symbol. Bars are sorted by date.
    #[must_use]
    pub fn with_bars(mut self, symbol: impl Into<String>, mut bars: Vec<PriceBar>) -> Self {
        bars.sort_by_key(|bar| bar.date);
        self.listings.entry(symbol.into()).or_default().bars = bars;
        self
    }

    /// Register `(date, close)` pairs as flat bars
    #[must_use]
    pub fn with_closes(
        self,
        symbol: impl Into<String>,
        closes: impl IntoIterator<Item = (Date, f64)>,
    ) -> Self {
        let bars = closes
            .into_iter()
            .map(|(date, close)| PriceBar::flat(date, close))
            .collect();
        self.with_bars(symbol, bars)
    }

    #[must_use]
    pub fn with_name(mut self, symbol: impl Into<String>, name: impl Into<String>) -> Self {
        self.listings.entry(symbol.into()).or_default().name = Some(name.into());
        self
    }

    #[must_use]
    pub fn with_risk_free_rate(mut self, rate: f64) -> Self {
        self.risk_free_rate = Some(rate);
        self
    }
}

impl PriceSource for InMemorySource {
    fn fetch_price_history(
        &self,
        symbol: &str,
        start: Date,
        end: Date,
    ) -> SourceResult<Vec<PriceBar>> {
        let listing = self
            .listings
            .get(symbol)
            .ok_or_else(|| SourceError::new(format!("unknown symbol {symbol}")))?;

        Ok(listing
            .bars
            .iter()
            .filter(|bar| bar.date >= start && bar.date <= end)
            .copied()
            .collect())
    }

    fn fetch_display_name(&self, symbol: &str) -> SourceResult<Option<String>> {
        Ok(self.listings.get(symbol).and_then(|l| l.name.clone()))
    }

    fn fetch_risk_free_rate(&self) -> SourceResult<Option<f64>> {
        Ok(self.risk_free_rate)
    }
}
