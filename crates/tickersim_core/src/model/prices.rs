//! Daily closing price history of a single asset

use jiff::civil::Date;
use serde::{Deserialize, Serialize};

use crate::date_math::fast_days_between;
use crate::error::{Error, Result};

/// One trading day as delivered by a price source.
///
/// Only `date` and `close` are used by the engine.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PriceBar {
    pub date: Date,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

impl PriceBar {
    /// Bar where every price field equals `close`. Handy for synthetic series.
    #[must_use]
    pub fn flat(date: Date, close: f64) -> Self {
        Self {
            date,
            open: close,
            high: close,
            low: close,
            close,
            volume: 0.0,
        }
    }
}

/// A dated close. `None` marks a missing or unusable close.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PricePoint {
    pub date: Date,
    pub close: Option<f64>,
}

/// Ordered closing prices with strictly increasing dates
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PriceSeries {
    points: Vec<PricePoint>,
}

fn usable_close(close: f64) -> Option<f64> {
    (close.is_finite() && close > 0.0).then_some(close)
}

impl PriceSeries {
    /// Build from `(date, close)` pairs.
    ///
    /// Non-finite or non-positive closes are kept as missing entries.
    /// Fails if dates are not strictly increasing.
    pub fn new(points: impl IntoIterator<Item = (Date, f64)>) -> Result<Self> {
        let points: Vec<PricePoint> = points
            .into_iter()
            .map(|(date, close)| PricePoint {
                date,
                close: usable_close(close),
            })
            .collect();

        for pair in points.windows(2) {
            if pair[1].date <= pair[0].date {
                return Err(Error::InvalidPriceSeries(format!(
                    "dates must be strictly increasing ({} then {})",
                    pair[0].date, pair[1].date
                )));
            }
        }

        Ok(Self { points })
    }

    pub fn from_bars(bars: &[PriceBar]) -> Result<Self> {
        Self::new(bars.iter().map(|bar| (bar.date, bar.close)))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn points(&self) -> &[PricePoint] {
        &self.points
    }

    /// Number of points with a usable close
    #[must_use]
    pub fn valid_count(&self) -> usize {
        self.points.iter().filter(|p| p.close.is_some()).count()
    }

    /// Most recent usable close and its date
    #[must_use]
    pub fn last_valid(&self) -> Option<(Date, f64)> {
        self.points
            .iter()
            .rev()
            .find_map(|p| p.close.map(|c| (p.date, c)))
    }

    #[must_use]
    pub fn first_date(&self) -> Option<Date> {
        self.points.first().map(|p| p.date)
    }

    #[must_use]
    pub fn last_date(&self) -> Option<Date> {
        self.points.last().map(|p| p.date)
    }

    /// Calendar days between the first and last point
    #[must_use]
    pub fn span_days(&self) -> i32 {
        match (self.first_date(), self.last_date()) {
            (Some(first), Some(last)) => fast_days_between(first, last),
            _ => 0,
        }
    }

    /// Usable closes on or after `start`, for plotting historic context
    pub fn closes_since(&self, start: Date) -> impl Iterator<Item = (Date, f64)> + '_ {
        self.points
            .iter()
            .filter(move |p| p.date >= start)
            .filter_map(|p| p.close.map(|c| (p.date, c)))
    }
}
