//! Daily log returns derived from a price series
//!
//! `r[t] = ln(p[t] / p[t-1])` for consecutive points. A transition that
//! touches a missing close is dropped, never zero-filled or interpolated.

use jiff::civil::Date;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use super::prices::PriceSeries;
use crate::error::{Error, Result};
use crate::stats;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LogReturnSeries {
    dates: Vec<Date>,
    values: Vec<f64>,
}

impl LogReturnSeries {
    pub fn from_prices(prices: &PriceSeries) -> Result<Self> {
        let valid = prices.valid_count();
        if valid < 2 {
            return Err(Error::InsufficientData(format!(
                "need at least 2 valid prices, found {valid}"
            )));
        }

        let mut dates = Vec::with_capacity(prices.len() - 1);
        let mut values = Vec::with_capacity(prices.len() - 1);
        for pair in prices.points().windows(2) {
            if let (Some(prev), Some(curr)) = (pair[0].close, pair[1].close) {
                dates.push(pair[1].date);
                values.push((curr / prev).ln());
            }
        }

        if values.is_empty() {
            return Err(Error::InsufficientData(
                "no consecutive valid prices to derive a return from".into(),
            ));
        }

        Ok(Self { dates, values })
    }

    /// Build directly from dated returns. Dates must be strictly increasing.
    pub fn from_pairs(pairs: impl IntoIterator<Item = (Date, f64)>) -> Result<Self> {
        let (dates, values): (Vec<Date>, Vec<f64>) = pairs
            .into_iter()
            .filter(|(_, r)| r.is_finite())
            .unzip();
        if dates.windows(2).any(|w| w[1] <= w[0]) {
            return Err(Error::InvalidPriceSeries(
                "return dates must be strictly increasing".into(),
            ));
        }
        Ok(Self { dates, values })
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn dates(&self) -> &[Date] {
        &self.dates
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn iter(&self) -> impl Iterator<Item = (Date, f64)> + '_ {
        self.dates.iter().copied().zip(self.values.iter().copied())
    }

    #[must_use]
    pub fn mean(&self) -> f64 {
        stats::mean(&self.values)
    }

    /// Sample standard deviation (n - 1 denominator)
    #[must_use]
    pub fn std_dev(&self) -> f64 {
        stats::std_dev(&self.values)
    }
}

/// Log returns of several assets restricted to the dates they all share
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlignedReturns {
    pub dates: Vec<Date>,
    /// One column per input series, in input order
    pub columns: Vec<Vec<f64>>,
}

impl AlignedReturns {
    #[must_use]
    pub fn len(&self) -> usize {
        self.dates.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }
}

/// Inner-join several return series on their dates.
///
/// A date is kept only if every series has a return for it.
#[must_use]
pub fn align_returns(series: &[&LogReturnSeries]) -> AlignedReturns {
    let Some((first, rest)) = series.split_first() else {
        return AlignedReturns {
            dates: Vec::new(),
            columns: Vec::new(),
        };
    };

    let lookups: Vec<FxHashMap<Date, f64>> = rest.iter().map(|s| s.iter().collect()).collect();

    let mut dates = Vec::with_capacity(first.len());
    let mut columns = vec![Vec::with_capacity(first.len()); series.len()];
    for (date, value) in first.iter() {
        let others: Option<Vec<f64>> = lookups.iter().map(|m| m.get(&date).copied()).collect();
        if let Some(others) = others {
            dates.push(date);
            columns[0].push(value);
            for (column, v) in columns[1..].iter_mut().zip(others) {
                column.push(v);
            }
        }
    }

    AlignedReturns { dates, columns }
}
