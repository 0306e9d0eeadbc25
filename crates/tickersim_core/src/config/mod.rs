//! Analysis configuration
//!
//! `AnalysisConfig` holds everything that shapes how price history is turned
//! into models: the lookback window, the exchange, fit tolerances and how
//! Monte Carlo work is batched. Every field has a serde default so partial
//! JSON documents deserialize.
//!
//! # Builder DSL
//!
//! ```ignore
//! use tickersim_core::config::PortfolioBuilder;
//! use tickersim_core::model::Market;
//!
//! let portfolio = PortfolioBuilder::new()
//!     .holding("CBA", 120.0)
//!     .holding("WDS", 300.0)
//!     .years(5)
//!     .market(Market::Asx)
//!     .build(&source)?;
//! ```

use jiff::civil::Date;
use serde::{Deserialize, Serialize};

use crate::date_math;
use crate::error::{Error, Result};
use crate::model::{AutocorrelationMeasure, Market};

pub mod builder;

pub use builder::PortfolioBuilder;

fn default_lookback_years() -> u32 {
    5
}

fn default_min_overlap() -> usize {
    30
}

fn default_batch_size() -> usize {
    100
}

fn default_min_samples() -> usize {
    10
}

fn default_max_iterations() -> usize {
    5000
}

fn default_tolerance() -> f64 {
    1e-10
}

/// Settings for the maximum-likelihood fits
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FitConfig {
    /// Fewer finite returns than this is rejected as too little data
    #[serde(default = "default_min_samples")]
    pub min_samples: usize,

    /// Simplex iterations before the Student-t search gives up
    #[serde(default = "default_max_iterations")]
    pub max_iterations: usize,

    /// Relative convergence tolerance on the negative log-likelihood
    #[serde(default = "default_tolerance")]
    pub tolerance: f64,
}

impl Default for FitConfig {
    fn default() -> Self {
        Self {
            min_samples: default_min_samples(),
            max_iterations: default_max_iterations(),
            tolerance: default_tolerance(),
        }
    }
}

/// Complete configuration for building asset and portfolio models
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisConfig {
    /// Years of history to fit against (a year is 365 calendar days)
    #[serde(default = "default_lookback_years")]
    pub lookback_years: u32,

    #[serde(default)]
    pub market: Market,

    /// End of the lookback window. Defaults to today.
    #[serde(default)]
    pub as_of: Option<Date>,

    /// Minimum common trading days required to estimate correlations
    #[serde(default = "default_min_overlap")]
    pub min_overlap: usize,

    /// Simulations per Monte Carlo batch
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,

    #[serde(default)]
    pub autocorrelation: AutocorrelationMeasure,

    #[serde(default)]
    pub fit: FitConfig,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            lookback_years: default_lookback_years(),
            market: Market::default(),
            as_of: None,
            min_overlap: default_min_overlap(),
            batch_size: default_batch_size(),
            autocorrelation: AutocorrelationMeasure::default(),
            fit: FitConfig::default(),
        }
    }
}

impl AnalysisConfig {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Last day of the lookback window
    #[must_use]
    pub fn as_of_date(&self) -> Date {
        self.as_of.unwrap_or_else(|| jiff::Zoned::now().date())
    }

    /// First day of the lookback window
    #[must_use]
    pub fn lookback_start(&self) -> Date {
        date_math::lookback_start(self.as_of_date(), self.lookback_years)
    }

    pub fn validate(&self) -> Result<()> {
        if self.lookback_years == 0 {
            return Err(Error::invalid_parameter(
                "lookback_years",
                "must be at least 1",
            ));
        }
        if self.batch_size == 0 {
            return Err(Error::invalid_parameter("batch_size", "must be at least 1"));
        }
        if self.fit.min_samples < 2 {
            return Err(Error::invalid_parameter(
                "fit.min_samples",
                format!("must be at least 2, got {}", self.fit.min_samples),
            ));
        }
        if !(self.fit.tolerance.is_finite() && self.fit.tolerance > 0.0) {
            return Err(Error::invalid_parameter(
                "fit.tolerance",
                format!("must be positive, got {}", self.fit.tolerance),
            ));
        }
        Ok(())
    }
}
