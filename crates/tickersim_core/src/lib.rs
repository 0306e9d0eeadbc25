//! Monte Carlo simulation of listed assets and portfolios
//!
//! This crate turns daily closing prices into forward-looking simulations:
//! - Log returns with a maximum-likelihood Student-t fit (Normal for comparison)
//! - Independent single-asset balance paths
//! - Correlated multi-asset paths through a Gaussian copula, so each asset keeps
//!   its own heavy-tailed marginal
//! - Random-weight portfolio scatter for risk/return comparison
//! - Percentile bands, Sharpe ratios and autocorrelation diagnostics
//!
//! Price data comes from any [`source::PriceSource`]; nothing here talks to the
//! network.
//!
//! # Builder DSL
//!
//! ```ignore
//! use tickersim_core::config::PortfolioBuilder;
//! use tickersim_core::stats::calculate_percentiles_along;
//!
//! let portfolio = PortfolioBuilder::new()
//!     .holding("CBA", 120.0)
//!     .holding("WDS", 300.0)
//!     .years(5)
//!     .build(&source)?;
//!
//! let paths = portfolio.simulate_portfolio(252, 10_000, 42)?;
//! let bands = paths.percentile_bands(95.0)?;
//! ```

#![warn(clippy::all)]

// ============================================================================
// Core modules
// ============================================================================

pub mod asset;
pub mod copula;
pub mod date_math;
pub mod distribution;
pub mod error;
mod linalg;
pub mod optimization;
pub mod portfolio;
mod simulation;
pub mod source;
pub mod stats;

// ============================================================================
// Type definition modules
// ============================================================================

pub mod config;
pub mod model;

// ============================================================================
// Test modules
// ============================================================================

#[cfg(test)]
mod tests;

// ============================================================================
// Public re-exports for convenience
// ============================================================================

pub use asset::AssetModel;
pub use config::{AnalysisConfig, FitConfig, PortfolioBuilder};
pub use copula::CopulaSampler;
pub use distribution::{FittedDistribution, fit_normal, fit_student_t};
pub use error::{Error, Result, SourceError};
pub use portfolio::PortfolioModel;
pub use source::{InMemorySource, PriceSource};
