//! Integration tests for the asset and portfolio engine
//!
//! Tests are organized by topic:
//! - `fixtures` - Seeded synthetic price histories shared by the suites
//! - `returns` - Log returns and date alignment
//! - `fitting` - Distribution fits on price-derived returns
//! - `copula` - Gaussian copula dependence and PSD repair
//! - `portfolio` - Portfolio construction and simulations
//! - `stats` - Percentile bands and Sharpe ratios
//! - `builder_dsl` - Builder DSL for fluent portfolio setup

mod fixtures;
mod portfolio;
mod returns;
