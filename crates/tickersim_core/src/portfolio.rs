//! Multi-asset portfolio: correlated simulation and weight search
//!
//! Build sequence: one [`AssetModel`] per holding, log returns inner-joined
//! on common dates, then a Pearson correlation matrix. Portfolios with a
//! single asset have no correlation matrix and reject correlation-dependent
//! operations with [`Error::InsufficientAssets`].

use rand::Rng;
use rand_distr::Exp1;
use tracing::{debug, info};

use crate::asset::AssetModel;
use crate::config::AnalysisConfig;
use crate::copula::CopulaSampler;
use crate::error::{Error, Result};
use crate::model::{
    AlignedReturns, AssetCode, BalancePaths, CorrelatedReturns, CorrelationMatrix,
    CovarianceMatrix, FrontierPoint, Grid, HoldingRow, Holdings, OptimizationScatter, PriceSeries,
    align_returns,
};
use crate::simulation::{check_sizes, run_batches, try_run_batches};
use crate::source::PriceSource;

#[derive(Debug, Clone)]
pub struct PortfolioModel {
    holdings: Holdings,
    assets: Vec<AssetModel>,
    aligned: AlignedReturns,
    correlation: Option<CorrelationMatrix>,
    batch_size: usize,
}

impl PortfolioModel {
    /// Assemble from asset models given in holdings order
    pub fn new(
        holdings: Holdings,
        assets: Vec<AssetModel>,
        config: &AnalysisConfig,
    ) -> Result<Self> {
        config.validate()?;
        if holdings.is_empty() {
            return Err(Error::InvalidHoldings(
                "portfolio needs at least one holding".into(),
            ));
        }
        let in_order = holdings.len() == assets.len()
            && holdings.codes().zip(&assets).all(|(code, asset)| code == asset.code());
        if !in_order {
            return Err(Error::InvalidHoldings(
                "asset models must match the holdings one-to-one and in order".into(),
            ));
        }

        let series: Vec<_> = assets.iter().map(AssetModel::log_returns).collect();
        let aligned = align_returns(&series);

        let correlation = if assets.len() >= 2 {
            if aligned.len() < config.min_overlap {
                return Err(Error::InsufficientOverlap {
                    common: aligned.len(),
                    required: config.min_overlap,
                });
            }
            let labels = holdings.codes().cloned().collect();
            Some(CorrelationMatrix::from_returns(labels, &aligned)?)
        } else {
            None
        };

        info!(
            assets = assets.len(),
            common_dates = aligned.len(),
            "built portfolio model"
        );

        Ok(Self {
            holdings,
            assets,
            aligned,
            correlation,
            batch_size: config.batch_size,
        })
    }

    /// Build asset models from price series given in holdings order
    pub fn from_prices(
        holdings: Holdings,
        prices: Vec<PriceSeries>,
        config: &AnalysisConfig,
    ) -> Result<Self> {
        if prices.len() != holdings.len() {
            return Err(Error::InvalidHoldings(format!(
                "{} price series for {} holdings",
                prices.len(),
                holdings.len()
            )));
        }
        let assets = holdings
            .codes()
            .cloned()
            .zip(prices)
            .map(|(code, series)| AssetModel::new(code, series, config))
            .collect::<Result<Vec<_>>>()?;
        Self::new(holdings, assets, config)
    }

    /// Fetch and fit every holding from `source`
    pub fn load(
        holdings: Holdings,
        config: &AnalysisConfig,
        source: &dyn PriceSource,
    ) -> Result<Self> {
        let assets = holdings
            .codes()
            .map(|code| AssetModel::load(code.clone(), config, source))
            .collect::<Result<Vec<_>>>()?;
        Self::new(holdings, assets, config)
    }

    pub fn holdings(&self) -> &Holdings {
        &self.holdings
    }

    pub fn codes(&self) -> impl Iterator<Item = &AssetCode> {
        self.holdings.codes()
    }

    #[must_use]
    pub fn units(&self, code: &AssetCode) -> Option<f64> {
        self.holdings.units(code)
    }

    pub fn assets(&self) -> &[AssetModel] {
        &self.assets
    }

    #[must_use]
    pub fn asset(&self, code: &AssetCode) -> Option<&AssetModel> {
        self.assets.iter().find(|a| a.code() == code)
    }

    /// Log returns restricted to dates every asset traded on
    pub fn aligned_returns(&self) -> &AlignedReturns {
        &self.aligned
    }

    pub fn correlation_matrix(&self) -> Result<&CorrelationMatrix> {
        self.correlation.as_ref().ok_or(Error::InsufficientAssets {
            found: self.assets.len(),
        })
    }

    /// Per-asset `price * units`, in holdings order
    fn asset_balances(&self) -> Result<Vec<f64>> {
        self.assets
            .iter()
            .zip(self.holdings.iter())
            .map(|(asset, (_, units))| Ok(asset.current_price()? * units))
            .collect()
    }

    /// Current market value of all holdings
    pub fn starting_balance(&self) -> Result<f64> {
        Ok(self.asset_balances()?.iter().sum())
    }

    /// Summary per holding with value rounded to cents
    pub fn holdings_table(&self) -> Result<Vec<HoldingRow>> {
        self.assets
            .iter()
            .zip(self.holdings.iter())
            .map(|(asset, (code, units))| {
                let price = asset.current_price()?;
                Ok(HoldingRow {
                    code: code.clone(),
                    name: asset.display_name().map(str::to_string),
                    price,
                    units,
                    value: (price * units * 100.0).round() / 100.0,
                })
            })
            .collect()
    }

    pub fn annualized_returns(&self) -> Vec<f64> {
        self.assets.iter().map(AssetModel::annualized_return).collect()
    }

    pub fn annualized_volatilities(&self) -> Vec<f64> {
        self.assets
            .iter()
            .map(AssetModel::annualized_volatility)
            .collect()
    }

    /// Annualized covariance, correlation scaled by each asset's volatility
    pub fn covariance_matrix(&self) -> Result<CovarianceMatrix> {
        CovarianceMatrix::from_correlation(
            self.correlation_matrix()?,
            &self.annualized_volatilities(),
        )
    }

    /// Daily log returns with Gaussian-copula dependence, shape
    /// `(days, assets, sims)`.
    ///
    /// Each day draws fresh correlated uniforms and maps every asset's column
    /// through that asset's own quantile function. Days are independent.
    pub fn simulate_correlated_returns(
        &self,
        days: usize,
        sims: usize,
        seed: u64,
    ) -> Result<CorrelatedReturns> {
        check_sizes(Some(days), sims)?;
        let sampler = CopulaSampler::new(self.correlation_matrix()?)?;
        let n = self.assets.len();
        debug!(days, sims, assets = n, "simulating correlated returns");

        // One batch per day
        let per_day = try_run_batches(days, 1, seed, |_, rng| {
            let uniforms = sampler.sample_correlated_uniforms(sims, rng);
            let mut block = vec![0.0; n * sims];
            for (j, (asset, out)) in self.assets.iter().zip(block.chunks_mut(sims)).enumerate() {
                asset.distribution().ppf_into(&uniforms.column(j), out)?;
            }
            Ok(block)
        })?;

        let data: Vec<f64> = per_day.into_iter().flatten().collect();
        let grid = Grid::from_data(vec![days, n, sims], data)
            .ok_or_else(|| Error::invalid_parameter("sims", "simulation produced a ragged grid"))?;
        Ok(CorrelatedReturns::from_grid(
            self.holdings.codes().cloned().collect(),
            grid,
        ))
    }

    /// Total portfolio balance paths, shape `(sims, days + 1)`.
    ///
    /// Column 0 is the current starting balance; later columns sum
    /// `price * units * exp(cumulative log return)` across assets.
    pub fn simulate_portfolio(&self, days: usize, sims: usize, seed: u64) -> Result<BalancePaths> {
        let returns = self.simulate_correlated_returns(days, sims, seed)?;
        let starts = self.asset_balances()?;
        let total: f64 = starts.iter().sum();
        let n = starts.len();
        let width = days + 1;

        let draws = returns.grid().data();
        let mut balances = vec![0.0; sims * width];
        for sim in 0..sims {
            let row = &mut balances[sim * width..(sim + 1) * width];
            row[0] = total;
            for (j, start) in starts.iter().enumerate() {
                let mut cumulative = 0.0;
                for day in 0..days {
                    cumulative += draws[(day * n + j) * sims + sim];
                    row[day + 1] += start * f64::exp(cumulative);
                }
            }
        }

        Grid::from_data(vec![sims, width], balances)
            .map(BalancePaths::from_grid)
            .ok_or_else(|| Error::invalid_parameter("sims", "simulation produced a ragged grid"))
    }

    /// Random Dirichlet(1, ..., 1) weightings with their annualized return
    /// and volatility.
    pub fn simulate_portfolio_optimization(
        &self,
        sims: usize,
        seed: u64,
    ) -> Result<OptimizationScatter> {
        check_sizes(None, sims)?;
        let covariance = self.covariance_matrix()?;
        let returns = self.annualized_returns();
        let n = returns.len();
        debug!(sims, assets = n, "sampling portfolio weights");

        let batches = run_batches(sims, self.batch_size, seed, |range, rng| {
            range
                .map(|_| {
                    let weights = dirichlet_weights(n, rng);
                    let mean = weights.iter().zip(&returns).map(|(w, r)| w * r).sum();
                    let volatility = covariance.portfolio_variance(&weights).max(0.0).sqrt();
                    FrontierPoint {
                        weights,
                        mean,
                        volatility,
                    }
                })
                .collect::<Vec<_>>()
        });

        Ok(OptimizationScatter {
            codes: self.holdings.codes().cloned().collect(),
            points: batches.into_iter().flatten().collect(),
        })
    }
}

/// Uniform draw from the `n`-simplex via normalized Exp(1) variates
fn dirichlet_weights<R: Rng + ?Sized>(n: usize, rng: &mut R) -> Vec<f64> {
    let mut weights: Vec<f64> = (0..n).map(|_| rng.sample(Exp1)).collect();
    let total: f64 = weights.iter().sum();
    if total > 0.0 && total.is_finite() {
        for w in &mut weights {
            *w /= total;
        }
    } else {
        weights.fill(1.0 / n as f64);
    }
    weights
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::SmallRng;

    #[test]
    fn test_dirichlet_weights_on_simplex() {
        let mut rng = SmallRng::seed_from_u64(3);
        for _ in 0..1_000 {
            let w = dirichlet_weights(4, &mut rng);
            assert!(w.iter().all(|&x| x >= 0.0));
            assert!((w.iter().sum::<f64>() - 1.0).abs() < 1e-12);
        }
    }

    #[test]
    fn test_dirichlet_marginal_mean() {
        let mut rng = SmallRng::seed_from_u64(4);
        let n = 20_000;
        let first: f64 = (0..n).map(|_| dirichlet_weights(3, &mut rng)[0]).sum::<f64>() / n as f64;
        assert!((first - 1.0 / 3.0).abs() < 0.01);
    }
}
