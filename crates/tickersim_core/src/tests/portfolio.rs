//! Tests for portfolio construction and simulation
//!
//! These tests verify that:
//! - Portfolio balances start at the current value of the holdings
//! - Perfectly correlated assets give no diversification benefit
//! - Random weightings always lie on the simplex
//! - Too little overlap or too few assets fail with descriptive errors

use super::fixtures;
use crate::config::AnalysisConfig;
use crate::error::Error;
use crate::model::{AssetCode, Holdings, PriceSeries};
use crate::portfolio::PortfolioModel;
use crate::stats::calculate_sharpe_ratio;

fn three_asset_portfolio(rho: f64) -> PortfolioModel {
    let holdings = Holdings::new([("AAA", 10.0), ("BBB", 5.0), ("CCC", 2.5)]).unwrap();
    let prices = fixtures::correlated_series(3, 400, rho, 77);
    PortfolioModel::from_prices(holdings, prices, &fixtures::config()).unwrap()
}

fn code(s: &str) -> AssetCode {
    AssetCode::new(s).unwrap()
}

#[test]
fn test_build_preserves_holding_order() {
    let portfolio = three_asset_portfolio(0.5);
    let codes: Vec<&str> = portfolio.codes().map(AssetCode::as_str).collect();
    assert_eq!(codes, vec!["AAA", "BBB", "CCC"]);
    assert_eq!(portfolio.units(&code("bbb")), Some(5.0));
    assert_eq!(portfolio.aligned_returns().len(), 399);

    let corr = portfolio.correlation_matrix().unwrap();
    assert_eq!(corr.labels(), &[code("AAA"), code("BBB"), code("CCC")]);
    for (_, _, r) in corr.off_diagonal() {
        assert!((r - 0.5).abs() < 0.15, "r = {r}");
    }
}

#[test]
fn test_starting_balance_and_holdings_table() {
    let portfolio = three_asset_portfolio(0.2);
    let table = portfolio.holdings_table().unwrap();
    assert_eq!(table.len(), 3);

    let mut total = 0.0;
    for (row, asset) in table.iter().zip(portfolio.assets()) {
        let price = asset.current_price().unwrap();
        assert_eq!(row.code, *asset.code());
        assert_eq!(row.price, price);
        assert!((row.value - row.units * price).abs() <= 0.005 + 1e-9);
        total += row.units * price;
    }
    assert!((portfolio.starting_balance().unwrap() - total).abs() < 1e-9);
}

#[test]
fn test_covariance_diagonal_is_variance() {
    let portfolio = three_asset_portfolio(0.4);
    let cov = portfolio.covariance_matrix().unwrap();
    for (i, vol) in portfolio.annualized_volatilities().iter().enumerate() {
        assert!((cov.get(i, i).unwrap() - vol * vol).abs() < 1e-12);
    }
}

#[test]
fn test_correlated_returns_shape_and_seed() {
    let portfolio = three_asset_portfolio(0.6);
    let a = portfolio.simulate_correlated_returns(20, 300, 9).unwrap();
    let b = portfolio.simulate_correlated_returns(20, 300, 9).unwrap();

    assert_eq!(a.grid().shape(), &[20, 3, 300]);
    assert_eq!(a.codes().len(), 3);
    assert!(a.grid().data().iter().all(|r| r.is_finite()));
    assert_eq!(a, b);
}

#[test]
fn test_correlated_returns_follow_matrix() {
    let portfolio = three_asset_portfolio(0.8);
    let returns = portfolio.simulate_correlated_returns(2, 20_000, 12).unwrap();
    let target = portfolio.correlation_matrix().unwrap().get(0, 1).unwrap();

    // Rank correlation of day 0, robust to heavy tails
    let ranks = |values: &[f64]| {
        let mut order: Vec<usize> = (0..values.len()).collect();
        order.sort_by(|&i, &j| values[i].total_cmp(&values[j]));
        let mut ranks = vec![0.0; values.len()];
        for (rank, &i) in order.iter().enumerate() {
            ranks[i] = rank as f64;
        }
        ranks
    };
    let x = ranks(returns.draws(0, 0).unwrap());
    let y = ranks(returns.draws(0, 1).unwrap());
    let spearman = crate::stats::pearson_correlation(&x, &y);
    let expected = 6.0 / std::f64::consts::PI * (target / 2.0).asin();
    assert!((spearman - expected).abs() < 0.03, "{spearman} vs {expected}");
}

#[test]
fn test_portfolio_paths_start_at_balance() {
    let portfolio = three_asset_portfolio(0.3);
    let start = portfolio.starting_balance().unwrap();
    let paths = portfolio.simulate_portfolio(30, 500, 4).unwrap();

    assert_eq!(paths.sims(), 500);
    assert_eq!(paths.days(), 30);
    assert!(paths.column(0).unwrap().iter().all(|&b| b == start));
    assert!(paths.final_balances().iter().all(|&b| b.is_finite() && b > 0.0));

    let bands = paths.percentile_bands(90.0).unwrap();
    assert_eq!(bands.len(), 31);
    let last = bands.get(30).unwrap();
    assert!(last.low <= last.median && last.median <= last.high);
}

#[test]
fn test_perfect_correlation_has_no_diversification() {
    let holdings = Holdings::new([("A", 100.0), ("B", 100.0), ("C", 100.0)]).unwrap();
    let portfolio = PortfolioModel::from_prices(
        holdings,
        fixtures::identical_series(3, 400, 31),
        &fixtures::config(),
    )
    .unwrap();

    for (_, _, r) in portfolio.correlation_matrix().unwrap().off_diagonal() {
        assert!((r - 1.0).abs() < 1e-9, "r = {r}");
    }

    let day = 60;
    let sims = 5_000;
    let combined = portfolio.simulate_portfolio(day, sims, 17).unwrap();
    let single = portfolio.assets()[0]
        .simulate_independent_returns(day, combined.at(0, 0).unwrap(), sims, 18)
        .unwrap();

    let combined_std = fixtures::sample_std(&combined.column(day).unwrap());
    let single_std = fixtures::sample_std(&single.column(day).unwrap());
    assert!(
        combined_std >= 0.9 * single_std,
        "combined {combined_std} vs single x3 {single_std}"
    );
}

#[test]
fn test_optimization_weights_on_simplex() {
    let portfolio = three_asset_portfolio(0.5);
    let scatter = portfolio.simulate_portfolio_optimization(2_000, 5).unwrap();

    assert_eq!(scatter.len(), 2_000);
    assert_eq!(scatter.codes.len(), 3);
    for point in &scatter.points {
        assert_eq!(point.weights.len(), 3);
        assert!(point.weights.iter().all(|&w| w >= 0.0));
        assert!((point.weights.iter().sum::<f64>() - 1.0).abs() < 1e-12);
        assert!(point.volatility >= 0.0);
    }

    let best = scatter.max_sharpe(0.04).unwrap();
    let best_ratio = calculate_sharpe_ratio(best.mean, best.volatility, 0.04);
    assert!(scatter.sharpe_ratios(0.04).iter().all(|s| *s <= best_ratio));

    let calm = scatter.min_volatility().unwrap();
    assert!(scatter.volatilities().iter().all(|v| *v >= calm.volatility));
}

#[test]
fn test_optimization_is_seeded() {
    let portfolio = three_asset_portfolio(0.5);
    let a = portfolio.simulate_portfolio_optimization(300, 1).unwrap();
    let b = portfolio.simulate_portfolio_optimization(300, 1).unwrap();
    assert_eq!(a, b);
}

#[test]
fn test_single_asset_rejects_correlation_operations() {
    let holdings = Holdings::new([("SOLO", 10.0)]).unwrap();
    let portfolio = PortfolioModel::from_prices(
        holdings,
        fixtures::correlated_series(1, 200, 0.0, 3),
        &fixtures::config(),
    )
    .unwrap();

    assert!(portfolio.starting_balance().unwrap() > 0.0);
    assert!(matches!(
        portfolio.correlation_matrix(),
        Err(Error::InsufficientAssets { found: 1 })
    ));
    assert!(matches!(
        portfolio.simulate_portfolio(10, 10, 0),
        Err(Error::InsufficientAssets { .. })
    ));
    assert!(portfolio.simulate_portfolio_optimization(10, 0).is_err());
}

#[test]
fn test_insufficient_overlap() {
    // Second asset trades only after the first one stops
    let first = fixtures::correlated_closes(1, 100, 0.0, 1).remove(0);
    let second: Vec<_> = fixtures::correlated_closes(1, 200, 0.0, 2)
        .remove(0)
        .into_iter()
        .skip(95)
        .collect();

    let holdings = Holdings::new([("OLD", 1.0), ("NEW", 1.0)]).unwrap();
    let err = PortfolioModel::from_prices(
        holdings,
        vec![fixtures::series(&first), fixtures::series(&second)],
        &fixtures::config(),
    )
    .unwrap_err();

    assert!(matches!(
        err,
        Error::InsufficientOverlap {
            common: 4,
            required: 30
        }
    ));
}

#[test]
fn test_mismatched_inputs() {
    let config = AnalysisConfig {
        min_overlap: 10,
        ..fixtures::config()
    };
    let holdings = Holdings::new([("AAA", 1.0), ("BBB", 1.0)]).unwrap();
    let one_series = fixtures::correlated_series(1, 50, 0.0, 1);
    assert!(matches!(
        PortfolioModel::from_prices(holdings, one_series, &config),
        Err(Error::InvalidHoldings(_))
    ));

    let empty: Vec<PriceSeries> = Vec::new();
    assert!(matches!(
        PortfolioModel::from_prices(Holdings::default(), empty, &config),
        Err(Error::InvalidHoldings(_))
    ));
}
