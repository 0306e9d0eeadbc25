//! Tests for log returns and date alignment
//!
//! These tests verify that:
//! - Every return equals `ln(p[t] / p[t-1])` of its neighbouring closes
//! - Transitions touching a missing close are dropped, not zero-filled
//! - Multi-asset alignment keeps only dates every asset traded on

use jiff::civil::date;

use super::fixtures;
use crate::error::Error;
use crate::model::{LogReturnSeries, PriceSeries, align_returns};

#[test]
fn test_returns_match_price_ratios() {
    let closes = fixtures::correlated_closes(1, 300, 0.0, 21).remove(0);
    let returns = LogReturnSeries::from_prices(&fixtures::series(&closes)).unwrap();

    assert_eq!(returns.len(), closes.len() - 1);
    for (t, (day, r)) in returns.iter().enumerate() {
        assert_eq!(day, closes[t + 1].0);
        let expected = (closes[t + 1].1 / closes[t].1).ln();
        assert!((r - expected).abs() < 1e-12);
    }
}

#[test]
fn test_invalid_closes_drop_both_transitions() {
    let prices = PriceSeries::new([
        (date(2024, 3, 1), 10.0),
        (date(2024, 3, 4), 11.0),
        (date(2024, 3, 5), f64::NAN),
        (date(2024, 3, 6), 12.0),
        (date(2024, 3, 7), -1.0),
        (date(2024, 3, 8), 12.5),
        (date(2024, 3, 11), 12.0),
    ])
    .unwrap();
    assert_eq!(prices.valid_count(), 5);

    let returns = LogReturnSeries::from_prices(&prices).unwrap();
    // 6 transitions, 4 touch a missing close
    assert_eq!(returns.len(), 2);
    assert_eq!(returns.dates(), &[date(2024, 3, 4), date(2024, 3, 11)]);
    assert!((returns.values()[0] - (11.0_f64 / 10.0).ln()).abs() < 1e-15);
    assert!((returns.values()[1] - (12.0_f64 / 12.5).ln()).abs() < 1e-15);
}

#[test]
fn test_too_few_prices() {
    let one = PriceSeries::new([(date(2024, 3, 1), 10.0)]).unwrap();
    assert!(matches!(
        LogReturnSeries::from_prices(&one),
        Err(Error::InsufficientData(_))
    ));

    let gapped = PriceSeries::new([
        (date(2024, 3, 1), 10.0),
        (date(2024, 3, 2), 0.0),
        (date(2024, 3, 3), 10.5),
    ])
    .unwrap();
    assert!(LogReturnSeries::from_prices(&gapped).is_err());
}

#[test]
fn test_unordered_dates_rejected() {
    let result = PriceSeries::new([(date(2024, 3, 2), 10.0), (date(2024, 3, 1), 11.0)]);
    assert!(matches!(result, Err(Error::InvalidPriceSeries(_))));
}

#[test]
fn test_alignment_is_inner_join() {
    let a = LogReturnSeries::from_pairs([
        (date(2024, 1, 2), 0.01),
        (date(2024, 1, 3), 0.02),
        (date(2024, 1, 4), 0.03),
        (date(2024, 1, 5), 0.04),
    ])
    .unwrap();
    let b = LogReturnSeries::from_pairs([
        (date(2024, 1, 3), -0.02),
        (date(2024, 1, 5), -0.04),
        (date(2024, 1, 8), -0.05),
    ])
    .unwrap();

    let aligned = align_returns(&[&a, &b]);
    assert_eq!(aligned.dates, vec![date(2024, 1, 3), date(2024, 1, 5)]);
    assert_eq!(aligned.columns[0], vec![0.02, 0.04]);
    assert_eq!(aligned.columns[1], vec![-0.02, -0.04]);

    assert!(align_returns(&[]).is_empty());
}
