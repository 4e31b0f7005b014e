//! Unit tests for the rolling series

use chrono::Utc;
use marketpulse::models::PriceSample;
use marketpulse::series::{simple_returns, RollingSeries};

fn sample(price: f64) -> PriceSample {
    PriceSample::new(price, Utc::now())
}

#[test]
fn append_below_capacity_keeps_everything() {
    let mut series = RollingSeries::with_capacity(10);
    for i in 0..5 {
        series.append(sample(100.0 + i as f64));
    }
    assert_eq!(series.len(), 5);
    let prices: Vec<f64> = series.snapshot().iter().map(|s| s.price).collect();
    assert_eq!(prices, vec![100.0, 101.0, 102.0, 103.0, 104.0]);
}

#[test]
fn overflow_evicts_oldest_in_fifo_order() {
    let capacity = 7;
    let mut series = RollingSeries::with_capacity(capacity);
    for i in 0..25 {
        series.append(sample(i as f64));
    }
    assert_eq!(series.len(), capacity);
    let prices: Vec<f64> = series.snapshot().iter().map(|s| s.price).collect();
    // last N appended, in arrival order
    let expected: Vec<f64> = (18..25).map(|i| i as f64).collect();
    assert_eq!(prices, expected);
}

#[test]
fn snapshot_is_isolated_from_later_appends() {
    let mut series = RollingSeries::with_capacity(5);
    series.append(sample(1.0));
    series.append(sample(2.0));
    let snapshot = series.snapshot();
    series.append(sample(3.0));
    assert_eq!(snapshot.len(), 2);
    assert_eq!(series.len(), 3);
}

#[test]
#[should_panic]
fn zero_capacity_is_a_precondition_violation() {
    let _ = RollingSeries::with_capacity(0);
}

#[test]
fn returns_are_simple_relative_changes() {
    let samples = vec![sample(100.0), sample(110.0), sample(99.0)];
    let returns = simple_returns(&samples);
    assert_eq!(returns.len(), 2);
    assert!((returns[0] - 0.10).abs() < 1e-12);
    assert!((returns[1] - (-0.1)).abs() < 1e-12);
}

#[test]
fn returns_of_short_input_are_empty() {
    assert!(simple_returns(&[]).is_empty());
    assert!(simple_returns(&[sample(100.0)]).is_empty());
}
