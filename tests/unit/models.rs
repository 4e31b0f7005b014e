//! Unit tests for the wire models

use chrono::{TimeZone, Utc};
use marketpulse::models::{
    Direction, EvaluationResult, PriceSample, SignalCall, TickPayload, WelcomeEvent,
};

#[test]
fn signal_labels_are_stable() {
    assert_eq!(SignalCall::new(Direction::Buy, false).label(), "BUY");
    assert_eq!(SignalCall::new(Direction::Sell, false).label(), "SELL");
    assert_eq!(SignalCall::new(Direction::Buy, true).label(), "BUY-RISKY");
    assert_eq!(SignalCall::new(Direction::Sell, true).label(), "SELL-RISKY");
}

#[test]
fn payload_carries_the_contract_field_names() {
    let sample = PriceSample::new(
        42000.5,
        Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap(),
    );
    let result = EvaluationResult {
        signal: Some(SignalCall::new(Direction::Buy, true)),
        ma_short: Some(42010.0),
        ma_long: Some(41900.0),
        anomalous: true,
    };

    let payload = TickPayload::from_evaluation(&sample, &result);
    let value = serde_json::to_value(&payload).unwrap();

    let obj = value.as_object().unwrap();
    for field in ["price", "timestamp", "signal", "ma_short", "ma_long", "anomalous"] {
        assert!(obj.contains_key(field), "missing wire field {}", field);
    }
    assert_eq!(obj.len(), 6);

    assert_eq!(value["price"], 42000.5);
    assert_eq!(value["signal"], "BUY-RISKY");
    assert_eq!(value["anomalous"], true);
    assert_eq!(value["timestamp"].as_f64().unwrap(), sample.epoch_seconds());
}

#[test]
fn empty_evaluation_serializes_with_nulls() {
    let sample = PriceSample::new(100.0, Utc::now());
    let payload = TickPayload::from_evaluation(&sample, &EvaluationResult::insufficient_history());
    let value = serde_json::to_value(&payload).unwrap();

    assert!(value["signal"].is_null());
    assert!(value["ma_short"].is_null());
    assert!(value["ma_long"].is_null());
    // no verdict during warm-up, so the wire carries null rather than false
    assert!(value["anomalous"].is_null());
}

#[test]
fn evaluated_tick_carries_a_concrete_anomaly_verdict() {
    let sample = PriceSample::new(100.0, Utc::now());
    let result = EvaluationResult {
        signal: None,
        ma_short: Some(100.0),
        ma_long: Some(100.0),
        anomalous: false,
    };
    let payload = TickPayload::from_evaluation(&sample, &result);
    let value = serde_json::to_value(&payload).unwrap();
    assert_eq!(value["anomalous"], false);
}

#[test]
fn welcome_event_names_the_symbol() {
    let welcome = WelcomeEvent::new("BTCUSDT");
    let value = serde_json::to_value(&welcome).unwrap();
    assert_eq!(value["symbol"], "BTCUSDT");
    assert!(value["message"].as_str().unwrap().contains("connected"));
}
