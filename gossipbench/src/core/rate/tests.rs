use super::Rate;
use std::time::Duration;

#[test]
fn test_per_second() {
    assert_eq!(Rate::per_second(1).period(), Duration::from_secs(1));
    assert_eq!(Rate::per_second(4).period(), Duration::from_millis(250));
    assert_eq!(Rate::per_second(1000).period(), Duration::from_millis(1));
}

#[test]
fn test_per_minute() {
    assert_eq!(Rate::per_minute(60).period(), Duration::from_secs(1));
    assert_eq!(Rate::per_minute(120).period(), Duration::from_millis(500));
}

#[test]
fn test_from_budget_matches_window_over_budget() {
    // The legacy bench spread 150,000 updates over one minute
    let rate = Rate::from_budget(150_000, Duration::from_secs(60));
    assert_eq!(rate.period(), Duration::from_micros(400));

    let rate = Rate::from_budget(3, Duration::from_secs(1));
    assert_eq!(rate.period(), Duration::from_nanos(333_333_333));
}

#[test]
fn test_zero_budget_blocks() {
    let rate = Rate::from_budget(0, Duration::from_secs(60));
    assert_eq!(rate.period(), Duration::MAX);
    assert_eq!(Rate::per_second(0).period(), Duration::MAX);
}

#[test]
fn test_per_second_f64() {
    let rate = Rate::per_second(20);
    assert!((rate.per_second_f64() - 20.0).abs() < 1e-9);

    let instant = Rate::new(Duration::ZERO);
    assert!(instant.per_second_f64().is_infinite());
}
