// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn parses_each_supported_unit() {
    assert_eq!(parse_duration("10ns").unwrap(), Duration::from_nanos(10));
    assert_eq!(parse_duration("10us").unwrap(), Duration::from_micros(10));
    assert_eq!(parse_duration("10ms").unwrap(), Duration::from_millis(10));
    assert_eq!(parse_duration("5s").unwrap(), Duration::from_secs(5));
    assert_eq!(parse_duration("2m").unwrap(), Duration::from_secs(120));
    assert_eq!(parse_duration("1h").unwrap(), Duration::from_secs(3600));
}

#[test]
fn rejects_unknown_unit() {
    assert!(parse_duration("10x").is_err());
}

#[test]
fn rejects_compound_duration() {
    assert!(parse_duration("1m30s").is_err());
}

#[test]
fn rejects_missing_unit() {
    assert!(parse_duration("10").is_err());
}

#[test]
fn exponential_backoff_doubles_and_caps_at_30s() {
    let base = Duration::from_millis(10);
    assert_eq!(exponential_backoff(base, 0), Duration::from_millis(10));
    assert_eq!(exponential_backoff(base, 1), Duration::from_millis(20));
    assert_eq!(exponential_backoff(base, 2), Duration::from_millis(40));
    assert_eq!(exponential_backoff(Duration::from_secs(20), 5), Duration::from_secs(30));
}
