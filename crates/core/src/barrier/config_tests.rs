// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use yare::parameterized;

#[test]
fn new_uses_default_delay() {
    let config = BarrierConfig::new("forks");
    assert_eq!(config.name, "forks");
    assert_eq!(config.base_delay, DEFAULT_BASE_DELAY);
}

#[parameterized(
    no_participants = { 0, 100 },
    one_participant = { 1, 100 },
    five_participants = { 5, 500 },
)]
fn watchdog_delay_scales_with_altable_count(altable: usize, expected_ms: u64) {
    let config = BarrierConfig::new("b").with_base_delay(Duration::from_millis(100));
    assert_eq!(
        config.watchdog_delay(altable),
        Duration::from_millis(expected_ms)
    );
}

#[test]
fn watchdog_delay_saturates() {
    let config = BarrierConfig::new("b").with_base_delay(Duration::MAX);
    assert_eq!(config.watchdog_delay(3), Duration::MAX);
}

#[test]
fn deserializes_humantime_delay() {
    let config: BarrierConfig =
        serde_json::from_str(r#"{"name":"start","base_delay":"250ms"}"#).unwrap();
    assert_eq!(config.base_delay, Duration::from_millis(250));
}

#[test]
fn missing_delay_falls_back_to_default() {
    let config: BarrierConfig = serde_json::from_str(r#"{"name":"start"}"#).unwrap();
    assert_eq!(config, BarrierConfig::new("start"));
}
