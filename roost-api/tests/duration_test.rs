use roost_api::duration::{self, DUE_TIME_FIELD, PERIOD_FIELD};
use std::time::Duration;

#[test]
fn test_encode_timer_schedule() {
    let encoded = duration::encode(Duration::ZERO, Duration::from_secs(5), None);
    assert_eq!(encoded.due_time, "0h0m0s0ms");
    assert_eq!(encoded.period, "0h0m5s0ms");
}

#[test]
fn test_encode_reminder_with_repetitions() {
    let encoded = duration::encode(Duration::from_secs(60), Duration::from_secs(60), Some(10));
    assert_eq!(encoded.due_time, "0h1m0s0ms");
    assert_eq!(encoded.period, "R10/PT1M");
}

#[test]
fn test_custom_format_components() {
    let value = Duration::from_millis(26 * 3_600_000 + 3 * 60_000 + 4_000 + 5);
    assert_eq!(duration::format_duration(value), "26h3m4s5ms");
    assert_eq!(duration::parse_duration(DUE_TIME_FIELD, "26h3m4s5ms").unwrap(), value);
}

#[test]
fn test_sub_millisecond_precision_truncates() {
    assert_eq!(duration::format_duration(Duration::from_micros(1_999)), "0h0m0s1ms");
}

#[test]
fn test_custom_round_trip() {
    for millis in [0u64, 1, 999, 1_000, 59_999, 60_000, 3_599_999, 3_600_000, 90_061_001] {
        let value = Duration::from_millis(millis);
        let encoded = duration::encode(value, value, None);
        let decoded = duration::decode(&encoded.due_time, &encoded.period).unwrap();
        assert_eq!(decoded.due_time, value);
        assert_eq!(decoded.period, value);
        assert_eq!(decoded.repetitions, None);
    }
}

#[test]
fn test_repeating_round_trip() {
    let cases = [
        (Duration::from_secs(60), 10),
        (Duration::from_millis(1_500), 3),
        (Duration::from_secs(3_600 + 30), 1),
        (Duration::ZERO, 2),
    ];
    for (period, count) in cases {
        let encoded = duration::encode(Duration::from_secs(1), period, Some(count));
        assert!(encoded.period.starts_with(&format!("R{count}/PT")));
        let decoded = duration::decode(&encoded.due_time, &encoded.period).unwrap();
        assert_eq!(decoded.due_time, Duration::from_secs(1));
        assert_eq!(decoded.period, period);
        assert_eq!(decoded.repetitions, Some(count));
    }
}

#[test]
fn test_iso_formatting() {
    assert_eq!(duration::format_iso8601(Duration::ZERO), "PT0S");
    assert_eq!(duration::format_iso8601(Duration::from_secs(90)), "PT1M30S");
    assert_eq!(duration::format_iso8601(Duration::from_millis(1_500)), "PT1.5S");
    assert_eq!(duration::format_iso8601(Duration::from_millis(250)), "PT0.25S");
    assert_eq!(duration::format_iso8601(Duration::from_secs(3_600)), "PT1H");
    assert_eq!(duration::format_iso8601(Duration::from_secs(30 * 3_600)), "PT30H");
}

#[test]
fn test_period_variants() {
    assert_eq!(
        duration::parse_period(PERIOD_FIELD, "PT30S").unwrap(),
        (Duration::from_secs(30), None)
    );
    assert_eq!(
        duration::parse_period(PERIOD_FIELD, "R/PT1M").unwrap(),
        (Duration::from_secs(60), None)
    );
    assert_eq!(
        duration::parse_period(PERIOD_FIELD, "R5/P1D").unwrap(),
        (Duration::from_secs(86_400), Some(5))
    );
    assert_eq!(duration::parse_period(PERIOD_FIELD, "").unwrap(), (Duration::ZERO, None));
    assert_eq!(
        duration::parse_period(PERIOD_FIELD, "0h0m5s0ms").unwrap(),
        (Duration::from_secs(5), None)
    );
}

#[test]
fn test_partial_custom_components() {
    assert_eq!(
        duration::parse_duration(DUE_TIME_FIELD, "5s").unwrap(),
        Duration::from_secs(5)
    );
    assert_eq!(
        duration::parse_duration(DUE_TIME_FIELD, "1h250ms").unwrap(),
        Duration::from_millis(3_600_250)
    );
}

#[test]
fn test_malformed_custom_durations() {
    for text in ["", "5", "5x", "1s1h", "1m1m", "h", "-1s", "1.5s"] {
        let err = duration::parse_duration(DUE_TIME_FIELD, text).unwrap_err();
        assert_eq!(err.field, DUE_TIME_FIELD, "input {text:?}");
        assert_eq!(err.value, text);
    }
}

#[test]
fn test_format_error_message() {
    let err = duration::parse_duration(DUE_TIME_FIELD, "5x").unwrap_err();
    assert_eq!(err.to_string(), "invalid dueTime value \"5x\": expected unit h, m, s or ms");
}

#[test]
fn test_malformed_periods() {
    for text in ["R10PT1M", "Rx/PT1M", "R10/", "R10/1m", "PT", "P", "PT1X", "PT1S1M", "R-1/PT1S"] {
        let err = duration::parse_period(PERIOD_FIELD, text).unwrap_err();
        assert_eq!(err.field, PERIOD_FIELD, "input {text:?}");
    }
}

#[test]
fn test_decode_reports_failing_field() {
    let err = duration::decode("0h0m0s0ms", "R2/PTxS").unwrap_err();
    assert_eq!(err.field, PERIOD_FIELD);

    let err = duration::decode("soon", "R2/PT1S").unwrap_err();
    assert_eq!(err.field, DUE_TIME_FIELD);
}
