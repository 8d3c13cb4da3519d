//! # Duration Codec
//!
//! Converts schedule durations to and from the two textual encodings the
//! backend expects.
//!
//! ## Encodings
//!
//! - Custom: `"{hours}h{minutes}m{seconds}s{milliseconds}ms"`. There is no
//!   days field, so a 36 hour duration encodes as `36h0m0s0ms`.
//! - ISO-8601 repeating interval: `"R{count}/PT{duration}"`, e.g. `R10/PT1M`.
//!
//! `dueTime` always uses the custom encoding. `period` uses the repeating
//! interval when a repetition count is present and the custom encoding
//! otherwise. The backend depends on this exact asymmetry, so it is kept as a
//! fixed wire contract.
//!
//! ## Precision
//!
//! Durations are carried with millisecond precision. Anything below a
//! millisecond is truncated on encode.
//!
//! ## Usage Example
//!
//! ```rust
//! use roost_api::duration;
//! use std::time::Duration;
//!
//! let encoded = duration::encode(Duration::from_secs(60), Duration::from_secs(60), Some(10));
//! assert_eq!(encoded.due_time, "0h1m0s0ms");
//! assert_eq!(encoded.period, "R10/PT1M");
//!
//! let decoded = duration::decode(&encoded.due_time, &encoded.period).unwrap();
//! assert_eq!(decoded.repetitions, Some(10));
//! ```

use crate::errors::FormatError;
use std::time::Duration;

/// Payload field name for the first-fire delay.
pub const DUE_TIME_FIELD: &str = "dueTime";
/// Payload field name for the repeat interval.
pub const PERIOD_FIELD: &str = "period";
/// Payload field name for the time-to-live.
pub const TTL_FIELD: &str = "ttl";

const MILLIS_PER_SECOND: u64 = 1_000;
const MILLIS_PER_MINUTE: u64 = 60 * MILLIS_PER_SECOND;
const MILLIS_PER_HOUR: u64 = 60 * MILLIS_PER_MINUTE;
const MILLIS_PER_DAY: u64 = 24 * MILLIS_PER_HOUR;

/// Wire form of a schedule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedSchedule {
    pub due_time: String,
    pub period: String,
}

/// Decoded schedule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Schedule {
    pub due_time: Duration,
    pub period: Duration,
    /// Present only when the period was a bounded repeating interval
    pub repetitions: Option<u32>,
}

/// Encodes a due time and period for the backend.
pub fn encode(due_time: Duration, period: Duration, repetitions: Option<u32>) -> EncodedSchedule {
    let period = match repetitions {
        Some(count) => format_repeating_interval(period, count),
        None => format_duration(period),
    };
    EncodedSchedule {
        due_time: format_duration(due_time),
        period,
    }
}

/// Decodes a wire schedule, dispatching the period on its `R` prefix.
pub fn decode(due_time: &str, period: &str) -> Result<Schedule, FormatError> {
    let due_time = parse_duration(DUE_TIME_FIELD, due_time)?;
    let (period, repetitions) = parse_period(PERIOD_FIELD, period)?;
    Ok(Schedule {
        due_time,
        period,
        repetitions,
    })
}

/// Formats `value` as `{h}h{m}m{s}s{ms}ms`.
pub fn format_duration(value: Duration) -> String {
    let (hours, minutes, seconds, millis) = split_millis(value);
    format!("{hours}h{minutes}m{seconds}s{millis}ms")
}

/// Formats `value` as an ISO-8601 repeating interval with `count` repetitions.
pub fn format_repeating_interval(value: Duration, count: u32) -> String {
    format!("R{count}/{}", format_iso8601(value))
}

/// Formats `value` as an ISO-8601 time duration (`PT1H30M`, `PT1.5S`, `PT0S`).
pub fn format_iso8601(value: Duration) -> String {
    let (hours, minutes, seconds, millis) = split_millis(value);
    let mut out = String::from("PT");
    if hours > 0 {
        out.push_str(&format!("{hours}H"));
    }
    if minutes > 0 {
        out.push_str(&format!("{minutes}M"));
    }
    if millis > 0 {
        let fraction = format!("{millis:03}");
        out.push_str(&format!("{seconds}.{}S", fraction.trim_end_matches('0')));
    } else if seconds > 0 || (hours == 0 && minutes == 0) {
        out.push_str(&format!("{seconds}S"));
    }
    out
}

/// Parses the custom `{h}h{m}m{s}s{ms}ms` encoding.
///
/// Components may be omitted but must appear at most once and in
/// hours, minutes, seconds, milliseconds order.
pub fn parse_duration(field: &'static str, text: &str) -> Result<Duration, FormatError> {
    let err = |reason: &str| FormatError::new(field, text, reason);
    if text.is_empty() {
        return Err(err("empty duration"));
    }

    let mut rest = text;
    let mut last_rank: Option<u8> = None;
    let mut total: u64 = 0;
    while !rest.is_empty() {
        let digits = rest
            .find(|c: char| !c.is_ascii_digit())
            .unwrap_or(rest.len());
        if digits == 0 {
            return Err(err("expected a number"));
        }
        let value = parse_number(&rest[..digits]).ok_or_else(|| err("number out of range"))?;
        let tail = &rest[digits..];

        let (rank, unit, unit_len) = if tail.starts_with("ms") {
            (3, 1, 2)
        } else if tail.starts_with('h') {
            (0, MILLIS_PER_HOUR, 1)
        } else if tail.starts_with('m') {
            (1, MILLIS_PER_MINUTE, 1)
        } else if tail.starts_with('s') {
            (2, MILLIS_PER_SECOND, 1)
        } else {
            return Err(err("expected unit h, m, s or ms"));
        };
        if last_rank.is_some_and(|last| rank <= last) {
            return Err(err("units must appear once, in h, m, s, ms order"));
        }
        last_rank = Some(rank);

        total = value
            .checked_mul(unit)
            .and_then(|ms| total.checked_add(ms))
            .ok_or_else(|| err("duration overflows"))?;
        rest = &tail[unit_len..];
    }
    Ok(Duration::from_millis(total))
}

/// Parses a period in either encoding.
///
/// - `R{n}/P…` yields the interval and `Some(n)`
/// - `R/P…` (unbounded) and bare `P…` yield the interval and `None`
/// - an empty string means no period
/// - anything else is read as the custom encoding
pub fn parse_period(field: &'static str, text: &str) -> Result<(Duration, Option<u32>), FormatError> {
    if text.is_empty() {
        return Ok((Duration::ZERO, None));
    }
    if let Some(rest) = text.strip_prefix('R') {
        let (count, interval) = rest
            .split_once('/')
            .ok_or_else(|| FormatError::new(field, text, "repeating interval must look like R{count}/{duration}"))?;
        let repetitions = if count.is_empty() {
            None
        } else {
            let count = parse_number(count)
                .and_then(|n| u32::try_from(n).ok())
                .ok_or_else(|| FormatError::new(field, text, "invalid repetition count"))?;
            Some(count)
        };
        let period = parse_iso8601(field, text, interval)?;
        return Ok((period, repetitions));
    }
    if text.starts_with('P') {
        return Ok((parse_iso8601(field, text, text)?, None));
    }
    Ok((parse_duration(field, text)?, None))
}

/// Parses an ISO-8601 duration limited to days, hours, minutes and seconds.
fn parse_iso8601(field: &'static str, full: &str, text: &str) -> Result<Duration, FormatError> {
    let err = |reason: &str| FormatError::new(field, full, reason);
    let body = text
        .strip_prefix('P')
        .ok_or_else(|| err("ISO-8601 duration must start with P"))?;
    let (date, time) = match body.split_once('T') {
        Some((date, time)) => (date, Some(time)),
        None => (body, None),
    };
    if date.is_empty() && time.map_or(true, str::is_empty) {
        return Err(err("ISO-8601 duration has no components"));
    }

    let mut total: u64 = 0;
    if !date.is_empty() {
        let days = date
            .strip_suffix('D')
            .ok_or_else(|| err("only a day component is supported before T"))?;
        total = parse_number(days)
            .and_then(|d| d.checked_mul(MILLIS_PER_DAY))
            .ok_or_else(|| err("invalid day component"))?;
    }

    if let Some(mut rest) = time {
        if rest.is_empty() {
            return Err(err("missing time components after T"));
        }
        let mut last_rank: Option<u8> = None;
        while !rest.is_empty() {
            let end = rest
                .find(|c: char| !(c.is_ascii_digit() || c == '.'))
                .ok_or_else(|| err("missing unit designator"))?;
            let (number, tail) = rest.split_at(end);
            let unit = tail.chars().next().ok_or_else(|| err("missing unit designator"))?;
            rest = &tail[unit.len_utf8()..];

            let (rank, unit_ms) = match unit {
                'H' => (0, MILLIS_PER_HOUR),
                'M' => (1, MILLIS_PER_MINUTE),
                'S' => (2, MILLIS_PER_SECOND),
                _ => return Err(err("unsupported unit designator")),
            };
            if last_rank.is_some_and(|last| rank <= last) {
                return Err(err("time components must appear once, in H, M, S order"));
            }
            last_rank = Some(rank);

            let millis = match number.split_once('.') {
                Some((whole, fraction)) => {
                    if unit != 'S' {
                        return Err(err("fractions are only supported on seconds"));
                    }
                    let whole = parse_number(whole).ok_or_else(|| err("expected a number"))?;
                    let fraction = parse_fraction_millis(fraction).ok_or_else(|| err("invalid fraction"))?;
                    whole
                        .checked_mul(MILLIS_PER_SECOND)
                        .and_then(|ms| ms.checked_add(fraction))
                }
                None => parse_number(number)
                    .ok_or_else(|| err("expected a number"))?
                    .checked_mul(unit_ms),
            };
            total = millis
                .and_then(|ms| total.checked_add(ms))
                .ok_or_else(|| err("duration overflows"))?;
        }
    }
    Ok(Duration::from_millis(total))
}

fn split_millis(value: Duration) -> (u128, u128, u128, u128) {
    let total = value.as_millis();
    let hours = total / u128::from(MILLIS_PER_HOUR);
    let minutes = (total / u128::from(MILLIS_PER_MINUTE)) % 60;
    let seconds = (total / u128::from(MILLIS_PER_SECOND)) % 60;
    let millis = total % u128::from(MILLIS_PER_SECOND);
    (hours, minutes, seconds, millis)
}

fn parse_number(text: &str) -> Option<u64> {
    if text.is_empty() || !text.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    text.parse().ok()
}

// First three fraction digits, right-padded; further digits are truncated.
fn parse_fraction_millis(text: &str) -> Option<u64> {
    if text.is_empty() || !text.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let padded: String = text.chars().chain(std::iter::repeat('0')).take(3).collect();
    padded.parse().ok()
}
