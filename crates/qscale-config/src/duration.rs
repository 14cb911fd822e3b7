//! Duration values as they appear in workload configs.
//!
//! A duration is either a JSON number (nanoseconds) or a string made of
//! one or more `<number><unit>` terms, e.g. `"300ms"`, `"1m30s"`, `"1.5h"`.
//! Units: `ns`, `us` (or `µs`), `ms`, `s`, `m`, `h`.

use std::fmt;
use std::time::Duration;

use serde::de::{self, Deserializer, Visitor};

use crate::error::{ConfigError, ConfigResult};

const NANOS_PER_MICRO: u128 = 1_000;
const NANOS_PER_MILLI: u128 = 1_000_000;
const NANOS_PER_SEC: u128 = 1_000_000_000;

/// Fraction digits beyond this are below nanosecond precision for every unit.
const MAX_FRACTION_DIGITS: usize = 18;

/// Parse a duration string like `"5s"`, `"500ms"` or `"1h2m3s"`.
///
/// A bare `"0"` is accepted. Negative durations are rejected.
pub fn parse_duration(input: &str) -> ConfigResult<Duration> {
    let fail = |reason: &str| ConfigError::Duration {
        input: input.to_string(),
        reason: reason.to_string(),
    };

    let mut s = input.trim();
    if let Some(rest) = s.strip_prefix('+') {
        s = rest;
    } else if s.starts_with('-') {
        return Err(fail("negative durations are not allowed"));
    }

    if s == "0" {
        return Ok(Duration::ZERO);
    }
    if s.is_empty() {
        return Err(fail("empty duration"));
    }

    let mut total_nanos: u128 = 0;
    while !s.is_empty() {
        let number_len = s
            .find(|c: char| !(c.is_ascii_digit() || c == '.'))
            .unwrap_or(s.len());
        let (number, rest) = s.split_at(number_len);
        let (whole, fraction) = number.split_once('.').unwrap_or((number, ""));
        if whole.is_empty() && fraction.is_empty() {
            return Err(fail("expected a number"));
        }
        if fraction.contains('.') {
            return Err(fail("malformed number"));
        }

        let unit_len = rest
            .find(|c: char| c.is_ascii_digit() || c == '.')
            .unwrap_or(rest.len());
        let (unit, rest) = rest.split_at(unit_len);
        let scale = match unit {
            "ns" => 1,
            "us" | "µs" | "μs" => NANOS_PER_MICRO,
            "ms" => NANOS_PER_MILLI,
            "s" => NANOS_PER_SEC,
            "m" => 60 * NANOS_PER_SEC,
            "h" => 3600 * NANOS_PER_SEC,
            "" => return Err(fail("missing unit")),
            _ => return Err(fail("unknown unit")),
        };

        let whole: u128 = if whole.is_empty() {
            0
        } else {
            whole.parse().map_err(|_| fail("duration out of range"))?
        };
        let (numerator, denominator) = fraction
            .bytes()
            .take(MAX_FRACTION_DIGITS)
            .fold((0u128, 1u128), |(n, d), digit| {
                (n * 10 + u128::from(digit - b'0'), d * 10)
            });

        total_nanos = whole
            .checked_mul(scale)
            .and_then(|n| n.checked_add(numerator * scale / denominator))
            .and_then(|n| n.checked_add(total_nanos))
            .ok_or_else(|| fail("duration out of range"))?;
        s = rest;
    }

    let nanos = u64::try_from(total_nanos).map_err(|_| fail("duration out of range"))?;
    Ok(Duration::from_nanos(nanos))
}

/// Serde adapter for `#[serde(deserialize_with = "...")]` fields.
pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
where
    D: Deserializer<'de>,
{
    deserializer.deserialize_any(DurationVisitor)
}

struct DurationVisitor;

impl<'de> Visitor<'de> for DurationVisitor {
    type Value = Duration;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("a number of nanoseconds or a duration string like \"5s\"")
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<Duration, E> {
        Ok(Duration::from_nanos(v))
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<Duration, E> {
        u64::try_from(v)
            .map(Duration::from_nanos)
            .map_err(|_| E::custom("negative durations are not allowed"))
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> Result<Duration, E> {
        if !v.is_finite() || v < 0.0 {
            return Err(E::custom("duration must be a non-negative number"));
        }
        // Fractional nanoseconds are truncated.
        Ok(Duration::from_nanos(v as u64))
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<Duration, E> {
        parse_duration(v).map_err(E::custom)
    }
}
