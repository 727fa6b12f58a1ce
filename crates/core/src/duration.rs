// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Duration string parsing (spec §9 design note (c), §4.4 `retry_policy.interval`,
//! §6 `REQUEST_TIMEOUT`).
//!
//! Accepts a single `{number}{unit}` pair, `unit` in `{ns,us,ms,s,m,h}`.
//! Compound durations (`"1m30s"`) are not supported, matching the source's
//! narrower grammar.

use crate::error::FlowError;
use std::time::Duration;

pub fn parse_duration(s: &str) -> Result<Duration, FlowError> {
    let s = s.trim();
    let unit_start = s
        .find(|c: char| !c.is_ascii_digit() && c != '.')
        .ok_or_else(|| FlowError::InvalidDsl(format!("duration {s:?} has no unit")))?;
    let (number, unit) = s.split_at(unit_start);
    let number: f64 = number
        .parse()
        .map_err(|_| FlowError::InvalidDsl(format!("duration {s:?} has an invalid number")))?;
    let nanos = match unit {
        "ns" => number,
        "us" => number * 1_000.0,
        "ms" => number * 1_000_000.0,
        "s" => number * 1_000_000_000.0,
        "m" => number * 60_000_000_000.0,
        "h" => number * 3_600_000_000_000.0,
        other => {
            return Err(FlowError::InvalidDsl(format!(
                "duration {s:?} has unknown unit {other:?}"
            )))
        }
    };
    if nanos < 0.0 {
        return Err(FlowError::InvalidDsl(format!("duration {s:?} is negative")));
    }
    Ok(Duration::from_nanos(nanos as u64))
}

/// Doubles `base` per exponential-retry attempt, capped at 30s (spec §4.4).
pub fn exponential_backoff(base: Duration, attempt: u32) -> Duration {
    let cap = Duration::from_secs(30);
    // Shifts beyond ~20 already dwarf the cap for any realistic base; clamp
    // the exponent so the multiply below can't overflow.
    let shift = attempt.min(20);
    let factor = 1u32.checked_shl(shift).unwrap_or(u32::MAX);
    base.checked_mul(factor).unwrap_or(cap).min(cap)
}

#[cfg(test)]
#[path = "duration_tests.rs"]
mod tests;
