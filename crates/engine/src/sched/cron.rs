// SPDX-License-Identifier: MIT

//! Five-field POSIX cron expressions (`min hour dom mon dow`) with
//! lists, ranges, steps, and `*`/`?`.
//!
//! Evaluation is minute-granular: an expression either matches a given
//! wall-clock minute boundary or it does not.

use aether_core::KernelError;
use chrono::{DateTime, TimeZone, Utc};
use croner::Cron;

/// Milliseconds in one evaluation step.
pub const MINUTE_MS: u64 = 60_000;

/// Parse and validate an expression.
pub fn parse(expr: &str) -> Result<Cron, KernelError> {
    Cron::new(expr)
        .parse()
        .map_err(|e| KernelError::invalid_input(format!("invalid cron expression '{expr}': {e}")))
}

fn datetime(ms: u64) -> Option<DateTime<Utc>> {
    Utc.timestamp_millis_opt(ms as i64).single()
}

/// Floor a timestamp to its minute boundary.
pub fn minute_floor_ms(ms: u64) -> u64 {
    ms - ms % MINUTE_MS
}

/// Whether the expression matches the minute containing `ms`.
pub fn matches_at(cron: &Cron, ms: u64) -> bool {
    let Some(at) = datetime(minute_floor_ms(ms)) else {
        return false;
    };
    cron.is_time_matching(&at).unwrap_or(false)
}

/// The next matching minute boundary strictly after `after_ms`.
pub fn next_fire_ms(cron: &Cron, after_ms: u64) -> Option<u64> {
    let after = datetime(after_ms)?;
    let next = cron.find_next_occurrence(&after, false).ok()?;
    let ms = next.timestamp_millis();
    (ms >= 0).then_some(ms as u64)
}

#[cfg(test)]
#[path = "cron_tests.rs"]
mod tests;
