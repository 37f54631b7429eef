// SPDX-License-Identifier: MIT

//! Transient-error retry with exponential backoff.
//!
//! Only `TRANSIENT` failures of idempotent operations are retried;
//! everything else surfaces immediately. Delays are 200ms × 2ⁿ capped
//! at 60s.

use aether_core::{ErrorCode, KernelError};
use std::time::Duration;
use tracing::warn;

const BASE_DELAY_MS: u64 = 200;
const MAX_DELAY: Duration = Duration::from_secs(60);

/// Backoff delay before retry `attempt` (0-based).
pub fn delay_for_attempt(attempt: u32) -> Duration {
    let exp = BASE_DELAY_MS.saturating_mul(1u64.checked_shl(attempt).unwrap_or(u64::MAX));
    Duration::from_millis(exp).min(MAX_DELAY)
}

/// Run an idempotent operation, retrying `TRANSIENT` failures up to
/// `attempts` times in total.
pub async fn with_backoff<T>(
    attempts: u32,
    mut op: impl FnMut() -> Result<T, KernelError>,
) -> Result<T, KernelError> {
    let mut attempt = 0;
    loop {
        match op() {
            Ok(value) => return Ok(value),
            Err(err) if err.code == ErrorCode::Transient && attempt + 1 < attempts => {
                let delay = delay_for_attempt(attempt);
                warn!(error = %err, attempt, delay_ms = delay.as_millis() as u64, "transient failure, retrying");
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
            Err(err) => return Err(err),
        }
    }
}
