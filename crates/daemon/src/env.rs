// SPDX-License-Identifier: MIT

//! Centralized environment variable access for the daemon crate.
//!
//! Library crates never read the environment; everything they need is
//! resolved here and passed down as explicit configuration.

use crate::kernel::KernelConfig;
use aether_engine::MAX_PROCESSES;
use std::path::PathBuf;
use std::time::Duration;

/// Resolve state directory: AETHER_STATE_DIR > XDG_STATE_HOME/aether >
/// ~/.local/state/aether.
pub fn state_dir() -> Option<PathBuf> {
    if let Ok(dir) = std::env::var("AETHER_STATE_DIR") {
        return Some(PathBuf::from(dir));
    }
    if let Ok(xdg) = std::env::var("XDG_STATE_HOME") {
        return Some(PathBuf::from(xdg).join("aether"));
    }
    std::env::var("HOME").ok().map(|home| PathBuf::from(home).join(".local/state/aether"))
}

/// Token signing secret (`AETHER_SECRET`). Absent means an ephemeral
/// secret is generated at startup.
pub fn signing_secret() -> Option<Vec<u8>> {
    std::env::var("AETHER_SECRET").ok().filter(|s| !s.is_empty()).map(String::into_bytes)
}

/// Full-token TTL (`AETHER_TOKEN_EXPIRY_SECS`, default one day).
pub fn token_expiry_secs() -> u64 {
    std::env::var("AETHER_TOKEN_EXPIRY_SECS")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(aether_auth::DEFAULT_TOKEN_TTL_SECS)
}

/// Concurrency cap before spawns queue (`AETHER_MAX_CONCURRENT`).
pub fn max_concurrent() -> usize {
    std::env::var("AETHER_MAX_CONCURRENT")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(MAX_PROCESSES)
}

/// Admission queue bound (`AETHER_QUEUE_LIMIT`, default 256).
pub fn queue_limit() -> usize {
    std::env::var("AETHER_QUEUE_LIMIT").ok().and_then(|s| s.parse().ok()).unwrap_or(256)
}

/// TCP port for remote connections. When set, the daemon listens on
/// this port in addition to the Unix socket.
pub fn tcp_port() -> Option<u16> {
    std::env::var("AETHER_TCP_PORT").ok().and_then(|s| s.parse().ok())
}

/// Slack webhook signing secret (`AETHER_SLACK_SIGNING_SECRET`).
pub fn slack_signing_secret() -> Option<String> {
    std::env::var("AETHER_SLACK_SIGNING_SECRET").ok().filter(|s| !s.is_empty())
}

/// Shutdown drain timeout (default 5s, `AETHER_DRAIN_TIMEOUT_MS`).
pub fn drain_timeout() -> Duration {
    std::env::var("AETHER_DRAIN_TIMEOUT_MS")
        .ok()
        .and_then(|s| s.parse::<u64>().ok())
        .map(Duration::from_millis)
        .unwrap_or(Duration::from_secs(5))
}

/// Assemble the kernel configuration from the environment.
pub fn kernel_config() -> KernelConfig {
    KernelConfig {
        state_dir: state_dir(),
        secret: signing_secret(),
        token_ttl_secs: token_expiry_secs(),
        max_concurrent: max_concurrent(),
        queue_limit: queue_limit(),
        slack_signing_secret: slack_signing_secret(),
    }
}

#[cfg(test)]
#[path = "env_tests.rs"]
mod tests;
