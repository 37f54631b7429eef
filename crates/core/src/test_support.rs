// SPDX-License-Identifier: MIT

//! Shared helpers for tests in this crate and downstream crates.
//!
//! Only compiled under `cfg(test)` or the `test-support` feature.

use crate::clock::FakeClock;
use crate::process::ProcessConfig;

/// A fake clock pinned to a known epoch (2025-01-01T00:00:00Z).
pub fn fixed_clock() -> FakeClock {
    let clock = FakeClock::new();
    clock.set_epoch_ms(1_735_689_600_000);
    clock
}

/// Minimal spawn config for table tests.
pub fn spawn_config(name: &str) -> ProcessConfig {
    ProcessConfig {
        name: name.to_string(),
        role: "worker".to_string(),
        goal: format!("{name} goal"),
        ..ProcessConfig::default()
    }
}

#[cfg(feature = "proptest")]
pub mod strategies {
    use proptest::prelude::*;

    /// Dotted event subjects: 1-4 segments of lowercase alphanumerics.
    pub fn subject() -> impl Strategy<Value = String> {
        proptest::collection::vec("[a-z][a-z0-9]{0,7}", 1..=4).prop_map(|segs| segs.join("."))
    }

    /// Arbitrary byte vectors for codec round-trips.
    pub fn bytes() -> impl Strategy<Value = Vec<u8>> {
        proptest::collection::vec(any::<u8>(), 0..64)
    }
}
