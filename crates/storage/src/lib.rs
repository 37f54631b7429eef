// SPDX-License-Identifier: MIT

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! aether-storage: durable state for the Aether kernel.
//!
//! Layout mirrors a write-ahead log with periodic snapshots: every row
//! mutation is a typed [`StoreOp`] appended (and fsynced) to the WAL
//! before it is applied to the in-memory [`StoreState`]; startup loads
//! the latest snapshot and replays the WAL tail. The [`StateStore`]
//! facade is the only surface other crates touch.

mod error;
mod snapshot;
mod state;
mod store;
mod wal;

pub use error::StorageError;
pub use snapshot::{load_snapshot, write_snapshot, Snapshot, CURRENT_SNAPSHOT_VERSION};
pub use state::{StoreOp, StoreState};
pub use store::StateStore;
pub use wal::{Wal, WalEntry};
