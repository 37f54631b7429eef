// SPDX-License-Identifier: MIT

//! State snapshots: zstd-compressed JSON, written atomically.
//!
//! A snapshot captures the full [`StoreState`] plus the WAL sequence it
//! covers; startup loads the snapshot then replays only newer WAL
//! entries.

use crate::error::StorageError;
use crate::state::StoreState;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Bump when the snapshot schema changes incompatibly.
pub const CURRENT_SNAPSHOT_VERSION: u32 = 1;

const SNAPSHOT_FILE: &str = "state.snapshot.zst";

/// A point-in-time capture of all durable tables.
#[derive(Debug, Serialize, Deserialize)]
pub struct Snapshot {
    pub version: u32,
    /// Last WAL sequence number folded into `state`.
    pub wal_seq: u64,
    pub state: StoreState,
}

/// Write a snapshot to `dir` atomically (tmp + rename).
pub fn write_snapshot(dir: &Path, snapshot: &Snapshot) -> Result<(), StorageError> {
    let json = serde_json::to_vec(snapshot)?;
    let compressed = zstd::stream::encode_all(json.as_slice(), 3)?;
    let tmp = dir.join(format!("{SNAPSHOT_FILE}.tmp"));
    fs::write(&tmp, compressed)?;
    fs::rename(&tmp, dir.join(SNAPSHOT_FILE))?;
    Ok(())
}

/// Load the snapshot from `dir`, if one exists. Secondary indexes are
/// rebuilt before returning.
pub fn load_snapshot(dir: &Path) -> Result<Option<Snapshot>, StorageError> {
    let path = dir.join(SNAPSHOT_FILE);
    if !path.exists() {
        return Ok(None);
    }
    let compressed = fs::read(&path)?;
    let json = zstd::stream::decode_all(compressed.as_slice())?;
    let mut snapshot: Snapshot = serde_json::from_slice(&json)?;
    if snapshot.version > CURRENT_SNAPSHOT_VERSION {
        return Err(StorageError::SnapshotVersion {
            found: snapshot.version,
            current: CURRENT_SNAPSHOT_VERSION,
        });
    }
    snapshot.state.reindex();
    Ok(Some(snapshot))
}

#[cfg(test)]
#[path = "snapshot_tests.rs"]
mod tests;
