// SPDX-License-Identifier: MIT

//! Append-only write-ahead log of store operations.
//!
//! One JSON object per line: `{"seq": N, "op": {...}}`. A torn final
//! line (crash mid-write) is dropped on replay with a warning; anything
//! malformed before the final line is corruption and fails open.

use crate::error::StorageError;
use crate::state::StoreOp;
use serde::{Deserialize, Serialize};
use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use tracing::warn;

/// One durable WAL record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WalEntry {
    pub seq: u64,
    pub op: StoreOp,
}

/// Append-only log handle. Not thread-safe; callers serialize access.
#[derive(Debug)]
pub struct Wal {
    file: File,
    path: PathBuf,
    next_seq: u64,
}

impl Wal {
    /// Open (creating if absent) and replay all entries with
    /// `seq > after_seq`. Returns the handle positioned for append.
    pub fn open(path: &Path, after_seq: u64) -> Result<(Self, Vec<WalEntry>), StorageError> {
        let mut entries = Vec::new();
        let mut next_seq = after_seq + 1;

        if path.exists() {
            let reader = BufReader::new(File::open(path)?);
            let mut lines = reader.lines().enumerate().peekable();
            while let Some((idx, line)) = lines.next() {
                let line = line?;
                if line.is_empty() {
                    continue;
                }
                match serde_json::from_str::<WalEntry>(&line) {
                    Ok(entry) => {
                        if entry.seq >= next_seq {
                            next_seq = entry.seq + 1;
                        }
                        if entry.seq > after_seq {
                            entries.push(entry);
                        }
                    }
                    Err(err) if lines.peek().is_none() => {
                        // Torn tail from a crash mid-append; recoverable.
                        warn!(line = idx + 1, error = %err, "dropping torn WAL tail");
                    }
                    Err(err) => {
                        return Err(StorageError::Corrupt {
                            line: idx + 1,
                            detail: err.to_string(),
                        });
                    }
                }
            }
        }

        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok((Self { file, path: path.to_path_buf(), next_seq }, entries))
    }

    /// Append one op and fsync. Returns the assigned sequence number.
    ///
    /// Durability point: when this returns Ok, the record survives
    /// restart.
    pub fn append(&mut self, op: &StoreOp) -> Result<u64, StorageError> {
        let seq = self.next_seq;
        let entry = WalEntry { seq, op: op.clone() };
        let mut line = serde_json::to_vec(&entry)?;
        line.push(b'\n');
        self.file.write_all(&line)?;
        self.file.sync_data()?;
        self.next_seq = seq + 1;
        Ok(seq)
    }

    /// Sequence number of the last appended entry (0 if none).
    pub fn last_seq(&self) -> u64 {
        self.next_seq - 1
    }

    /// Discard all entries after a snapshot has captured them. Sequence
    /// numbers keep increasing across truncation.
    pub fn truncate(&mut self) -> Result<(), StorageError> {
        self.file = OpenOptions::new().create(true).write(true).truncate(true).open(&self.path)?;
        self.file.sync_data()?;
        // Reopen in append mode for subsequent writes.
        self.file = OpenOptions::new().append(true).open(&self.path)?;
        Ok(())
    }
}

#[cfg(test)]
#[path = "wal_tests.rs"]
mod tests;
