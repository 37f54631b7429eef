// SPDX-License-Identifier: MIT

use aether_core::{ErrorCode, KernelError};
use thiserror::Error;

/// Errors from the WAL / snapshot machinery.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("encode error: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("snapshot version {found} unsupported (current {current})")]
    SnapshotVersion { found: u32, current: u32 },

    #[error("WAL corrupt at line {line}: {detail}")]
    Corrupt { line: usize, detail: String },
}

impl From<StorageError> for KernelError {
    fn from(err: StorageError) -> Self {
        let code = match err {
            StorageError::SnapshotVersion { .. } | StorageError::Corrupt { .. } => {
                ErrorCode::Fatal
            }
            _ => ErrorCode::Transient,
        };
        KernelError::new(code, err.to_string())
    }
}
