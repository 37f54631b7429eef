// SPDX-License-Identifier: MIT

//! Success/error envelopes: the fixed response contract.

use aether_core::{ErrorCode, KernelError};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Error payload inside the envelope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub code: ErrorCode,
    pub message: String,
}

/// Pagination metadata for list responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListMeta {
    pub total: usize,
    pub limit: usize,
    pub offset: usize,
}

/// The three response shapes. Serialized form is exactly
/// `{"data": T}`, `{"data": [T], "meta": {...}}`, or
/// `{"error": {"code": "...", "message": "..."}}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Envelope {
    Error { error: ErrorBody },
    List { data: Vec<Value>, meta: ListMeta },
    Data { data: Value },
}

impl Envelope {
    /// Wrap a single item.
    pub fn data<T: Serialize>(value: &T) -> Self {
        match serde_json::to_value(value) {
            Ok(data) => Envelope::Data { data },
            Err(err) => Envelope::error(ErrorCode::Fatal, format!("encode failed: {err}")),
        }
    }

    /// Wrap a page of items with pagination metadata.
    pub fn list<T: Serialize>(items: &[T], total: usize, limit: usize, offset: usize) -> Self {
        let data = items
            .iter()
            .map(|item| serde_json::to_value(item).unwrap_or(Value::Null))
            .collect();
        Envelope::List { data, meta: ListMeta { total, limit, offset } }
    }

    pub fn error(code: ErrorCode, message: impl Into<String>) -> Self {
        Envelope::Error { error: ErrorBody { code, message: message.into() } }
    }

    /// `{"data": {"ok": true}}` for operations with no natural payload.
    pub fn ok() -> Self {
        Envelope::Data { data: serde_json::json!({ "ok": true }) }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Envelope::Error { .. })
    }
}

impl From<KernelError> for Envelope {
    fn from(err: KernelError) -> Self {
        Envelope::error(err.code, err.message)
    }
}

#[cfg(test)]
#[path = "envelope_tests.rs"]
mod tests;
