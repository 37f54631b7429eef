// SPDX-License-Identifier: MIT

//! Closed error taxonomy shared by every subsystem.
//!
//! Errors carry a stable machine-readable [`ErrorCode`] plus a human
//! message. The code is what crosses the wire; the message never
//! participates in control flow.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Stable error codes surfaced in the RPC error envelope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// Malformed request, missing field, pattern violation.
    InvalidInput,
    /// Referenced entity absent.
    NotFound,
    /// Policy or ownership denial.
    Forbidden,
    /// Operation not valid in the current lifecycle state.
    InvalidState,
    /// Duplicate username / org name.
    Conflict,
    /// Too many operations from a subject.
    RateLimit,
    /// Upstream integration or persistence hiccup; idempotent callers may retry.
    Transient,
    /// Invariant violation. Not recoverable in place.
    Fatal,
    /// Missing or invalid bearer token.
    Unauthorized,
    /// Inbound callback signature did not verify.
    InvalidSignature,
}

impl ErrorCode {
    /// HTTP status the boundary maps this code to.
    pub fn http_status(self) -> u16 {
        match self {
            ErrorCode::InvalidInput => 400,
            ErrorCode::Unauthorized | ErrorCode::InvalidSignature => 401,
            ErrorCode::Forbidden => 403,
            ErrorCode::NotFound => 404,
            ErrorCode::InvalidState | ErrorCode::Conflict => 409,
            ErrorCode::RateLimit => 429,
            ErrorCode::Transient | ErrorCode::Fatal => 500,
        }
    }
}

crate::simple_display! {
    ErrorCode {
        InvalidInput => "INVALID_INPUT",
        NotFound => "NOT_FOUND",
        Forbidden => "FORBIDDEN",
        InvalidState => "INVALID_STATE",
        Conflict => "CONFLICT",
        RateLimit => "RATE_LIMIT",
        Transient => "TRANSIENT",
        Fatal => "FATAL",
        Unauthorized => "UNAUTHORIZED",
        InvalidSignature => "INVALID_SIGNATURE",
    }
}

/// Error carrier used across subsystem boundaries.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[error("{code}: {message}")]
pub struct KernelError {
    pub code: ErrorCode,
    pub message: String,
}

impl KernelError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self { code, message: message.into() }
    }

    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidInput, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::NotFound, message)
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::Forbidden, message)
    }

    pub fn invalid_state(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidState, message)
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::Conflict, message)
    }

    pub fn transient(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::Transient, message)
    }

    pub fn fatal(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::Fatal, message)
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::Unauthorized, message)
    }
}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
