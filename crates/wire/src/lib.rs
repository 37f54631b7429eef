// SPDX-License-Identifier: MIT

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! aether-wire: the daemon's IPC protocol.
//!
//! Wire format: 4-byte length prefix (big-endian) + JSON payload.
//! Responses are the fixed kernel envelopes (`{data}`, `{data, meta}`,
//! `{error: {code, message}}`) plus a version field. Event streams use
//! SSE framing instead of length prefixes.

mod envelope;
mod request;
mod response;
pub mod sse;
mod wire;

pub use envelope::{Envelope, ErrorBody, ListMeta};
pub use request::{Request, RequestFrame};
pub use response::ResponseFrame;
pub use wire::{decode, encode, read_frame, write_frame, ProtocolError, MAX_FRAME_LEN};
