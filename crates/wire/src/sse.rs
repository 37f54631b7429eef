// SPDX-License-Identifier: MIT

//! SSE framing for event streams.
//!
//! Each frame is `"data: " + JSON + "\n\n"`. The first frame after
//! accept is the `connected` heartbeat.

use serde_json::Value;

pub const CONTENT_TYPE: &str = "text/event-stream";

/// One SSE frame for an event payload.
pub fn frame(event: &Value) -> Vec<u8> {
    let mut out = b"data: ".to_vec();
    out.extend_from_slice(event.to_string().as_bytes());
    out.extend_from_slice(b"\n\n");
    out
}

/// The `{"type":"connected"}` heartbeat sent on accept.
pub fn connected_frame() -> Vec<u8> {
    frame(&serde_json::json!({ "type": "connected" }))
}
