// SPDX-License-Identifier: MIT

//! Inbound webhook signature verification (Slack v0 scheme).
//!
//! `v0=` + lowercase hex of HMAC-SHA256 over `"v0:<timestamp>:<body>"`.
//! Comparison is length-equal and constant-time.

use data_encoding::HEXLOWER;
use hmac::{Hmac, Mac};
use sha2::Sha256;
use subtle::ConstantTimeEq;

const VERSION: &str = "v0";

/// Compute the expected signature header value for a request.
pub fn slack_signature(signing_secret: &str, timestamp: &str, body: &str) -> String {
    let mut mac = match Hmac::<Sha256>::new_from_slice(signing_secret.as_bytes()) {
        Ok(mac) => mac,
        Err(_) => unreachable!("HMAC accepts any key length"),
    };
    mac.update(format!("{VERSION}:{timestamp}:{body}").as_bytes());
    format!("{VERSION}={}", HEXLOWER.encode(&mac.finalize().into_bytes()))
}

/// Verify a presented signature against the recomputed one.
pub fn verify_slack_signature(
    signing_secret: &str,
    timestamp: &str,
    body: &str,
    presented: &str,
) -> bool {
    let expected = slack_signature(signing_secret, timestamp, body);
    if expected.len() != presented.len() {
        return false;
    }
    expected.as_bytes().ct_eq(presented.as_bytes()).into()
}

/// Extract the URL-verification challenge from a webhook body, if this
/// is a challenge request. The caller echoes `{"challenge": ...}`.
pub fn challenge_response(body: &str) -> Option<serde_json::Value> {
    let parsed: serde_json::Value = serde_json::from_str(body).ok()?;
    if parsed.get("type").and_then(|t| t.as_str()) != Some("url_verification") {
        return None;
    }
    let challenge = parsed.get("challenge")?.clone();
    Some(serde_json::json!({ "challenge": challenge }))
}

#[cfg(test)]
#[path = "signature_tests.rs"]
mod tests;
