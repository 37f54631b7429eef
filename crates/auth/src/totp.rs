// SPDX-License-Identifier: MIT

//! TOTP second factor per RFC 6238 (HMAC-SHA1, 6 digits, 30s period).
//!
//! Secrets are 20 random bytes, Base32-encoded (RFC 4648, uppercase, no
//! padding) for provisioning. Verification tolerates one time-step of
//! clock drift in either direction.

use data_encoding::BASE32_NOPAD;
use hmac::{Hmac, Mac};
use rand::RngCore;
use sha1::Sha1;

pub const TOTP_PERIOD_SECS: u64 = 30;
pub const TOTP_DIGITS: u32 = 6;
const SECRET_LEN: usize = 20;
const ISSUER: &str = "AetherOS";

/// Fresh 20-byte TOTP secret.
pub fn generate_secret() -> [u8; SECRET_LEN] {
    let mut secret = [0u8; SECRET_LEN];
    rand::rng().fill_bytes(&mut secret);
    secret
}

/// Base32 (no padding, uppercase) encoding for provisioning.
pub fn encode_secret(secret: &[u8]) -> String {
    BASE32_NOPAD.encode(secret)
}

/// Decode a provisioning string back to raw bytes.
pub fn decode_secret(encoded: &str) -> Option<Vec<u8>> {
    BASE32_NOPAD.decode(encoded.as_bytes()).ok()
}

/// The otpauth:// provisioning URI for authenticator apps.
pub fn otpauth_uri(username: &str, secret_b32: &str) -> String {
    format!(
        "otpauth://totp/{ISSUER}:{}?secret={secret_b32}&issuer={ISSUER}\
         &algorithm=SHA1&digits={TOTP_DIGITS}&period={TOTP_PERIOD_SECS}",
        percent_encode(username)
    )
}

/// Six-digit code for one counter value (RFC 4226 dynamic truncation).
pub fn code_at(secret: &[u8], counter: u64) -> String {
    let mut mac = match Hmac::<Sha1>::new_from_slice(secret) {
        Ok(mac) => mac,
        Err(_) => unreachable!("HMAC accepts any key length"),
    };
    mac.update(&counter.to_be_bytes());
    let digest = mac.finalize().into_bytes();

    let offset = (digest[digest.len() - 1] & 0x0f) as usize;
    let bin = (u32::from(digest[offset] & 0x7f) << 24)
        | (u32::from(digest[offset + 1]) << 16)
        | (u32::from(digest[offset + 2]) << 8)
        | u32::from(digest[offset + 3]);
    let code = bin % 10u32.pow(TOTP_DIGITS);
    format!("{code:06}")
}

/// Code for the current wall-clock time step.
pub fn code_now(secret: &[u8], now_secs: u64) -> String {
    code_at(secret, now_secs / TOTP_PERIOD_SECS)
}

/// Verify a submitted code at T−1, T, or T+1.
pub fn verify_code(secret: &[u8], code: &str, now_secs: u64) -> bool {
    if code.len() != TOTP_DIGITS as usize || !code.bytes().all(|b| b.is_ascii_digit()) {
        return false;
    }
    let t = now_secs / TOTP_PERIOD_SECS;
    [t.wrapping_sub(1), t, t + 1]
        .into_iter()
        .any(|counter| code_at(secret, counter) == code)
}

/// Minimal percent-encoding for the URI label (RFC 3986 unreserved
/// characters pass through).
fn percent_encode(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for b in s.bytes() {
        if b.is_ascii_alphanumeric() || matches!(b, b'-' | b'_' | b'.' | b'~') {
            out.push(b as char);
        } else {
            out.push_str(&format!("%{b:02X}"));
        }
    }
    out
}

#[cfg(test)]
#[path = "totp_tests.rs"]
mod tests;
