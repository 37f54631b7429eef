// SPDX-License-Identifier: MIT

//! Bearer tokens: three dot-separated base64url segments signed with
//! HMAC-SHA256.
//!
//! The header is the fixed string `{"alg":"HS256","typ":"JWT"}`. Full
//! tokens carry `{sub, username, role, iat, exp}`; MFA step-up tokens
//! carry `{sub, purpose: "mfa", iat, exp}` with a five-minute TTL.
//! Verification fails closed: wrong segment count, signature mismatch,
//! malformed claims, or expiry all yield `None`.

use aether_core::{KernelError, Role, User, UserId};
use data_encoding::BASE64URL_NOPAD;
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use subtle::ConstantTimeEq;

const HEADER_JSON: &str = r#"{"alg":"HS256","typ":"JWT"}"#;

/// TTL for MFA step-up tokens.
pub const MFA_TOKEN_TTL_SECS: u64 = 300;

/// Marker carried in the `purpose` claim of step-up tokens.
pub const PURPOSE_MFA: &str = "mfa";

/// Token claims. Optional fields are omitted from the wire form when
/// absent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<Role>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub purpose: Option<String>,
    pub iat: u64,
    pub exp: u64,
}

impl Claims {
    /// Claims for a full session token.
    pub fn full(user: &User, now_secs: u64, ttl_secs: u64) -> Self {
        Self {
            sub: user.id.to_string(),
            username: Some(user.username.clone()),
            role: Some(user.role),
            purpose: None,
            iat: now_secs,
            exp: now_secs + ttl_secs,
        }
    }

    /// Claims for an MFA step-up token (password verified, second
    /// factor pending).
    pub fn mfa(user_id: UserId, now_secs: u64) -> Self {
        Self {
            sub: user_id.to_string(),
            username: None,
            role: None,
            purpose: Some(PURPOSE_MFA.to_string()),
            iat: now_secs,
            exp: now_secs + MFA_TOKEN_TTL_SECS,
        }
    }

    pub fn is_mfa(&self) -> bool {
        self.purpose.as_deref() == Some(PURPOSE_MFA)
    }
}

fn sign(data: &[u8], secret: &[u8]) -> Vec<u8> {
    // HMAC accepts keys of any length; new_from_slice cannot fail.
    let mut mac = match Hmac::<Sha256>::new_from_slice(secret) {
        Ok(mac) => mac,
        Err(_) => unreachable!("HMAC accepts any key length"),
    };
    mac.update(data);
    mac.finalize().into_bytes().to_vec()
}

/// Encode and sign claims into the three-segment wire form.
pub fn create_token(claims: &Claims, secret: &[u8]) -> Result<String, KernelError> {
    let header = BASE64URL_NOPAD.encode(HEADER_JSON.as_bytes());
    let body = BASE64URL_NOPAD.encode(
        &serde_json::to_vec(claims)
            .map_err(|e| KernelError::fatal(format!("claims encode: {e}")))?,
    );
    let signing_input = format!("{header}.{body}");
    let sig = BASE64URL_NOPAD.encode(&sign(signing_input.as_bytes(), secret));
    Ok(format!("{signing_input}.{sig}"))
}

/// Verify a token and return its claims, or `None` if anything about it
/// is wrong. Expiry is a pure `now > exp` check.
pub fn verify_token(token: &str, secret: &[u8], now_secs: u64) -> Option<Claims> {
    let mut segments = token.split('.');
    let (header, body, sig) = (segments.next()?, segments.next()?, segments.next()?);
    if segments.next().is_some() {
        return None;
    }

    let signing_input = format!("{header}.{body}");
    let expected = sign(signing_input.as_bytes(), secret);
    let provided = BASE64URL_NOPAD.decode(sig.as_bytes()).ok()?;
    if provided.len() != expected.len() {
        return None;
    }
    let matches: bool = provided.ct_eq(&expected).into();
    if !matches {
        return None;
    }

    let claims: Claims = serde_json::from_slice(&BASE64URL_NOPAD.decode(body.as_bytes()).ok()?)
        .ok()?;
    if now_secs > claims.exp {
        return None;
    }
    Some(claims)
}

#[cfg(test)]
#[path = "token_tests.rs"]
mod tests;
