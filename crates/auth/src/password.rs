// SPDX-License-Identifier: MIT

//! Password hashing and input validation.
//!
//! Store format is `"<hex-salt>:<hex-scrypt>"` with a 16-byte random
//! salt and a 64-byte scrypt digest (N=2^14, r=8, p=1). Verification is
//! constant-time over the derived digest.

use aether_core::KernelError;
use data_encoding::HEXLOWER;
use rand::RngCore;
use subtle::ConstantTimeEq;

/// Intentionally low; deployment policy belongs outside the core.
pub const MIN_PASSWORD_LEN: usize = 4;
pub const MIN_USERNAME_LEN: usize = 2;

const SALT_LEN: usize = 16;
const DIGEST_LEN: usize = 64;
const SCRYPT_LOG_N: u8 = 14;
const SCRYPT_R: u32 = 8;
const SCRYPT_P: u32 = 1;

/// Usernames: `[A-Za-z0-9_-]`, at least two characters.
pub fn validate_username(username: &str) -> Result<(), KernelError> {
    if username.len() < MIN_USERNAME_LEN {
        return Err(KernelError::invalid_input(format!(
            "username must be at least {MIN_USERNAME_LEN} characters"
        )));
    }
    if !username.bytes().all(|b| b.is_ascii_alphanumeric() || b == b'_' || b == b'-') {
        return Err(KernelError::invalid_input(
            "username may only contain letters, digits, '_' and '-'",
        ));
    }
    Ok(())
}

pub fn validate_password(password: &str) -> Result<(), KernelError> {
    if password.len() < MIN_PASSWORD_LEN {
        return Err(KernelError::invalid_input(format!(
            "password must be at least {MIN_PASSWORD_LEN} characters"
        )));
    }
    Ok(())
}

fn params() -> Result<scrypt::Params, KernelError> {
    scrypt::Params::new(SCRYPT_LOG_N, SCRYPT_R, SCRYPT_P, DIGEST_LEN)
        .map_err(|e| KernelError::fatal(format!("invalid scrypt params: {e}")))
}

fn derive(password: &str, salt: &[u8]) -> Result<[u8; DIGEST_LEN], KernelError> {
    let mut out = [0u8; DIGEST_LEN];
    scrypt::scrypt(password.as_bytes(), salt, &params()?, &mut out)
        .map_err(|e| KernelError::fatal(format!("scrypt failed: {e}")))?;
    Ok(out)
}

/// Hash a password with a fresh random salt.
pub fn hash_password(password: &str) -> Result<String, KernelError> {
    let mut salt = [0u8; SALT_LEN];
    rand::rng().fill_bytes(&mut salt);
    let digest = derive(password, &salt)?;
    Ok(format!("{}:{}", HEXLOWER.encode(&salt), HEXLOWER.encode(&digest)))
}

/// Verify a password against a stored `salt:digest` string.
///
/// Malformed stored values verify false rather than erroring: a
/// corrupt row must not distinguish itself from a wrong password.
pub fn verify_password(password: &str, stored: &str) -> bool {
    let Some((salt_hex, digest_hex)) = stored.split_once(':') else {
        return false;
    };
    let Ok(salt) = HEXLOWER.decode(salt_hex.as_bytes()) else {
        return false;
    };
    let Ok(expected) = HEXLOWER.decode(digest_hex.as_bytes()) else {
        return false;
    };
    let Ok(derived) = derive(password, &salt) else {
        return false;
    };
    if expected.len() != derived.len() {
        return false;
    }
    expected.ct_eq(&derived).into()
}

#[cfg(test)]
#[path = "password_tests.rs"]
mod tests;
