// SPDX-License-Identifier: MIT

use super::*;
use yare::parameterized;

#[test]
fn hash_and_verify_roundtrip() {
    let stored = hash_password("passw0rd").unwrap();
    assert!(verify_password("passw0rd", &stored));
    assert!(!verify_password("password", &stored));
}

#[test]
fn stored_format_is_salt_colon_digest() {
    let stored = hash_password("secret").unwrap();
    let (salt, digest) = stored.split_once(':').unwrap();
    assert_eq!(salt.len(), 32); // 16 bytes hex
    assert_eq!(digest.len(), 128); // 64 bytes hex
}

#[test]
fn same_password_gets_distinct_salts() {
    let a = hash_password("secret").unwrap();
    let b = hash_password("secret").unwrap();
    assert_ne!(a, b);
    assert!(verify_password("secret", &a));
    assert!(verify_password("secret", &b));
}

#[parameterized(
    empty = { "" },
    no_colon = { "deadbeef" },
    bad_hex = { "zz:zz" },
    truncated = { "aabb:" },
)]
fn malformed_stored_values_verify_false(stored: &str) {
    assert!(!verify_password("anything", stored));
}

#[parameterized(
    one_char = { "a", false },
    two_chars = { "ab", true },
    with_dash = { "a-b_c9", true },
    with_space = { "a b", false },
    with_dot = { "a.b", false },
)]
fn username_validation(username: &str, ok: bool) {
    assert_eq!(validate_username(username).is_ok(), ok, "username {username:?}");
}

#[parameterized(
    three_chars = { "abc", false },
    four_chars = { "abcd", true },
)]
fn password_validation(password: &str, ok: bool) {
    assert_eq!(validate_password(password).is_ok(), ok);
}
