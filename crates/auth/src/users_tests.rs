// SPDX-License-Identifier: MIT

use super::*;
use crate::core::{AuthConfig, AuthCore};
use aether_core::{Clock, ErrorCode, EventBus, FakeClock, Role};
use aether_storage::StateStore;

fn auth() -> AuthCore<FakeClock> {
    auth_with_bus().0
}

fn auth_with_bus() -> (AuthCore<FakeClock>, EventBus) {
    let bus = EventBus::new();
    let clock = aether_core::test_support::fixed_clock();
    let config = AuthConfig { secret: Some(b"test-secret".to_vec()), token_ttl_secs: 3600 };
    (AuthCore::new(StateStore::in_memory(), bus.clone(), clock, config), bus)
}

#[test]
fn bootstrap_creates_admin_once() {
    let auth = auth();
    let created = auth.bootstrap_admin().unwrap().unwrap();
    assert_eq!(created.username, BOOTSTRAP_ADMIN_USERNAME);
    assert_eq!(created.role, Role::Admin);

    // Second boot: users exist, nothing happens.
    assert!(auth.bootstrap_admin().unwrap().is_none());

    // The default credentials log in and yield a full token.
    let outcome = auth.authenticate(BOOTSTRAP_ADMIN_USERNAME, BOOTSTRAP_ADMIN_PASSWORD).unwrap();
    let AuthOutcome::Authenticated { user, token } = outcome else {
        panic!("expected full token");
    };
    assert_eq!(user.role, Role::Admin);
    assert!(auth.validate_token(&token).is_some());
}

#[test]
fn register_validates_inputs() {
    let auth = auth();
    assert_eq!(auth.register("a", "abcd", "").unwrap_err().code, ErrorCode::InvalidInput);
    assert_eq!(auth.register("ab", "abc", "").unwrap_err().code, ErrorCode::InvalidInput);
    let view = auth.register("ab", "abcd", "").unwrap();
    assert_eq!(view.username, "ab");
    assert_eq!(view.display_name, "ab");
}

#[test]
fn duplicate_username_conflicts() {
    let auth = auth();
    auth.register("alice", "passw0rd", "Alice").unwrap();
    assert_eq!(
        auth.register("alice", "other-pass", "").unwrap_err().code,
        ErrorCode::Conflict
    );
}

#[test]
fn authenticate_without_mfa_issues_full_token() {
    let auth = auth();
    auth.register("u1", "passw0rd", "").unwrap();
    let outcome = auth.authenticate("u1", "passw0rd").unwrap();
    let AuthOutcome::Authenticated { user, token } = outcome else {
        panic!("expected full token");
    };
    assert!(user.last_login_at_ms.is_some());
    let (resolved, claims) = auth.validate_token(&token).unwrap();
    assert_eq!(resolved.username, "u1");
    assert_eq!(claims.username.as_deref(), Some("u1"));
}

#[test]
fn bad_password_is_unauthorized() {
    let (auth, bus) = auth_with_bus();
    let failures = std::sync::Arc::new(parking_lot::Mutex::new(0u32));
    let f = failures.clone();
    let _sub = bus.subscribe("auth.failure", move |_| {
        *f.lock() += 1;
        Ok(())
    });

    auth.register("u1", "passw0rd", "").unwrap();
    let err = auth.authenticate("u1", "wrong").unwrap_err();
    assert_eq!(err.code, ErrorCode::Unauthorized);
    let err = auth.authenticate("ghost", "wrong").unwrap_err();
    assert_eq!(err.code, ErrorCode::Unauthorized);
    assert_eq!(*failures.lock(), 2);
}

#[test]
fn mfa_round_trip() {
    let auth = auth();
    let view = auth.register("u1", "passw0rd", "").unwrap();

    let setup = auth.setup_mfa(view.id.as_str()).unwrap();
    assert!(setup.otpauth_uri.contains("AetherOS:u1"));
    let secret = crate::totp::decode_secret(&setup.secret).unwrap();

    // Code confirms the pairing.
    let now = aether_core::test_support::fixed_clock().epoch_secs();
    let code = crate::totp::code_now(&secret, now);
    assert!(auth.enable_mfa(view.id.as_str(), &code).unwrap());

    // First step now demands the second factor.
    let outcome = auth.authenticate("u1", "passw0rd").unwrap();
    let AuthOutcome::MfaRequired { mfa_required, mfa_token } = outcome else {
        panic!("expected MFA step");
    };
    assert!(mfa_required);

    // The step-up token is not accepted as a session token.
    assert!(auth.validate_token(&mfa_token).is_none());

    // Fresh code completes login.
    let code = crate::totp::code_now(&secret, now);
    let outcome = auth.authenticate_mfa(&mfa_token, &code).unwrap();
    let AuthOutcome::Authenticated { token, .. } = outcome else {
        panic!("expected full token");
    };
    assert!(auth.validate_token(&token).is_some());
}

#[test]
fn wrong_totp_code_rejected() {
    let auth = auth();
    let view = auth.register("u1", "passw0rd", "").unwrap();
    let setup = auth.setup_mfa(view.id.as_str()).unwrap();
    let secret = crate::totp::decode_secret(&setup.secret).unwrap();
    let now = aether_core::test_support::fixed_clock().epoch_secs();
    auth.enable_mfa(view.id.as_str(), &crate::totp::code_now(&secret, now)).unwrap();

    let AuthOutcome::MfaRequired { mfa_token, .. } =
        auth.authenticate("u1", "passw0rd").unwrap()
    else {
        panic!("expected MFA step");
    };
    let err = auth.authenticate_mfa(&mfa_token, "000000").unwrap_err();
    assert_eq!(err.code, ErrorCode::Unauthorized);
}

#[test]
fn full_token_is_not_an_mfa_token() {
    let auth = auth();
    auth.register("u1", "passw0rd", "").unwrap();
    let AuthOutcome::Authenticated { token, .. } = auth.authenticate("u1", "passw0rd").unwrap()
    else {
        panic!("expected full token");
    };
    let err = auth.authenticate_mfa(&token, "123456").unwrap_err();
    assert_eq!(err.code, ErrorCode::Unauthorized);
}

#[test]
fn disable_mfa_clears_secret_and_flag() {
    let auth = auth();
    let view = auth.register("u1", "passw0rd", "").unwrap();
    let setup = auth.setup_mfa(view.id.as_str()).unwrap();
    let secret = crate::totp::decode_secret(&setup.secret).unwrap();
    let now = aether_core::test_support::fixed_clock().epoch_secs();
    auth.enable_mfa(view.id.as_str(), &crate::totp::code_now(&secret, now)).unwrap();

    auth.disable_mfa(view.id.as_str()).unwrap();
    let user = auth.get_user(view.id.as_str()).unwrap();
    assert!(!user.mfa_enabled);
    assert!(user.mfa_secret.is_none());

    // Login is single-step again.
    assert!(matches!(
        auth.authenticate("u1", "passw0rd").unwrap(),
        AuthOutcome::Authenticated { .. }
    ));
}

#[test]
fn expired_token_is_rejected() {
    let bus = EventBus::new();
    let clock = aether_core::test_support::fixed_clock();
    let config = AuthConfig { secret: Some(b"s".to_vec()), token_ttl_secs: 60 };
    let auth = AuthCore::new(StateStore::in_memory(), bus, clock.clone(), config);

    auth.register("u1", "passw0rd", "").unwrap();
    let AuthOutcome::Authenticated { token, .. } = auth.authenticate("u1", "passw0rd").unwrap()
    else {
        panic!("expected full token");
    };
    assert!(auth.validate_token(&token).is_some());
    clock.advance(std::time::Duration::from_secs(61));
    assert!(auth.validate_token(&token).is_none());
}

#[test]
fn deleted_user_token_is_rejected() {
    let auth = auth();
    let view = auth.register("u1", "passw0rd", "").unwrap();
    let AuthOutcome::Authenticated { token, .. } = auth.authenticate("u1", "passw0rd").unwrap()
    else {
        panic!("expected full token");
    };
    auth.delete_user(view.id.as_str()).unwrap();
    assert!(auth.validate_token(&token).is_none());
}
