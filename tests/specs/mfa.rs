//! MFA round-trip spec: setup → enable → two-step login.

use crate::prelude::*;
use aether_auth::totp;

#[test]
fn mfa_round_trip_over_the_wire() {
    let kernel = test_kernel();
    let (_, token) = register_and_login(&kernel, "u1", "passw0rd");

    // Setup: secret + provisioning URI naming the account.
    let body = respond(&kernel, RequestFrame::with_token(token.clone(), Request::MfaSetup));
    let secret_b32 = body["data"]["secret"].as_str().unwrap().to_string();
    let uri = body["data"]["otpauth_uri"].as_str().unwrap();
    assert!(uri.contains("AetherOS:u1"), "got {uri}");
    let secret = totp::decode_secret(&secret_b32).unwrap();

    // Enable with a current code.
    let now = fixed_clock().epoch_secs();
    let code = totp::code_now(&secret, now);
    let body = respond(&kernel, RequestFrame::with_token(token, Request::MfaEnable { code }));
    assert_eq!(body["data"]["enabled"], true);

    // Step 1: password alone yields only the step-up token.
    let body = respond(
        &kernel,
        RequestFrame::bare(Request::Authenticate {
            username: "u1".to_string(),
            password: "passw0rd".to_string(),
        }),
    );
    assert_eq!(body["data"]["mfa_required"], true);
    let mfa_token = body["data"]["mfa_token"].as_str().unwrap().to_string();
    assert!(body["data"].get("token").is_none());

    // The step-up token is not a session token.
    assert!(kernel.auth.validate_token(&mfa_token).is_none());

    // Step 2: fresh code completes the login.
    let code = totp::code_now(&secret, now);
    let body = respond(
        &kernel,
        RequestFrame::bare(Request::AuthenticateMfa { mfa_token, code }),
    );
    let full = body["data"]["token"].as_str().unwrap();
    let (user, _) = kernel.auth.validate_token(full).expect("full token validates");
    assert_eq!(user.username, "u1");
}

#[test]
fn wrong_code_fails_step_two() {
    let kernel = test_kernel();
    let (user_id, token) = register_and_login(&kernel, "u1", "passw0rd");

    let body = respond(&kernel, RequestFrame::with_token(token.clone(), Request::MfaSetup));
    let secret = totp::decode_secret(body["data"]["secret"].as_str().unwrap()).unwrap();
    let now = fixed_clock().epoch_secs();
    respond(
        &kernel,
        RequestFrame::with_token(token, Request::MfaEnable { code: totp::code_now(&secret, now) }),
    );

    let body = respond(
        &kernel,
        RequestFrame::bare(Request::Authenticate {
            username: "u1".to_string(),
            password: "passw0rd".to_string(),
        }),
    );
    let mfa_token = body["data"]["mfa_token"].as_str().unwrap().to_string();

    let body = respond(
        &kernel,
        RequestFrame::bare(Request::AuthenticateMfa {
            mfa_token,
            code: "000000".to_string(),
        }),
    );
    assert_eq!(body["error"]["code"], "UNAUTHORIZED");

    // The secret is still paired with the user.
    let user = kernel.store.get_user(&user_id).unwrap();
    assert!(user.mfa_enabled);
    assert!(user.mfa_secret.is_some());
}
