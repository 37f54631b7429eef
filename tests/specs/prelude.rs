//! Shared fixtures for the integration specs.

#![allow(dead_code)]

pub use aether_core::test_support::{fixed_clock, spawn_config};
pub use aether_core::{Clock, FakeClock};
pub use aether_daemon::{dispatch, DispatchOutcome, Kernel, KernelConfig};
pub use aether_wire::{Request, RequestFrame};
pub use serde_json::Value;

/// In-memory kernel with a fixed clock and known secrets.
pub fn test_kernel() -> Kernel<FakeClock> {
    kernel_with(|_| {})
}

/// In-memory kernel with config tweaks applied before start.
pub fn kernel_with(tweak: impl FnOnce(&mut KernelConfig)) -> Kernel<FakeClock> {
    let mut config = KernelConfig {
        state_dir: None,
        secret: Some(b"spec-secret".to_vec()),
        token_ttl_secs: 3_600,
        max_concurrent: 8,
        queue_limit: 16,
        slack_signing_secret: Some("8f742231b10e8888abcd99yyyzzz85a5".to_string()),
    };
    tweak(&mut config);
    Kernel::start(config, fixed_clock()).expect("kernel start")
}

/// Dispatch a request and return the serialized envelope.
pub fn respond(kernel: &Kernel<FakeClock>, frame: RequestFrame) -> Value {
    match dispatch(kernel, &frame) {
        DispatchOutcome::Respond(envelope) => {
            serde_json::to_value(&envelope).expect("envelope encodes")
        }
        other => panic!("expected a response, got {other:?}"),
    }
}

/// Register a user over the wire and log in; returns `(user_id, token)`.
pub fn register_and_login(kernel: &Kernel<FakeClock>, username: &str, password: &str) -> (String, String) {
    let body = respond(
        kernel,
        RequestFrame::bare(Request::Register {
            username: username.to_string(),
            password: password.to_string(),
            display_name: String::new(),
        }),
    );
    let user_id = body["data"]["id"].as_str().expect("user id").to_string();

    let body = respond(
        kernel,
        RequestFrame::bare(Request::Authenticate {
            username: username.to_string(),
            password: password.to_string(),
        }),
    );
    let token = body["data"]["token"].as_str().expect("token").to_string();
    (user_id, token)
}

/// Log in as the bootstrap admin.
pub fn admin_token(kernel: &Kernel<FakeClock>) -> String {
    let body = respond(
        kernel,
        RequestFrame::bare(Request::Authenticate {
            username: aether_auth::BOOTSTRAP_ADMIN_USERNAME.to_string(),
            password: aether_auth::BOOTSTRAP_ADMIN_PASSWORD.to_string(),
        }),
    );
    body["data"]["token"].as_str().expect("admin token").to_string()
}
