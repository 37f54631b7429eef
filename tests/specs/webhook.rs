//! Webhook signature spec: canonical Slack-style verification at the
//! boundary.

use crate::prelude::*;
use aether_auth::signature::slack_signature;

const SECRET: &str = "8f742231b10e8888abcd99yyyzzz85a5";

fn webhook(timestamp: &str, signature: String, body: &str) -> RequestFrame {
    RequestFrame::bare(Request::SlackWebhook {
        timestamp: timestamp.to_string(),
        signature,
        body: body.to_string(),
    })
}

#[test]
fn valid_signature_passes_and_emits() {
    let kernel = test_kernel();
    let seen = std::sync::Arc::new(parking_lot::Mutex::new(0u32));
    let sink = seen.clone();
    let _sub = kernel.bus.subscribe("slack.event", move |_| {
        *sink.lock() += 1;
        Ok(())
    });

    let body = r#"{"type":"event_callback","event":{"type":"message","text":"hi"}}"#;
    let sig = slack_signature(SECRET, "1531420618", body);
    let response = respond(&kernel, webhook("1531420618", sig, body));
    assert!(response.get("error").is_none());
    assert_eq!(*seen.lock(), 1);
}

#[test]
fn single_byte_mutations_fail_with_invalid_signature() {
    let kernel = test_kernel();
    let body = "token=xyz";
    let sig = slack_signature(SECRET, "1531420618", body);

    // Mutated body.
    let response = respond(&kernel, webhook("1531420618", sig.clone(), "token=xyZ"));
    assert_eq!(response["error"]["code"], "INVALID_SIGNATURE");

    // Mutated timestamp ("header").
    let response = respond(&kernel, webhook("1531420619", sig.clone(), body));
    assert_eq!(response["error"]["code"], "INVALID_SIGNATURE");

    // Intact request verifies.
    let response = respond(&kernel, webhook("1531420618", sig, body));
    assert!(response.get("error").is_none());
}

#[test]
fn url_verification_challenge_is_echoed() {
    let kernel = test_kernel();
    let body = r#"{"type":"url_verification","challenge":"3eZbrw1aBm2rZgRNFdxV"}"#;
    let sig = slack_signature(SECRET, "9", body);
    let response = respond(&kernel, webhook("9", sig, body));
    assert_eq!(response["data"]["challenge"], "3eZbrw1aBm2rZgRNFdxV");
}

#[test]
fn webhook_can_fire_a_trigger() {
    let kernel = test_kernel();
    kernel
        .scheduler
        .create_trigger(
            "root",
            "on-message",
            "slack.event",
            Some(serde_json::json!({"event": {"type": "message"}})),
            0,
            spawn_config("responder"),
        )
        .unwrap();

    let body = r#"{"type":"event_callback","event":{"type":"message","text":"hi"}}"#;
    let sig = slack_signature(SECRET, "7", body);
    respond(&kernel, webhook("7", sig, body));

    let live = kernel.table.list_live();
    assert_eq!(live.len(), 1);
    assert_eq!(live[0].name, "responder");
}
