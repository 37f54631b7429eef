// SPDX-License-Identifier: MIT

use super::*;
use serde_json::json;

#[test]
fn data_shape() {
    let envelope = Envelope::data(&json!({"pid": 1}));
    let wire = serde_json::to_value(&envelope).unwrap();
    assert_eq!(wire, json!({"data": {"pid": 1}}));
}

#[test]
fn list_shape_with_meta() {
    let envelope = Envelope::list(&[1, 2, 3], 10, 3, 0);
    let wire = serde_json::to_value(&envelope).unwrap();
    assert_eq!(
        wire,
        json!({"data": [1, 2, 3], "meta": {"total": 10, "limit": 3, "offset": 0}})
    );
}

#[test]
fn error_shape_upper_snake_code() {
    let envelope = Envelope::error(ErrorCode::NotFound, "no such pid");
    let wire = serde_json::to_value(&envelope).unwrap();
    assert_eq!(
        wire,
        json!({"error": {"code": "NOT_FOUND", "message": "no such pid"}})
    );
}

#[test]
fn kernel_errors_convert() {
    let envelope: Envelope = KernelError::forbidden("nope").into();
    assert!(envelope.is_error());
    let wire = serde_json::to_value(&envelope).unwrap();
    assert_eq!(wire["error"]["code"], "FORBIDDEN");
}

#[test]
fn untagged_roundtrip_disambiguates() {
    for envelope in [
        Envelope::data(&json!({"x": 1})),
        Envelope::list(&["a"], 1, 50, 0),
        Envelope::error(ErrorCode::InvalidInput, "bad"),
        Envelope::ok(),
    ] {
        let wire = serde_json::to_string(&envelope).unwrap();
        let back: Envelope = serde_json::from_str(&wire).unwrap();
        assert_eq!(back, envelope);
    }
}
