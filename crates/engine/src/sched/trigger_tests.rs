// SPDX-License-Identifier: MIT

use super::*;
use serde_json::json;

#[test]
fn leaf_equality() {
    assert!(filter_matches(&json!({"channel": "C1"}), &json!({"channel": "C1", "x": 2})));
    assert!(!filter_matches(&json!({"channel": "C1"}), &json!({"channel": "C2"})));
}

#[test]
fn missing_keys_fail() {
    assert!(!filter_matches(&json!({"channel": "C1"}), &json!({"text": "hi"})));
}

#[test]
fn nested_subtrees_recurse() {
    let filter = json!({"event": {"type": "message", "user": "U1"}});
    let payload = json!({"event": {"type": "message", "user": "U1", "ts": "1"}, "team": "T"});
    assert!(filter_matches(&filter, &payload));

    let wrong = json!({"event": {"type": "message", "user": "U2"}});
    assert!(!filter_matches(&wrong, &payload));
}

#[test]
fn non_string_leaves_compare_deeply() {
    assert!(filter_matches(&json!({"n": 3}), &json!({"n": 3})));
    assert!(!filter_matches(&json!({"n": 3}), &json!({"n": "3"})));
    assert!(filter_matches(&json!({"tags": ["a", "b"]}), &json!({"tags": ["a", "b"]})));
    assert!(!filter_matches(&json!({"tags": ["a"]}), &json!({"tags": ["a", "b"]})));
}

#[test]
fn empty_filter_matches_anything() {
    assert!(filter_matches(&json!({}), &json!({"whatever": 1})));
}
