// SPDX-License-Identifier: MIT

//! Event-trigger payload filters.
//!
//! A filter is a JSON sub-tree: every leaf key it names must exist in
//! the event payload with an equal value. Missing keys fail the match;
//! extra payload keys are ignored.

use serde_json::Value;

/// Whether `payload` satisfies `filter`.
pub fn filter_matches(filter: &Value, payload: &Value) -> bool {
    match filter {
        Value::Object(fields) => fields.iter().all(|(key, expected)| {
            match payload.get(key) {
                Some(actual) => filter_matches(expected, actual),
                None => false,
            }
        }),
        leaf => leaf == payload,
    }
}

#[cfg(test)]
#[path = "trigger_tests.rs"]
mod tests;
