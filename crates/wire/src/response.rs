// SPDX-License-Identifier: MIT

//! Responses from the daemon. Every response carries the daemon
//! version (the `X-Aether-Version` contract) beside one envelope.

use crate::envelope::Envelope;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponseFrame {
    pub version: String,
    #[serde(flatten)]
    pub envelope: Envelope,
}

impl ResponseFrame {
    pub fn new(version: &str, envelope: Envelope) -> Self {
        Self { version: version.to_string(), envelope }
    }
}

#[cfg(test)]
#[path = "response_tests.rs"]
mod tests;
