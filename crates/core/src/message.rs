// SPDX-License-Identifier: MIT

//! Mailbox message record.

use crate::process::Pid;
use serde::{Deserialize, Serialize};

/// One inter-process message. IDs are `msg_<n>` with a per-receiver
/// counter; timestamps are monotonic within a mailbox.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MailboxMessage {
    pub id: String,
    pub from_pid: Pid,
    pub to_pid: Pid,
    pub from_uid: String,
    pub to_uid: String,
    pub channel: String,
    pub payload: serde_json::Value,
    pub timestamp_ms: u64,
    pub delivered: bool,
}
