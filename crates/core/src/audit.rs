// SPDX-License-Identifier: MIT

//! Append-only audit record and its query filter.

use crate::process::Pid;
use serde::{Deserialize, Serialize};

crate::define_id! {
    /// Unique identifier for an audit entry.
    pub struct AuditId("aud-");
}

/// Outcome recorded for a decision-grade event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuditOutcome {
    Allowed,
    Denied,
    Ok,
    Error,
}

crate::simple_display! {
    AuditOutcome {
        Allowed => "allowed",
        Denied => "denied",
        Ok => "ok",
        Error => "error",
    }
}

/// One append-only audit row. No mutation API exists beyond append.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditEntry {
    pub id: AuditId,
    pub ts_ms: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pid: Option<Pid>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uid: Option<String>,
    /// What was attempted, e.g. `tool.run_command.execute`.
    pub action: String,
    /// Originating event subject, e.g. `policy.decision`.
    pub event_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subject: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource: Option<String>,
    pub outcome: AuditOutcome,
    #[serde(default, skip_serializing_if = "serde_json::Value::is_null")]
    pub detail: serde_json::Value,
}

/// Filter set for audit queries. All fields are conjunctive.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AuditQuery {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pid: Option<Pid>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_ms: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_ms: Option<u64>,
    #[serde(default)]
    pub limit: Option<usize>,
    #[serde(default)]
    pub offset: Option<usize>,
}

impl AuditQuery {
    /// Whether `entry` passes every filter in this query.
    pub fn matches(&self, entry: &AuditEntry) -> bool {
        if let Some(pid) = self.pid {
            if entry.pid != Some(pid) {
                return false;
            }
        }
        if let Some(action) = &self.action {
            if &entry.action != action {
                return false;
            }
        }
        if let Some(event_type) = &self.event_type {
            if &entry.event_type != event_type {
                return false;
            }
        }
        if let Some(start) = self.start_ms {
            if entry.ts_ms < start {
                return false;
            }
        }
        if let Some(end) = self.end_ms {
            if entry.ts_ms > end {
                return false;
            }
        }
        true
    }
}
