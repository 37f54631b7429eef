// SPDX-License-Identifier: MIT

//! Persisted scheduler records: cron jobs and event triggers.

use crate::process::ProcessConfig;
use serde::{Deserialize, Serialize};

crate::define_id! {
    /// Unique identifier for a cron job.
    pub struct CronId("crn-");
}

crate::define_id! {
    /// Unique identifier for an event trigger.
    pub struct TriggerId("trg-");
}

/// A timer-driven spawn rule. The expression is five-field POSIX cron
/// (`min hour dom mon dow`), evaluated at wall-clock minute boundaries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CronJob {
    pub id: CronId,
    pub name: String,
    pub cron_expr: String,
    pub agent_config: ProcessConfig,
    pub owner_uid: String,
    pub enabled: bool,
    pub created_at_ms: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_fired_at_ms: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_fire_at_ms: Option<u64>,
}

/// An event-driven spawn rule.
///
/// `event_pattern` is a subject string with an optional trailing `.*`
/// segment; `filter` is a sub-tree equality match applied to the event
/// payload. A trigger in cooldown is skipped, not queued.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventTrigger {
    pub id: TriggerId,
    pub name: String,
    pub event_pattern: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filter: Option<serde_json::Value>,
    pub agent_config: ProcessConfig,
    pub owner_uid: String,
    pub enabled: bool,
    pub cooldown_ms: u64,
    pub created_at_ms: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_fired_at_ms: Option<u64>,
}
