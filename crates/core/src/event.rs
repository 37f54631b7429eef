// SPDX-License-Identifier: MIT

//! Event types for the Aether kernel.
//!
//! Serializes with `{"type": "dotted.subject", ...fields}` format, the
//! exact frame shape the SSE fan-out puts on the wire. Integration
//! subjects the kernel does not model (e.g. `slack.event`) travel through
//! the `Custom` variant.

use crate::org::{OrgId, OrgRole};
use crate::policy::{PolicyEffect, PolicyId};
use crate::process::{Pid, ProcessState, Signal};
use crate::schedule::{CronId, TriggerId};
use crate::user::{Role, UserId};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Which agent reasoning stream a report belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AgentStream {
    Thought,
    Action,
    Observation,
}

crate::simple_display! {
    AgentStream {
        Thought => "thought",
        Action => "action",
        Observation => "observation",
    }
}

/// Events published on the kernel bus.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type")]
pub enum Event {
    // -- process lifecycle --
    #[serde(rename = "process.spawned")]
    ProcessSpawned {
        pid: Pid,
        ppid: Pid,
        uid: String,
        owner_uid: String,
        name: String,
        priority: u8,
    },

    #[serde(rename = "process.stateChange")]
    ProcessStateChange { pid: Pid, from: ProcessState, to: ProcessState, phase: String },

    #[serde(rename = "process.exit")]
    ProcessExit { pid: Pid, code: i32, signal: Option<Signal> },

    #[serde(rename = "process.queued")]
    ProcessQueued { name: String, owner_uid: String, priority: u8 },

    #[serde(rename = "process.dequeued")]
    ProcessDequeued { name: String, owner_uid: String, priority: u8 },

    #[serde(rename = "process.reaped")]
    ProcessReaped { pid: Pid, uid: String },

    #[serde(rename = "process.priorityChanged")]
    ProcessPriorityChanged { pid: Pid, previous: u8, priority: u8 },

    // -- agent reasoning stream --
    #[serde(rename = "agent.thought")]
    AgentThought { pid: Pid, content: String },

    #[serde(rename = "agent.action")]
    AgentAction { pid: Pid, action: String, detail: Value },

    #[serde(rename = "agent.observation")]
    AgentObservation { pid: Pid, content: String },

    #[serde(rename = "agent.phaseChange")]
    AgentPhaseChange { pid: Pid, previous: String, phase: String },

    // -- scheduler --
    #[serde(rename = "cron.fired")]
    CronFired { id: CronId, name: String, pid: Option<Pid>, owner_uid: String },

    #[serde(rename = "cron.error")]
    CronError { id: CronId, name: String, error: String },

    #[serde(rename = "trigger.fired")]
    TriggerFired { id: TriggerId, name: String, pid: Option<Pid>, subject: String },

    #[serde(rename = "trigger.error")]
    TriggerError { id: TriggerId, name: String, error: String },

    // -- auth --
    #[serde(rename = "user.created")]
    UserCreated { id: UserId, username: String, role: Role },

    #[serde(rename = "user.deleted")]
    UserDeleted { id: UserId, username: String },

    #[serde(rename = "auth.success")]
    AuthSuccess { user_id: UserId, username: String },

    #[serde(rename = "auth.failure")]
    AuthFailure { username: String, reason: String },

    #[serde(rename = "auth.mfa.enabled")]
    MfaEnabled { user_id: UserId },

    #[serde(rename = "auth.mfa.disabled")]
    MfaDisabled { user_id: UserId },

    // -- org graph --
    #[serde(rename = "org.created")]
    OrgCreated { id: OrgId, name: String, owner_user_id: UserId },

    #[serde(rename = "org.deleted")]
    OrgDeleted { id: OrgId, name: String },

    #[serde(rename = "org.member.invited")]
    OrgMemberInvited { org_id: OrgId, user_id: UserId, role: OrgRole },

    #[serde(rename = "org.member.removed")]
    OrgMemberRemoved { org_id: OrgId, user_id: UserId },

    #[serde(rename = "org.member.updated")]
    OrgMemberUpdated { org_id: OrgId, user_id: UserId, role: OrgRole },

    // -- policy engine --
    #[serde(rename = "permission.granted")]
    PermissionGranted {
        id: PolicyId,
        subject: String,
        action: String,
        resource: String,
        effect: PolicyEffect,
    },

    #[serde(rename = "permission.revoked")]
    PermissionRevoked { id: PolicyId },

    #[serde(rename = "policy.decision")]
    PolicyDecision {
        user_id: UserId,
        action: String,
        resource: String,
        allowed: bool,
        rule_id: Option<PolicyId>,
    },

    /// Integration subject the kernel does not model. The payload object
    /// is flattened into the frame with `type` set to the subject.
    Custom { subject: String, payload: Value },
}

impl Event {
    /// The dotted subject this event is published under.
    pub fn subject(&self) -> &str {
        match self {
            Event::ProcessSpawned { .. } => "process.spawned",
            Event::ProcessStateChange { .. } => "process.stateChange",
            Event::ProcessExit { .. } => "process.exit",
            Event::ProcessQueued { .. } => "process.queued",
            Event::ProcessDequeued { .. } => "process.dequeued",
            Event::ProcessReaped { .. } => "process.reaped",
            Event::ProcessPriorityChanged { .. } => "process.priorityChanged",
            Event::AgentThought { .. } => "agent.thought",
            Event::AgentAction { .. } => "agent.action",
            Event::AgentObservation { .. } => "agent.observation",
            Event::AgentPhaseChange { .. } => "agent.phaseChange",
            Event::CronFired { .. } => "cron.fired",
            Event::CronError { .. } => "cron.error",
            Event::TriggerFired { .. } => "trigger.fired",
            Event::TriggerError { .. } => "trigger.error",
            Event::UserCreated { .. } => "user.created",
            Event::UserDeleted { .. } => "user.deleted",
            Event::AuthSuccess { .. } => "auth.success",
            Event::AuthFailure { .. } => "auth.failure",
            Event::MfaEnabled { .. } => "auth.mfa.enabled",
            Event::MfaDisabled { .. } => "auth.mfa.disabled",
            Event::OrgCreated { .. } => "org.created",
            Event::OrgDeleted { .. } => "org.deleted",
            Event::OrgMemberInvited { .. } => "org.member.invited",
            Event::OrgMemberRemoved { .. } => "org.member.removed",
            Event::OrgMemberUpdated { .. } => "org.member.updated",
            Event::PermissionGranted { .. } => "permission.granted",
            Event::PermissionRevoked { .. } => "permission.revoked",
            Event::PolicyDecision { .. } => "policy.decision",
            Event::Custom { subject, .. } => subject,
        }
    }

    /// PID this event concerns, when it concerns one.
    pub fn pid(&self) -> Option<Pid> {
        match self {
            Event::ProcessSpawned { pid, .. }
            | Event::ProcessStateChange { pid, .. }
            | Event::ProcessExit { pid, .. }
            | Event::ProcessReaped { pid, .. }
            | Event::ProcessPriorityChanged { pid, .. }
            | Event::AgentThought { pid, .. }
            | Event::AgentAction { pid, .. }
            | Event::AgentObservation { pid, .. }
            | Event::AgentPhaseChange { pid, .. } => Some(*pid),
            Event::CronFired { pid, .. } | Event::TriggerFired { pid, .. } => *pid,
            _ => None,
        }
    }

    /// JSON frame for the wire: `{"type": subject, ...fields}`.
    ///
    /// For `Custom` the payload object is flattened so external subjects
    /// look identical to kernel ones.
    pub fn to_frame(&self) -> Value {
        if let Event::Custom { subject, payload } = self {
            let mut obj = match payload {
                Value::Object(map) => map.clone(),
                other => {
                    let mut map = serde_json::Map::new();
                    if !other.is_null() {
                        map.insert("payload".to_string(), other.clone());
                    }
                    map
                }
            };
            obj.insert("type".to_string(), Value::String(subject.clone()));
            return Value::Object(obj);
        }
        serde_json::to_value(self).unwrap_or_else(|_| {
            serde_json::json!({ "type": self.subject() })
        })
    }

    /// One-line summary for daemon logs.
    pub fn log_summary(&self) -> String {
        let t = self.subject();
        match self {
            Event::ProcessSpawned { pid, name, owner_uid, .. } => {
                format!("[{t}] pid={pid} name={name} owner={owner_uid}")
            }
            Event::ProcessStateChange { pid, from, to, .. } => {
                format!("[{t}] pid={pid} {from}->{to}")
            }
            Event::ProcessExit { pid, code, signal } => match signal {
                Some(sig) => format!("[{t}] pid={pid} code={code} signal={sig}"),
                None => format!("[{t}] pid={pid} code={code}"),
            },
            Event::ProcessQueued { name, priority, .. } => {
                format!("[{t}] name={name} priority={priority}")
            }
            Event::ProcessDequeued { name, priority, .. } => {
                format!("[{t}] name={name} priority={priority}")
            }
            Event::ProcessReaped { pid, .. } => format!("[{t}] pid={pid}"),
            Event::ProcessPriorityChanged { pid, previous, priority } => {
                format!("[{t}] pid={pid} {previous}->{priority}")
            }
            Event::AgentPhaseChange { pid, previous, phase } => {
                format!("[{t}] pid={pid} {previous}->{phase}")
            }
            Event::AgentThought { pid, .. }
            | Event::AgentAction { pid, .. }
            | Event::AgentObservation { pid, .. } => format!("[{t}] pid={pid}"),
            Event::CronFired { name, pid, .. } => match pid {
                Some(pid) => format!("[{t}] cron={name} pid={pid}"),
                None => format!("[{t}] cron={name}"),
            },
            Event::CronError { name, error, .. } => format!("[{t}] cron={name} error={error}"),
            Event::TriggerFired { name, subject, .. } => {
                format!("[{t}] trigger={name} on={subject}")
            }
            Event::TriggerError { name, error, .. } => {
                format!("[{t}] trigger={name} error={error}")
            }
            Event::UserCreated { username, role, .. } => {
                format!("[{t}] username={username} role={role}")
            }
            Event::UserDeleted { username, .. } => format!("[{t}] username={username}"),
            Event::AuthSuccess { username, .. } => format!("[{t}] username={username}"),
            Event::AuthFailure { username, reason } => {
                format!("[{t}] username={username} reason={reason}")
            }
            Event::MfaEnabled { user_id } | Event::MfaDisabled { user_id } => {
                format!("[{t}] user={user_id}")
            }
            Event::OrgCreated { name, .. } | Event::OrgDeleted { name, .. } => {
                format!("[{t}] org={name}")
            }
            Event::OrgMemberInvited { org_id, user_id, role } => {
                format!("[{t}] org={org_id} user={user_id} role={role}")
            }
            Event::OrgMemberRemoved { org_id, user_id } => {
                format!("[{t}] org={org_id} user={user_id}")
            }
            Event::OrgMemberUpdated { org_id, user_id, role } => {
                format!("[{t}] org={org_id} user={user_id} role={role}")
            }
            Event::PermissionGranted { subject, action, effect, .. } => {
                format!("[{t}] subject={subject} action={action} effect={effect}")
            }
            Event::PermissionRevoked { id } => format!("[{t}] id={id}"),
            Event::PolicyDecision { action, resource, allowed, .. } => {
                format!("[{t}] action={action} resource={resource} allowed={allowed}")
            }
            Event::Custom { subject, .. } => format!("[custom] subject={subject}"),
        }
    }
}

#[cfg(test)]
#[path = "event_tests.rs"]
mod tests;
