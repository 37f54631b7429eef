// SPDX-License-Identifier: MIT

//! Requests from clients to the daemon.

use aether_core::{
    AgentStream, AuditQuery, OrgRole, Pid, PlanNode, PolicyEffect, ProcessConfig, ProcessState,
    Signal, TeamRole,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Bearer token plus the request body. The token is extracted before
/// dispatch; requests that predate identity (register, login, webhook)
/// simply omit it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequestFrame {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    #[serde(flatten)]
    pub request: Request,
}

impl RequestFrame {
    pub fn bare(request: Request) -> Self {
        Self { token: None, request }
    }

    pub fn with_token(token: impl Into<String>, request: Request) -> Self {
        Self { token: Some(token.into()), request }
    }
}

/// Request body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Request {
    /// Health check ping
    Ping,

    /// Version handshake
    Hello { version: String },

    /// Request daemon shutdown
    Shutdown,

    // -- identity --
    Register {
        username: String,
        password: String,
        #[serde(default)]
        display_name: String,
    },
    Authenticate {
        username: String,
        password: String,
    },
    AuthenticateMfa {
        mfa_token: String,
        code: String,
    },
    MfaSetup,
    MfaEnable {
        code: String,
    },
    MfaDisable,
    UserList,
    UserDelete {
        id: String,
    },

    // -- org graph --
    OrgCreate {
        name: String,
        #[serde(default)]
        display_name: String,
    },
    OrgDelete {
        id: String,
    },
    OrgList,
    MemberInvite {
        org_id: String,
        user_id: String,
        role: OrgRole,
    },
    MemberUpdate {
        org_id: String,
        user_id: String,
        role: OrgRole,
    },
    MemberRemove {
        org_id: String,
        user_id: String,
    },
    TeamCreate {
        org_id: String,
        name: String,
        #[serde(default)]
        description: String,
    },
    TeamMemberAdd {
        team_id: String,
        user_id: String,
        role: TeamRole,
    },

    // -- policies --
    PolicyGrant {
        subject: String,
        action: String,
        resource: String,
        effect: PolicyEffect,
    },
    PolicyRevoke {
        id: String,
    },
    PolicyList,
    PermissionCheck {
        action: String,
        resource: String,
    },

    // -- processes --
    Spawn {
        config: ProcessConfig,
        #[serde(default)]
        ppid: Pid,
    },
    SignalSend {
        pid: Pid,
        signal: Signal,
    },
    SetState {
        pid: Pid,
        state: ProcessState,
        #[serde(default)]
        phase: Option<String>,
    },
    SetPriority {
        pid: Pid,
        priority: i64,
    },
    Reap {
        pid: Pid,
    },
    MessageSend {
        from_pid: Pid,
        to_pid: Pid,
        channel: String,
        payload: Value,
    },
    MessageDrain {
        pid: Pid,
    },
    ProcessList {
        /// Include dead (historical) processes.
        #[serde(default)]
        all: bool,
    },
    ProcessGet {
        pid: Pid,
    },
    ProcessCounts,
    /// Agent-runtime reporting: one entry on the thought / action /
    /// observation stream of a hosted process.
    AgentEmit {
        pid: Pid,
        stream: AgentStream,
        content: String,
        #[serde(default)]
        detail: Value,
    },

    // -- plans --
    PlanSet {
        pid: Pid,
        goal: String,
        #[serde(default)]
        nodes: Vec<PlanNode>,
    },
    PlanGet {
        pid: Pid,
    },

    // -- scheduler --
    CronCreate {
        name: String,
        cron_expr: String,
        agent_config: ProcessConfig,
    },
    CronList,
    CronSetEnabled {
        id: String,
        enabled: bool,
    },
    CronDelete {
        id: String,
    },
    TriggerCreate {
        name: String,
        event_pattern: String,
        #[serde(default)]
        filter: Option<Value>,
        #[serde(default)]
        cooldown_ms: u64,
        agent_config: ProcessConfig,
    },
    TriggerList,
    TriggerSetEnabled {
        id: String,
        enabled: bool,
    },
    TriggerDelete {
        id: String,
    },

    // -- audit --
    Audit {
        #[serde(flatten)]
        query: AuditQuery,
    },

    // -- streams & webhooks --
    /// Switch this connection to an SSE event stream filtered by a
    /// comma-separated subject list (trailing `.*` wildcards allowed).
    Subscribe {
        filters: String,
    },
    /// Inbound Slack-style webhook: signature is verified before the
    /// payload reaches the bus.
    SlackWebhook {
        timestamp: String,
        signature: String,
        body: String,
    },
}

impl Request {
    /// Requests that are valid without a bearer token.
    pub fn is_anonymous(&self) -> bool {
        matches!(
            self,
            Request::Ping
                | Request::Hello { .. }
                | Request::Register { .. }
                | Request::Authenticate { .. }
                | Request::AuthenticateMfa { .. }
                | Request::SlackWebhook { .. }
        )
    }

    /// The `(action, resource)` pair the policy engine gates this
    /// request on. `None` for anonymous requests.
    pub fn required_permission(&self) -> Option<(String, String)> {
        let (action, resource) = match self {
            Request::Ping
            | Request::Hello { .. }
            | Request::Register { .. }
            | Request::Authenticate { .. }
            | Request::AuthenticateMfa { .. }
            | Request::SlackWebhook { .. } => return None,

            Request::Shutdown => ("system.shutdown".to_string(), "daemon".to_string()),

            Request::MfaSetup | Request::MfaEnable { .. } | Request::MfaDisable => {
                ("user.mfa.manage".to_string(), "self".to_string())
            }
            Request::UserList => ("user.list".to_string(), "users".to_string()),
            Request::UserDelete { id } => ("user.delete".to_string(), id.clone()),

            Request::OrgCreate { name, .. } => ("org.create".to_string(), name.clone()),
            Request::OrgDelete { id } => ("org.delete".to_string(), id.clone()),
            Request::OrgList => ("org.list".to_string(), "orgs".to_string()),
            Request::MemberInvite { org_id, .. } => {
                ("org.member.invite".to_string(), org_id.clone())
            }
            Request::MemberUpdate { org_id, .. } => {
                ("org.member.update".to_string(), org_id.clone())
            }
            Request::MemberRemove { org_id, .. } => {
                ("org.member.remove".to_string(), org_id.clone())
            }
            Request::TeamCreate { org_id, .. } => ("team.create".to_string(), org_id.clone()),
            Request::TeamMemberAdd { team_id, .. } => {
                ("team.member.add".to_string(), team_id.clone())
            }

            Request::PolicyGrant { .. } => ("policy.grant".to_string(), "policies".to_string()),
            Request::PolicyRevoke { id } => ("policy.revoke".to_string(), id.clone()),
            Request::PolicyList => ("policy.list".to_string(), "policies".to_string()),
            Request::PermissionCheck { action, resource } => {
                return Some((action.clone(), resource.clone()))
            }

            Request::Spawn { .. } => ("process.spawn".to_string(), "processes".to_string()),
            Request::SignalSend { pid, .. } => ("process.signal".to_string(), pid.to_string()),
            Request::SetState { pid, .. } => ("process.set_state".to_string(), pid.to_string()),
            Request::SetPriority { pid, .. } => {
                ("process.set_priority".to_string(), pid.to_string())
            }
            Request::Reap { pid } => ("process.reap".to_string(), pid.to_string()),
            Request::MessageSend { to_pid, .. } => {
                ("process.message.send".to_string(), to_pid.to_string())
            }
            Request::MessageDrain { pid } => {
                ("process.message.drain".to_string(), pid.to_string())
            }
            Request::ProcessList { .. } => ("process.list".to_string(), "processes".to_string()),
            Request::ProcessGet { pid } => ("process.get".to_string(), pid.to_string()),
            Request::ProcessCounts => ("process.list".to_string(), "processes".to_string()),
            Request::AgentEmit { pid, .. } => ("agent.emit".to_string(), pid.to_string()),

            Request::PlanSet { pid, .. } => ("plan.set".to_string(), pid.to_string()),
            Request::PlanGet { pid } => ("plan.get".to_string(), pid.to_string()),

            Request::CronCreate { name, .. } => ("cron.create".to_string(), name.clone()),
            Request::CronList => ("cron.list".to_string(), "crons".to_string()),
            Request::CronSetEnabled { id, .. } => ("cron.update".to_string(), id.clone()),
            Request::CronDelete { id } => ("cron.delete".to_string(), id.clone()),
            Request::TriggerCreate { name, .. } => ("trigger.create".to_string(), name.clone()),
            Request::TriggerList => ("trigger.list".to_string(), "triggers".to_string()),
            Request::TriggerSetEnabled { id, .. } => ("trigger.update".to_string(), id.clone()),
            Request::TriggerDelete { id } => ("trigger.delete".to_string(), id.clone()),

            Request::Audit { .. } => ("audit.query".to_string(), "audit".to_string()),
            Request::Subscribe { .. } => ("events.subscribe".to_string(), "events".to_string()),
        };
        Some((action, resource))
    }

    /// PID whose ownership must additionally be enforced, if any.
    pub fn owned_pid(&self) -> Option<Pid> {
        match self {
            Request::SignalSend { pid, .. }
            | Request::SetState { pid, .. }
            | Request::SetPriority { pid, .. }
            | Request::Reap { pid }
            | Request::MessageDrain { pid }
            | Request::ProcessGet { pid }
            | Request::AgentEmit { pid, .. }
            | Request::PlanSet { pid, .. }
            | Request::PlanGet { pid } => Some(*pid),
            _ => None,
        }
    }
}

#[cfg(test)]
#[path = "request_tests.rs"]
mod tests;
