// SPDX-License-Identifier: MIT

//! Materialized state built from snapshot + WAL replay.
//!
//! Every table is an [`IndexMap`] so enumeration order is insert order,
//! the deterministic-order contract the rest of the kernel relies on.
//! Membership rows are keyed by composite `<parent>:<user>` strings.

mod audit;
mod orgs;
mod policies;
mod sched;
mod users;

pub use audit::DEFAULT_AUDIT_LIMIT;

use aether_core::{
    AuditEntry, CronJob, EventTrigger, Org, OrgMember, PermissionPolicy, Plan, Team, TeamMember,
    User,
};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

/// One row mutation. WAL records and replay both speak this type, so a
/// mutation is expressible exactly once.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum StoreOp {
    PutUser { user: User },
    DeleteUser { id: String },
    PutOrg { org: Org },
    DeleteOrg { id: String },
    PutOrgMember { member: OrgMember },
    DeleteOrgMember { org_id: String, user_id: String },
    PutTeam { team: Team },
    DeleteTeam { id: String },
    PutTeamMember { member: TeamMember },
    DeleteTeamMember { team_id: String, user_id: String },
    PutPolicy { policy: PermissionPolicy },
    DeletePolicy { id: String },
    PutCron { job: CronJob },
    DeleteCron { id: String },
    PutTrigger { trigger: EventTrigger },
    DeleteTrigger { id: String },
    AppendAudit { entry: AuditEntry },
    PutPlan { plan: Plan },
    DeletePlan { pid: u32 },
    SetKv { key: String, value: Value },
}

/// All durable tables. Replay of the same op sequence always yields the
/// same state; `apply` is total and never fails.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct StoreState {
    #[serde(default)]
    pub users: IndexMap<String, User>,
    #[serde(default)]
    pub orgs: IndexMap<String, Org>,
    /// Keyed `<org_id>:<user_id>`.
    #[serde(default)]
    pub org_members: IndexMap<String, OrgMember>,
    #[serde(default)]
    pub teams: IndexMap<String, Team>,
    /// Keyed `<team_id>:<user_id>`.
    #[serde(default)]
    pub team_members: IndexMap<String, TeamMember>,
    #[serde(default)]
    pub policies: IndexMap<String, PermissionPolicy>,
    #[serde(default)]
    pub crons: IndexMap<String, CronJob>,
    #[serde(default)]
    pub triggers: IndexMap<String, EventTrigger>,
    #[serde(default)]
    pub audit: Vec<AuditEntry>,
    /// Keyed by PID (one active plan per process).
    #[serde(default)]
    pub plans: IndexMap<u32, Plan>,
    #[serde(default)]
    pub kv: IndexMap<String, Value>,

    /// username → user id. Rebuilt on load, maintained by `apply`.
    #[serde(skip)]
    pub username_index: HashMap<String, String>,
    /// org name → org id. Rebuilt on load, maintained by `apply`.
    #[serde(skip)]
    pub org_name_index: HashMap<String, String>,
}

pub(crate) fn member_key(parent: &str, user: &str) -> String {
    format!("{parent}:{user}")
}

impl StoreState {
    /// Rebuild the secondary indexes after deserialization.
    pub fn reindex(&mut self) {
        self.username_index = self
            .users
            .iter()
            .map(|(id, u)| (u.username.clone(), id.clone()))
            .collect();
        self.org_name_index =
            self.orgs.iter().map(|(id, o)| (o.name.clone(), id.clone())).collect();
    }

    /// Apply one mutation. Total: unknown ids are no-ops on delete,
    /// puts are upserts. Validation happens before the op is written.
    pub fn apply(&mut self, op: &StoreOp) {
        match op {
            StoreOp::PutUser { user } => {
                if let Some(prev) = self.users.insert(user.id.to_string(), user.clone()) {
                    if prev.username != user.username {
                        self.username_index.remove(&prev.username);
                    }
                }
                self.username_index.insert(user.username.clone(), user.id.to_string());
            }
            StoreOp::DeleteUser { id } => {
                if let Some(user) = self.users.shift_remove(id.as_str()) {
                    self.username_index.remove(&user.username);
                }
                self.org_members.retain(|_, m| m.user_id != id.as_str());
                self.team_members.retain(|_, m| m.user_id != id.as_str());
            }
            StoreOp::PutOrg { org } => {
                if let Some(prev) = self.orgs.insert(org.id.to_string(), org.clone()) {
                    if prev.name != org.name {
                        self.org_name_index.remove(&prev.name);
                    }
                }
                self.org_name_index.insert(org.name.clone(), org.id.to_string());
            }
            StoreOp::DeleteOrg { id } => {
                if let Some(org) = self.orgs.shift_remove(id.as_str()) {
                    self.org_name_index.remove(&org.name);
                }
                self.org_members.retain(|_, m| m.org_id != id.as_str());
                let doomed: Vec<String> = self
                    .teams
                    .iter()
                    .filter(|(_, t)| t.org_id == id.as_str())
                    .map(|(tid, _)| tid.clone())
                    .collect();
                for tid in doomed {
                    self.teams.shift_remove(&tid);
                    self.team_members.retain(|_, m| m.team_id != tid.as_str());
                }
            }
            StoreOp::PutOrgMember { member } => {
                let key = member_key(member.org_id.as_str(), member.user_id.as_str());
                self.org_members.insert(key, member.clone());
            }
            StoreOp::DeleteOrgMember { org_id, user_id } => {
                self.org_members.shift_remove(&member_key(org_id, user_id));
            }
            StoreOp::PutTeam { team } => {
                self.teams.insert(team.id.to_string(), team.clone());
            }
            StoreOp::DeleteTeam { id } => {
                self.teams.shift_remove(id.as_str());
                self.team_members.retain(|_, m| m.team_id != id.as_str());
            }
            StoreOp::PutTeamMember { member } => {
                let key = member_key(member.team_id.as_str(), member.user_id.as_str());
                self.team_members.insert(key, member.clone());
            }
            StoreOp::DeleteTeamMember { team_id, user_id } => {
                self.team_members.shift_remove(&member_key(team_id, user_id));
            }
            StoreOp::PutPolicy { policy } => {
                self.policies.insert(policy.id.to_string(), policy.clone());
            }
            StoreOp::DeletePolicy { id } => {
                self.policies.shift_remove(id.as_str());
            }
            StoreOp::PutCron { job } => {
                self.crons.insert(job.id.to_string(), job.clone());
            }
            StoreOp::DeleteCron { id } => {
                self.crons.shift_remove(id.as_str());
            }
            StoreOp::PutTrigger { trigger } => {
                self.triggers.insert(trigger.id.to_string(), trigger.clone());
            }
            StoreOp::DeleteTrigger { id } => {
                self.triggers.shift_remove(id.as_str());
            }
            StoreOp::AppendAudit { entry } => {
                self.audit.push(entry.clone());
            }
            StoreOp::PutPlan { plan } => {
                self.plans.insert(plan.pid, plan.clone());
            }
            StoreOp::DeletePlan { pid } => {
                self.plans.shift_remove(pid);
            }
            StoreOp::SetKv { key, value } => {
                self.kv.insert(key.clone(), value.clone());
            }
        }
    }
}

#[cfg(test)]
#[path = "state_tests.rs"]
mod tests;
