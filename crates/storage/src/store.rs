// SPDX-License-Identifier: MIT

//! The `StateStore` facade: the narrow persistence surface every other
//! crate depends on.
//!
//! Writes validate against the in-memory state, append to the WAL
//! (fsync), then apply, all under one lock, so every operation is
//! linearisable. A failed append surfaces immediately; the store never
//! compensates for a lost write. Reads clone rows out under the lock;
//! enumeration order is insert order everywhere.

use crate::error::StorageError;
use crate::snapshot::{load_snapshot, write_snapshot, Snapshot, CURRENT_SNAPSHOT_VERSION};
use crate::state::{StoreOp, StoreState};
use crate::wal::Wal;
use aether_core::{
    AuditEntry, AuditQuery, CronJob, EventTrigger, KernelError, Org, OrgMember, PermissionPolicy,
    Plan, Team, TeamMember, User,
};
use parking_lot::Mutex;
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;

const WAL_FILE: &str = "store.wal";

struct StoreInner {
    state: StoreState,
    wal: Option<Wal>,
    dir: Option<PathBuf>,
}

impl StoreInner {
    /// Append + apply a batch as one commit. All ops hit the WAL before
    /// any of them applies, so replay sees exactly what the live state
    /// saw.
    fn commit(&mut self, ops: Vec<StoreOp>) -> Result<(), KernelError> {
        if let Some(wal) = self.wal.as_mut() {
            for op in &ops {
                wal.append(op).map_err(KernelError::from)?;
            }
        }
        for op in &ops {
            self.state.apply(op);
        }
        Ok(())
    }
}

/// Transactional key/row store. Cheap to clone; clones share state.
#[derive(Clone)]
pub struct StateStore {
    inner: Arc<Mutex<StoreInner>>,
}

impl StateStore {
    /// Open (or create) a durable store in `dir`: load the latest
    /// snapshot, replay the WAL tail, ready for writes.
    pub fn open(dir: &Path) -> Result<Self, StorageError> {
        std::fs::create_dir_all(dir)?;
        let (mut state, snapshot_seq) = match load_snapshot(dir)? {
            Some(snapshot) => (snapshot.state, snapshot.wal_seq),
            None => (StoreState::default(), 0),
        };
        let (wal, tail) = Wal::open(&dir.join(WAL_FILE), snapshot_seq)?;
        let replayed = tail.len();
        for entry in tail {
            state.apply(&entry.op);
        }
        if replayed > 0 {
            info!(replayed, "replayed WAL tail");
        }
        Ok(Self {
            inner: Arc::new(Mutex::new(StoreInner {
                state,
                wal: Some(wal),
                dir: Some(dir.to_path_buf()),
            })),
        })
    }

    /// Volatile store for tests and embedded use. Same semantics, no
    /// durability.
    pub fn in_memory() -> Self {
        Self {
            inner: Arc::new(Mutex::new(StoreInner {
                state: StoreState::default(),
                wal: None,
                dir: None,
            })),
        }
    }

    /// Write a snapshot of current state and truncate the WAL.
    pub fn checkpoint(&self) -> Result<(), StorageError> {
        let mut inner = self.inner.lock();
        let Some(dir) = inner.dir.clone() else { return Ok(()) };
        let wal_seq = inner.wal.as_ref().map(Wal::last_seq).unwrap_or(0);
        let snapshot = Snapshot {
            version: CURRENT_SNAPSHOT_VERSION,
            wal_seq,
            state: inner.state.clone(),
        };
        write_snapshot(&dir, &snapshot)?;
        if let Some(wal) = inner.wal.as_mut() {
            wal.truncate()?;
        }
        Ok(())
    }

    /// Run a read closure over the state under the lock.
    fn read<T>(&self, f: impl FnOnce(&StoreState) -> T) -> T {
        let inner = self.inner.lock();
        f(&inner.state)
    }

    /// Validate-then-commit under one lock acquisition.
    fn write<T>(
        &self,
        f: impl FnOnce(&StoreState) -> Result<(Vec<StoreOp>, T), KernelError>,
    ) -> Result<T, KernelError> {
        let mut inner = self.inner.lock();
        let (ops, out) = f(&inner.state)?;
        inner.commit(ops)?;
        Ok(out)
    }

    // ---- users ----

    pub fn insert_user(&self, user: User) -> Result<(), KernelError> {
        self.write(|state| {
            if state.get_user_by_username(&user.username).is_some() {
                return Err(KernelError::conflict(format!(
                    "username '{}' already exists",
                    user.username
                )));
            }
            Ok((vec![StoreOp::PutUser { user }], ()))
        })
    }

    pub fn update_user(&self, user: User) -> Result<(), KernelError> {
        self.write(|state| {
            if state.get_user(user.id.as_str()).is_none() {
                return Err(KernelError::not_found(format!("user {}", user.id)));
            }
            Ok((vec![StoreOp::PutUser { user }], ()))
        })
    }

    pub fn delete_user(&self, id: &str) -> Result<User, KernelError> {
        self.write(|state| {
            let user = state
                .get_user(id)
                .cloned()
                .ok_or_else(|| KernelError::not_found(format!("user {id}")))?;
            Ok((vec![StoreOp::DeleteUser { id: id.to_string() }], user))
        })
    }

    pub fn get_user(&self, id: &str) -> Option<User> {
        self.read(|s| s.get_user(id).cloned())
    }

    pub fn get_user_by_username(&self, username: &str) -> Option<User> {
        self.read(|s| s.get_user_by_username(username).cloned())
    }

    pub fn list_users(&self) -> Vec<User> {
        self.read(|s| s.list_users().into_iter().cloned().collect())
    }

    pub fn user_count(&self) -> usize {
        self.read(StoreState::user_count)
    }

    // ---- orgs / teams ----

    /// Insert an org and its self-owner membership as one commit.
    pub fn insert_org_with_owner(&self, org: Org, owner: OrgMember) -> Result<(), KernelError> {
        self.write(|state| {
            if state.get_org_by_name(&org.name).is_some() {
                return Err(KernelError::conflict(format!(
                    "org name '{}' already exists",
                    org.name
                )));
            }
            Ok((vec![StoreOp::PutOrg { org }, StoreOp::PutOrgMember { member: owner }], ()))
        })
    }

    pub fn update_org(&self, org: Org) -> Result<(), KernelError> {
        self.write(|state| {
            if state.get_org(org.id.as_str()).is_none() {
                return Err(KernelError::not_found(format!("org {}", org.id)));
            }
            Ok((vec![StoreOp::PutOrg { org }], ()))
        })
    }

    pub fn delete_org(&self, id: &str) -> Result<Org, KernelError> {
        self.write(|state| {
            let org = state
                .get_org(id)
                .cloned()
                .ok_or_else(|| KernelError::not_found(format!("org {id}")))?;
            Ok((vec![StoreOp::DeleteOrg { id: id.to_string() }], org))
        })
    }

    pub fn get_org(&self, id: &str) -> Option<Org> {
        self.read(|s| s.get_org(id).cloned())
    }

    pub fn get_org_by_name(&self, name: &str) -> Option<Org> {
        self.read(|s| s.get_org_by_name(name).cloned())
    }

    pub fn list_orgs(&self) -> Vec<Org> {
        self.read(|s| s.list_orgs().into_iter().cloned().collect())
    }

    pub fn org_count(&self) -> usize {
        self.read(StoreState::org_count)
    }

    pub fn put_org_member(&self, member: OrgMember) -> Result<(), KernelError> {
        self.write(|state| {
            if state.get_org(member.org_id.as_str()).is_none() {
                return Err(KernelError::not_found(format!("org {}", member.org_id)));
            }
            Ok((vec![StoreOp::PutOrgMember { member }], ()))
        })
    }

    pub fn remove_org_member(&self, org_id: &str, user_id: &str) -> Result<(), KernelError> {
        self.write(|state| {
            if state.get_org_member(org_id, user_id).is_none() {
                return Err(KernelError::not_found(format!(
                    "membership {user_id} in {org_id}"
                )));
            }
            Ok((
                vec![StoreOp::DeleteOrgMember {
                    org_id: org_id.to_string(),
                    user_id: user_id.to_string(),
                }],
                (),
            ))
        })
    }

    pub fn get_org_member(&self, org_id: &str, user_id: &str) -> Option<OrgMember> {
        self.read(|s| s.get_org_member(org_id, user_id).cloned())
    }

    pub fn members_of_org(&self, org_id: &str) -> Vec<OrgMember> {
        self.read(|s| s.members_of_org(org_id).into_iter().cloned().collect())
    }

    pub fn orgs_of_user(&self, user_id: &str) -> Vec<(Org, OrgMember)> {
        self.read(|s| {
            s.orgs_of_user(user_id)
                .into_iter()
                .map(|(o, m)| (o.clone(), m.clone()))
                .collect()
        })
    }

    pub fn insert_team(&self, team: Team) -> Result<(), KernelError> {
        self.write(|state| {
            if state.get_org(team.org_id.as_str()).is_none() {
                return Err(KernelError::not_found(format!("org {}", team.org_id)));
            }
            Ok((vec![StoreOp::PutTeam { team }], ()))
        })
    }

    pub fn get_team(&self, id: &str) -> Option<Team> {
        self.read(|s| s.get_team(id).cloned())
    }

    pub fn teams_of_org(&self, org_id: &str) -> Vec<Team> {
        self.read(|s| s.teams_of_org(org_id).into_iter().cloned().collect())
    }

    /// Insert a team membership. The user must already be a member of
    /// the team's parent org.
    pub fn put_team_member(&self, member: TeamMember) -> Result<(), KernelError> {
        self.write(|state| {
            let team = state
                .get_team(member.team_id.as_str())
                .ok_or_else(|| KernelError::not_found(format!("team {}", member.team_id)))?;
            if state.get_org_member(team.org_id.as_str(), member.user_id.as_str()).is_none() {
                return Err(KernelError::invalid_state(format!(
                    "user {} is not a member of org {}",
                    member.user_id, team.org_id
                )));
            }
            Ok((vec![StoreOp::PutTeamMember { member }], ()))
        })
    }

    pub fn get_team_member(&self, team_id: &str, user_id: &str) -> Option<TeamMember> {
        self.read(|s| s.get_team_member(team_id, user_id).cloned())
    }

    pub fn members_of_team(&self, team_id: &str) -> Vec<TeamMember> {
        self.read(|s| s.members_of_team(team_id).into_iter().cloned().collect())
    }

    // ---- policies ----

    pub fn insert_policy(&self, policy: PermissionPolicy) -> Result<(), KernelError> {
        self.write(|_| Ok((vec![StoreOp::PutPolicy { policy }], ())))
    }

    pub fn delete_policy(&self, id: &str) -> Result<PermissionPolicy, KernelError> {
        self.write(|state| {
            let policy = state
                .get_policy(id)
                .cloned()
                .ok_or_else(|| KernelError::not_found(format!("policy {id}")))?;
            Ok((vec![StoreOp::DeletePolicy { id: id.to_string() }], policy))
        })
    }

    pub fn get_policy(&self, id: &str) -> Option<PermissionPolicy> {
        self.read(|s| s.get_policy(id).cloned())
    }

    pub fn list_policies(&self) -> Vec<PermissionPolicy> {
        self.read(|s| s.list_policies().into_iter().cloned().collect())
    }

    pub fn policies_for_subjects(&self, subjects: &[String]) -> Vec<PermissionPolicy> {
        self.read(|s| s.policies_for_subjects(subjects).into_iter().cloned().collect())
    }

    // ---- scheduler ----

    pub fn put_cron(&self, job: CronJob) -> Result<(), KernelError> {
        self.write(|_| Ok((vec![StoreOp::PutCron { job }], ())))
    }

    pub fn delete_cron(&self, id: &str) -> Result<CronJob, KernelError> {
        self.write(|state| {
            let job = state
                .get_cron(id)
                .cloned()
                .ok_or_else(|| KernelError::not_found(format!("cron {id}")))?;
            Ok((vec![StoreOp::DeleteCron { id: id.to_string() }], job))
        })
    }

    pub fn get_cron(&self, id: &str) -> Option<CronJob> {
        self.read(|s| s.get_cron(id).cloned())
    }

    pub fn list_crons(&self) -> Vec<CronJob> {
        self.read(|s| s.list_crons().into_iter().cloned().collect())
    }

    pub fn put_trigger(&self, trigger: EventTrigger) -> Result<(), KernelError> {
        self.write(|_| Ok((vec![StoreOp::PutTrigger { trigger }], ())))
    }

    pub fn delete_trigger(&self, id: &str) -> Result<EventTrigger, KernelError> {
        self.write(|state| {
            let trigger = state
                .get_trigger(id)
                .cloned()
                .ok_or_else(|| KernelError::not_found(format!("trigger {id}")))?;
            Ok((vec![StoreOp::DeleteTrigger { id: id.to_string() }], trigger))
        })
    }

    pub fn get_trigger(&self, id: &str) -> Option<EventTrigger> {
        self.read(|s| s.get_trigger(id).cloned())
    }

    pub fn list_triggers(&self) -> Vec<EventTrigger> {
        self.read(|s| s.list_triggers().into_iter().cloned().collect())
    }

    // ---- audit ----

    pub fn append_audit(&self, entry: AuditEntry) -> Result<(), KernelError> {
        self.write(|_| Ok((vec![StoreOp::AppendAudit { entry }], ())))
    }

    pub fn query_audit(&self, query: &AuditQuery) -> (Vec<AuditEntry>, usize) {
        self.read(|s| {
            let (page, total) = s.query_audit(query);
            (page.into_iter().cloned().collect(), total)
        })
    }

    // ---- plans ----

    pub fn put_plan(&self, plan: Plan) -> Result<(), KernelError> {
        self.write(|_| Ok((vec![StoreOp::PutPlan { plan }], ())))
    }

    pub fn get_plan(&self, pid: u32) -> Option<Plan> {
        self.read(|s| s.get_plan(pid).cloned())
    }

    pub fn delete_plan(&self, pid: u32) -> Result<(), KernelError> {
        self.write(|_| Ok((vec![StoreOp::DeletePlan { pid }], ())))
    }

    // ---- opaque KV ----

    pub fn set_kv(&self, key: &str, value: Value) -> Result<(), KernelError> {
        self.write(|_| Ok((vec![StoreOp::SetKv { key: key.to_string(), value }], ())))
    }

    pub fn get_kv(&self, key: &str) -> Option<Value> {
        self.read(|s| s.kv.get(key).cloned())
    }
}

#[cfg(test)]
#[path = "store_tests.rs"]
mod tests;
