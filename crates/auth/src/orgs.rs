// SPDX-License-Identifier: MIT

//! Org and team graph operations.
//!
//! Ownership is structural: the owner membership is created with the
//! org, can never be granted, promoted to, or removed, and dies only
//! with the org.

use crate::core::AuthCore;
use crate::password;
use aether_core::{
    Clock, Event, KernelError, Org, OrgId, OrgMember, OrgRole, Team, TeamId, TeamMember, TeamRole,
    User,
};

impl<C: Clock> AuthCore<C> {
    /// Create an org; the creator becomes its owner. The org row and
    /// the self-owner membership are one atomic commit.
    pub fn create_org(
        &self,
        creator: &User,
        name: &str,
        display_name: &str,
    ) -> Result<Org, KernelError> {
        password::validate_username(name)
            .map_err(|_| KernelError::invalid_input("org name must be 2+ chars of [A-Za-z0-9_-]"))?;
        let now = self.clock.epoch_ms();
        let org = Org {
            id: OrgId::new(),
            name: name.to_string(),
            display_name: if display_name.is_empty() {
                name.to_string()
            } else {
                display_name.to_string()
            },
            owner_user_id: creator.id,
            settings: serde_json::Value::Null,
            created_at_ms: now,
            updated_at_ms: now,
        };
        let owner = OrgMember {
            org_id: org.id,
            user_id: creator.id,
            role: OrgRole::Owner,
            joined_at_ms: now,
        };
        self.store.insert_org_with_owner(org.clone(), owner)?;
        self.bus.emit(&Event::OrgCreated {
            id: org.id,
            name: org.name.clone(),
            owner_user_id: creator.id,
        });
        Ok(org)
    }

    /// Delete an org. Only the owner or a system admin may.
    pub fn delete_org(&self, actor: &User, org_id: &str) -> Result<(), KernelError> {
        let org = self
            .store
            .get_org(org_id)
            .ok_or_else(|| KernelError::not_found(format!("org {org_id}")))?;
        if !actor.is_admin() && org.owner_user_id != actor.id {
            return Err(KernelError::forbidden("only the owner or an admin may delete an org"));
        }
        self.store.delete_org(org_id)?;
        self.bus.emit(&Event::OrgDeleted { id: org.id, name: org.name });
        Ok(())
    }

    /// Invite a user into an org. The `owner` role is unassignable.
    pub fn invite_member(
        &self,
        actor: &User,
        org_id: &str,
        user_id: &str,
        role: OrgRole,
    ) -> Result<OrgMember, KernelError> {
        if role == OrgRole::Owner {
            return Err(KernelError::invalid_input("the owner role cannot be granted"));
        }
        if !self.has_permission(actor.id.as_str(), "members.invite", Some(org_id)) {
            return Err(KernelError::forbidden("missing members.invite on this org"));
        }
        if self.store.get_user(user_id).is_none() {
            return Err(KernelError::not_found(format!("user {user_id}")));
        }
        if self.store.get_org_member(org_id, user_id).is_some() {
            return Err(KernelError::conflict("user is already a member"));
        }
        let member = OrgMember {
            org_id: OrgId::from_string(org_id),
            user_id: aether_core::UserId::from_string(user_id),
            role,
            joined_at_ms: self.clock.epoch_ms(),
        };
        self.store.put_org_member(member.clone())?;
        self.bus.emit(&Event::OrgMemberInvited {
            org_id: member.org_id,
            user_id: member.user_id,
            role,
        });
        Ok(member)
    }

    /// Change a member's role. Transitions to or from `owner` are
    /// rejected.
    pub fn update_member_role(
        &self,
        actor: &User,
        org_id: &str,
        user_id: &str,
        role: OrgRole,
    ) -> Result<OrgMember, KernelError> {
        if role == OrgRole::Owner {
            return Err(KernelError::invalid_input("cannot promote to owner"));
        }
        if !self.has_permission(actor.id.as_str(), "members.update", Some(org_id)) {
            return Err(KernelError::forbidden("missing members.update on this org"));
        }
        let mut member = self
            .store
            .get_org_member(org_id, user_id)
            .ok_or_else(|| KernelError::not_found("membership"))?;
        if member.role == OrgRole::Owner {
            return Err(KernelError::invalid_input("cannot change the owner's role"));
        }
        member.role = role;
        self.store.put_org_member(member.clone())?;
        self.bus.emit(&Event::OrgMemberUpdated {
            org_id: member.org_id,
            user_id: member.user_id,
            role,
        });
        Ok(member)
    }

    /// Remove a member. The owner membership is immortal.
    pub fn remove_member(
        &self,
        actor: &User,
        org_id: &str,
        user_id: &str,
    ) -> Result<(), KernelError> {
        if !self.has_permission(actor.id.as_str(), "members.remove", Some(org_id)) {
            return Err(KernelError::forbidden("missing members.remove on this org"));
        }
        let member = self
            .store
            .get_org_member(org_id, user_id)
            .ok_or_else(|| KernelError::not_found("membership"))?;
        if member.role == OrgRole::Owner {
            return Err(KernelError::invalid_input("the owner cannot be removed"));
        }
        self.store.remove_org_member(org_id, user_id)?;
        self.bus.emit(&Event::OrgMemberRemoved { org_id: member.org_id, user_id: member.user_id });
        Ok(())
    }

    /// Create a team. Requires `teams.create` on the org.
    pub fn create_team(
        &self,
        actor: &User,
        org_id: &str,
        name: &str,
        description: &str,
    ) -> Result<Team, KernelError> {
        if !self.has_permission(actor.id.as_str(), "teams.create", Some(org_id)) {
            return Err(KernelError::forbidden("missing teams.create on this org"));
        }
        if self.store.get_org(org_id).is_none() {
            return Err(KernelError::not_found(format!("org {org_id}")));
        }
        let team = Team {
            id: TeamId::new(),
            org_id: OrgId::from_string(org_id),
            name: name.to_string(),
            description: description.to_string(),
        };
        self.store.insert_team(team.clone())?;
        Ok(team)
    }

    /// Add a team member. The store enforces that the user is already an
    /// org member of the team's parent org.
    pub fn add_team_member(
        &self,
        actor: &User,
        team_id: &str,
        user_id: &str,
        role: TeamRole,
    ) -> Result<TeamMember, KernelError> {
        let team = self
            .store
            .get_team(team_id)
            .ok_or_else(|| KernelError::not_found(format!("team {team_id}")))?;
        if !self.has_permission(actor.id.as_str(), "teams.manage", Some(team.org_id.as_str())) {
            return Err(KernelError::forbidden("missing teams.manage on this org"));
        }
        let member = TeamMember {
            team_id: TeamId::from_string(team_id),
            user_id: aether_core::UserId::from_string(user_id),
            role,
            joined_at_ms: self.clock.epoch_ms(),
        };
        self.store.put_team_member(member.clone())?;
        Ok(member)
    }

    pub fn list_orgs(&self) -> Vec<Org> {
        self.store.list_orgs()
    }

    pub fn orgs_of_user(&self, user_id: &str) -> Vec<(Org, OrgMember)> {
        self.store.orgs_of_user(user_id)
    }

    pub fn members_of_org(&self, org_id: &str) -> Vec<OrgMember> {
        self.store.members_of_org(org_id)
    }

    pub fn teams_of_org(&self, org_id: &str) -> Vec<Team> {
        self.store.teams_of_org(org_id)
    }

    pub fn members_of_team(&self, team_id: &str) -> Vec<TeamMember> {
        self.store.members_of_team(team_id)
    }
}

#[cfg(test)]
#[path = "orgs_tests.rs"]
mod tests;
